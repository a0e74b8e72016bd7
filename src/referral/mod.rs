//! Referral codes
//!
//! Admins issue codes that carry an activation count and an optional expiry.
//! Redeeming a live code whitelists the user and consumes one activation.
//! Expired and exhausted codes are dropped lazily by `sweep` whenever the
//! collection is read for redemption or listing.

mod engine;
mod sweep;
mod ttl;
mod types;

pub use engine::{describe_expiry, ReferralEngine};
pub use sweep::{sweep, RemovalReason, Removed};
pub use ttl::{parse_ttl, ttl_or_unbounded};
pub use types::{ReferralCode, ReferralLink};
