//! Configuration system
//!
//! - `macros`: the `config_struct!` macro
//! - `schemas`: every config section with its defaults
//! - `utils`: loading and the global accessors
//!
//! ```ignore
//! use crate::config::{load_config, with_config};
//!
//! load_config()?;
//! let interval = with_config(|cfg| cfg.description.interval_secs);
//! ```

#[macro_use]
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::*;
