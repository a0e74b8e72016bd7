//! Telegram front-end
//!
//! # Architecture
//!
//! ```text
//! telegram/
//! ├── mod.rs           # This file - public API
//! ├── bot.rs           # Bot creation and token check
//! ├── context.rs       # Shared handler state (BotContext)
//! ├── state.rs         # Per-chat conversation steps
//! ├── polling.rs       # getUpdates loop, access and admin guards
//! ├── service.rs       # ServiceManager integration
//! ├── notifier.rs      # Bot description publisher
//! │
//! ├── keyboards.rs     # Inline keyboards
//! ├── formatters.rs    # HTML message texts
//! ├── pagination.rs    # Pair list pages
//! │
//! └── commands/        # Handlers
//!     ├── mod.rs       # Text dispatch and send helpers
//!     ├── start.rs     # /start and referral redemption
//!     ├── menu.rs      # Main menu, FAQ, pair list
//!     ├── charts.rs    # Chart queries and quick charts
//!     ├── admin.rs     # Admin panel and wizards
//!     └── callbacks.rs # Button click handlers
//! ```

pub mod bot;
pub mod commands;
pub mod context;
pub mod formatters;
pub mod keyboards;
pub mod notifier;
pub mod pagination;
pub mod polling;
pub mod service;
pub mod state;

pub use bot::connect;
pub use context::{BotContext, BotSettings};
pub use notifier::TelegramDescriptionPublisher;
pub use service::{DescriptionService, TelegramService};
pub use state::{ChartKind, ConversationState, ConversationStore};
