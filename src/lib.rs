pub mod access;
pub mod arguments;
pub mod candles;
pub mod chart;
pub mod clock;
pub mod config;
pub mod description;
pub mod errors; // Structured error handling
pub mod logger;
pub mod paths;
pub mod referral;
pub mod run;
pub mod services;
pub mod storage;
pub mod telegram;
