/// Log tags identify the subsystem a message comes from.
///
/// Each tag maps to a `--debug-<key>` command-line flag that enables its
/// debug-level output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Storage,
    Access,
    Referral,
    Api,
    Chart,
    Telegram,
    Description,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by `--debug-<key>` flags and the enabled-tags filter
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Storage => "storage".to_string(),
            LogTag::Access => "access".to_string(),
            LogTag::Referral => "referral".to_string(),
            LogTag::Api => "api".to_string(),
            LogTag::Chart => "chart".to_string(),
            LogTag::Telegram => "telegram".to_string(),
            LogTag::Description => "description".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(s) => s.to_lowercase(),
        }
    }

    /// Uppercase label without colors, used in the log file
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::Other(s) => s.to_uppercase(),
            other => other.to_debug_key().to_uppercase(),
        }
    }

    /// All tags that have a dedicated debug flag
    pub fn all() -> Vec<LogTag> {
        vec![
            LogTag::System,
            LogTag::Config,
            LogTag::Storage,
            LogTag::Access,
            LogTag::Referral,
            LogTag::Api,
            LogTag::Chart,
            LogTag::Telegram,
            LogTag::Description,
        ]
    }
}
