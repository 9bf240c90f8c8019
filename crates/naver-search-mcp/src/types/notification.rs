//! MCP notification types pushed to clients over the session stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LOG_MESSAGE_METHOD: &str = "notifications/message";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessageParams {
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub data: Value,
}

/// Syslog severities, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Emergency);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_level_wire_format() {
        let level: LogLevel = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(serde_json::to_string(&LogLevel::Critical).unwrap(), "\"critical\"");
    }
}
