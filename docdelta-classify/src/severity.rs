use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of a change, totally ordered from `Low` to `Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or clarifying wording
    #[default]
    Low,
    /// Changes obligations in a limited way
    Medium,
    /// Changes money, deadlines or liability
    High,
    /// Removes or rewrites a protective clause
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Accepts the English names in any case, optionally wrapped in brackets
    /// (`[high]`), and the Russian adjectives models sometimes answer with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s
            .trim()
            .trim_matches(|c: char| matches!(c, '[' | ']' | '*' | '"' | '\'' | '.'))
            .trim()
            .to_lowercase();
        match cleaned.as_str() {
            "low" | "низкая" | "низкий" => Ok(Severity::Low),
            "medium" | "средняя" | "средний" => Ok(Severity::Medium),
            "high" | "высокая" | "высокий" => Ok(Severity::High),
            "critical" | "критическая" | "критический" => Ok(Severity::Critical),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}
