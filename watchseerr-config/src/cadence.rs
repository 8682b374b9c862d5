use std::fmt;

use thiserror::Error;

/// Keyword that turns scheduled synchronization off.
pub const DISABLED: &str = "disabled";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CadenceError {
    #[error(
        "cron expression `{expression}` has {fields} fields; expected 5, 6 or 7"
    )]
    FieldCount { expression: String, fields: usize },
    #[error("cron expression `{expression}` contains invalid character `{character}`")]
    InvalidCharacter { expression: String, character: char },
}

/// A cron expression normalized to the seconds-first form used by the
/// scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    raw: String,
    normalized: String,
}

impl CronExpression {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Six or seven field expression; five field input gets a `0` seconds
    /// field prepended.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// How often the watchlist synchronization runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cadence {
    #[default]
    Disabled,
    Cron(CronExpression),
}

impl Cadence {
    pub fn parse(raw: &str) -> Result<Self, CadenceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DISABLED) {
            return Ok(Cadence::Disabled);
        }

        if let Some(character) = trimmed.chars().find(|c| {
            !(c.is_ascii_alphanumeric()
                || c.is_ascii_whitespace()
                || matches!(c, '*' | '/' | ',' | '-' | '?' | '#'))
        }) {
            return Err(CadenceError::InvalidCharacter {
                expression: trimmed.to_string(),
                character,
            });
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let normalized = match fields.len() {
            5 => format!("0 {}", fields.join(" ")),
            6 | 7 => fields.join(" "),
            count => {
                return Err(CadenceError::FieldCount {
                    expression: trimmed.to_string(),
                    fields: count,
                });
            }
        };

        Ok(Cadence::Cron(CronExpression {
            raw: trimmed.to_string(),
            normalized,
        }))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Cadence::Cron(_))
    }

    pub fn cron(&self) -> Option<&CronExpression> {
        match self {
            Cadence::Disabled => None,
            Cadence::Cron(expr) => Some(expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_keyword_and_blank_disable_scheduling() {
        assert_eq!(Cadence::parse("disabled"), Ok(Cadence::Disabled));
        assert_eq!(Cadence::parse(" DISABLED "), Ok(Cadence::Disabled));
        assert_eq!(Cadence::parse(""), Ok(Cadence::Disabled));
    }

    #[test]
    fn five_field_expressions_gain_a_seconds_field() {
        let cadence = Cadence::parse("*/30 * * * *").expect("valid cron");
        let expr = cadence.cron().expect("enabled");
        assert_eq!(expr.raw(), "*/30 * * * *");
        assert_eq!(expr.normalized(), "0 */30 * * * *");
    }

    #[test]
    fn six_field_expressions_are_kept() {
        let cadence = Cadence::parse("15 0 4 * * Mon").expect("valid cron");
        assert_eq!(cadence.cron().unwrap().normalized(), "15 0 4 * * Mon");
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(matches!(
            Cadence::parse("* * *"),
            Err(CadenceError::FieldCount { fields: 3, .. })
        ));
        assert!(matches!(
            Cadence::parse("0 4 * * ; rm"),
            Err(CadenceError::InvalidCharacter { character: ';', .. })
        ));
    }
}
