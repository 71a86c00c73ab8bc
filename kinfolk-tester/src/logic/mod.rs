pub mod reports;
pub mod scenarios;
pub mod tester;

use anyhow::{Context, Result};
use clap::ValueEnum;
use kinfolk_game::Narrator;
use serde::{Deserialize, Serialize};

use crate::llm::ChatCompletionSource;

pub use scenarios::{RunSummary, ScenarioCtx, TestScenario, find_scenario, list_scenarios};
pub use tester::*;

/// Where scenario narration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorMode {
    /// Embedded templates, fully deterministic
    Offline,
    /// OpenAI-compatible endpoint configured through `LLM_*` variables
    Llm,
}

impl NarratorMode {
    /// Build a fresh narrator for one run.
    ///
    /// # Errors
    ///
    /// Returns an error when the live endpoint is selected but not configured.
    pub fn build(self, seed: u64) -> Result<Narrator> {
        match self {
            Self::Offline => Ok(Narrator::offline(seed)),
            Self::Llm => {
                let source = ChatCompletionSource::from_env()
                    .context("live narration requested but the endpoint is not configured")?;
                Ok(Narrator::new(Box::new(source)))
            }
        }
    }
}

pub fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse comma-separated seeds. Decimal and `0x` hex are accepted.
///
/// # Errors
///
/// Returns an error naming the first token that is not a number.
pub fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    split_csv(input)
        .iter()
        .map(|token| {
            let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => token.parse::<u64>(),
            };
            parsed.with_context(|| format!("invalid seed '{token}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_drops_blanks() {
        assert_eq!(split_csv(" smoke, ,lifetime ,"), vec!["smoke", "lifetime"]);
    }

    #[test]
    fn seeds_accept_decimal_and_hex() {
        assert_eq!(parse_seeds("1337, 0x10").unwrap(), vec![1337, 16]);
        let err = parse_seeds("12,abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn offline_narrator_always_builds() {
        let narrator = NarratorMode::Offline.build(7).unwrap();
        assert_eq!(narrator.failures(), 0);
    }
}
