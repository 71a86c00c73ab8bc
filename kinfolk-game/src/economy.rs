//! Calendar and macro-economy state machines.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DAYS_PER_YEAR;
use crate::rng::pick_weighted;

/// Day-of-year for a one-based running day counter. Day 365 wraps to 0.
#[must_use]
pub const fn day_of_year(day: u32) -> u32 {
    day % DAYS_PER_YEAR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Pure function of day-of-year; day-of-year 0 falls into winter.
    #[must_use]
    pub const fn from_day_of_year(day_of_year: u32) -> Self {
        match day_of_year {
            1..=90 => Self::Spring,
            91..=180 => Self::Summer,
            181..=270 => Self::Autumn,
            _ => Self::Winter,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EconomyStatus {
    Boom,
    #[default]
    Normal,
    Recession,
}

/// Where an economy multiplier is being read; each system weighs the cycle differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EconomyLens {
    Investment,
    Startup,
    Management,
    Accrual,
}

impl EconomyStatus {
    pub const ALL: [Self; 3] = [Self::Boom, Self::Normal, Self::Recession];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boom => "boom",
            Self::Normal => "normal",
            Self::Recession => "recession",
        }
    }

    #[must_use]
    pub const fn multiplier(self, lens: EconomyLens) -> f64 {
        match (lens, self) {
            (_, Self::Normal) => 1.0,
            (EconomyLens::Investment | EconomyLens::Management, Self::Boom) => 1.2,
            (EconomyLens::Startup, Self::Boom) => 1.3,
            (EconomyLens::Accrual, Self::Boom) => 1.5,
            (EconomyLens::Investment | EconomyLens::Startup, Self::Recession) => 0.7,
            (EconomyLens::Management, Self::Recession) => 0.8,
            (EconomyLens::Accrual, Self::Recession) => 0.6,
        }
    }

    /// Outgoing distribution over `[Boom, Normal, Recession]`.
    #[must_use]
    pub const fn transition_weights(self) -> [f64; 3] {
        match self {
            Self::Boom => [0.3, 0.6, 0.1],
            Self::Normal => [0.3, 0.4, 0.3],
            Self::Recession => [0.1, 0.6, 0.3],
        }
    }

    /// Draw the next state of the Markov chain.
    #[must_use]
    pub fn next<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let weights = self.transition_weights();
        let candidates: Vec<(Self, f64)> = Self::ALL.into_iter().zip(weights).collect();
        pick_weighted(&candidates, rng).copied().unwrap_or(self)
    }
}

impl fmt::Display for EconomyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EconomyStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boom" => Ok(Self::Boom),
            "normal" => Ok(Self::Normal),
            "recession" => Ok(Self::Recession),
            _ => Err(()),
        }
    }
}
