//! Achievement counters, their one-shot rewards, and the family traits they unlock.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyTrait {
    WisdomLegacy,
    BusinessAcumen,
    HealthyGenes,
    CharismaticBearing,
    FortunesFavor,
}

impl FamilyTrait {
    pub const ALL: [Self; 5] = [
        Self::WisdomLegacy,
        Self::BusinessAcumen,
        Self::HealthyGenes,
        Self::CharismaticBearing,
        Self::FortunesFavor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WisdomLegacy => "wisdom_legacy",
            Self::BusinessAcumen => "business_acumen",
            Self::HealthyGenes => "healthy_genes",
            Self::CharismaticBearing => "charismatic_bearing",
            Self::FortunesFavor => "fortunes_favor",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::WisdomLegacy => "Wisdom Legacy",
            Self::BusinessAcumen => "Business Acumen",
            Self::HealthyGenes => "Healthy Genes",
            Self::CharismaticBearing => "Charismatic Bearing",
            Self::FortunesFavor => "Fortune's Favor",
        }
    }
}

/// Trait -> tier. Tier 0 means locked; every trait is listed from the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyTraits(BTreeMap<FamilyTrait, u8>);

impl Default for FamilyTraits {
    fn default() -> Self {
        Self(FamilyTrait::ALL.into_iter().map(|t| (t, 0)).collect())
    }
}

impl FamilyTraits {
    #[must_use]
    pub fn tier(&self, family_trait: FamilyTrait) -> u8 {
        self.0.get(&family_trait).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has(&self, family_trait: FamilyTrait) -> bool {
        self.tier(family_trait) > 0
    }

    /// Unlock at tier 1. Returns false when already unlocked.
    pub fn unlock(&mut self, family_trait: FamilyTrait) -> bool {
        let tier = self.0.entry(family_trait).or_insert(0);
        if *tier > 0 {
            return false;
        }
        *tier = 1;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (FamilyTrait, u8)> + '_ {
        self.0.iter().map(|(t, tier)| (*t, *tier))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    Wealthy,
    Entrepreneur,
    Prolific,
    Longevity,
    PrestigiousFamily,
    InvestmentTycoon,
    Philanthropist,
}

impl AchievementId {
    pub const ALL: [Self; 7] = [
        Self::Wealthy,
        Self::Entrepreneur,
        Self::Prolific,
        Self::Longevity,
        Self::PrestigiousFamily,
        Self::InvestmentTycoon,
        Self::Philanthropist,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wealthy => "wealthy",
            Self::Entrepreneur => "entrepreneur",
            Self::Prolific => "prolific",
            Self::Longevity => "longevity",
            Self::PrestigiousFamily => "prestigious_family",
            Self::InvestmentTycoon => "investment_tycoon",
            Self::Philanthropist => "philanthropist",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Wealthy => "Wealthy",
            Self::Entrepreneur => "Entrepreneur",
            Self::Prolific => "Prolific",
            Self::Longevity => "Longevity",
            Self::PrestigiousFamily => "Prestigious Family",
            Self::InvestmentTycoon => "Investment Tycoon",
            Self::Philanthropist => "Philanthropist",
        }
    }

    #[must_use]
    pub const fn goal(self) -> AchievementGoal {
        let reward = match self {
            Self::Wealthy => Reward::FortuneBonus { pct: 10.0 },
            Self::Entrepreneur => Reward::StartupEdge { bonus: 0.15 },
            Self::Prolific => Reward::Prestige { amount: 20.0 },
            Self::Longevity => Reward::UnlockTrait {
                family_trait: FamilyTrait::HealthyGenes,
            },
            Self::PrestigiousFamily => Reward::UnlockTrait {
                family_trait: FamilyTrait::CharismaticBearing,
            },
            Self::InvestmentTycoon => Reward::UnlockTrait {
                family_trait: FamilyTrait::FortunesFavor,
            },
            Self::Philanthropist => Reward::Prestige { amount: 10.0 },
        };
        let target = match self {
            Self::Wealthy | Self::Philanthropist => 1_000_000.0,
            Self::Entrepreneur => 3.0,
            Self::Prolific => 5.0,
            Self::Longevity => 90.0,
            Self::PrestigiousFamily => 100.0,
            Self::InvestmentTycoon => 1.0,
        };
        AchievementGoal::new(target, reward)
    }

    /// Key of the derived completion marker, e.g. `wealthy_completed`.
    #[must_use]
    pub fn completion_key(self) -> String {
        format!("{}_completed", self.as_str())
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reward {
    /// Percentage of the family fortune paid out to the head of the family.
    FortuneBonus { pct: f64 },
    /// Passive: read by business founding while the achievement is complete.
    StartupEdge { bonus: f64 },
    Prestige { amount: f64 },
    UnlockTrait { family_trait: FamilyTrait },
}

impl Reward {
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::FortuneBonus { pct } => format!("family fortune +{pct:.0}%"),
            Self::StartupEdge { bonus } => {
                format!("startup success chance +{:.0}%", bonus * 100.0)
            }
            Self::Prestige { amount } => format!("family prestige +{amount:.0}"),
            Self::UnlockTrait { family_trait } => {
                format!("family trait '{}' unlocked", family_trait.title())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementGoal {
    pub target: f64,
    pub reward: Reward,
}

impl AchievementGoal {
    #[must_use]
    pub const fn new(target: f64, reward: Reward) -> Self {
        Self { target, reward }
    }
}

/// A goal crossed for the first time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unlock {
    pub id: AchievementId,
    pub reward: Reward,
}

/// Monotonic progress counters plus one-shot completion markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementTracker {
    #[serde(default)]
    progress: BTreeMap<AchievementId, f64>,
    #[serde(default)]
    completed: BTreeSet<AchievementId>,
}

impl AchievementTracker {
    /// Add `delta` to a counter. Returns the unlock the first time the goal is met.
    pub fn increment(&mut self, id: AchievementId, delta: f64) -> Option<Unlock> {
        let counter = self.progress.entry(id).or_insert(0.0);
        *counter += delta.max(0.0);
        self.check(id)
    }

    /// Raise a counter to `value` when it is higher, for level-style goals
    /// such as wealth, prestige or age.
    pub fn advance_to(&mut self, id: AchievementId, value: f64) -> Option<Unlock> {
        let counter = self.progress.entry(id).or_insert(0.0);
        if value > *counter {
            *counter = value;
        }
        self.check(id)
    }

    fn check(&mut self, id: AchievementId) -> Option<Unlock> {
        let goal = id.goal();
        if self.progress(id) < goal.target || !self.completed.insert(id) {
            return None;
        }
        Some(Unlock {
            id,
            reward: goal.reward,
        })
    }

    #[must_use]
    pub fn progress(&self, id: AchievementId) -> f64 {
        self.progress.get(&id).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_completed(&self, id: AchievementId) -> bool {
        self.completed.contains(&id)
    }

    /// Flattened view: each counter by id plus `<id>_completed` markers.
    #[must_use]
    pub fn flattened(&self) -> BTreeMap<String, serde_json::Value> {
        let mut out = BTreeMap::new();
        for (id, value) in &self.progress {
            out.insert(id.as_str().to_string(), serde_json::json!(value));
        }
        for id in &self.completed {
            out.insert(id.completion_key(), serde_json::Value::Bool(true));
        }
        out
    }
}
