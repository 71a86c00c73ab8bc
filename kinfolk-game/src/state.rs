//! World state: calendar, economy, family-wide standing and the registry.

use serde::{Deserialize, Serialize};

use crate::achievements::{AchievementId, AchievementTracker, FamilyTraits, Reward, Unlock};
use crate::attributes;
use crate::character::Character;
use crate::constants::{STARTING_FAMILY_PRESTIGE, STARTING_FORTUNE};
use crate::economy::{EconomyStatus, Season, day_of_year};
use crate::events::{EventId, EventLog};
use crate::family::{CharacterId, FamilyRegistry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub seed: u64,
    /// One-based running day counter.
    pub day: u32,
    pub season: Season,
    pub economy: EconomyStatus,
    pub family_fortune: f64,
    pub family_prestige: f64,
    pub family_traits: FamilyTraits,
    pub achievements: AchievementTracker,
    pub events: EventLog,
    pub registry: FamilyRegistry,
    pub player: Option<CharacterId>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            seed: 0,
            day: 1,
            season: Season::from_day_of_year(day_of_year(1)),
            economy: EconomyStatus::Normal,
            family_fortune: STARTING_FORTUNE,
            family_prestige: STARTING_FAMILY_PRESTIGE,
            family_traits: FamilyTraits::default(),
            achievements: AchievementTracker::default(),
            events: EventLog::new(),
            registry: FamilyRegistry::new(),
            player: None,
        }
    }
}

impl GameState {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn player(&self) -> Option<&Character> {
        self.player.and_then(|id| self.registry.get(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Character> {
        self.player.and_then(|id| self.registry.get_mut(id))
    }

    /// Everyone in the registry except the player.
    #[must_use]
    pub fn family_member_ids(&self) -> Vec<CharacterId> {
        self.registry
            .ids()
            .filter(|id| Some(*id) != self.player)
            .collect()
    }

    /// Append a visible event stamped with the current day.
    pub fn log(&mut self, text: impl Into<String>, tag: &str) -> EventId {
        self.events.record(self.day, text, tag)
    }

    /// Add progress to a counter-style achievement, applying the reward on first completion.
    pub fn update_achievement(&mut self, id: AchievementId, delta: f64) -> Option<Unlock> {
        let unlock = self.achievements.increment(id, delta)?;
        self.apply_unlock(unlock);
        Some(unlock)
    }

    /// Raise a level-style achievement to `value`, applying the reward on first completion.
    pub fn advance_achievement(&mut self, id: AchievementId, value: f64) -> Option<Unlock> {
        let unlock = self.achievements.advance_to(id, value)?;
        self.apply_unlock(unlock);
        Some(unlock)
    }

    fn apply_unlock(&mut self, unlock: Unlock) {
        log::info!("achievement unlocked: {}", unlock.id);
        self.log(
            format!(
                "Achievement unlocked: {}! Reward: {}",
                unlock.id.title(),
                unlock.reward.describe()
            ),
            "achievement",
        );
        match unlock.reward {
            Reward::FortuneBonus { pct } => {
                let bonus = self.family_fortune * pct / 100.0;
                self.family_fortune += bonus;
                if let Some(player) = self.player_mut() {
                    player.assets += bonus;
                }
                self.log(
                    format!("The family fortune grew by {bonus:.0}!"),
                    "achievement",
                );
            }
            Reward::StartupEdge { .. } => {
                self.log(
                    "Family members will find it easier to launch new ventures.",
                    "achievement",
                );
            }
            Reward::Prestige { amount } => {
                self.family_prestige += amount;
                self.log(
                    format!("Family prestige rose by {amount:.0}!"),
                    "achievement",
                );
            }
            Reward::UnlockTrait { family_trait } => {
                if self.family_traits.unlock(family_trait) {
                    self.log(
                        format!("Family trait '{}' unlocked!", family_trait.title()),
                        "achievement",
                    );
                }
            }
        }
    }

    /// Living members' assets, summed.
    #[must_use]
    pub fn living_assets(&self) -> f64 {
        self.registry
            .iter()
            .filter(|(_, character)| character.alive)
            .map(|(_, character)| character.assets)
            .sum()
    }

    /// Authoritative fortune recompute followed by the wealth and prestige checks.
    pub fn recompute_fortune(&mut self) {
        self.family_fortune = self.living_assets();
        if self.family_fortune >= AchievementId::Wealthy.goal().target {
            self.advance_achievement(AchievementId::Wealthy, self.family_fortune);
        }
        if self.family_prestige >= AchievementId::PrestigiousFamily.goal().target {
            self.advance_achievement(AchievementId::PrestigiousFamily, self.family_prestige);
        }
    }

    /// Repair links and reapply clamps after deserializing.
    #[must_use]
    pub fn rehydrate(mut self) -> Self {
        let repaired = self.registry.repair_links();
        if repaired > 0 {
            log::warn!("repaired {repaired} dangling family links on load");
        }
        if self.player.is_some_and(|id| self.registry.get(id).is_none()) {
            log::warn!("player {:?} missing from registry; clearing", self.player);
            self.player = None;
        }
        for (_, character) in self.registry.iter_mut() {
            attributes::normalize(character);
            attributes::recompute_appearance(character);
        }
        self.day = self.day.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::FamilyTrait;
    use crate::character::Gender;

    fn state_with_player(assets: f64) -> GameState {
        let mut state = GameState::default().with_seed(11);
        let mut player = Character::new("Mara Quill", Gender::Female, 30);
        player.assets = assets;
        state.player = Some(state.registry.insert(player));
        state
    }

    #[test]
    fn defaults_match_a_fresh_family() {
        let state = GameState::default();
        assert_eq!(state.day, 1);
        assert_eq!(state.season, Season::Spring);
        assert_eq!(state.economy, EconomyStatus::Normal);
        assert!((state.family_fortune - 10_000.0).abs() < f64::EPSILON);
        assert!((state.family_prestige - 50.0).abs() < f64::EPSILON);
        assert!(state.player().is_none());
    }

    #[test]
    fn wealthy_bonus_is_paid_once() {
        let mut state = state_with_player(1_200_000.0);
        state.recompute_fortune();
        assert!(state.achievements.is_completed(AchievementId::Wealthy));
        let paid = state.player().map_or(0.0, |p| p.assets);
        assert!((paid - 1_320_000.0).abs() < 1e-6);

        state.recompute_fortune();
        let again = state.player().map_or(0.0, |p| p.assets);
        assert!((again - paid).abs() < 1e-6);
    }

    #[test]
    fn prestige_threshold_unlocks_charismatic_bearing() {
        let mut state = state_with_player(100.0);
        state.family_prestige = 120.0;
        state.recompute_fortune();
        assert!(state.family_traits.has(FamilyTrait::CharismaticBearing));
        assert!(
            state
                .events
                .iter()
                .any(|entry| entry.text.contains("Charismatic"))
        );
    }

    #[test]
    fn prolific_reward_adds_prestige() {
        let mut state = state_with_player(100.0);
        for _ in 0..4 {
            assert!(state.update_achievement(AchievementId::Prolific, 1.0).is_none());
        }
        assert!(state.update_achievement(AchievementId::Prolific, 1.0).is_some());
        assert!((state.family_prestige - 70.0).abs() < f64::EPSILON);
        assert!(state.update_achievement(AchievementId::Prolific, 1.0).is_none());
        assert!((state.family_prestige - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fortune_ignores_the_dead() {
        let mut state = state_with_player(5_000.0);
        let mut ghost = Character::new("Old Quill", Gender::Male, 80);
        ghost.assets = 9_999.0;
        ghost.alive = false;
        state.registry.insert(ghost);
        state.recompute_fortune();
        assert!((state.family_fortune - 5_000.0).abs() < f64::EPSILON);
    }
}
