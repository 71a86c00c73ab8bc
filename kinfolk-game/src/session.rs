//! Session wrapper binding a game state to its random streams and narrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::activities::{
    self, ActivityCategory, ActivityKind, ActivityParams, FailureReason, Outcome,
};
use crate::character::{Character, EducationLevel, Gender};
use crate::constants::{ENERGY_MAX, STARTER_JOB, STARTER_SALARY};
use crate::family::{CharacterId, FamilyRegistry};
use crate::names;
use crate::narrative::Narrator;
use crate::rng::RngBundle;
use crate::snapshot::StateSnapshot;
use crate::state::GameState;
use crate::tick::{self, DayReport};

/// Character creation request. A missing name is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSpec {
    pub name: Option<String>,
    pub gender: Gender,
    pub age: u32,
    pub education: EducationLevel,
}

impl Default for CharacterSpec {
    fn default() -> Self {
        Self {
            name: None,
            gender: Gender::Male,
            age: 25,
            education: EducationLevel::HighSchool,
        }
    }
}

/// One playthrough: state, deterministic random streams and a narrator.
#[derive(Debug)]
pub struct LifeSession {
    state: GameState,
    rngs: RngBundle,
    narrator: Narrator,
}

impl LifeSession {
    /// Fresh game narrated offline.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_narrator(seed, Narrator::offline(seed))
    }

    #[must_use]
    pub fn with_narrator(seed: u64, narrator: Narrator) -> Self {
        Self {
            state: GameState::default().with_seed(seed),
            rngs: RngBundle::from_user_seed(seed),
            narrator,
        }
    }

    /// Resume a loaded game. Streams are keyed by seed and day.
    #[must_use]
    pub fn from_state(state: GameState, narrator: Narrator) -> Self {
        let rngs = RngBundle::resumed(state.seed, state.day);
        Self {
            state,
            rngs,
            narrator,
        }
    }

    /// Create the player, replacing any previous family.
    pub fn create_character(&mut self, spec: &CharacterSpec) -> CharacterId {
        let mut rng = self.rngs.genesis();
        let name = match spec.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => names::catalog().full_name(spec.gender, &mut *rng),
        };
        let mut character = Character::generate(
            name,
            spec.gender,
            spec.age,
            &self.state.family_traits,
            &mut *rng,
        );
        drop(rng);

        let bonus = spec.education.creation_bonus();
        character.education_level = spec.education;
        character.intelligence += bonus;
        character.financial_intelligence += bonus * 0.5;
        character.job = STARTER_JOB.to_string();
        character.salary = STARTER_SALARY;
        crate::attributes::normalize(&mut character);

        let created = format!("Created a new character: {}", character.name);
        self.state.registry = FamilyRegistry::new();
        let id = self.state.registry.insert(character);
        self.state.player = Some(id);
        self.state.log(created, "creation");
        self.state.recompute_fortune();
        log::info!("created player {id} (seed {})", self.state.seed);
        id
    }

    /// Resolve an activity by wire name for the player.
    pub fn perform(&mut self, name: &str, params: &ActivityParams) -> Outcome {
        let Some(player) = self.state.player else {
            return Outcome::failed(FailureReason::CharacterUnavailable);
        };
        let mut rng = self.rngs.activity();
        activities::resolve_named(
            &mut self.state,
            player,
            name,
            params,
            &mut *rng,
            &mut self.narrator,
        )
    }

    /// Resolve an activity for any registered character.
    pub fn perform_as(
        &mut self,
        actor: CharacterId,
        kind: ActivityKind,
        params: &ActivityParams,
    ) -> Outcome {
        let mut rng = self.rngs.activity();
        activities::resolve(
            &mut self.state,
            actor,
            kind,
            params,
            &mut *rng,
            &mut self.narrator,
        )
    }

    /// Sleep, then run the daily tick.
    pub fn advance_day(&mut self) -> DayReport {
        if let Some(player) = self.state.player_mut() {
            player.energy = ENERGY_MAX;
        }
        let mut rng = self.rngs.daily();
        tick::advance_day(&mut self.state, &mut *rng, &mut self.narrator)
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.state)
    }

    /// Activities the player can attempt right now.
    #[must_use]
    pub fn available_activities(&self) -> BTreeMap<ActivityCategory, Vec<ActivityKind>> {
        self.state
            .player()
            .map(activities::available_activities)
            .unwrap_or_default()
    }

    /// Deterministically reseed the session.
    pub fn reseed(&mut self, seed: u64) {
        self.state.seed = seed;
        self.rngs = RngBundle::from_user_seed(seed);
    }

    #[must_use]
    pub fn rng_draws(&self) -> u64 {
        self.rngs.total_draws()
    }

    #[must_use]
    pub const fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    pub const fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Apply a closure to the mutable game state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut self.state)
    }

    /// Consume the session, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }
}
