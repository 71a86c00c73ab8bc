//! Kinfolk Game Engine
//!
//! Platform-agnostic core logic for the Kinfolk family life simulation.
//! This crate provides the attribute model, activity resolution, the daily tick,
//! achievements and the event log without any UI, network or disk dependencies.

pub mod achievements;
pub mod activities;
pub mod attributes;
pub mod careers;
pub mod character;
pub mod constants;
pub mod economy;
pub mod events;
pub mod family;
pub mod names;
pub mod narrative;
pub mod numbers;
pub mod random_events;
pub mod rng;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod tick;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use achievements::{AchievementId, AchievementTracker, FamilyTrait, FamilyTraits, Reward};
pub use activities::{
    ActivityCategory, ActivityKind, ActivityParams, FailureReason, Outcome, available_activities,
    resolve, resolve_named,
};
pub use character::{
    AssetClass, Business, BusinessKind, Character, EducationLevel, Gender, MentalState,
    NetworkDomain, RelationshipStatus,
};
pub use economy::{EconomyStatus, Season};
pub use events::{EventId, EventLog, LogEntry};
pub use family::{CharacterId, FamilyRegistry};
pub use narrative::{
    ContextBlock, NarrativeError, NarrativeRequest, NarrativeSource, Narrator, TemplateNarrator,
};
pub use random_events::{EventCategory, RandomEvent, Sentiment};
pub use rng::RngBundle;
pub use session::{CharacterSpec, LifeSession};
pub use snapshot::{CharacterSummary, StateSnapshot};
pub use state::GameState;
pub use tick::{DayReport, advance_day};

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error>;

    /// Load game state
    ///
    /// # Errors
    ///
    /// Returns an error if the save exists but cannot be read.
    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error>;

    /// Names of every stored save, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be listed.
    fn list_saves(&self) -> Result<Vec<String>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// `(ok, message)` pair reported back to clients for storage requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReport {
    pub ok: bool,
    pub message: String,
}

impl StorageReport {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Main game engine for managing game instances
pub struct GameEngine<S>
where
    S: GameStorage,
{
    storage: S,
}

impl<S> GameEngine<S>
where
    S: GameStorage,
{
    /// Create a new game engine with the provided storage
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Start a fresh offline-narrated session.
    #[must_use]
    pub fn create_session(&self, seed: u64) -> LifeSession {
        LifeSession::new(seed)
    }

    /// Save a game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    pub fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), S::Error> {
        self.storage.save_game(save_name, game_state)
    }

    /// Load a game state, repairing links and clamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    pub fn load_game(&self, save_name: &str) -> Result<Option<GameState>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let loaded = self.storage.load_game(save_name).map_err(Into::into)?;
        Ok(loaded.map(GameState::rehydrate))
    }

    /// Resume a stored game as a session driven by `narrator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    pub fn resume_session(
        &self,
        save_name: &str,
        narrator: Narrator,
    ) -> Result<Option<LifeSession>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        Ok(self
            .load_game(save_name)?
            .map(|state| LifeSession::from_state(state, narrator)))
    }

    /// List stored saves
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be listed.
    pub fn list_saves(&self) -> Result<Vec<String>, S::Error> {
        self.storage.list_saves()
    }

    /// Delete a stored save
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }

    /// Save and describe the result for a client.
    pub fn save_report(&self, save_name: &str, game_state: &GameState) -> StorageReport {
        match self.save_game(save_name, game_state) {
            Ok(()) => StorageReport::ok(format!("Game saved as {save_name}")),
            Err(err) => {
                log::warn!("saving {save_name} failed: {err}");
                StorageReport::failed(format!("Save failed: {err}"))
            }
        }
    }

    /// Load and describe the result for a client.
    pub fn load_report(&self, save_name: &str) -> (StorageReport, Option<GameState>)
    where
        S::Error: Into<anyhow::Error>,
    {
        match self.load_game(save_name) {
            Ok(Some(state)) => (
                StorageReport::ok(format!("Game loaded: {save_name}")),
                Some(state),
            ),
            Ok(None) => (
                StorageReport::failed(format!("Failed to load game: no save named {save_name}")),
                None,
            ),
            Err(err) => {
                log::warn!("loading {save_name} failed: {err:#}");
                (
                    StorageReport::failed(format!("Failed to load game: {err}")),
                    None,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<BTreeMap<String, GameState>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), game_state.clone());
            Ok(())
        }

        fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn list_saves(&self) -> Result<Vec<String>, Self::Error> {
            Ok(self.saves.borrow().keys().cloned().collect())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[test]
    fn engine_roundtrips_a_family_through_json() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut session = engine.create_session(0xABCD);
        let player = session.create_character(&CharacterSpec::default());
        session.with_state_mut(|state| {
            let spouse = state.registry.insert(Character::new("Lior Penn", Gender::Female, 27));
            state.registry.link_spouses(player, spouse);
            let child = state.registry.insert(Character::new("Ada Penn", Gender::Female, 0));
            state.registry.link_child(&[player, spouse], child);
            state.day = 40;
        });
        let state = session.into_state();
        let json = serde_json::to_string(&state).unwrap();
        let decoded: GameState = serde_json::from_str(&json).unwrap();
        engine.save_game("family", &decoded).unwrap();

        let loaded = engine.load_game("family").unwrap().unwrap();
        assert_eq!(loaded.day, 40);
        assert_eq!(loaded.registry.len(), 3);
        assert!(loaded.registry.spouse_links_symmetric());
        let child = loaded.registry.get(CharacterId(2)).unwrap();
        assert_eq!(child.parents, vec![player, CharacterId(1)]);
        assert_eq!(engine.list_saves().unwrap(), vec!["family".to_string()]);
    }

    #[test]
    fn reports_mirror_storage_results() {
        let engine = GameEngine::new(MemoryStorage::default());
        let report = engine.save_report("slot", &GameState::default());
        assert!(report.ok);
        assert_eq!(report.message, "Game saved as slot");
        let (report, state) = engine.load_report("missing");
        assert!(!report.ok);
        assert!(state.is_none());
        engine.delete_save("slot").unwrap();
        assert!(engine.list_saves().unwrap().is_empty());
    }

    #[test]
    fn resumed_sessions_keep_playing() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut session = engine.create_session(11);
        session.create_character(&CharacterSpec::default());
        session.advance_day();
        engine.save_game("auto", session.state()).unwrap();
        let mut resumed = engine
            .resume_session("auto", Narrator::offline(11))
            .unwrap()
            .unwrap();
        assert_eq!(resumed.state().day, 2);
        resumed.advance_day();
        assert_eq!(resumed.state().day, 3);
    }
}
