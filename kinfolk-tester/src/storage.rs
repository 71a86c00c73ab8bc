//! JSON-file save slots for the engine's `GameStorage` seam.

use chrono::{DateTime, Utc};
use kinfolk_game::{GameState, GameStorage};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const SAVE_FORMAT_VERSION: u32 = 1;
const SAVE_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid save name '{0}': use 1-64 letters, digits, '-' or '_'")]
    InvalidName(String),
    #[error("save format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveEnvelope {
    version: u32,
    saved_at: DateTime<Utc>,
    state: GameState,
}

/// One `<name>.json` file per save under `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, save_name: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_save_name(save_name) {
            return Err(StorageError::InvalidName(save_name.to_string()));
        }
        Ok(self.root.join(format!("{save_name}.{SAVE_EXTENSION}")))
    }
}

fn is_valid_save_name(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
}

impl GameStorage for FileStorage {
    type Error = StorageError;

    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error> {
        let path = self.slot_path(save_name)?;
        fs::create_dir_all(&self.root)?;
        let envelope = SaveEnvelope {
            version: SAVE_FORMAT_VERSION,
            saved_at: Utc::now(),
            state: game_state.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &path)?;
        log::debug!("wrote save {}", path.display());
        Ok(())
    }

    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error> {
        let path = self.slot_path(save_name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let envelope: SaveEnvelope = serde_json::from_str(&raw)?;
        if envelope.version > SAVE_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: envelope.version,
                supported: SAVE_FORMAT_VERSION,
            });
        }
        log::debug!("loaded save {} from {}", save_name, envelope.saved_at);
        Ok(Some(envelope.state))
    }

    fn list_saves(&self) -> Result<Vec<String>, Self::Error> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && is_valid_save_name(stem)
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(save_name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinfolk_game::{CharacterSpec, GameEngine, LifeSession};

    fn temp_root(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "kinfolk-storage-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn rejects_names_that_escape_the_directory() {
        let storage = FileStorage::new(temp_root("names"));
        let state = GameState::default();
        for name in ["../escape", "", "with space", "a/b"] {
            assert!(matches!(
                storage.save_game(name, &state),
                Err(StorageError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn saves_list_sorted_and_delete_cleanly() {
        let root = temp_root("list");
        let storage = FileStorage::new(&root);
        assert!(storage.list_saves().unwrap().is_empty());

        let state = GameState::default();
        storage.save_game("zeta", &state).unwrap();
        storage.save_game("alpha", &state).unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();
        assert_eq!(storage.list_saves().unwrap(), vec!["alpha", "zeta"]);

        storage.delete_save("alpha").unwrap();
        storage.delete_save("alpha").unwrap();
        assert_eq!(storage.list_saves().unwrap(), vec!["zeta"]);
        assert!(storage.load_game("alpha").unwrap().is_none());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn engine_round_trips_a_played_session() {
        let root = temp_root("engine");
        let engine = GameEngine::new(FileStorage::new(&root));
        let mut session = LifeSession::new(404);
        session.create_character(&CharacterSpec::default());
        for _ in 0..5 {
            session.perform("work", &kinfolk_game::ActivityParams::new());
            session.advance_day();
        }
        let report = engine.save_report("slot_1", session.state());
        assert!(report.ok, "{}", report.message);

        let (report, loaded) = engine.load_report("slot_1");
        assert!(report.ok, "{}", report.message);
        let loaded = loaded.unwrap();
        assert_eq!(loaded.day, session.state().day);
        assert_eq!(loaded.events.len(), session.state().events.len());
        assert_eq!(
            loaded.player().map(|p| p.name.clone()),
            session.state().player().map(|p| p.name.clone())
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn newer_format_versions_are_refused() {
        let root = temp_root("version");
        let storage = FileStorage::new(&root);
        storage.save_game("future", &GameState::default()).unwrap();
        let path = root.join("future.json");
        let mut raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        raw["version"] = serde_json::json!(SAVE_FORMAT_VERSION + 1);
        fs::write(&path, raw.to_string()).unwrap();
        assert!(matches!(
            storage.load_game("future"),
            Err(StorageError::UnsupportedVersion { .. })
        ));
        let _ = fs::remove_dir_all(root);
    }
}
