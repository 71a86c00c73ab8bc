use anyhow::{Context, Result, bail, ensure};
use kinfolk_game::{
    ActivityKind, ActivityParams, Character, CharacterSpec, EducationLevel, GameEngine, GameState,
    Gender, LifeSession, MentalState, Narrator,
};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::path::PathBuf;
use twox_hash::XxHash64;

use super::NarratorMode;
use crate::storage::FileStorage;

const SMOKE_DAYS: u32 = 7;
const PERSISTENCE_DAYS: u32 = 30;
const RESUMED_DAYS: u32 = 10;
const DETERMINISM_DAY_CAP: u32 = 120;
const ACTIVITIES_PER_DAY: usize = 3;

/// Rotating daily routine: wire name plus parameters.
const ROUTINE: &[(&str, &[(&str, &str)])] = &[
    ("work", &[]),
    ("study", &[("focus", "financial")]),
    ("exercise", &[]),
    ("socialize", &[]),
    ("date", &[]),
    ("investment", &[("type", "fund"), ("amount", "2000")]),
    ("marriage", &[]),
    ("job_hunting", &[]),
    ("mental_health", &[("type", "therapy")]),
    ("rest", &[]),
    ("charity", &[("type", "medical"), ("amount", "1000")]),
    ("start_business", &[("type", "tech")]),
    ("manage_business", &[("focus", "strategy")]),
    ("have_child", &[]),
    ("plastic_surgery", &[("type", "face")]),
];

#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub days: u32,
    pub narrator: NarratorMode,
    pub save_dir: PathBuf,
    pub verbose: bool,
}

impl ScenarioCtx {
    fn narrator(&self) -> Result<Narrator> {
        self.narrator.build(self.seed)
    }
}

/// What one scenario run observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub days_played: u32,
    pub activities_attempted: usize,
    pub activities_succeeded: usize,
    pub random_events: usize,
    pub events_logged: usize,
    pub family_size: usize,
    pub family_fortune: f64,
    pub narrator_failures: u64,
    pub fingerprint: Option<u64>,
}

impl RunSummary {
    fn absorb(&mut self, other: &Self) {
        self.days_played += other.days_played;
        self.activities_attempted += other.activities_attempted;
        self.activities_succeeded += other.activities_succeeded;
        self.random_events += other.random_events;
    }

    fn finish(mut self, session: &LifeSession) -> Self {
        let state = session.state();
        self.events_logged = state.events.len();
        self.family_size = state.registry.len();
        self.family_fortune = state.family_fortune;
        self.narrator_failures = session.narrator().failures();
        self
    }
}

type ScenarioRun = fn(&ScenarioCtx) -> Result<RunSummary>;

#[derive(Clone)]
pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    run: ScenarioRun,
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TestScenario {
    /// Execute one run.
    ///
    /// # Errors
    ///
    /// Returns the first broken expectation.
    pub fn run(&self, ctx: &ScenarioCtx) -> Result<RunSummary> {
        (self.run)(ctx)
    }
}

const CATALOG: &[TestScenario] = &[
    TestScenario {
        name: "smoke",
        description: "Create a character and play one week of routine activities",
        run: run_smoke,
    },
    TestScenario {
        name: "lifetime",
        description: "Play the routine for --days days, checking every invariant daily",
        run: run_lifetime,
    },
    TestScenario {
        name: "persistence",
        description: "Save to disk, reload, resume play and delete the slot",
        run: run_persistence,
    },
    TestScenario {
        name: "determinism",
        description: "Replay the same seed twice and compare snapshot fingerprints",
        run: run_determinism,
    },
    TestScenario {
        name: "activity-sweep",
        description: "Attempt every activity once; failures must leave the family untouched",
        run: run_activity_sweep,
    },
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.name, s.description)).collect()
}

#[must_use]
pub fn find_scenario(name: &str) -> Option<TestScenario> {
    let key = name.trim().to_ascii_lowercase().replace('_', "-");
    CATALOG.iter().find(|s| s.name == key).cloned()
}

#[must_use]
pub fn all_scenario_names() -> Vec<String> {
    CATALOG.iter().map(|s| s.name.to_string()).collect()
}

fn new_session(ctx: &ScenarioCtx, narrator: Narrator) -> LifeSession {
    let mut session = LifeSession::with_narrator(ctx.seed, narrator);
    session.create_character(&CharacterSpec {
        name: None,
        gender: if ctx.seed % 2 == 0 {
            Gender::Male
        } else {
            Gender::Female
        },
        age: 24,
        education: EducationLevel::Bachelor,
    });
    session
}

fn routine_params(pairs: &[(&str, &str)]) -> ActivityParams {
    pairs
        .iter()
        .fold(ActivityParams::new(), |params, (key, value)| {
            params.with(key, *value)
        })
}

fn play_days(session: &mut LifeSession, days: u32) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for _ in 0..days {
        let start = session.state().day as usize % ROUTINE.len();
        for offset in 0..ACTIVITIES_PER_DAY {
            let (name, pairs) = ROUTINE[(start + offset) % ROUTINE.len()];
            let outcome = session.perform(name, &routine_params(pairs));
            summary.activities_attempted += 1;
            if outcome.success {
                summary.activities_succeeded += 1;
            } else if outcome.reason.is_none() {
                bail!("day {}: {name} failed without a reason", session.state().day);
            }
            check_state(session.state())
                .with_context(|| format!("after {name} on day {}", session.state().day))?;
        }

        let before_day = session.state().day;
        let before_minds = mental_states(session.state());
        let report = session.advance_day();
        if report.random_event.is_some() {
            summary.random_events += 1;
        }
        check_tick(session.state(), before_day, &before_minds)?;
        check_state(session.state()).with_context(|| format!("after the tick of day {before_day}"))?;
        summary.days_played += 1;
    }
    Ok(summary)
}

fn mental_states(state: &GameState) -> Vec<MentalState> {
    state.registry.iter().map(|(_, c)| c.mental_state).collect()
}

fn check_tick(state: &GameState, before_day: u32, before_minds: &[MentalState]) -> Result<()> {
    ensure!(
        state.day == before_day + 1,
        "day advanced from {before_day} to {}",
        state.day
    );
    for (before, after) in before_minds.iter().zip(mental_states(state)) {
        ensure!(
            before.severity().abs_diff(after.severity()) <= 1,
            "mental state jumped from {before:?} to {after:?}"
        );
    }
    let living = state.living_assets();
    ensure!(
        (state.family_fortune - living).abs() < 1e-6,
        "family fortune {} does not match living assets {living}",
        state.family_fortune
    );
    Ok(())
}

fn check_state(state: &GameState) -> Result<()> {
    ensure!(
        state.registry.spouse_links_symmetric(),
        "spouse links are not symmetric"
    );
    for (id, character) in state.registry.iter() {
        check_character(character)?;
        for child in &character.children {
            let record = state
                .registry
                .get(*child)
                .with_context(|| format!("{} lists unknown child {child}", character.name))?;
            ensure!(
                record.parents.contains(&id),
                "{} is not a parent of {}",
                character.name,
                record.name
            );
        }
    }
    Ok(())
}

fn check_character(character: &Character) -> Result<()> {
    for (label, value) in [
        ("energy", character.energy),
        ("health", character.health),
        ("appearance", character.appearance),
        ("charm", character.charm),
        ("intelligence", character.intelligence),
        ("emotional intelligence", character.emotional_intelligence),
        ("financial intelligence", character.financial_intelligence),
        ("luck", character.luck),
        ("happiness", character.happiness),
        ("self esteem", character.self_esteem),
    ] {
        ensure!(
            (0.0..=100.0).contains(&value),
            "{} has {label} {value} out of range",
            character.name
        );
    }
    for (label, value) in [
        ("stress", character.stress_level),
        ("depression risk", character.depression_risk),
        ("anxiety risk", character.anxiety_risk),
        ("career prestige", character.career_prestige),
    ] {
        ensure!(value >= 0.0, "{} has negative {label} {value}", character.name);
    }
    for (domain, strength) in character.network.iter() {
        ensure!(
            (0.0..=100.0).contains(&strength),
            "{} has {domain:?} network strength {strength}",
            character.name
        );
    }
    Ok(())
}

fn fingerprint(session: &LifeSession) -> Result<u64> {
    let canonical = serde_json::to_string(&session.snapshot())?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(canonical.as_bytes());
    Ok(hasher.finish())
}

fn run_smoke(ctx: &ScenarioCtx) -> Result<RunSummary> {
    let mut session = new_session(ctx, ctx.narrator()?);
    ensure!(session.state().day == 1, "new games start on day 1");
    ensure!(
        !session.available_activities().is_empty(),
        "a new character has nothing to do"
    );
    let summary = play_days(&mut session, SMOKE_DAYS)?;
    ensure!(
        summary.activities_succeeded > 0,
        "no activity succeeded in a week"
    );
    Ok(RunSummary {
        seed: ctx.seed,
        ..summary
    }
    .finish(&session))
}

fn run_lifetime(ctx: &ScenarioCtx) -> Result<RunSummary> {
    let mut session = new_session(ctx, ctx.narrator()?);
    let start_age = session.state().player().map_or(0, |p| p.age);
    let summary = play_days(&mut session, ctx.days)?;
    let player = session.state().player().context("player vanished")?;
    let years = ctx.days / 365;
    ensure!(
        player.age >= start_age + years,
        "{} aged from {start_age} to {} over {} days",
        player.name,
        player.age,
        ctx.days
    );
    if ctx.verbose {
        log::info!(
            "seed {}: {} after {} days with fortune {:.0}",
            ctx.seed,
            player.name,
            summary.days_played,
            session.state().family_fortune
        );
    }
    Ok(RunSummary {
        seed: ctx.seed,
        ..summary
    }
    .finish(&session))
}

fn run_persistence(ctx: &ScenarioCtx) -> Result<RunSummary> {
    let engine = GameEngine::new(FileStorage::new(&ctx.save_dir));
    let save_name = format!("persistence-{}", ctx.seed);

    let mut session = new_session(ctx, ctx.narrator()?);
    let mut summary = play_days(&mut session, PERSISTENCE_DAYS)?;
    let report = engine.save_report(&save_name, session.state());
    ensure!(report.ok, "{}", report.message);
    ensure!(
        engine.list_saves()?.contains(&save_name),
        "{save_name} missing from the save list"
    );

    let mut resumed = engine
        .resume_session(&save_name, ctx.narrator()?)?
        .with_context(|| format!("{save_name} could not be found after saving"))?;
    let original = session.state();
    let loaded = resumed.state();
    ensure!(loaded.day == original.day, "day changed across the save");
    ensure!(
        loaded.registry.len() == original.registry.len(),
        "family size changed across the save"
    );
    ensure!(
        loaded.events.len() == original.events.len(),
        "event log changed across the save"
    );
    ensure!(
        loaded.family_traits == original.family_traits,
        "family traits changed across the save"
    );
    ensure!(
        loaded.player().map(|p| &p.name) == original.player().map(|p| &p.name),
        "player changed across the save"
    );

    let more = play_days(&mut resumed, RESUMED_DAYS)?;
    summary.absorb(&more);

    engine.delete_save(&save_name)?;
    ensure!(
        !engine.list_saves()?.contains(&save_name),
        "{save_name} still listed after deletion"
    );
    Ok(RunSummary {
        seed: ctx.seed,
        ..summary
    }
    .finish(&resumed))
}

fn run_determinism(ctx: &ScenarioCtx) -> Result<RunSummary> {
    let days = ctx.days.min(DETERMINISM_DAY_CAP);
    // Live text feeds sentiment detection, so replays are only exact offline.
    let mut first = new_session(ctx, Narrator::offline(ctx.seed));
    let summary = play_days(&mut first, days)?;
    let mut second = new_session(ctx, Narrator::offline(ctx.seed));
    play_days(&mut second, days)?;

    let expected = fingerprint(&first)?;
    let actual = fingerprint(&second)?;
    ensure!(
        expected == actual,
        "replay diverged: {expected:016x} vs {actual:016x}"
    );
    ensure!(
        first.rng_draws() == second.rng_draws(),
        "replay consumed {} draws instead of {}",
        second.rng_draws(),
        first.rng_draws()
    );
    Ok(RunSummary {
        seed: ctx.seed,
        fingerprint: Some(expected),
        ..summary
    }
    .finish(&first))
}

fn run_activity_sweep(ctx: &ScenarioCtx) -> Result<RunSummary> {
    let mut summary = RunSummary {
        seed: ctx.seed,
        ..RunSummary::default()
    };
    let mut session = new_session(ctx, ctx.narrator()?);
    for kind in ActivityKind::ALL {
        let before = session.state().registry.clone();
        let before_events = session.state().events.len();
        let outcome = session.perform(kind.as_str(), &ActivityParams::new());
        summary.activities_attempted += 1;
        if outcome.success {
            summary.activities_succeeded += 1;
            ensure!(
                !outcome.message.trim().is_empty(),
                "{kind} succeeded without a message"
            );
            ensure!(
                session.state().events.len() > before_events,
                "{kind} succeeded without a journal entry"
            );
        } else {
            ensure!(outcome.reason.is_some(), "{kind} failed without a reason");
            ensure!(
                session.state().registry == before,
                "{kind} failed but changed the family"
            );
        }
        check_state(session.state()).with_context(|| format!("after {kind}"))?;
    }

    let unknown = session.perform("time_travel", &ActivityParams::new());
    ensure!(!unknown.success, "unknown activity reported success");
    summary.activities_attempted += 1;
    Ok(summary.finish(&session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(seed: u64, days: u32) -> ScenarioCtx {
        ScenarioCtx {
            seed,
            days,
            narrator: NarratorMode::Offline,
            save_dir: std::env::temp_dir().join(format!("kinfolk-scenarios-{}", std::process::id())),
            verbose: false,
        }
    }

    #[test]
    fn catalog_names_are_unique_and_findable() {
        let names = all_scenario_names();
        for name in &names {
            assert!(find_scenario(name).is_some());
        }
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
        assert!(find_scenario("Activity_Sweep").is_some());
        assert!(find_scenario("missing").is_none());
    }

    #[test]
    fn smoke_plays_a_week() {
        let summary = find_scenario("smoke").unwrap().run(&ctx(1337, 0)).unwrap();
        assert_eq!(summary.days_played, SMOKE_DAYS);
        assert_eq!(
            summary.activities_attempted,
            SMOKE_DAYS as usize * ACTIVITIES_PER_DAY
        );
        assert_eq!(summary.narrator_failures, 0);
    }

    #[test]
    fn determinism_reports_a_fingerprint() {
        let summary = find_scenario("determinism")
            .unwrap()
            .run(&ctx(21, 30))
            .unwrap();
        assert!(summary.fingerprint.is_some());
        assert_eq!(summary.days_played, 30);
    }

    #[test]
    fn persistence_cleans_up_its_slot() {
        let ctx = ctx(77, 0);
        let summary = find_scenario("persistence").unwrap().run(&ctx).unwrap();
        assert_eq!(summary.days_played, PERSISTENCE_DAYS + RESUMED_DAYS);
        let storage = FileStorage::new(&ctx.save_dir);
        assert!(
            !kinfolk_game::GameStorage::list_saves(&storage)
                .unwrap()
                .contains(&"persistence-77".to_string())
        );
    }

    #[test]
    fn sweep_attempts_every_activity() {
        let summary = find_scenario("activity-sweep")
            .unwrap()
            .run(&ctx(5, 0))
            .unwrap();
        assert_eq!(summary.activities_attempted, ActivityKind::ALL.len() + 1);
        assert!(summary.activities_succeeded >= 1);
    }
}
