//! Activity resolution.
//!
//! Every activity runs against a working copy of the acting character. The copy
//! is committed back to the registry only when the activity succeeds, so a
//! failed precondition never leaves a partial mutation behind. Narration is
//! journaled while the activity runs and appended to the event log afterwards.

mod business;
mod career;
mod finance;
mod romance;
mod routine;
mod study;
mod wellness;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::achievements::AchievementId;
use crate::attributes;
use crate::character::Character;
use crate::family::CharacterId;
use crate::narrative::{NarrativeRequest, Narrator};
use crate::rng::{chance, roll, uniform};
use crate::state::GameState;

pub use romance::generate_candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Rest,
    Work,
    Exercise,
    Study,
    JobHunting,
    Socialize,
    Investment,
    StartBusiness,
    ManageBusiness,
    Date,
    Marriage,
    HaveChild,
    PlasticSurgery,
    MentalHealth,
    Charity,
}

impl ActivityKind {
    pub const ALL: [Self; 15] = [
        Self::Rest,
        Self::Work,
        Self::Exercise,
        Self::Study,
        Self::JobHunting,
        Self::Socialize,
        Self::Investment,
        Self::StartBusiness,
        Self::ManageBusiness,
        Self::Date,
        Self::Marriage,
        Self::HaveChild,
        Self::PlasticSurgery,
        Self::MentalHealth,
        Self::Charity,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Work => "work",
            Self::Exercise => "exercise",
            Self::Study => "study",
            Self::JobHunting => "job_hunting",
            Self::Socialize => "socialize",
            Self::Investment => "investment",
            Self::StartBusiness => "start_business",
            Self::ManageBusiness => "manage_business",
            Self::Date => "date",
            Self::Marriage => "marriage",
            Self::HaveChild => "have_child",
            Self::PlasticSurgery => "plastic_surgery",
            Self::MentalHealth => "mental_health",
            Self::Charity => "charity",
        }
    }

    #[must_use]
    pub const fn category(self) -> ActivityCategory {
        match self {
            Self::Rest | Self::Exercise | Self::PlasticSurgery => ActivityCategory::Basics,
            Self::Work | Self::Study | Self::JobHunting => ActivityCategory::WorkAndStudy,
            Self::Socialize
            | Self::Date
            | Self::Marriage
            | Self::HaveChild
            | Self::MentalHealth => ActivityCategory::Relationships,
            Self::Investment | Self::StartBusiness | Self::ManageBusiness | Self::Charity => {
                ActivityCategory::Wealth
            }
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "work" => Ok(Self::Work),
            "exercise" => Ok(Self::Exercise),
            "study" => Ok(Self::Study),
            "job_hunting" | "job_hunt" => Ok(Self::JobHunting),
            "socialize" | "socialise" => Ok(Self::Socialize),
            "investment" | "invest" => Ok(Self::Investment),
            "start_business" => Ok(Self::StartBusiness),
            "manage_business" => Ok(Self::ManageBusiness),
            "date" => Ok(Self::Date),
            "marriage" | "propose" => Ok(Self::Marriage),
            "have_child" => Ok(Self::HaveChild),
            "plastic_surgery" | "cosmetic_surgery" => Ok(Self::PlasticSurgery),
            "mental_health" => Ok(Self::MentalHealth),
            "charity" => Ok(Self::Charity),
            _ => Err(()),
        }
    }
}

/// Menu grouping used by [`available_activities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Basics,
    WorkAndStudy,
    Relationships,
    Wealth,
}

/// Activities whose entry conditions `character` currently meets, grouped for menus.
#[must_use]
pub fn available_activities(character: &Character) -> BTreeMap<ActivityCategory, Vec<ActivityKind>> {
    let mut menu: BTreeMap<ActivityCategory, Vec<ActivityKind>> = BTreeMap::new();
    for kind in ActivityKind::ALL {
        if is_available(character, kind) {
            menu.entry(kind.category()).or_default().push(kind);
        }
    }
    menu
}

fn is_available(character: &Character, kind: ActivityKind) -> bool {
    use crate::character::RelationshipStatus::{Dating, Married};
    match kind {
        ActivityKind::Work => character.is_employed(),
        ActivityKind::Investment | ActivityKind::Charity => character.assets >= 1_000.0,
        ActivityKind::StartBusiness => !character.has_business() && character.assets >= 50_000.0,
        ActivityKind::ManageBusiness => character.has_business(),
        ActivityKind::Marriage => matches!(character.relationship_status, Dating | Married),
        ActivityKind::HaveChild => character.spouse.is_some(),
        ActivityKind::PlasticSurgery => character.assets >= 20_000.0,
        _ => true,
    }
}

/// Loose parameter bag as received from the request surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityParams(BTreeMap<String, Value>);

impl ActivityParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Finite numeric parameter; numeric strings are accepted.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        let value: f64 = match self.0.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Parse a textual parameter, falling back to `default` when absent or unknown.
    #[must_use]
    pub fn choice<T: FromStr>(&self, key: &str, default: T) -> T {
        self.text(key)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }
}

impl From<BTreeMap<String, Value>> for ActivityParams {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Why an activity could not go ahead.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("not enough energy (need {required:.0}, have {available:.0})")]
    InsufficientEnergy { required: f64, available: f64 },
    #[error("not enough money (need {required:.0}, have {available:.0})")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("amount is below the minimum of {minimum:.0}")]
    AmountTooLow { minimum: f64 },
    #[error("no job")]
    Unemployed,
    #[error("no business to manage")]
    NoBusiness,
    #[error("already owns a business")]
    AlreadyOwnsBusiness,
    #[error("no suitable partner")]
    NoPartner,
    #[error("no spouse")]
    NoSpouse,
    #[error("same-gender couples cannot conceive naturally; adoption is not supported")]
    NoNaturalConception,
    #[error("mother's age {age} is outside the fertile range")]
    FertilityAgeOutOfRange { age: u32 },
    #[error("unknown activity type: {name}")]
    UnknownActivity { name: String },
    #[error("character is unavailable")]
    CharacterUnavailable,
}

/// Structured activity result. Field names inside `fields` are part of the
/// per-activity contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Outcome {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            reason: None,
            fields: BTreeMap::new(),
        }
    }

    /// Failure outcome carrying the context fields a client needs to explain it.
    #[must_use]
    pub fn failed(reason: FailureReason) -> Self {
        let mut outcome = Self {
            success: false,
            message: reason.to_string(),
            reason: None,
            fields: BTreeMap::new(),
        };
        match &reason {
            FailureReason::InsufficientEnergy { required, .. } => {
                outcome.set("required_energy", *required);
            }
            FailureReason::InsufficientFunds {
                required,
                available,
            } => {
                outcome.set("required_assets", *required);
                outcome.set("available_assets", *available);
            }
            FailureReason::AmountTooLow { minimum } => outcome.set("minimum_amount", *minimum),
            FailureReason::FertilityAgeOutOfRange { age } => outcome.set("female_age", *age),
            _ => {}
        }
        outcome.reason = Some(reason);
        outcome
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }
}

type Resolution = Result<Outcome, FailureReason>;

/// Everything an activity may touch while it runs.
pub(crate) struct ActivityCtx<'a, R: Rng + ?Sized> {
    pub state: &'a mut GameState,
    pub actor_id: CharacterId,
    /// Working copy, committed on success.
    pub actor: Character,
    pub rng: &'a mut R,
    pub narrator: &'a mut Narrator,
    journal: Vec<String>,
    pending_achievements: Vec<(AchievementId, f64)>,
    pending_spouse: Option<CharacterId>,
}

impl<R: Rng + ?Sized> ActivityCtx<'_, R> {
    pub fn roll(&mut self, low: i32, high: i32) -> f64 {
        roll(&mut *self.rng, low, high)
    }

    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        uniform(&mut *self.rng, low, high)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        chance(&mut *self.rng, probability)
    }

    /// Unit draw used to decide success branches.
    pub fn draw(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.journal.push(text.into());
    }

    /// Narrate through the collaborator and journal the result.
    pub fn narrate(&mut self, request: &NarrativeRequest) -> String {
        let text = self.narrator.tell(request);
        self.journal.push(text.clone());
        text
    }

    /// Draw an energy cost in `low..=high` and pay it, or fail without paying.
    pub fn spend_energy(&mut self, low: i32, high: i32) -> Result<f64, FailureReason> {
        let cost = self.roll(low, high);
        self.spend_fixed_energy(cost)
    }

    pub fn spend_fixed_energy(&mut self, cost: f64) -> Result<f64, FailureReason> {
        if self.actor.energy < cost {
            return Err(FailureReason::InsufficientEnergy {
                required: cost,
                available: self.actor.energy,
            });
        }
        self.actor.energy -= cost;
        Ok(cost)
    }

    /// Queue achievement progress; applied after the actor is committed.
    pub fn achieve(&mut self, id: AchievementId, delta: f64) {
        self.pending_achievements.push((id, delta));
    }

    /// Marry the actor to `spouse` once the actor is committed.
    pub fn wed(&mut self, spouse: CharacterId) {
        self.pending_spouse = Some(spouse);
    }

    fn flush_journal(&mut self) {
        for text in self.journal.drain(..) {
            self.state.log(text, "activity");
        }
    }
}

/// Resolve one activity for `actor`.
pub fn resolve<R: Rng + ?Sized>(
    state: &mut GameState,
    actor: CharacterId,
    kind: ActivityKind,
    params: &ActivityParams,
    rng: &mut R,
    narrator: &mut Narrator,
) -> Outcome {
    let Some(character) = state.registry.get(actor).filter(|c| c.alive).cloned() else {
        log::warn!("activity {kind} requested for unavailable character {actor}");
        return Outcome::failed(FailureReason::CharacterUnavailable);
    };
    let mut ctx = ActivityCtx {
        state,
        actor_id: actor,
        actor: character,
        rng,
        narrator,
        journal: Vec::new(),
        pending_achievements: Vec::new(),
        pending_spouse: None,
    };

    let resolution = match kind {
        ActivityKind::Rest => routine::rest(&mut ctx),
        ActivityKind::Work => routine::work(&mut ctx),
        ActivityKind::Exercise => routine::exercise(&mut ctx),
        ActivityKind::Study => study::study(&mut ctx, params),
        ActivityKind::JobHunting => career::job_hunting(&mut ctx),
        ActivityKind::Socialize => career::socialize(&mut ctx),
        ActivityKind::Investment => finance::investment(&mut ctx, params),
        ActivityKind::Charity => finance::charity(&mut ctx, params),
        ActivityKind::StartBusiness => business::start_business(&mut ctx, params),
        ActivityKind::ManageBusiness => business::manage_business(&mut ctx, params),
        ActivityKind::Date => romance::date(&mut ctx),
        ActivityKind::Marriage => romance::marriage(&mut ctx),
        ActivityKind::HaveChild => romance::have_child(&mut ctx),
        ActivityKind::PlasticSurgery => wellness::plastic_surgery(&mut ctx, params),
        ActivityKind::MentalHealth => wellness::mental_health(&mut ctx, params),
    };

    match resolution {
        Ok(outcome) => {
            commit(&mut ctx);
            ctx.flush_journal();
            log::debug!("{kind} by {actor}: {}", outcome.message);
            outcome
        }
        Err(reason) => {
            let name = ctx.actor.name.clone();
            ctx.note(format!("{name} could not {}: {reason}.", kind.as_str().replace('_', " ")));
            ctx.flush_journal();
            log::debug!("{kind} by {actor} failed: {reason}");
            Outcome::failed(reason)
        }
    }
}

/// Resolve an activity by its wire name. Unknown names fail without mutation.
pub fn resolve_named<R: Rng + ?Sized>(
    state: &mut GameState,
    actor: CharacterId,
    name: &str,
    params: &ActivityParams,
    rng: &mut R,
    narrator: &mut Narrator,
) -> Outcome {
    match name.parse::<ActivityKind>() {
        Ok(kind) => resolve(state, actor, kind, params, rng, narrator),
        Err(()) => {
            log::warn!("unknown activity type requested: {name}");
            Outcome::failed(FailureReason::UnknownActivity {
                name: name.to_string(),
            })
        }
    }
}

fn commit<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) {
    attributes::normalize(&mut ctx.actor);
    attributes::recompute_appearance(&mut ctx.actor);
    if let Some(slot) = ctx.state.registry.get_mut(ctx.actor_id) {
        *slot = ctx.actor.clone();
    }
    if let Some(spouse) = ctx.pending_spouse.take()
        && !ctx.state.registry.link_spouses(ctx.actor_id, spouse)
    {
        log::warn!("could not link {} and {spouse} as spouses", ctx.actor_id);
    }
    for (_, member) in ctx.state.registry.iter_mut() {
        attributes::normalize(member);
    }
    for (id, delta) in std::mem::take(&mut ctx.pending_achievements) {
        ctx.state.update_achievement(id, delta);
    }
}
