//! Narrated random events for the player.
//!
//! A category is drawn from weights that lean toward the player's circumstances,
//! the narrator supplies the text, and a keyword scan of that text decides
//! whether the event helped or hurt. Effects stay small on purpose; the event
//! text is flavour, not a balance lever.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attributes::{self, clamp_event_stat, floor_zero};
use crate::character::{Character, MentalState, NetworkDomain, RelationshipStatus};
use crate::narrative::{NarrativeRequest, Narrator};
use crate::rng::{chance, pick_weighted, roll, uniform};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Daily,
    Career,
    Health,
    Social,
    Economic,
    Family,
    Psychological,
    Interpersonal,
    Learning,
    Special,
}

impl EventCategory {
    pub const ALL: [Self; 10] = [
        Self::Daily,
        Self::Career,
        Self::Health,
        Self::Social,
        Self::Economic,
        Self::Family,
        Self::Psychological,
        Self::Interpersonal,
        Self::Learning,
        Self::Special,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Career => "career",
            Self::Health => "health",
            Self::Social => "social",
            Self::Economic => "economic",
            Self::Family => "family",
            Self::Psychological => "psychological",
            Self::Interpersonal => "interpersonal",
            Self::Learning => "learning",
            Self::Special => "special",
        }
    }

    const fn base_weight(self) -> f64 {
        match self {
            Self::Daily => 30.0,
            Self::Career => 20.0,
            Self::Health | Self::Social | Self::Economic => 10.0,
            Self::Family | Self::Psychological | Self::Interpersonal => 5.0,
            Self::Learning => 3.0,
            Self::Special => 2.0,
        }
    }

    /// Narrative topic key.
    #[must_use]
    pub fn topic(self) -> String {
        format!("random_event.{}", self.as_str())
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

const POSITIVE_WORDS: &[&str] = &[
    "success", "gain", "lucky", "luck", "improve", "reward", "happy", "glad", "pleased", "won",
    "praise", "benefit",
];
const NEGATIVE_WORDS: &[&str] = &[
    "fail", "loss", "lost", "unlucky", "sad", "upset", "mistake", "sick", "frustrat", "anxious",
    "painful", "lonely", "worse",
];
const HEALTH_WORDS: &[&str] = &[
    "health", "sick", "injur", "virus", "illness", "hospital", "medicine", "treatment", "recover",
    "workout",
];
const MONEY_WORDS: &[&str] = &[
    "money", "wealth", "income", "expense", "spend", "bought", "sold", "savings", "invest",
    "lottery", "prize", "refund",
];
const SOCIAL_WORDS: &[&str] = &[
    "friend", "colleague", "party", "dinner", "social", "acquaint", "club",
];
const WORK_WORDS: &[&str] = &[
    "work", "office", "promotion", "raise", "review", "project", "boss", "performance",
];
const ROMANCE_WORDS: &[&str] = &[
    "love", "date", "dating", "romance", "marriage", "wedding", "divorce", "quarrel",
];

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text.contains(word))
}

/// Keyword sentiment of an event text. A negative keyword outweighs any positive one.
#[must_use]
pub fn detect_sentiment(text: &str) -> Sentiment {
    let text = text.to_lowercase();
    if mentions(&text, NEGATIVE_WORDS) {
        Sentiment::Negative
    } else if mentions(&text, POSITIVE_WORDS) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

/// Category weights for `character`, boosted by their circumstances.
#[must_use]
pub fn category_weights(character: &Character) -> Vec<(EventCategory, f64)> {
    let mut weights: Vec<(EventCategory, f64)> = EventCategory::ALL
        .iter()
        .map(|category| (*category, category.base_weight()))
        .collect();
    let mut boost = |target: EventCategory, amount: f64| {
        if let Some(entry) = weights.iter_mut().find(|(category, _)| *category == target) {
            entry.1 += amount;
        }
    };
    if character.mental_state != MentalState::Normal {
        boost(EventCategory::Psychological, 15.0);
    }
    if character.health < 60.0 {
        boost(EventCategory::Health, 15.0);
    }
    if character.is_employed() {
        boost(EventCategory::Career, 10.0);
    }
    if matches!(
        character.relationship_status,
        RelationshipStatus::Dating | RelationshipStatus::Married
    ) {
        boost(EventCategory::Family, 10.0);
    }
    if character.assets > 100_000.0 {
        boost(EventCategory::Economic, 10.0);
    }
    for (domain, strength) in character.network.iter() {
        if strength <= 50.0 {
            continue;
        }
        match domain {
            NetworkDomain::Business => boost(EventCategory::Economic, 5.0),
            NetworkDomain::Academic => boost(EventCategory::Learning, 5.0),
            NetworkDomain::Entertainment | NetworkDomain::Political => {
                boost(EventCategory::Interpersonal, 5.0);
            }
            NetworkDomain::Medical => {}
        }
    }
    weights
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub category: EventCategory,
    pub sentiment: Sentiment,
    pub text: String,
}

/// Draw, narrate and apply one random event for the player.
pub fn strike<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    narrator: &mut Narrator,
) -> Option<RandomEvent> {
    let player = state.player()?.clone();
    let weights = category_weights(&player);
    let category = *pick_weighted(&weights, rng)?;

    let request = NarrativeRequest::new(
        category.topic(),
        format!(
            "Generate a short {category} random event (under 50 words) for this character that may nudge their attributes slightly."
        ),
    )
    .var("name", player.name.as_str())
    .var("gender", player.gender.as_str())
    .var("age", player.age)
    .var("health", player.health)
    .var("job", player.job.as_str())
    .var("assets", player.assets)
    .var("relationship_status", player.relationship_status.as_str())
    .var("mental_state", player.mental_state.as_str())
    .var("happiness", player.happiness)
    .var("family_fortune", state.family_fortune)
    .var("family_prestige", state.family_prestige);
    let text = narrator.tell(&request);

    let sentiment = state
        .player_mut()
        .map_or(Sentiment::Neutral, |character| {
            apply_effects(character, category, &text, rng)
        });
    state.log(text.clone(), "random_event");
    log::debug!("random {category} event ({sentiment:?})");
    Some(RandomEvent {
        category,
        sentiment,
        text,
    })
}

fn nudge_stat(value: &mut f64, delta: f64) {
    *value = clamp_event_stat(*value + delta);
}

fn nudge_floor(value: &mut f64, delta: f64) {
    *value = floor_zero(*value + delta);
}

/// Apply the category/sentiment nudge and any keyword extras. Returns the sentiment used.
pub fn apply_effects<R: Rng + ?Sized>(
    character: &mut Character,
    category: EventCategory,
    text: &str,
    rng: &mut R,
) -> Sentiment {
    let sentiment = detect_sentiment(text);
    let intensity = roll(rng, 1, 5);
    let c = &mut *character;
    match (category, sentiment) {
        (EventCategory::Daily, Sentiment::Positive) => nudge_stat(&mut c.happiness, intensity),
        (EventCategory::Daily, Sentiment::Negative) => nudge_stat(&mut c.happiness, -intensity),
        (EventCategory::Daily, Sentiment::Neutral) => {}
        (EventCategory::Career, Sentiment::Positive) => {
            c.career_prestige += intensity;
            nudge_floor(&mut c.assets, 100.0 * intensity);
        }
        (EventCategory::Career, Sentiment::Negative) => {
            nudge_floor(&mut c.career_prestige, -intensity);
            nudge_floor(&mut c.stress_level, 2.0 * intensity);
        }
        (EventCategory::Career, Sentiment::Neutral) => c.career_prestige += 0.5 * intensity,
        (EventCategory::Health, Sentiment::Positive) => nudge_stat(&mut c.health, intensity),
        (EventCategory::Health, Sentiment::Negative) => nudge_stat(&mut c.health, -2.0 * intensity),
        (EventCategory::Health, Sentiment::Neutral) => nudge_stat(&mut c.health, 0.5 * intensity),
        (EventCategory::Social, Sentiment::Positive) => {
            c.personal_connections += intensity;
            nudge_stat(&mut c.happiness, 2.0 * intensity);
        }
        (EventCategory::Social, Sentiment::Negative) => {
            nudge_floor(&mut c.personal_connections, -intensity);
            nudge_stat(&mut c.happiness, -intensity);
        }
        (EventCategory::Social, Sentiment::Neutral) => c.personal_connections += 0.5 * intensity,
        (EventCategory::Economic, Sentiment::Positive) => {
            nudge_floor(&mut c.assets, 500.0 * intensity);
            nudge_stat(&mut c.financial_intelligence, 0.5 * intensity);
        }
        (EventCategory::Economic, Sentiment::Negative) => {
            nudge_floor(&mut c.assets, -300.0 * intensity);
            nudge_floor(&mut c.stress_level, 2.0 * intensity);
        }
        (EventCategory::Economic, Sentiment::Neutral) => {
            nudge_stat(&mut c.financial_intelligence, 0.3 * intensity);
        }
        (EventCategory::Family, Sentiment::Positive) => nudge_stat(&mut c.happiness, 3.0 * intensity),
        (EventCategory::Family, Sentiment::Negative) => {
            nudge_stat(&mut c.happiness, -2.0 * intensity);
            nudge_floor(&mut c.stress_level, 3.0 * intensity);
        }
        (EventCategory::Family, Sentiment::Neutral) => nudge_stat(&mut c.happiness, intensity),
        (EventCategory::Psychological, Sentiment::Positive) => {
            nudge_stat(&mut c.happiness, 2.0 * intensity);
            nudge_floor(&mut c.stress_level, -3.0 * intensity);
        }
        (EventCategory::Psychological, Sentiment::Negative) => {
            nudge_stat(&mut c.happiness, -2.0 * intensity);
            nudge_floor(&mut c.stress_level, 4.0 * intensity);
            nudge_floor(&mut c.depression_risk, 2.0 * intensity);
        }
        (EventCategory::Psychological, Sentiment::Neutral) => {
            nudge_stat(&mut c.self_esteem, intensity);
        }
        (EventCategory::Interpersonal, Sentiment::Positive) => {
            nudge_stat(&mut c.charm, 0.5 * intensity);
            c.personal_connections += 2.0 * intensity;
        }
        (EventCategory::Interpersonal, Sentiment::Negative) => {
            nudge_stat(&mut c.charm, -0.5 * intensity);
            nudge_floor(&mut c.personal_connections, -intensity);
        }
        (EventCategory::Interpersonal, Sentiment::Neutral) => {
            nudge_stat(&mut c.emotional_intelligence, 0.3 * intensity);
        }
        (EventCategory::Learning, Sentiment::Positive) => {
            nudge_stat(&mut c.intelligence, 0.5 * intensity);
            nudge_stat(&mut c.emotional_intelligence, 0.3 * intensity);
        }
        (EventCategory::Learning, Sentiment::Negative) => {
            nudge_floor(&mut c.stress_level, 2.0 * intensity);
        }
        (EventCategory::Learning, Sentiment::Neutral) => nudge_stat(&mut c.intelligence, 0.2 * intensity),
        (EventCategory::Special, Sentiment::Positive) => {
            nudge_stat(&mut c.luck, 2.0 * intensity);
            nudge_floor(&mut c.assets, 1_000.0 * intensity);
        }
        (EventCategory::Special, Sentiment::Negative) => {
            nudge_stat(&mut c.luck, -2.0 * intensity);
            nudge_floor(&mut c.assets, -500.0 * intensity);
        }
        (EventCategory::Special, Sentiment::Neutral) => nudge_stat(&mut c.luck, intensity),
    }
    apply_keyword_extras(c, sentiment, &text.to_lowercase(), rng);
    attributes::normalize(c);
    sentiment
}

fn apply_keyword_extras<R: Rng + ?Sized>(
    c: &mut Character,
    sentiment: Sentiment,
    text: &str,
    rng: &mut R,
) {
    if sentiment == Sentiment::Neutral {
        return;
    }
    let positive = sentiment == Sentiment::Positive;
    if mentions(text, HEALTH_WORDS) {
        if positive {
            nudge_stat(&mut c.health, roll(rng, 1, 3));
        } else {
            nudge_stat(&mut c.health, -roll(rng, 1, 5));
        }
    }
    if mentions(text, MONEY_WORDS) {
        let acumen = c.financial_intelligence.max(1.0);
        if positive {
            nudge_floor(&mut c.assets, roll(rng, 200, 1_000) * acumen / 50.0);
        } else {
            nudge_floor(&mut c.assets, -roll(rng, 100, 500) * 100.0 / acumen);
        }
    }
    if positive && mentions(text, SOCIAL_WORDS) {
        c.personal_connections += roll(rng, 1, 3);
        if let Some(domain) = NetworkDomain::ALL.choose(rng).copied() {
            c.network.add(domain, roll(rng, 1, 3));
        }
    }
    if positive && mentions(text, WORK_WORDS) {
        c.career_prestige += roll(rng, 1, 3);
        if chance(rng, 0.2) {
            c.salary += c.salary * uniform(rng, 0.03, 0.1);
        }
    }
    if mentions(text, ROMANCE_WORDS) {
        let attached = c.spouse.is_some()
            && matches!(
                c.relationship_status,
                RelationshipStatus::Dating | RelationshipStatus::Married
            );
        if positive {
            nudge_stat(&mut c.happiness, roll(rng, 2, 5));
            if attached {
                c.relationship_satisfaction += roll(rng, 3, 8);
            }
        } else {
            nudge_stat(&mut c.happiness, -roll(rng, 2, 5));
            if attached {
                c.relationship_satisfaction -= roll(rng, 3, 8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Gender;
    use rand::rngs::mock::StepRng;

    #[test]
    fn negative_keywords_win() {
        assert_eq!(detect_sentiment("A lucky find!"), Sentiment::Positive);
        assert_eq!(
            detect_sentiment("An unlucky day, though the lunch was a success."),
            Sentiment::Negative
        );
        assert_eq!(detect_sentiment("Nothing much happened."), Sentiment::Neutral);
    }

    #[test]
    fn circumstances_shift_weights() {
        let mut character = Character::new("Oren Hale", Gender::Male, 40);
        let base = category_weights(&character);
        assert_eq!(base.iter().map(|(_, w)| w).sum::<f64>(), 100.0);
        character.mental_state = MentalState::Anxious;
        character.health = 50.0;
        character.network.add(NetworkDomain::Academic, 60.0);
        let boosted = category_weights(&character);
        let weight_of = |pool: &[(EventCategory, f64)], target| {
            pool.iter().find(|(c, _)| *c == target).map_or(0.0, |(_, w)| *w)
        };
        assert!((weight_of(&boosted, EventCategory::Psychological) - 20.0).abs() < 1e-9);
        assert!((weight_of(&boosted, EventCategory::Health) - 25.0).abs() < 1e-9);
        assert!((weight_of(&boosted, EventCategory::Learning) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn losses_never_drive_assets_negative() {
        let mut character = Character::new("Oren Hale", Gender::Male, 40);
        character.assets = 50.0;
        let mut rng = StepRng::new(0, 0);
        let sentiment = apply_effects(
            &mut character,
            EventCategory::Special,
            "Oren lost a wallet and the savings with it; a painful loss of money.",
            &mut rng,
        );
        assert_eq!(sentiment, Sentiment::Negative);
        assert!(character.assets.abs() < f64::EPSILON);
        assert!(character.luck >= 1.0);
    }

    #[test]
    fn small_stats_bottom_out_at_one() {
        let mut character = Character::new("Oren Hale", Gender::Male, 40);
        character.health = 1.5;
        let mut rng = StepRng::new(0, 0);
        apply_effects(&mut character, EventCategory::Health, "Oren was sick with a virus.", &mut rng);
        assert!((character.health - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strike_logs_for_the_player() {
        let mut state = GameState::default();
        let id = state.registry.insert(Character::new("Oren Hale", Gender::Male, 40));
        state.player = Some(id);
        let mut narrator = Narrator::offline(5);
        let mut rng = StepRng::new(0, 0);
        let event = strike(&mut state, &mut rng, &mut narrator);
        assert_eq!(event.as_ref().map(|e| e.category), Some(EventCategory::Daily));
        assert_eq!(state.events.len(), 1);
        assert!(state.events.iter().all(|entry| entry.text.contains("Oren Hale")));
    }

    #[test]
    fn no_player_no_event() {
        let mut state = GameState::default();
        let mut narrator = Narrator::offline(5);
        let mut rng = StepRng::new(0, 0);
        assert!(strike(&mut state, &mut rng, &mut narrator).is_none());
        assert!(state.events.is_empty());
    }
}
