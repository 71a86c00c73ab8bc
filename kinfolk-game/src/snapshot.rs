//! Read-only view of a game handed to clients after every request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::attributes::{self, WeightStatus};
use crate::character::{
    EducationLevel, Gender, MentalState, NetworkDomain, RelationshipStatus,
};
use crate::constants::SNAPSHOT_EVENT_WINDOW;
use crate::economy::{EconomyStatus, Season};
use crate::events::LogEntry;
use crate::family::CharacterId;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub name: String,
    pub kind: String,
    pub scale: f64,
    pub profit: f64,
    pub valuation: f64,
    pub employees: u32,
    pub reputation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub birthday: u32,
    pub alive: bool,
    pub energy: f64,
    pub health: f64,
    pub appearance: f64,
    pub charm: f64,
    pub intelligence: f64,
    pub emotional_intelligence: f64,
    pub financial_intelligence: f64,
    pub luck: f64,
    pub happiness: f64,
    pub stress_level: f64,
    pub mental_state: MentalState,
    pub weight_status: WeightStatus,
    pub relationship_status: RelationshipStatus,
    pub spouse: Option<CharacterId>,
    pub children: Vec<CharacterId>,
    pub parents: Vec<CharacterId>,
    pub job: String,
    pub salary: f64,
    pub assets: f64,
    pub education_level: EducationLevel,
    pub career_prestige: f64,
    pub network: BTreeMap<NetworkDomain, f64>,
    pub business: Option<BusinessSummary>,
    pub portfolio_principal: f64,
    pub honorary_titles: Vec<String>,
}

impl CharacterSummary {
    fn of(state: &GameState, id: CharacterId) -> Option<Self> {
        let c = state.registry.get(id)?;
        Some(Self {
            id,
            name: c.name.clone(),
            gender: c.gender,
            age: c.age,
            birthday: c.birthday,
            alive: c.alive,
            energy: c.energy,
            health: c.health,
            appearance: c.appearance,
            charm: c.charm,
            intelligence: c.intelligence,
            emotional_intelligence: c.emotional_intelligence,
            financial_intelligence: c.financial_intelligence,
            luck: c.luck,
            happiness: c.happiness,
            stress_level: c.stress_level,
            mental_state: c.mental_state,
            weight_status: attributes::weight_status(c),
            relationship_status: c.relationship_status,
            spouse: c.spouse,
            children: c.children.clone(),
            parents: c.parents.clone(),
            job: c.job.clone(),
            salary: c.salary,
            assets: c.assets,
            education_level: c.education_level,
            career_prestige: c.career_prestige,
            network: c.network.iter().collect(),
            business: c.business.as_ref().map(|b| BusinessSummary {
                name: b.name.clone(),
                kind: b.kind.as_str().to_string(),
                scale: b.scale,
                profit: b.profit,
                valuation: b.valuation,
                employees: b.employees,
                reputation: b.reputation,
            }),
            portfolio_principal: c.portfolio.total_principal(),
            honorary_titles: c.honorary_titles.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub day: u32,
    pub season: Season,
    pub economy: EconomyStatus,
    pub family_fortune: f64,
    pub family_prestige: f64,
    pub family_traits: BTreeMap<String, u8>,
    /// Counters by id plus `<id>_completed` markers.
    pub achievements: BTreeMap<String, serde_json::Value>,
    pub events: Vec<LogEntry>,
    pub player: Option<CharacterSummary>,
    pub family: Vec<CharacterSummary>,
}

impl StateSnapshot {
    #[must_use]
    pub fn capture(state: &GameState) -> Self {
        Self {
            day: state.day,
            season: state.season,
            economy: state.economy,
            family_fortune: state.family_fortune,
            family_prestige: state.family_prestige,
            family_traits: state
                .family_traits
                .iter()
                .map(|(t, tier)| (t.as_str().to_string(), tier))
                .collect(),
            achievements: state.achievements.flattened(),
            events: state
                .events
                .recent_visible(SNAPSHOT_EVENT_WINDOW)
                .into_iter()
                .cloned()
                .collect(),
            player: state.player.and_then(|id| CharacterSummary::of(state, id)),
            family: state
                .family_member_ids()
                .into_iter()
                .filter_map(|id| CharacterSummary::of(state, id))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::AchievementId;
    use crate::character::Character;

    #[test]
    fn window_keeps_the_latest_visible_events() {
        let mut state = GameState::default();
        for n in 0..30 {
            state.log(format!("entry {n}"), "test");
        }
        state.events.record_hidden(1, "secret", "test");
        let snapshot = StateSnapshot::capture(&state);
        assert_eq!(snapshot.events.len(), 20);
        assert_eq!(snapshot.events.first().map(|e| e.text.as_str()), Some("entry 10"));
        assert_eq!(snapshot.events.last().map(|e| e.text.as_str()), Some("entry 29"));
    }

    #[test]
    fn completion_markers_and_family_are_listed() {
        let mut state = GameState::default();
        let player = state.registry.insert(Character::new("Tam Rook", Gender::Male, 40));
        let spouse = state.registry.insert(Character::new("Bea Rook", Gender::Female, 38));
        state.player = Some(player);
        state.registry.link_spouses(player, spouse);
        state.update_achievement(AchievementId::Prolific, 5.0);

        let snapshot = StateSnapshot::capture(&state);
        assert_eq!(
            snapshot.achievements.get("prolific_completed"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(snapshot.player.as_ref().and_then(|p| p.spouse), Some(spouse));
        assert_eq!(snapshot.family.len(), 1);
        assert_eq!(snapshot.family_traits.len(), 5);
        assert_eq!(snapshot.family[0].network.len(), 5);
    }
}
