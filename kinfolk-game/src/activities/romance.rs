//! Dating, marriage and children.

use rand::Rng;
use rand::seq::SliceRandom;

use super::{ActivityCtx, FailureReason, Outcome, Resolution};
use crate::achievements::{AchievementId, FamilyTraits};
use crate::careers;
use crate::character::{
    Character, Gender, HiddenMotive, MentalState, PartnerBackground, PartnerCandidate,
    RelationshipStatus,
};
use crate::constants::{
    ADULT_AGE, BIRTH_ASSET_SHARE, DAYS_PER_YEAR, PROPOSAL_ENERGY, WEDDING_ASSET_SHARE,
};
use crate::economy::day_of_year;
use crate::names;
use crate::narrative::{NarrativeRequest, catalog};
use crate::rng::{chance, roll};

const BACKGROUNDS: [PartnerBackground; 4] = [
    PartnerBackground::Ordinary,
    PartnerBackground::Wealthy,
    PartnerBackground::Poor,
    PartnerBackground::Prominent,
];

/// Roll someone `character` might fall for.
pub fn generate_candidate<R: Rng + ?Sized>(character: &Character, rng: &mut R) -> PartnerCandidate {
    let gender = character
        .sexual_orientation
        .partner_gender(character.gender, rng);
    let youngest = character.age.saturating_sub(10).max(ADULT_AGE);
    let oldest = (character.age + 5).max(youngest);
    let age = rng.gen_range(youngest..=oldest);
    let high_status = character.career_prestige > 50.0 || character.assets > 100_000.0;
    let job = careers::catalog().partner_job(high_status, rng);

    let mut candidate = PartnerCandidate {
        name: names::catalog().full_name(gender, rng),
        gender,
        age,
        job,
        charm: roll(rng, 60, 95),
        appearance: roll(rng, 60, 95),
        intelligence: roll(rng, 60, 95),
        background: BACKGROUNDS.choose(rng).copied().unwrap_or_default(),
        hidden_motive: None,
        affection: 50.0,
    };
    if character.assets > 500_000.0 && chance(rng, 0.2) {
        candidate.hidden_motive = Some(HiddenMotive::GoldDigger);
        candidate.charm += 10.0;
    }
    if character.appearance > 85.0 && chance(rng, 0.3) {
        candidate.hidden_motive = Some(HiddenMotive::LooksDriven);
        candidate.affection = character.appearance * 1.2;
    }
    candidate
}

fn candidate_value(candidate: &PartnerCandidate) -> serde_json::Value {
    serde_json::to_value(candidate).unwrap_or_default()
}

pub(super) fn date<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    ctx.spend_energy(10, 20)?;
    let status = ctx.actor.relationship_status;
    let mut outcome = Outcome::ok("Date").with("relationship_status", status.as_str());
    match status {
        RelationshipStatus::Single => seek_partner(ctx, &mut outcome),
        RelationshipStatus::Dating => go_on_date(ctx, &mut outcome),
        RelationshipStatus::Married => spend_time_with_spouse(ctx, &mut outcome),
    }
    Ok(outcome)
}

fn seek_partner<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>, outcome: &mut Outcome) {
    let name = ctx.actor.name.clone();
    let request = NarrativeRequest::new(
        "date_single",
        "Describe this single character actively looking for romance in under 100 words.",
    )
    .var("name", name.as_str())
    .var("gender", ctx.actor.gender.as_str())
    .var("age", ctx.actor.age)
    .var("charm", ctx.actor.charm)
    .var("job", ctx.actor.job.as_str());
    let story = ctx.narrate(&request);
    outcome.set("event", story);
    outcome.set("activity", "seek_partner");

    let appeal = ctx.actor.charm + ctx.actor.appearance;
    let candidate = match ctx.actor.courting.take() {
        Some(candidate) => candidate,
        None => {
            if !ctx.chance(appeal / 300.0) {
                return;
            }
            let candidate = generate_candidate(&ctx.actor, &mut *ctx.rng);
            ctx.note(format!(
                "{name} met someone appealing: {}, {}, {}.",
                candidate.name, candidate.age, candidate.job
            ));
            candidate
        }
    };
    outcome.set("met_partner", true);
    outcome.set("partner", candidate_value(&candidate));

    if ctx.chance(appeal / 200.0) {
        let happiness_gain = ctx.roll(10, 30);
        ctx.actor.happiness += happiness_gain;
        ctx.actor.relationship_status = RelationshipStatus::Dating;
        let courtship = NarrativeRequest::new(
            "courtship",
            "Describe how this character won over their love interest and the start of the relationship in under 100 words.",
        )
        .var("name", name.as_str())
        .var("partner", candidate.name.as_str())
        .var("partner_job", candidate.job.as_str());
        let description = ctx.narrate(&courtship);
        outcome.set("relationship", RelationshipStatus::Dating.as_str());
        outcome.set("relationship_description", description);
        outcome.set("happiness_gain", happiness_gain);
        ctx.actor.courting = Some(candidate);
    } else {
        let happiness_loss = ctx.roll(5, 15);
        ctx.actor.happiness -= happiness_loss;
        ctx.note(format!(
            "{name} confessed their feelings to {} and was turned down.",
            candidate.name
        ));
        outcome.set("relationship", RelationshipStatus::Single.as_str());
        outcome.set("outcome", "rejection");
        outcome.set("happiness_loss", happiness_loss);
    }
}

fn go_on_date<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>, outcome: &mut Outcome) {
    let name = ctx.actor.name.clone();
    let happiness_gain = ctx.roll(5, 15);
    ctx.actor.happiness += happiness_gain;
    let scenario = catalog()
        .scenario_pool("date_outings")
        .choose(&mut *ctx.rng)
        .cloned()
        .unwrap_or_else(|| "had dinner together".to_string());
    let partner = ctx
        .actor
        .courting
        .as_ref()
        .map_or_else(|| "their partner".to_string(), |c| c.name.clone());
    ctx.note(format!("{name} and {partner} {scenario} and had a lovely time."));
    outcome.set("activity", "date");
    outcome.set("scenario", scenario);
    outcome.set("happiness_gain", happiness_gain);
    if ctx.chance(0.1) {
        ctx.note("The date went wonderfully. Perhaps it is time to think about proposing?");
        outcome.set("marriage_hint", true);
    }
}

fn spend_time_with_spouse<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>, outcome: &mut Outcome) {
    let Some(spouse_id) = ctx.actor.spouse else {
        return;
    };
    let Some(spouse_name) = ctx.state.registry.get(spouse_id).map(|s| s.name.clone()) else {
        return;
    };
    let name = ctx.actor.name.clone();
    let happiness_gain = ctx.roll(3, 10);
    let improvement = ctx.roll(2, 5);
    ctx.actor.happiness += happiness_gain;
    ctx.actor.relationship_satisfaction += improvement;
    if let Some(spouse) = ctx.state.registry.get_mut(spouse_id) {
        spouse.happiness += happiness_gain;
        spouse.relationship_satisfaction += improvement;
    }
    let scenario = catalog()
        .scenario_pool("married_outings")
        .choose(&mut *ctx.rng)
        .cloned()
        .unwrap_or_else(|| "talked at home".to_string());
    ctx.note(format!("{name} and {spouse_name} {scenario}, growing closer as a couple."));
    outcome.set("activity", "spouse_time");
    outcome.set("scenario", scenario);
    outcome.set("happiness_gain", happiness_gain);
    outcome.set("relationship_improvement", improvement);

    if ctx.actor.is_cheating && ctx.chance(0.1) {
        ctx.note(format!(
            "Time with {spouse_name} made {name} rethink the affair."
        ));
        if ctx.chance(0.5) {
            ctx.note(format!("{name} decided to end the affair."));
            ctx.actor.is_cheating = false;
            outcome.set("end_cheating", true);
        }
    }
}

pub(super) fn marriage<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    match ctx.actor.relationship_status {
        RelationshipStatus::Dating => propose(ctx),
        RelationshipStatus::Married => have_child(ctx),
        RelationshipStatus::Single => Err(FailureReason::NoPartner),
    }
}

fn spouse_from<R: Rng + ?Sized>(
    candidate: &PartnerCandidate,
    traits: &FamilyTraits,
    rng: &mut R,
) -> Character {
    let mut spouse =
        Character::generate(candidate.name.clone(), candidate.gender, candidate.age, traits, rng);
    spouse.charm = candidate.charm;
    spouse.innate_appearance = candidate.appearance;
    spouse.intelligence = candidate.intelligence;
    spouse.job = candidate.job.clone();
    spouse.salary = roll(rng, 3_000, 10_000);
    spouse
}

fn propose<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    ctx.spend_fixed_energy(PROPOSAL_ENERGY)?;
    let name = ctx.actor.name.clone();
    let candidate = match ctx.actor.courting.take() {
        Some(candidate) => candidate,
        None => {
            let mut candidate = generate_candidate(&ctx.actor, &mut *ctx.rng);
            candidate.job = careers::catalog().spouse_job(&mut *ctx.rng);
            candidate
        }
    };

    let mut chance = 0.7;
    if ctx.actor.assets < 50_000.0 {
        chance -= 0.1;
    }
    if ctx.actor.mental_state != MentalState::Normal {
        chance -= 0.2;
    }
    if ctx.actor.charm > 80.0 {
        chance += 0.1;
    }
    let mut outcome = Outcome::ok("Proposal")
        .with("partner", candidate_value(&candidate))
        .with("success_chance", chance);

    if ctx.draw() < chance {
        let spouse = spouse_from(&candidate, &ctx.state.family_traits, &mut *ctx.rng);
        let spouse_name = spouse.name.clone();
        let spouse_summary = serde_json::json!({
            "name": spouse.name,
            "gender": spouse.gender,
            "age": spouse.age,
            "job": spouse.job,
            "salary": spouse.salary,
        });
        let spouse_job = spouse.job.clone();
        let spouse_age = spouse.age;
        let spouse_id = ctx.state.registry.insert(spouse);
        ctx.wed(spouse_id);

        let wedding_cost = ctx.roll(30_000, 100_000);
        ctx.actor.assets -= (ctx.actor.assets * WEDDING_ASSET_SHARE).min(wedding_cost);
        let happiness_gain = ctx.roll(20, 40);
        let stress_reduction = ctx.roll(10, 20);
        ctx.actor.happiness += happiness_gain;
        ctx.actor.stress_level -= stress_reduction;
        ctx.note(format!(
            "{name} proposed to {spouse_name} and was accepted! The wedding cost {wedding_cost:.0}."
        ));

        let request = NarrativeRequest::new(
            "wedding",
            "Briefly describe this couple's wedding and early married life in under 100 words.",
        )
        .var("name", name.as_str())
        .var("age", ctx.actor.age)
        .var("job", ctx.actor.job.as_str())
        .var("partner", spouse_name.as_str())
        .var("partner_age", spouse_age)
        .var("partner_job", spouse_job.as_str())
        .var("budget", wedding_cost);
        let description = ctx.narrate(&request);

        outcome.set("outcome", "success");
        outcome.set("spouse", spouse_summary);
        outcome.set("wedding_cost", wedding_cost);
        outcome.set("happiness_gain", happiness_gain);
        outcome.set("stress_reduction", stress_reduction);
        outcome.set("wedding_description", description);
    } else {
        let happiness_loss = ctx.roll(20, 40);
        let stress_increase = ctx.roll(20, 40);
        ctx.actor.happiness -= happiness_loss;
        ctx.actor.stress_level += stress_increase;
        ctx.actor.relationship_status = RelationshipStatus::Single;
        let reason = catalog()
            .scenario_pool("proposal_rejections")
            .choose(&mut *ctx.rng)
            .cloned()
            .unwrap_or_else(|| "they were not ready".to_string());
        ctx.note(format!(
            "{name}'s proposal to {} was turned down ({reason}). It hurt deeply.",
            candidate.name
        ));
        outcome.set("outcome", "rejection");
        outcome.set("happiness_loss", happiness_loss);
        outcome.set("stress_increase", stress_increase);
        outcome.set("rejection_reason", reason);
    }
    Ok(outcome)
}

fn fertility_by_age(age: u32) -> f64 {
    match age {
        0..30 => 1.0,
        30..35 => 0.8,
        35..40 => 0.5,
        _ => 0.2,
    }
}

pub(super) fn have_child<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    let spouse_id = ctx.actor.spouse.ok_or(FailureReason::NoSpouse)?;
    let spouse = ctx
        .state
        .registry
        .get(spouse_id)
        .filter(|s| s.alive)
        .cloned()
        .ok_or(FailureReason::NoSpouse)?;
    if spouse.gender == ctx.actor.gender {
        return Err(FailureReason::NoNaturalConception);
    }
    let actor_is_mother = ctx.actor.gender == Gender::Female;
    let mother = if actor_is_mother { &ctx.actor } else { &spouse };
    if !(ADULT_AGE..=45).contains(&mother.age) {
        return Err(FailureReason::FertilityAgeOutOfRange { age: mother.age });
    }
    let mother_name = mother.name.clone();
    let mut chance = 0.6;
    let age_factor = fertility_by_age(mother.age);
    chance *= age_factor;
    let health_factor = (ctx.actor.health + spouse.health) / 200.0;
    chance *= health_factor;
    if mother.fertility_boosted {
        chance *= 2.0;
    }
    if mother.contraception_active {
        chance *= 0.1;
    }

    let mut outcome = Outcome::ok("Tried for a child")
        .with("female", mother_name.as_str())
        .with("success_chance", chance)
        .with("age_factor", age_factor)
        .with("health_factor", health_factor);

    if ctx.draw() >= chance {
        ctx.note("They did not conceive this time; they can keep trying.");
        outcome.set("outcome", "failure");
        return Ok(outcome);
    }

    let child_gender = if ctx.rng.gen_bool(0.5) {
        Gender::Male
    } else {
        Gender::Female
    };
    let surname = names::surname_of(&ctx.actor.name).to_string();
    let child_name = names::catalog().family_name(&surname, child_gender, &mut *ctx.rng);
    let mut child = Character::generate(
        child_name.clone(),
        child_gender,
        0,
        &ctx.state.family_traits,
        &mut *ctx.rng,
    );
    let today = day_of_year(ctx.state.day);
    child.birthday = if today == 0 { DAYS_PER_YEAR } else { today };
    child.parents = vec![ctx.actor_id, spouse_id];
    let child_id = ctx.state.registry.insert(child);
    ctx.actor.children.push(child_id);

    let health_impact = ctx.roll(5, 15);
    let happiness_gain = ctx.roll(20, 40);
    ctx.actor.happiness += happiness_gain;
    if actor_is_mother {
        ctx.actor.health -= health_impact;
    }
    if let Some(partner) = ctx.state.registry.get_mut(spouse_id) {
        partner.children.push(child_id);
        partner.happiness += happiness_gain;
        if !actor_is_mother {
            partner.health -= health_impact;
        }
    }

    let birth_cost = ctx.roll(5_000, 20_000);
    ctx.actor.assets -= (ctx.actor.assets * BIRTH_ASSET_SHARE).min(birth_cost);
    ctx.note(format!(
        "Wonderful news! {mother_name} gave birth to a healthy {} baby named {child_name}.",
        if child_gender == Gender::Male { "boy" } else { "girl" }
    ));
    ctx.achieve(AchievementId::Prolific, 1.0);

    let request = NarrativeRequest::new(
        "birth",
        "Briefly describe this couple welcoming their newborn in under 100 words.",
    )
    .var("name", ctx.actor.name.as_str())
    .var("partner", spouse.name.as_str())
    .var("child", child_name.as_str())
    .var("child_gender", child_gender.as_str());
    let description = ctx.narrate(&request);

    outcome.set("outcome", "success");
    outcome.set("child_name", child_name);
    outcome.set("child_gender", child_gender.as_str());
    outcome.set("health_impact", health_impact);
    outcome.set("happiness_gain", happiness_gain);
    outcome.set("birth_cost", birth_cost);
    outcome.set("birth_description", description);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use super::super::{ActivityKind, ActivityParams, FailureReason, resolve};
    use super::generate_candidate;
    use crate::achievements::AchievementId;
    use crate::character::{Character, Gender, RelationshipStatus, SexualOrientation};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;

    #[test]
    fn candidates_respect_orientation_and_age_window() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut seeker = Character::new("Noor Vale", Gender::Male, 20);
        seeker.sexual_orientation = SexualOrientation::Homosexual;
        for _ in 0..20 {
            let candidate = generate_candidate(&seeker, &mut rng);
            assert_eq!(candidate.gender, Gender::Male);
            assert!((18..=25).contains(&candidate.age));
            assert!((60.0..=95.0).contains(&candidate.appearance));
            assert!(!candidate.name.is_empty());
        }
    }

    #[test]
    fn single_without_partner_cannot_marry() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Marriage, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.reason, Some(FailureReason::NoPartner));
    }

    #[test]
    fn a_lucky_date_turns_into_dating() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Date, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.field("relationship"), Some(&serde_json::json!("dating")));
        let player = state.player().cloned().unwrap_or_default();
        assert_eq!(player.relationship_status, RelationshipStatus::Dating);
        assert!(player.courting.is_some());
    }

    #[test]
    fn accepted_proposal_links_both_spouses() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.relationship_status = RelationshipStatus::Dating;
            player.assets = 100_000.0;
        }
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Marriage, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("success")));
        let player = state.player().cloned().unwrap_or_default();
        assert_eq!(player.relationship_status, RelationshipStatus::Married);
        let spouse_id = player.spouse.unwrap_or(id);
        assert_ne!(spouse_id, id);
        assert_eq!(state.registry.get(spouse_id).and_then(|s| s.spouse), Some(id));
        assert_eq!(
            state.registry.get(spouse_id).map(|s| s.relationship_status),
            Some(RelationshipStatus::Married)
        );
        assert!(state.registry.spouse_links_symmetric());
        // 30,000 wedding against 70% of 100,000.
        assert!((player.assets - 70_000.0).abs() < 1e-9);
        assert!((player.energy - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejected_proposal_returns_to_single() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.relationship_status = RelationshipStatus::Dating;
        }
        let mut rng = StepRng::new(0xF000_0000_0000_0000, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Marriage, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("rejection")));
        let player = state.player().cloned().unwrap_or_default();
        assert_eq!(player.relationship_status, RelationshipStatus::Single);
        assert!(player.spouse.is_none());
        assert_eq!(state.registry.len(), 1);
    }

    fn married_couple(mother_age: u32, husband_gender: Gender) -> (crate::state::GameState, crate::family::CharacterId, crate::narrative::Narrator) {
        let (mut state, id, narrator) = setup(100.0);
        let mut spouse = Character::new("Ash Marsh", husband_gender, 32);
        spouse.relationship_status = RelationshipStatus::Married;
        spouse.spouse = Some(id);
        let spouse_id = state.registry.insert(spouse);
        if let Some(player) = state.player_mut() {
            player.age = mother_age;
            player.relationship_status = RelationshipStatus::Married;
            player.spouse = Some(spouse_id);
            player.assets = 40_000.0;
        }
        (state, id, narrator)
    }

    #[test]
    fn married_couple_welcomes_a_child() {
        let (mut state, id, mut narrator) = married_couple(28, Gender::Male);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::HaveChild, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("success")));
        let player = state.player().cloned().unwrap_or_default();
        assert_eq!(player.children.len(), 1);
        let child_id = player.children[0];
        let child = state.registry.get(child_id).cloned().unwrap_or_default();
        assert_eq!(child.age, 0);
        assert_eq!(child.parents.len(), 2);
        assert!(child.name.ends_with("Marsh"));
        let spouse_id = player.spouse.unwrap_or(id);
        assert_eq!(state.registry.get(spouse_id).map(|s| s.children.clone()), Some(vec![child_id]));
        assert!((state.achievements.progress(AchievementId::Prolific) - 1.0).abs() < f64::EPSILON);
        // Mother's health: 80 - 5.
        assert!((player.health - 75.0).abs() < f64::EPSILON);
        assert!((player.assets - 35_000.0).abs() < 1e-9);
    }

    #[test]
    fn same_gender_couples_cannot_conceive() {
        let (mut state, id, mut narrator) = married_couple(28, Gender::Female);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::HaveChild, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.reason, Some(FailureReason::NoNaturalConception));
        assert_eq!(state.registry.len(), 2);
    }

    #[test]
    fn fertility_window_is_enforced() {
        let (mut state, id, mut narrator) = married_couple(47, Gender::Male);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::HaveChild, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.reason, Some(FailureReason::FertilityAgeOutOfRange { age: 47 }));
        assert_eq!(outcome.number("female_age"), Some(47.0));
    }
}
