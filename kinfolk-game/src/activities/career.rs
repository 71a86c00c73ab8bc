//! Job hunting and socializing.

use rand::Rng;
use rand::seq::SliceRandom;

use super::romance::generate_candidate;
use super::{ActivityCtx, Outcome, Resolution};
use crate::careers;
use crate::character::{MentalState, NetworkDomain, RelationshipStatus};
use crate::constants::UNEMPLOYED;
use crate::narrative::NarrativeRequest;

pub(super) fn job_hunting<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    ctx.spend_energy(15, 25)?;
    let name = ctx.actor.name.clone();

    let mut chance = (ctx.actor.intelligence + ctx.actor.charm) / 200.0;
    chance += ctx.actor.education_level.hiring_bonus();
    if ctx.actor.surgery.has_had_surgery() {
        if ctx.actor.surgery.complications {
            chance *= 0.9;
        } else if ctx.actor.appearance > 80.0 {
            chance *= 1.1;
        }
    }
    if ctx.actor.mental_state != MentalState::Normal {
        chance *= 0.8;
    }
    let business = ctx.actor.network.strength(NetworkDomain::Business);
    if business > 30.0 {
        chance += business / 100.0;
    }
    if ctx.actor.network.strength(NetworkDomain::Political) > 20.0 && ctx.chance(0.3) {
        chance += 0.2;
        ctx.note(format!(
            "{name} heard about a good opening through political connections."
        ));
    }
    let chance = chance.clamp(0.1, 0.9);

    let mut outcome = Outcome::ok("Job hunt").with("chance", chance);

    if ctx.draw() >= chance {
        let happiness_loss = ctx.roll(2, 8);
        let stress_increase = ctx.roll(5, 15);
        ctx.actor.happiness -= happiness_loss;
        ctx.actor.stress_level += stress_increase;
        ctx.note(format!("{name}'s job hunt came to nothing, which was discouraging."));
        outcome.message = "Job hunt failed".to_string();
        outcome.set("happiness_loss", happiness_loss);
        outcome.set("stress_increase", stress_increase);
        return Ok(outcome);
    }

    let openings = careers::catalog().eligible(ctx.actor.education_level);
    let Some(opening) = openings.choose(&mut *ctx.rng).copied() else {
        outcome.message = "No openings available".to_string();
        return Ok(outcome);
    };
    let offered = opening.roll_salary(&mut *ctx.rng);
    let multiplier = 1.0 + ctx.actor.career_prestige / 50.0 + business / 100.0;
    let salary = (offered * multiplier).trunc();

    let old_job = std::mem::replace(&mut ctx.actor.job, opening.title.clone());
    let old_salary = ctx.actor.salary;
    let was_unemployed = old_job == UNEMPLOYED;
    ctx.actor.salary = salary;
    let career_gain = ctx.roll(1, 5);
    ctx.actor.career_prestige += career_gain;
    outcome.set("career_prestige_gain", career_gain);

    let title = opening.title.clone();
    if was_unemployed {
        ctx.note(format!("{name} landed a job as {title} earning {salary:.0} a month."));
        outcome.message = "Job hunt succeeded".to_string();
        outcome.set("new_job", title);
        outcome.set("salary", salary);
    } else {
        let change = salary - old_salary;
        if change > 0.0 {
            ctx.note(format!(
                "{name} moved from {old_job} to {title}; pay rose by {change:.0} to {salary:.0}."
            ));
            outcome.message = "Changed jobs with a raise".to_string();
        } else {
            ctx.note(format!(
                "{name} moved from {old_job} to {title}, now earning {salary:.0}."
            ));
            outcome.message = "Changed jobs".to_string();
        }
        outcome.set("old_job", old_job);
        outcome.set("new_job", title);
        outcome.set("old_salary", old_salary);
        outcome.set("new_salary", salary);
    }

    if salary > 20_000.0 {
        let prestige_gain = ctx.roll(1, 3);
        ctx.state.family_prestige += prestige_gain;
        ctx.note(format!("{name}'s well-paid position raised the family's standing."));
        outcome.set("prestige_gain", prestige_gain);
    }
    Ok(outcome)
}

pub(super) fn socialize<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    ctx.spend_energy(10, 20)?;
    let name = ctx.actor.name.clone();

    let request = NarrativeRequest::new(
        "socialize",
        "Describe one social outing for this character in under 50 words; they may meet new friends or a potential love interest.",
    )
    .var("name", name.as_str())
    .var("gender", ctx.actor.gender.as_str())
    .var("age", ctx.actor.age)
    .var("charm", ctx.actor.charm)
    .var("relationship_status", ctx.actor.relationship_status.as_str());
    let story = ctx.narrate(&request);

    let happiness_gain = ctx.roll(2, 8);
    let connections_gain = ctx.roll(1, 2);
    let stress_reduction = ctx.roll(1, 5);
    ctx.actor.happiness += happiness_gain;
    ctx.actor.personal_connections += connections_gain;
    ctx.actor.stress_level = (ctx.actor.stress_level - stress_reduction).max(0.0);

    let mut outcome = Outcome::ok("Socialized")
        .with("event", story)
        .with("happiness_gain", happiness_gain)
        .with("connections_gain", connections_gain)
        .with("stress_reduction", stress_reduction);

    if ctx.chance(0.3)
        && let Some(domain) = NetworkDomain::ALL.choose(&mut *ctx.rng).copied()
    {
        let gain = ctx.roll(1, 3);
        ctx.actor.network.add(domain, gain);
        if gain >= 2.0 && ctx.actor.network.strength(domain) > 30.0 {
            ctx.note(format!("{name} widened their {} circle.", domain.as_str()));
            outcome.set("network_type", domain.as_str());
            outcome.set("network_gain", gain);
        }
    }

    let meet_chance = 0.1 * (ctx.actor.charm + ctx.actor.appearance) / 150.0;
    if ctx.actor.relationship_status == RelationshipStatus::Single && ctx.chance(meet_chance) {
        let candidate = generate_candidate(&ctx.actor, &mut *ctx.rng);
        ctx.note(format!(
            "{name} met someone interesting while out: {}.",
            candidate.name
        ));
        let meeting = NarrativeRequest::new(
            "meet_partner",
            "This character met a potential love interest while socializing. Describe their first encounter in under 100 words.",
        )
        .var("name", name.as_str())
        .var("partner", candidate.name.as_str())
        .var("partner_job", candidate.job.as_str());
        let description = ctx.narrate(&meeting);
        outcome.set("met_partner", true);
        outcome.set(
            "partner",
            serde_json::to_value(&candidate).unwrap_or_default(),
        );
        outcome.set("meeting_description", description);
        ctx.actor.courting = Some(candidate);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use super::super::{ActivityKind, ActivityParams, resolve};
    use crate::character::EducationLevel;
    use rand::rngs::mock::StepRng;

    #[test]
    fn low_draw_lands_a_fallback_job_for_dropouts() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.education_level = EducationLevel::MiddleSchool;
        }
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::JobHunting, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.field("new_job"), Some(&serde_json::json!("Courier")));
        let player = state.player().cloned().unwrap_or_default();
        assert_eq!(player.job, "Courier");
        // 3000 base with prestige 10 -> x1.2
        assert!((player.salary - 3_600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn high_draw_fails_the_hunt() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0xF000_0000_0000_0000, 0);
        let outcome = resolve(&mut state, id, ActivityKind::JobHunting, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Job hunt failed");
        assert_eq!(outcome.number("happiness_loss"), Some(2.0));
        assert!(state.player().is_some_and(|p| !p.is_employed()));
    }

    #[test]
    fn socializing_can_introduce_a_candidate() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Socialize, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.field("met_partner"), Some(&serde_json::json!(true)));
        assert!(state.player().is_some_and(|p| p.courting.is_some()));
        assert!(state.events.len() >= 3);
    }
}
