//! Rest, work and exercise.

use rand::Rng;

use super::{ActivityCtx, FailureReason, Outcome, Resolution};
use crate::attributes::{self, weight_status};
use crate::character::MentalState;
use crate::constants::ENERGY_MAX;

pub(super) fn rest<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    let recovery = ctx.roll(20, 40);
    ctx.actor.energy = (ctx.actor.energy + recovery).min(ENERGY_MAX);
    let name = ctx.actor.name.clone();
    ctx.note(format!("{name} took a rest and recovered {recovery:.0} energy."));
    Ok(Outcome::ok(format!("Rest restored {recovery:.0} energy")).with("energy_gain", recovery))
}

pub(super) fn work<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    if !ctx.actor.is_employed() {
        return Err(FailureReason::Unemployed);
    }
    ctx.spend_energy(10, 20)?;

    let income = ctx.actor.salary / 30.0;
    ctx.actor.assets += income;
    let name = ctx.actor.name.clone();

    let performance = ctx.draw();
    if performance > 0.9 {
        let bonus = income * 0.5;
        ctx.actor.assets += bonus;
        ctx.actor.career_prestige += 1.0;
        ctx.note(format!("{name} did outstanding work and earned a bonus of {bonus:.2}!"));
        return Ok(Outcome::ok("Outstanding performance")
            .with("income", income)
            .with("bonus", bonus)
            .with("prestige_gain", 1));
    }
    if performance < 0.1 {
        let stress = ctx.roll(5, 15);
        ctx.actor.career_prestige -= 1.0;
        ctx.actor.stress_level += stress;
        ctx.note(format!("{name} had a poor day at work and felt the pressure."));
        return Ok(Outcome::ok("Poor performance")
            .with("income", income)
            .with("prestige_loss", 1)
            .with("stress_increase", stress));
    }
    ctx.note(format!("{name} finished a day's work and earned {income:.2}."));
    Ok(Outcome::ok("A normal day at work").with("income", income))
}

pub(super) fn exercise<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>) -> Resolution {
    ctx.spend_energy(15, 25)?;

    let health_gain = ctx.roll(1, 3);
    ctx.actor.health += health_gain;

    if ctx.actor.weight > ctx.actor.ideal_weight {
        let loss = ctx.uniform(0.1, 0.3);
        ctx.actor.weight -= loss;
    } else if ctx.actor.weight < ctx.actor.ideal_weight - 5.0 {
        let gain = ctx.uniform(0.05, 0.15);
        ctx.actor.weight += gain;
    }

    let happiness_gain = ctx.roll(2, 5);
    ctx.actor.happiness += happiness_gain;
    let stress_reduction = ctx.roll(3, 8);
    ctx.actor.stress_level = (ctx.actor.stress_level - stress_reduction).max(0.0);

    let mut recovery = 0.0;
    if ctx.actor.mental_state != MentalState::Normal {
        recovery = ctx.roll(1, 3);
        ctx.actor.depression_risk = (ctx.actor.depression_risk - recovery).max(0.0);
        ctx.actor.anxiety_risk = (ctx.actor.anxiety_risk - recovery).max(0.0);
    }

    attributes::recompute_appearance(&mut ctx.actor);
    let name = ctx.actor.name.clone();
    let weight = ctx.actor.weight;
    ctx.note(format!(
        "{name} worked out and felt healthier and happier. Weight is now {weight:.1}kg."
    ));

    Ok(Outcome::ok("Exercise complete")
        .with("health_gain", health_gain)
        .with("happiness_gain", happiness_gain)
        .with("stress_reduction", stress_reduction)
        .with("mental_health_improvement", recovery)
        .with("weight", weight)
        .with("weight_status", weight_status(&ctx.actor).as_str()))
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use super::super::{ActivityKind, ActivityParams, resolve};
    use crate::character::MentalState;
    use rand::rngs::mock::StepRng;

    #[test]
    fn rest_caps_energy() {
        let (mut state, id, mut narrator) = setup(90.0);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Rest, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.number("energy_gain"), Some(20.0));
        assert!((state.player().map_or(0.0, |p| p.energy) - 100.0).abs() < f64::EPSILON);
        assert!(state.events.iter().any(|e| e.text.contains("took a rest")));
    }

    #[test]
    fn poor_work_day_raises_stress() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.job = "Clerk".to_string();
            player.salary = 3_000.0;
        }
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Work, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.number("income"), Some(100.0));
        assert_eq!(outcome.number("stress_increase"), Some(5.0));
        let player = state.player().cloned().unwrap_or_default();
        assert!((player.energy - 90.0).abs() < f64::EPSILON);
        assert!((player.assets - 1_100.0).abs() < 1e-9);
    }

    #[test]
    fn excellent_work_day_pays_a_bonus() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.job = "Clerk".to_string();
            player.salary = 3_000.0;
        }
        let mut rng = StepRng::new(0xF000_0000_0000_0000, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Work, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.number("bonus"), Some(50.0));
        assert!((state.player().map_or(0.0, |p| p.assets) - 1_150.0).abs() < 1e-9);
    }

    #[test]
    fn unemployed_cannot_work() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Work, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(!outcome.success);
        assert!((state.player().map_or(0.0, |p| p.energy) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exercise_eases_anxiety_risk() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.mental_state = MentalState::Anxious;
            player.anxiety_risk = 55.0;
        }
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Exercise, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.number("mental_health_improvement"), Some(1.0));
        assert!((state.player().map_or(0.0, |p| p.anxiety_risk) - 54.0).abs() < f64::EPSILON);
    }
}
