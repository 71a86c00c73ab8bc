use rand::Rng;
use rand::seq::SliceRandom;
use std::str::FromStr;

use super::{ActivityCtx, ActivityParams, FailureReason, Outcome, Resolution};
use crate::attributes;
use crate::character::MentalState;
use crate::constants::{SURGERY_MIN_ASSETS, THERAPY_FEE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurgeryTier {
    #[default]
    Minor,
    FullFace,
    Total,
}

struct SurgeryPlan {
    cost: f64,
    risk: f64,
    min_effect: i32,
    max_effect: i32,
}

impl SurgeryTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::FullFace => "full_face",
            Self::Total => "total",
        }
    }

    const fn plan(self) -> SurgeryPlan {
        match self {
            Self::Minor => SurgeryPlan {
                cost: 20_000.0,
                risk: 0.05,
                min_effect: 5,
                max_effect: 15,
            },
            Self::FullFace => SurgeryPlan {
                cost: 50_000.0,
                risk: 0.15,
                min_effect: 10,
                max_effect: 25,
            },
            Self::Total => SurgeryPlan {
                cost: 150_000.0,
                risk: 0.30,
                min_effect: 20,
                max_effect: 40,
            },
        }
    }
}

impl FromStr for SurgeryTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "minor" | "micro" => Ok(Self::Minor),
            "full_face" | "facial" | "face" => Ok(Self::FullFace),
            "total" | "makeover" | "full_body" => Ok(Self::Total),
            _ => Err(()),
        }
    }
}

pub(super) fn plastic_surgery<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    if ctx.actor.assets < SURGERY_MIN_ASSETS {
        return Err(FailureReason::InsufficientFunds {
            required: SURGERY_MIN_ASSETS,
            available: ctx.actor.assets,
        });
    }
    let tier = params.choice("type", SurgeryTier::Minor);
    let plan = tier.plan();
    if ctx.actor.assets < plan.cost {
        return Err(FailureReason::InsufficientFunds {
            required: plan.cost,
            available: ctx.actor.assets,
        });
    }

    let name = ctx.actor.name.clone();
    ctx.actor.assets -= plan.cost;
    let complications = ctx.chance(plan.risk);
    if !ctx.actor.surgery.has_had_surgery() {
        ctx.actor.surgery.original_appearance = Some(ctx.actor.appearance);
    }
    ctx.actor.surgery.procedures += 1;

    let mut outcome = Outcome::ok("Cosmetic surgery")
        .with("surgery_type", tier.as_str())
        .with("cost", plan.cost)
        .with("risk", plan.risk);

    let baseline = ctx.actor.appearance_baseline();
    if complications {
        let effect = ctx.roll(-10, plan.min_effect / 2);
        ctx.actor.surgery.quality = Some(baseline + effect);
        ctx.actor.surgery.complications = true;
        let health_impact = ctx.roll(5, 15);
        let happiness_loss = ctx.roll(10, 30);
        let stress_increase = ctx.roll(10, 30);
        ctx.actor.health -= health_impact;
        ctx.actor.happiness -= happiness_loss;
        ctx.actor.stress_level += stress_increase;
        ctx.note(format!(
            "{name}'s surgery ran into complications; appearance {effect:+.0}."
        ));
        outcome.set("outcome", "complications");
        outcome.set("effect", effect);
        outcome.set("health_impact", health_impact);
        outcome.set("happiness_loss", happiness_loss);
        outcome.set("stress_increase", stress_increase);
    } else {
        let effect = ctx.roll(plan.min_effect, plan.max_effect);
        ctx.actor.surgery.quality = Some(baseline + effect);
        ctx.actor.surgery.complications = false;
        let happiness_gain = ctx.roll(10, 30);
        ctx.actor.happiness += happiness_gain;
        ctx.note(format!("{name}'s surgery went very well; appearance +{effect:.0}."));
        outcome.set("outcome", "success");
        outcome.set("effect", effect);
        outcome.set("happiness_gain", happiness_gain);
    }

    attributes::recompute_appearance(&mut ctx.actor);
    if ctx.actor.appearance > 85.0 {
        let charm_gain = ctx.roll(1, 5);
        ctx.actor.charm += charm_gain;
        ctx.note(format!("After the surgery {name} drew more attention and found socializing easier."));
        outcome.set("charm_gain", charm_gain);
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Treatment {
    #[default]
    SelfHelp,
    TalkToFriend,
    Professional,
}

impl Treatment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfHelp => "self_help",
            Self::TalkToFriend => "talk_to_friend",
            Self::Professional => "professional",
        }
    }

    const fn effect(self) -> f64 {
        match self {
            Self::SelfHelp => 0.3,
            Self::TalkToFriend => 0.5,
            Self::Professional => 0.8,
        }
    }
}

impl FromStr for Treatment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "self_help" | "self" => Ok(Self::SelfHelp),
            "talk_to_friend" | "friend" | "talk" => Ok(Self::TalkToFriend),
            "professional" | "therapy" | "counseling" => Ok(Self::Professional),
            _ => Err(()),
        }
    }
}

const RELAXATIONS: [&str; 6] = [
    "watched a film",
    "listened to music",
    "read a book",
    "meditated",
    "went for a walk",
    "did some yoga",
];

pub(super) fn mental_health<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    ctx.spend_energy(10, 20)?;
    let treatment = params.choice("type", Treatment::SelfHelp);
    let name = ctx.actor.name.clone();
    let mut outcome = Outcome::ok("Mental health care")
        .with("treatment_type", treatment.as_str())
        .with("mental_state", ctx.actor.mental_state.as_str())
        .with("stress_level", ctx.actor.stress_level)
        .with("happiness", ctx.actor.happiness);

    if ctx.actor.mental_state == MentalState::Normal
        && ctx.actor.happiness > 50.0
        && ctx.actor.stress_level < 40.0
    {
        let activity = RELAXATIONS
            .choose(&mut *ctx.rng)
            .copied()
            .unwrap_or(RELAXATIONS[0]);
        let happiness_gain = ctx.roll(5, 10);
        let stress_reduction = ctx.roll(5, 15);
        ctx.actor.happiness += happiness_gain;
        ctx.actor.stress_level = (ctx.actor.stress_level - stress_reduction).max(0.0);
        ctx.note(format!("{name} {activity} to unwind and felt good."));
        outcome.set("activity", activity);
        outcome.set("happiness_gain", happiness_gain);
        outcome.set("stress_reduction", stress_reduction);
        return Ok(outcome);
    }

    if treatment == Treatment::Professional {
        if ctx.actor.assets < THERAPY_FEE {
            return Err(FailureReason::InsufficientFunds {
                required: THERAPY_FEE,
                available: ctx.actor.assets,
            });
        }
        ctx.actor.assets -= THERAPY_FEE;
        outcome.set("cost", THERAPY_FEE);
    }

    let effect = treatment.effect();
    let stress_reduction = (ctx.actor.stress_level * effect * 0.5).floor();
    ctx.actor.stress_level = (ctx.actor.stress_level - stress_reduction).max(0.0);
    let happiness_gain = ((100.0 - ctx.actor.happiness) * effect * 0.3).floor();
    ctx.actor.happiness += happiness_gain;
    outcome.set("stress_reduction", stress_reduction);
    outcome.set("happiness_gain", happiness_gain);

    match ctx.actor.mental_state {
        MentalState::Depressed => {
            let reduction = (70.0 * effect).floor();
            ctx.actor.depression_risk = (ctx.actor.depression_risk - reduction).max(0.0);
            outcome.set("depression_reduction", reduction);
            let recovered = below_recovery(ctx, MentalState::Depressed);
            step_down(ctx, &mut outcome, recovered, &name);
        }
        MentalState::Anxious => {
            let reduction = (60.0 * effect).floor();
            ctx.actor.anxiety_risk = (ctx.actor.anxiety_risk - reduction).max(0.0);
            outcome.set("anxiety_reduction", reduction);
            let recovered = below_recovery(ctx, MentalState::Anxious);
            step_down(ctx, &mut outcome, recovered, &name);
        }
        MentalState::Normal => {
            let line = match treatment {
                Treatment::SelfHelp => format!("{name} worked through the stress alone and felt better."),
                Treatment::TalkToFriend => format!("{name} talked things over with a friend and felt much lighter."),
                Treatment::Professional => format!("{name} saw a counselor and came away with good guidance."),
            };
            ctx.note(line);
            outcome.set("outcome", "maintained");
        }
    }
    Ok(outcome)
}

/// True when the risk for `state` has fallen below its treated recovery threshold.
fn below_recovery<R: Rng + ?Sized>(ctx: &ActivityCtx<'_, R>, state: MentalState) -> bool {
    use crate::constants::{TREATED_ANXIETY_RECOVERY, TREATED_DEPRESSION_RECOVERY};
    match state {
        MentalState::Depressed => ctx.actor.depression_risk < TREATED_DEPRESSION_RECOVERY,
        MentalState::Anxious => ctx.actor.anxiety_risk < TREATED_ANXIETY_RECOVERY,
        MentalState::Normal => false,
    }
}

fn step_down<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    outcome: &mut Outcome,
    recovered: bool,
    name: &str,
) {
    let from = ctx.actor.mental_state;
    if recovered {
        ctx.actor.mental_state = from.milder();
        ctx.note(format!(
            "{name}'s {from} symptoms eased; now {}.",
            ctx.actor.mental_state
        ));
        outcome.set("outcome", "recovered");
        outcome.set("mental_state", ctx.actor.mental_state.as_str());
    } else {
        ctx.note(format!(
            "{name}'s {from} symptoms eased a little, but more care is needed."
        ));
        outcome.set("outcome", "improved");
    }
}
