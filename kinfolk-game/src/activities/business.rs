//! Founding and running a family business.

use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;

use super::{ActivityCtx, ActivityParams, FailureReason, Outcome, Resolution};
use crate::achievements::{AchievementId, FamilyTrait};
use crate::character::{Business, BusinessKind, NetworkDomain};
use crate::constants::STARTUP_COST;
use crate::economy::EconomyLens;
use crate::narrative::{NarrativeRequest, catalog};

const REPUTATION_FLOOR: f64 = 10.0;
const SCALE_FLOOR: f64 = 5.0;
const CEILING: f64 = 100.0;

fn pick_scenario<R: Rng + ?Sized>(ctx: &mut ActivityCtx<'_, R>, pool: &str, fallback: &str) -> String {
    catalog()
        .scenario_pool(pool)
        .choose(&mut *ctx.rng)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

pub(super) fn start_business<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    if ctx.actor.has_business() {
        return Err(FailureReason::AlreadyOwnsBusiness);
    }
    if ctx.actor.assets < STARTUP_COST {
        return Err(FailureReason::InsufficientFunds {
            required: STARTUP_COST,
            available: ctx.actor.assets,
        });
    }

    let kind = params.choice("type", BusinessKind::Tech);
    let owner = ctx.actor.name.clone();
    let business_name = params
        .text("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("{owner}'s {} Company", kind.label()), str::to_string);

    ctx.actor.assets -= STARTUP_COST;
    let mut business = Business::founded(business_name.clone(), kind);
    business.valuation = STARTUP_COST;

    let mut chance = (ctx.actor.financial_intelligence
        + ctx.actor.business_vision
        + ctx.actor.leadership)
        / 300.0;
    chance += std::mem::take(&mut ctx.actor.business_idea_bonus);
    chance += ctx.actor.education_level.venture_bonus();
    chance += ctx.actor.network.strength(NetworkDomain::Business) / 200.0;
    if ctx.state.family_traits.has(FamilyTrait::BusinessAcumen) {
        chance += 0.1;
    }
    if ctx.state.achievements.is_completed(AchievementId::Entrepreneur) {
        chance += 0.15;
    }
    let chance = (chance * ctx.state.economy.multiplier(EconomyLens::Startup)).clamp(0.2, 0.9);

    let mut outcome = Outcome::ok("Business founded")
        .with("business_name", business_name.as_str())
        .with("business_type", kind.as_str())
        .with("investment", STARTUP_COST)
        .with("success_chance", chance);

    if ctx.draw() < chance {
        business.profit = ctx.roll(1_000, 3_000);
        ctx.note(format!(
            "{owner} founded \"{business_name}\" and it got off to a strong start, earning about {:.0} a month.",
            business.profit
        ));
        match kind {
            BusinessKind::Tech => {
                business.valuation *= 1.2;
                ctx.note(format!("As a tech company, \"{business_name}\" has real growth potential."));
            }
            BusinessKind::Restaurant => {
                business.reputation += 10.0;
                ctx.note(format!("\"{business_name}\" has a great location and quickly drew regulars."));
            }
            BusinessKind::Retail => {
                business.profit *= 1.1;
                ctx.note(format!("\"{business_name}\" runs a flexible model with steady cash flow."));
            }
            BusinessKind::Education => {
                business.reputation += 15.0;
                ctx.actor.intelligence += 2.0;
                ctx.note(format!("\"{business_name}\" earned a name for quality teaching."));
            }
        }
        outcome.set("outcome", "success");
    } else {
        business.profit = ctx.roll(-1_000, 500);
        ctx.note(format!(
            "{owner} founded \"{business_name}\", but the early days are proving hard."
        ));
        let challenge = pick_scenario(ctx, "business_challenges", "cash flow is tight");
        ctx.note(format!("The main challenge: {challenge}."));
        outcome.set("outcome", "challenge");
        outcome.set("challenge", challenge);
    }
    outcome.set("profit", business.profit);

    let start = if business.profit > 0.0 { "good" } else { "difficult" };
    let request = NarrativeRequest::new(
        "business_story",
        "Describe the beginning of this character's entrepreneurial story in under 100 words.",
    )
    .var("name", owner.as_str())
    .var("gender", ctx.actor.gender.as_str())
    .var("age", ctx.actor.age)
    .var("leadership", ctx.actor.leadership)
    .var("business", business_name.as_str())
    .var("business_type", kind.as_str())
    .var("start", start);
    let story = ctx.narrate(&request);
    outcome.set("business_story", story);

    let network_gain = ctx.roll(5, 15);
    ctx.actor.network.add(NetworkDomain::Business, network_gain);
    outcome.set("network_gain", network_gain);

    ctx.actor.business = Some(business);
    ctx.achieve(AchievementId::Entrepreneur, 1.0);
    outcome.set("achievement", AchievementId::Entrepreneur.as_str());
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusinessFocus {
    Marketing,
    Hiring,
    RnD,
    #[default]
    CostControl,
    Strategy,
    Financing,
}

impl BusinessFocus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marketing => "marketing",
            Self::Hiring => "hiring",
            Self::RnD => "r_and_d",
            Self::CostControl => "cost_control",
            Self::Strategy => "strategy",
            Self::Financing => "financing",
        }
    }
}

impl fmt::Display for BusinessFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessFocus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-', '&'], "_").as_str() {
            "marketing" => Ok(Self::Marketing),
            "hiring" | "recruiting" => Ok(Self::Hiring),
            "r_and_d" | "rnd" | "r_d" | "research" => Ok(Self::RnD),
            "cost_control" | "costs" => Ok(Self::CostControl),
            "strategy" => Ok(Self::Strategy),
            "financing" | "fundraising" => Ok(Self::Financing),
            _ => Err(()),
        }
    }
}

pub(super) fn manage_business<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    let Some(mut business) = ctx.actor.business.clone() else {
        return Err(FailureReason::NoBusiness);
    };
    ctx.spend_energy(15, 25)?;
    let focus = params.choice("focus", BusinessFocus::CostControl);
    let owner = ctx.actor.name.clone();
    let label = business.name.clone();

    let skill = (ctx.actor.leadership + ctx.actor.business_vision + ctx.actor.financial_intelligence)
        / 300.0;
    let contacts = ctx.actor.network.strength(NetworkDomain::Business);
    let mut network_bonus = contacts / 200.0;
    if focus == BusinessFocus::Financing && contacts > 60.0 {
        network_bonus *= 1.5;
    }
    let scale_factor = if business.scale > 80.0 {
        1.2
    } else if business.scale > 50.0 {
        1.1
    } else {
        1.0
    };
    let chance = ((skill + ctx.actor.education_level.venture_bonus() + network_bonus)
        * ctx.state.economy.multiplier(EconomyLens::Management)
        * scale_factor)
        .clamp(0.2, 0.9);

    let mut outcome = Outcome::ok("Business managed")
        .with("focus", focus.as_str())
        .with("business_name", label.as_str())
        .with("success_chance", chance);

    if ctx.draw() < chance {
        match focus {
            BusinessFocus::Marketing => {
                let gain = ctx.roll(5, 15);
                let before = business.reputation;
                business.reputation = (before + gain).clamp(REPUTATION_FLOOR, CEILING);
                let adjustment = (business.reputation - before) * 100.0;
                business.profit += adjustment;
                ctx.note(format!(
                    "Reputation rose from {before:.0} to {:.0}.",
                    business.reputation
                ));
                outcome.set("reputation_gain", gain);
                outcome.set("profit_adjustment", adjustment);
            }
            BusinessFocus::Hiring => {
                let gain = ctx.uniform(2.0, 5.0);
                let before = business.scale;
                business.scale = (before + gain).clamp(SCALE_FLOOR, CEILING);
                business.employees = crate::numbers::trunc_f64_to_u32(business.scale / 2.0);
                business.valuation = business.implied_valuation();
                ctx.note(format!(
                    "The company grew from scale {before:.1} to {:.1} with {} employees.",
                    business.scale, business.employees
                ));
                outcome.set("scale_gain", gain);
            }
            BusinessFocus::RnD => {
                let gain = ctx.roll(500, 2_000);
                business.profit += gain;
                ctx.note(format!(
                    "Monthly profit rose by {gain:.0} to {:.0}.",
                    business.profit
                ));
                outcome.set("profit_gain", gain);
            }
            BusinessFocus::CostControl => {
                let adjustment = business.valuation * ctx.roll(5, 15) / 100.0;
                business.valuation += adjustment;
                ctx.note(format!(
                    "Operations steadied and the valuation grew by {adjustment:.0}."
                ));
                outcome.set("value_adjustment", adjustment);
            }
            BusinessFocus::Strategy => {
                let reputation = ctx.roll(10, 30) / 3.0;
                let profit = ctx.roll(10, 30) * 50.0;
                let value = ctx.roll(10, 30) * 1_000.0;
                business.reputation = (business.reputation + reputation).clamp(REPUTATION_FLOOR, CEILING);
                business.profit += profit;
                business.valuation += value;
                ctx.note("The strategic shift paid off and brightened the long-term outlook.");
                outcome.set("reputation_gain", reputation);
                outcome.set("profit_adjustment", profit);
                outcome.set("value_adjustment", value);
            }
            BusinessFocus::Financing => {
                let amount = business.valuation * ctx.roll(20, 50) / 100.0;
                let dilution = ctx.roll(20, 50) / 200.0;
                ctx.actor.assets += amount * 0.1;
                business.scale += ctx.roll(20, 50) / 5.0;
                business.profit += amount * 0.02;
                business.valuation += amount;
                ctx.note(format!(
                    "The company raised {amount:.0} and expanded quickly, diluting {:.1}% of equity.",
                    dilution * 100.0
                ));
                outcome.set("financing_amount", amount);
                outcome.set("dilution", dilution);
                if amount > 1_000_000.0 {
                    let prestige = ctx.roll(3, 8);
                    ctx.state.family_prestige += prestige;
                    ctx.note(format!("The large raise for \"{label}\" lifted the family's prestige."));
                    outcome.set("prestige_gain", prestige);
                }
            }
        }
        ctx.note(format!("{owner}'s {focus} push paid off for \"{label}\"."));
        outcome.set("outcome", "success");
    } else {
        match focus {
            BusinessFocus::Marketing => {
                let change = ctx.roll(-5, 5);
                business.reputation = (business.reputation + change).clamp(REPUTATION_FLOOR, CEILING);
                outcome.set("reputation_change", change);
            }
            BusinessFocus::Hiring => {
                let change = ctx.uniform(-1.0, 2.0);
                business.scale = (business.scale + change).clamp(SCALE_FLOOR, CEILING);
                business.valuation = business.implied_valuation();
                outcome.set("scale_change", change);
            }
            BusinessFocus::RnD => {
                let change = ctx.roll(-500, 500);
                business.profit += change;
                outcome.set("profit_change", change);
            }
            BusinessFocus::CostControl => {
                let change = business.valuation * ctx.roll(-10, 5) / 100.0;
                business.valuation += change;
                outcome.set("value_change", change);
            }
            BusinessFocus::Strategy => {
                let reputation = ctx.roll(-15, 5) / 3.0;
                let profit = ctx.roll(-15, 5) * 50.0;
                let value = ctx.roll(-15, 5) * 1_000.0;
                business.reputation = (business.reputation + reputation).clamp(REPUTATION_FLOOR, CEILING);
                business.profit += profit;
                business.valuation += value;
                outcome.set("reputation_change", reputation);
                outcome.set("profit_change", profit);
                outcome.set("value_change", value);
            }
            BusinessFocus::Financing => {
                let reputation_loss = ctx.roll(-10, 0).abs() / 2.0;
                business.reputation -= reputation_loss;
                let stress = ctx.roll(10, 20);
                ctx.actor.stress_level += stress;
                let reason = pick_scenario(ctx, "financing_rejections", "investors found the valuation too high");
                ctx.note(format!(
                    "The funding round fell through ({reason}), and {owner} felt the strain."
                ));
                outcome.set("reputation_loss", reputation_loss);
                outcome.set("stress_increase", stress);
                outcome.set("failure_reason", reason);
            }
        }
        ctx.note(format!("{owner}'s {focus} push made little difference to \"{label}\"."));
        outcome.set("outcome", "failure");
    }

    business.employees = crate::numbers::trunc_f64_to_u32(business.scale / 2.0);

    if ctx.chance(0.3) {
        ctx.actor.leadership += 0.2;
        outcome.set("leadership_gain", 0.2);
    }
    if ctx.chance(0.2) {
        let gain = ctx.roll(1, 2);
        ctx.actor.network.add(NetworkDomain::Business, gain);
        outcome.set("network_gain", gain);
    }

    outcome.set("business_profit", business.profit);
    outcome.set("business_scale", business.scale);
    outcome.set("business_value", business.valuation);
    outcome.set("business_reputation", business.reputation);
    ctx.actor.business = Some(business);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use super::super::{ActivityKind, ActivityParams, FailureReason, resolve};
    use super::BusinessFocus;
    use crate::achievements::AchievementId;
    use crate::character::{Business, BusinessKind};
    use rand::rngs::mock::StepRng;

    #[test]
    fn founding_a_tech_company() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.assets = 60_000.0;
            player.business_idea_bonus = 0.05;
        }
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::StartBusiness, &ActivityParams::new(), &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("success")));
        assert_eq!(outcome.field("business_name"), Some(&serde_json::json!("Ivy Marsh's Tech Company")));
        let player = state.player().cloned().unwrap_or_default();
        assert!((player.assets - 10_000.0).abs() < f64::EPSILON);
        assert!(player.business_idea_bonus.abs() < f64::EPSILON);
        let business = player.business.unwrap_or_else(|| Business::founded("", BusinessKind::Tech));
        assert!((business.valuation - 60_000.0).abs() < 1e-9);
        assert!((business.profit - 1_000.0).abs() < f64::EPSILON);
        assert!((state.achievements.progress(AchievementId::Entrepreneur) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn only_one_business_at_a_time() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.assets = 500_000.0;
            player.business = Some(Business::founded("Corner Shop", BusinessKind::Retail));
        }
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::StartBusiness, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.reason, Some(FailureReason::AlreadyOwnsBusiness));
        assert!((state.player().map_or(0.0, |p| p.assets) - 500_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn managing_requires_a_business() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::ManageBusiness, &ActivityParams::new(), &mut rng, &mut narrator);
        assert_eq!(outcome.reason, Some(FailureReason::NoBusiness));
        assert!((state.player().map_or(0.0, |p| p.energy) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hiring_grows_scale_and_headcount() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.business = Some(Business::founded("Ivy Labs", BusinessKind::Tech));
        }
        let params = ActivityParams::new().with("focus", "hiring");
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::ManageBusiness, &params, &mut rng, &mut narrator);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("success")));
        let business = state
            .player()
            .and_then(|p| p.business.clone())
            .unwrap_or_else(|| Business::founded("", BusinessKind::Tech));
        assert!((business.scale - 12.0).abs() < 1e-9);
        assert_eq!(business.employees, 6);
        assert!((business.valuation - 120_000.0).abs() < 1e-6);
    }

    #[test]
    fn failed_fundraising_costs_reputation_and_calm() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.business = Some(Business::founded("Ivy Labs", BusinessKind::Tech));
        }
        let params = ActivityParams::new().with("focus", "financing");
        let mut rng = StepRng::new(0xF000_0000_0000_0000, 0);
        let outcome = resolve(&mut state, id, ActivityKind::ManageBusiness, &params, &mut rng, &mut narrator);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("failure")));
        assert!(outcome.field("failure_reason").is_some());
        assert_eq!(outcome.number("stress_increase"), Some(10.0));
        assert_eq!(outcome.number("reputation_loss"), Some(5.0));
    }

    #[test]
    fn focus_names_parse() {
        assert_eq!("R&D".parse::<BusinessFocus>(), Ok(BusinessFocus::RnD));
        assert_eq!("cost control".parse::<BusinessFocus>(), Ok(BusinessFocus::CostControl));
        assert!("daydreaming".parse::<BusinessFocus>().is_err());
    }
}
