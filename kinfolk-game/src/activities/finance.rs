//! Investment and charitable giving.

use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;

use super::{ActivityCtx, ActivityParams, FailureReason, Outcome, Resolution};
use crate::achievements::{AchievementId, FamilyTrait};
use crate::character::{AssetClass, Donation, NetworkDomain};
use crate::constants::{MAJOR_DONATION, MIN_DONATION, MIN_INVESTMENT};
use crate::economy::EconomyLens;
use crate::narrative::catalog;

fn requested_amount(params: &ActivityParams, minimum: f64) -> Result<f64, FailureReason> {
    if !params.contains("amount") {
        return Ok(minimum);
    }
    params
        .number("amount")
        .ok_or(FailureReason::AmountTooLow { minimum })
}

fn require_funds(available: f64, minimum: f64, amount: f64) -> Result<(), FailureReason> {
    if !amount.is_finite() {
        return Err(FailureReason::AmountTooLow { minimum });
    }
    if available < minimum {
        return Err(FailureReason::InsufficientFunds {
            required: minimum,
            available,
        });
    }
    if amount < minimum {
        return Err(FailureReason::AmountTooLow { minimum });
    }
    if amount > available {
        return Err(FailureReason::InsufficientFunds {
            required: amount,
            available,
        });
    }
    Ok(())
}

pub(super) fn investment<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    let class = params.choice("type", AssetClass::Stock);
    let amount = requested_amount(params, MIN_INVESTMENT)?;
    require_funds(ctx.actor.assets, MIN_INVESTMENT, amount)?;

    let name = ctx.actor.name.clone();
    ctx.actor.assets -= amount;
    ctx.actor.portfolio.deposit(class, amount);

    let (base_return, risk) = class.trade_profile();
    let mut chance = (0.5 + (ctx.actor.financial_intelligence - 50.0) / 100.0).clamp(0.1, 0.9);
    let economy = ctx.state.economy.multiplier(EconomyLens::Investment);

    let mut network = 1.0;
    let business = ctx.actor.network.strength(NetworkDomain::Business);
    if business > 40.0 {
        network += business / 200.0;
        if network > 1.1 {
            ctx.note(format!("{name}'s business contacts shared useful market intelligence."));
        }
    }
    let fortune = if ctx.state.family_traits.has(FamilyTrait::FortunesFavor) {
        1.1
    } else {
        1.0
    };

    let mut hot = false;
    if ctx.chance(0.3) {
        hot = AssetClass::ALL.choose(&mut *ctx.rng) == Some(&class);
        if hot {
            ctx.note(format!("The {class} market is rising; a good time to buy."));
            chance += 0.1;
        }
    }

    let multiplier = economy * network * fortune;
    let final_chance = (chance * multiplier).clamp(0.1, 0.9);
    let mut outcome = Outcome::ok(format!("Invested in {class}"))
        .with("amount", amount)
        .with("type", class.as_str())
        .with("success_chance", final_chance);

    if ctx.draw() < final_chance {
        let base = if hot { base_return * 1.5 } else { base_return };
        let rate = ctx.uniform(0.05, base * 2.0) * multiplier;
        let profit = amount * rate;
        ctx.actor.assets += amount + profit;
        ctx.actor.financial_intelligence += 0.5;
        ctx.actor.portfolio.book_return(class, profit);
        ctx.note(format!(
            "{name} invested {amount:.0} in {class} and made {profit:.2} ({:.1}% return)!",
            rate * 100.0
        ));
        outcome.set("outcome", "success");
        outcome.set("profit", profit);
        outcome.set("return_rate", rate);
        outcome.set("financial_intelligence_gain", 0.5);
        if ctx.chance(0.3) {
            let gain = ctx.roll(1, 3);
            ctx.actor.network.add(NetworkDomain::Business, gain);
            outcome.set("network_gain", gain);
        }
    } else {
        let rate = ctx.uniform(0.1, risk * 1.5) / economy;
        let loss = amount * rate;
        ctx.actor.assets += amount - loss;
        ctx.actor.portfolio.book_return(class, -loss);
        ctx.note(format!(
            "{name} invested {amount:.0} in {class} and lost {loss:.2} ({:.1}% loss).",
            rate * 100.0
        ));
        outcome.set("outcome", "loss");
        outcome.set("loss", loss);
        outcome.set("loss_rate", rate);
    }

    if ctx.actor.portfolio.total_principal() > 1_000_000.0 {
        ctx.achieve(AchievementId::InvestmentTycoon, 1.0);
        outcome.set("achievement", AchievementId::InvestmentTycoon.as_str());
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharityCause {
    #[default]
    Education,
    Medical,
    PovertyRelief,
    Environmental,
}

impl CharityCause {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Medical => "medical",
            Self::PovertyRelief => "poverty_relief",
            Self::Environmental => "environmental",
        }
    }

    /// `(family prestige per 1000 donated, flat happiness)`.
    const fn effect(self) -> (f64, f64) {
        match self {
            Self::Education => (0.2, 5.0),
            Self::Medical => (0.5, 10.0),
            Self::PovertyRelief => (1.0, 15.0),
            Self::Environmental => (0.3, 8.0),
        }
    }
}

impl fmt::Display for CharityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharityCause {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "education" | "education_fund" => Ok(Self::Education),
            "medical" | "medical_aid" => Ok(Self::Medical),
            "poverty_relief" | "poverty" => Ok(Self::PovertyRelief),
            "environmental" | "environment" => Ok(Self::Environmental),
            _ => Err(()),
        }
    }
}

pub(super) fn charity<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    let cause = params.choice("type", CharityCause::Education);
    let amount = requested_amount(params, MIN_DONATION)?;
    require_funds(ctx.actor.assets, MIN_DONATION, amount)?;

    let name = ctx.actor.name.clone();
    let (rate, happiness_gain) = cause.effect();
    let prestige_gain = rate * amount / 1_000.0;
    ctx.actor.assets -= amount;
    ctx.actor.happiness += happiness_gain;
    ctx.actor.total_donations += amount;
    ctx.state.family_prestige += prestige_gain;
    ctx.note(format!(
        "{name} donated {amount:.0} to {cause} causes; family prestige +{prestige_gain:.1}."
    ));

    let mut outcome = Outcome::ok("Donation made")
        .with("charity_type", cause.as_str())
        .with("amount", amount)
        .with("prestige_gain", prestige_gain)
        .with("happiness_gain", happiness_gain);

    if amount >= MAJOR_DONATION {
        ctx.note(format!(
            "The generous gift drew wide attention and burnished {name}'s public image."
        ));
        let career_gain = ctx.roll(5, 10);
        ctx.actor.career_prestige += career_gain;
        outcome.set("career_prestige_gain", career_gain);

        if ctx.chance(0.5)
            && let Some(title) = catalog()
                .scenario_pool("honorary_titles")
                .choose(&mut *ctx.rng)
                .cloned()
        {
            ctx.note(format!("{name} was named \"{title}\"."));
            ctx.actor.honorary_titles.push(title.clone());
            outcome.set("honorary_title", title);
        }

        ctx.actor.donations.push(Donation {
            day: ctx.state.day,
            cause: cause.as_str().to_string(),
            amount,
        });

        let id = AchievementId::Philanthropist;
        let goal = id.goal();
        if !ctx.state.achievements.is_completed(id)
            && ctx.state.achievements.progress(id) + amount >= goal.target
        {
            outcome.set("achievement", id.as_str());
            outcome.set("extra_prestige", 10);
        }
        ctx.achieve(id, amount);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use super::super::{ActivityKind, ActivityParams, FailureReason, resolve};
    use crate::achievements::AchievementId;
    use crate::character::AssetClass;
    use rand::rngs::mock::StepRng;

    #[test]
    fn investing_everything_tracks_principal_on_a_win() {
        let (mut state, id, mut narrator) = setup(100.0);
        let params = ActivityParams::new()
            .with("type", "stock")
            .with("amount", 1_000);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Investment, &params, &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("success")));
        let player = state.player().cloned().unwrap_or_default();
        assert!((player.portfolio.principal_in(AssetClass::Stock) - 1_000.0).abs() < f64::EPSILON);
        assert!(player.assets > 1_000.0);
    }

    #[test]
    fn losing_investment_still_tracks_principal() {
        let (mut state, id, mut narrator) = setup(100.0);
        let params = ActivityParams::new()
            .with("type", "stock")
            .with("amount", 1_000);
        let mut rng = StepRng::new(0xF000_0000_0000_0000, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Investment, &params, &mut rng, &mut narrator);
        assert_eq!(outcome.field("outcome"), Some(&serde_json::json!("loss")));
        let player = state.player().cloned().unwrap_or_default();
        assert!((player.portfolio.principal_in(AssetClass::Stock) - 1_000.0).abs() < f64::EPSILON);
        assert!(player.assets < 1_000.0);
        assert!(player.assets > 0.0);
    }

    #[test]
    fn small_amounts_are_rejected() {
        let (mut state, id, mut narrator) = setup(100.0);
        let params = ActivityParams::new().with("amount", 500);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Investment, &params, &mut rng, &mut narrator);
        assert_eq!(outcome.reason, Some(FailureReason::AmountTooLow { minimum: 1_000.0 }));
        assert!((state.player().map_or(0.0, |p| p.assets) - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_amounts_leave_money_untouched() {
        let (mut state, id, mut narrator) = setup(100.0);
        let prestige = state.family_prestige;
        let mut rng = StepRng::new(0, 0);
        for (kind, raw, minimum) in [
            (ActivityKind::Investment, "NaN", 1_000.0),
            (ActivityKind::Investment, "inf", 1_000.0),
            (ActivityKind::Charity, "NaN", 1_000.0),
            (ActivityKind::Charity, "-inf", 1_000.0),
        ] {
            let params = ActivityParams::new().with("type", "medical").with("amount", raw);
            let outcome = resolve(&mut state, id, kind, &params, &mut rng, &mut narrator);
            assert!(!outcome.success, "{kind} accepted {raw}");
            assert_eq!(outcome.reason, Some(FailureReason::AmountTooLow { minimum }));
        }
        let player = state.player().cloned().unwrap_or_default();
        assert!((player.assets - 1_000.0).abs() < f64::EPSILON);
        assert!((state.family_prestige - prestige).abs() < f64::EPSILON);
        state.recompute_fortune();
        assert!(state.family_fortune.is_finite());
    }

    #[test]
    fn funds_check_refuses_non_finite_amounts() {
        assert_eq!(
            super::require_funds(5_000.0, 1_000.0, f64::NAN),
            Err(FailureReason::AmountTooLow { minimum: 1_000.0 })
        );
        assert!(super::require_funds(5_000.0, 1_000.0, 2_000.0).is_ok());
    }

    #[test]
    fn major_gift_feeds_philanthropy() {
        let (mut state, id, mut narrator) = setup(100.0);
        if let Some(player) = state.player_mut() {
            player.assets = 2_000_000.0;
        }
        let params = ActivityParams::new()
            .with("type", "poverty_relief")
            .with("amount", 1_000_000);
        let mut rng = StepRng::new(0, 0);
        let outcome = resolve(&mut state, id, ActivityKind::Charity, &params, &mut rng, &mut narrator);
        assert!(outcome.success);
        assert_eq!(outcome.number("prestige_gain"), Some(1_000.0));
        assert!(outcome.field("honorary_title").is_some());
        assert!(state.achievements.is_completed(AchievementId::Philanthropist));
        // 50 base + 1000 from the gift + 10 from the achievement.
        assert!((state.family_prestige - 1_060.0).abs() < 1e-9);
        let player = state.player().cloned().unwrap_or_default();
        assert_eq!(player.donations.len(), 1);
        assert_eq!(player.honorary_titles.len(), 1);
    }
}
