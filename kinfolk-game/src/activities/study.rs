use rand::Rng;
use rand::seq::SliceRandom;
use std::str::FromStr;

use super::{ActivityCtx, ActivityParams, Outcome, Resolution};
use crate::achievements::FamilyTrait;
use crate::character::{MentalState, NetworkDomain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyFocus {
    Financial,
    Emotional,
    Leadership,
    Business,
    #[default]
    General,
}

impl StudyFocus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Emotional => "emotional",
            Self::Leadership => "leadership",
            Self::Business => "business",
            Self::General => "general",
        }
    }
}

impl FromStr for StudyFocus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.contains("financ") {
            Ok(Self::Financial)
        } else if s.contains("emotion") {
            Ok(Self::Emotional)
        } else if s.contains("leader") {
            Ok(Self::Leadership)
        } else if s.contains("business") {
            Ok(Self::Business)
        } else if s.contains("general") || s.contains("knowledge") {
            Ok(Self::General)
        } else {
            Err(())
        }
    }
}

const INVESTMENT_TIPS: [&str; 3] = [
    "spotted a promising investment opportunity",
    "picked up a new money-management technique",
    "learned about an important market trend",
];

pub(super) fn study<R: Rng + ?Sized>(
    ctx: &mut ActivityCtx<'_, R>,
    params: &ActivityParams,
) -> Resolution {
    ctx.spend_energy(15, 25)?;
    let focus = params.choice("focus", StudyFocus::General);
    let name = ctx.actor.name.clone();

    let mut intelligence_gain = 0.1;
    if ctx.state.family_traits.has(FamilyTrait::WisdomLegacy) {
        intelligence_gain *= 1.5;
    }
    ctx.actor.intelligence += intelligence_gain;

    let mut efficiency = 1.0 + ctx.draw() * 0.5;
    let academic = ctx.actor.network.strength(NetworkDomain::Academic);
    if academic > 30.0 {
        let bonus = academic / 100.0;
        efficiency += bonus;
        if bonus > 0.2 {
            ctx.note(format!(
                "{name} tapped academic contacts for better study material."
            ));
        }
    }
    match ctx.actor.mental_state {
        MentalState::Depressed => efficiency *= 0.6,
        MentalState::Anxious => efficiency *= 0.8,
        MentalState::Normal => {}
    }
    let base_gain = ctx.roll(1, 2) / 10.0 * efficiency;

    let mut outcome = Outcome::ok("Study session complete")
        .with("focus", focus.as_str())
        .with("intelligence_gain", intelligence_gain)
        .with("efficiency", efficiency);

    match focus {
        StudyFocus::Financial => {
            ctx.actor.financial_intelligence += base_gain;
            ctx.note(format!(
                "{name} studied personal finance; financial intelligence +{base_gain:.2}."
            ));
            outcome.set("financial_intelligence_gain", base_gain);
            if ctx.chance(0.1) {
                let tip = INVESTMENT_TIPS
                    .choose(&mut *ctx.rng)
                    .copied()
                    .unwrap_or(INVESTMENT_TIPS[0]);
                let bonus = base_gain * 0.5;
                ctx.actor.financial_intelligence += bonus;
                ctx.note(format!("While studying, {name} {tip}."));
                outcome.set("investment_bonus", bonus);
            }
        }
        StudyFocus::Emotional => {
            ctx.actor.emotional_intelligence += base_gain;
            ctx.note(format!(
                "{name} practised emotional awareness; emotional intelligence +{base_gain:.2}."
            ));
            outcome.set("emotional_intelligence_gain", base_gain);
            if ctx.chance(0.3) {
                let charm_gain = base_gain * 0.7;
                ctx.actor.charm += charm_gain;
                ctx.note(format!("{name}'s social skills improved; charm +{charm_gain:.2}."));
                outcome.set("charm_gain", charm_gain);
            }
        }
        StudyFocus::Leadership => {
            ctx.actor.leadership += base_gain;
            ctx.note(format!(
                "{name} studied team management; leadership +{base_gain:.2}."
            ));
            outcome.set("leadership_gain", base_gain);
            if ctx.chance(0.2) && ctx.actor.is_employed() {
                let prestige_gain = ctx.roll(1, 3);
                ctx.actor.career_prestige += prestige_gain;
                ctx.note(format!("{name} showed leadership at work; career prestige +{prestige_gain:.0}."));
                outcome.set("prestige_gain", prestige_gain);
            }
        }
        StudyFocus::Business => {
            ctx.actor.business_vision += base_gain;
            ctx.note(format!(
                "{name} studied market analysis; business vision +{base_gain:.2}."
            ));
            outcome.set("business_vision_gain", base_gain);
            if ctx.chance(0.1) && !ctx.actor.has_business() {
                ctx.actor.business_idea_bonus += 0.05;
                ctx.note(format!("{name} came up with a promising startup idea."));
                outcome.set("business_idea", true);
            }
        }
        StudyFocus::General => {
            ctx.actor.intelligence += base_gain;
            ctx.note(format!(
                "{name} studied professional skills; intelligence +{base_gain:.2}."
            ));
            outcome.set("knowledge_gain", base_gain);
        }
    }

    let stress_reduction = ctx.roll(1, 3);
    ctx.actor.stress_level = (ctx.actor.stress_level - stress_reduction).max(0.0);
    ctx.actor.happiness += 1.0;
    outcome.set("stress_reduction", stress_reduction);
    outcome.set("happiness_gain", 1);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use super::super::{ActivityKind, ActivityParams, resolve};
    use super::StudyFocus;
    use crate::achievements::FamilyTrait;
    use rand::rngs::mock::StepRng;

    #[test]
    fn focus_parses_loosely() {
        assert_eq!("Financial literacy".parse::<StudyFocus>(), Ok(StudyFocus::Financial));
        assert_eq!("leadership".parse::<StudyFocus>(), Ok(StudyFocus::Leadership));
        assert!("juggling".parse::<StudyFocus>().is_err());
    }

    #[test]
    fn wisdom_legacy_boosts_base_gain() {
        let (mut state, id, mut narrator) = setup(100.0);
        state.family_traits.unlock(FamilyTrait::WisdomLegacy);
        let before = state.player().map_or(0.0, |p| p.intelligence);
        let mut rng = StepRng::new(0, 0);
        let params = ActivityParams::new().with("focus", "general");
        let outcome = resolve(&mut state, id, ActivityKind::Study, &params, &mut rng, &mut narrator);
        assert!(outcome.success);
        let gain = outcome.number("intelligence_gain").unwrap_or_default();
        assert!((gain - 0.15).abs() < 1e-9);
        // 0.15 flat plus a 0.1 knowledge gain at unit efficiency.
        let after = state.player().map_or(0.0, |p| p.intelligence);
        assert!((after - before - 0.25).abs() < 1e-9);
    }

    #[test]
    fn business_study_can_spark_an_idea() {
        let (mut state, id, mut narrator) = setup(100.0);
        let mut rng = StepRng::new(0, 0);
        let params = ActivityParams::new().with("focus", "business");
        let outcome = resolve(&mut state, id, ActivityKind::Study, &params, &mut rng, &mut narrator);
        assert_eq!(outcome.field("business_idea"), Some(&serde_json::json!(true)));
        assert!((state.player().map_or(0.0, |p| p.business_idea_bonus) - 0.05).abs() < 1e-9);
    }
}
