//! The daily world clock.
//!
//! One call to [`advance_day`] runs every per-character upkeep, rolls the
//! player's random event, moves the calendar and the economy, pays holiday and
//! birthday effects, re-aggregates the family fortune and finally bumps the day.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::achievements::AchievementId;
use crate::attributes::{self, floor_zero};
use crate::character::{AssetClass, Character, MentalState};
use crate::constants::{
    ANXIETY_ONSET, ANXIETY_RECOVERY, DAYS_PER_YEAR, DEPRESSION_ONSET, DEPRESSION_RECOVERY,
    ECONOMY_CYCLE_DAYS, ECONOMY_SHIFT_CHANCE, ENERGY_MAX, HIGH_STRESS, RANDOM_EVENT_CHANCE,
    SURGERY_COMPLICATION_DAILY,
};
use crate::economy::{EconomyLens, EconomyStatus, Season, day_of_year};
use crate::family::CharacterId;
use crate::narrative::Narrator;
use crate::numbers::{round_f64_to_i32, trunc_f64_to_u32};
use crate::random_events::{self, RandomEvent};
use crate::rng::{chance, roll, uniform};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentalTransition {
    pub character: CharacterId,
    pub from: MentalState,
    pub to: MentalState,
}

/// What happened during one simulated day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    /// The day that was simulated; `state.day` is one past it afterwards.
    pub day: u32,
    pub random_event: Option<RandomEvent>,
    pub season_changed: Option<Season>,
    pub economy_changed: Option<EconomyStatus>,
    pub holiday_bonus: Option<f64>,
    pub birthdays: Vec<CharacterId>,
    pub mental_transitions: Vec<MentalTransition>,
    pub complications: Vec<CharacterId>,
}

/// Advance the world by one day.
pub fn advance_day<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    narrator: &mut Narrator,
) -> DayReport {
    let today = day_of_year(state.day);
    let mut report = DayReport {
        day: state.day,
        ..DayReport::default()
    };

    let economy = state.economy;
    for id in state.registry.living_ids() {
        let Some(character) = state.registry.get_mut(id) else {
            continue;
        };
        let notes = daily_upkeep(id, character, economy, rng, &mut report);
        for note in notes {
            state.log(note, "daily");
        }
    }

    if state.player().is_some_and(|player| player.alive) && chance(rng, RANDOM_EVENT_CHANCE) {
        report.random_event = random_events::strike(state, rng, narrator);
    }

    let season = Season::from_day_of_year(today);
    if season != state.season {
        state.season = season;
        state.log(season_line(season), "season");
        report.season_changed = Some(season);
    }

    if today % ECONOMY_CYCLE_DAYS == 0 && chance(rng, ECONOMY_SHIFT_CHANCE) {
        let previous = state.economy;
        let next = previous.next(rng);
        if next != previous {
            state.economy = next;
            state.log(economy_line(next), "economy");
            log::info!("economy moved from {previous} to {next} on day {}", state.day);
            report.economy_changed = Some(next);
        }
    }

    if today == 1 {
        let bonus = roll(rng, 1_000, 5_000);
        if let Some(player) = state.player_mut() {
            player.assets += bonus;
            let name = player.name.clone();
            state.log(
                format!("The new year arrived! {name} received a holiday gift of {bonus:.0}."),
                "holiday",
            );
            report.holiday_bonus = Some(bonus);
        }
    }

    celebrate_birthdays(state, today, rng, &mut report);

    state.recompute_fortune();
    state.day = state.day.saturating_add(1);
    report
}

fn daily_upkeep<R: Rng + ?Sized>(
    id: CharacterId,
    c: &mut Character,
    economy: EconomyStatus,
    rng: &mut R,
    report: &mut DayReport,
) -> Vec<String> {
    let mut notes = Vec::new();
    c.energy = (c.energy + 1.0).min(ENERGY_MAX);

    if c.stress_level > HIGH_STRESS {
        c.happiness -= 1.0;
        if chance(rng, 0.1) {
            c.health -= 1.0;
        }
    }

    if let Some((from, to)) = reevaluate_mental_state(c, rng) {
        notes.push(mental_line(&c.name, from, to));
        report.mental_transitions.push(MentalTransition {
            character: id,
            from,
            to,
        });
    }

    accrue_business(c, economy, rng);

    if c.surgery.has_had_surgery()
        && !c.surgery.complications
        && chance(rng, SURGERY_COMPLICATION_DAILY)
    {
        let drop = roll(rng, 5, 15);
        c.surgery.complications = true;
        c.surgery.quality = Some(floor_zero(c.appearance_baseline() - drop));
        notes.push(format!(
            "{}'s cosmetic surgery developed complications and their looks suffered.",
            c.name
        ));
        report.complications.push(id);
    }

    attributes::normalize(c);
    attributes::recompute_appearance(c);
    accrue_portfolio(c, economy, rng);
    notes
}

/// Move the risk accumulators and step the mental state at most one tier.
pub fn reevaluate_mental_state<R: Rng + ?Sized>(
    c: &mut Character,
    rng: &mut R,
) -> Option<(MentalState, MentalState)> {
    if c.happiness < 30.0 || c.stress_level > 70.0 || c.trauma > 30.0 {
        c.depression_risk += roll(rng, 1, 3);
    } else {
        c.depression_risk = floor_zero(c.depression_risk - 1.0);
    }
    if c.stress_level > 60.0 || c.has_been_abused || c.trauma > 20.0 {
        c.anxiety_risk += roll(rng, 1, 2);
    } else {
        c.anxiety_risk = floor_zero(c.anxiety_risk - 1.0);
    }

    let from = c.mental_state;
    let to = match from {
        MentalState::Normal
            if c.anxiety_risk > ANXIETY_ONSET || c.depression_risk > DEPRESSION_ONSET =>
        {
            MentalState::Anxious
        }
        MentalState::Anxious if c.anxiety_risk < ANXIETY_RECOVERY => MentalState::Normal,
        MentalState::Anxious if c.depression_risk > DEPRESSION_ONSET => MentalState::Depressed,
        MentalState::Depressed if c.depression_risk < DEPRESSION_RECOVERY => MentalState::Anxious,
        unchanged => unchanged,
    };
    if to == from {
        return None;
    }
    c.mental_state = to;
    Some((from, to))
}

/// Daily business profit plus an occasional growth spurt.
pub fn accrue_business<R: Rng + ?Sized>(c: &mut Character, economy: EconomyStatus, rng: &mut R) {
    let skill = (c.financial_intelligence + c.business_vision + c.leadership + c.risk_management)
        / 400.0;
    let Some(business) = c.business.as_mut() else {
        return;
    };
    let base = business.scale * 10.0 * (business.reputation / 50.0);
    let profit =
        base * economy.multiplier(EconomyLens::Accrual) * skill * uniform(rng, 0.8, 1.2);
    business.profit = f64::from(round_f64_to_i32(profit));
    c.assets += business.profit;

    if profit > 0.0 && chance(rng, 0.1) {
        let growth = uniform(rng, 0.01, 0.05) * business.scale;
        business.scale = (business.scale + growth).min(100.0);
        business.employees = trunc_f64_to_u32(business.scale / 2.0);
        business.valuation = business.implied_valuation();
    }
}

/// Daily drift on every open position.
pub fn accrue_portfolio<R: Rng + ?Sized>(c: &mut Character, economy: EconomyStatus, rng: &mut R) {
    if c.portfolio.total_principal() <= 0.0 {
        return;
    }
    let days = f64::from(DAYS_PER_YEAR);
    let acumen = (c.financial_intelligence - 50.0) / 500.0 / days;
    let factor = economy.multiplier(EconomyLens::Accrual);
    for class in AssetClass::ALL {
        let principal = c.portfolio.principal_in(class);
        if principal <= 0.0 {
            continue;
        }
        let (base, volatility) = class.accrual_profile();
        let rate = base * factor / days + uniform(rng, -volatility, volatility) / days + acumen;
        let gain = principal * rate;
        c.assets += gain;
        c.portfolio.book_return(class, gain);
    }
}

fn celebrate_birthdays<R: Rng + ?Sized>(
    state: &mut GameState,
    today: u32,
    rng: &mut R,
    report: &mut DayReport,
) {
    let player = state.player;
    let mut lines = Vec::new();
    for id in state.registry.living_ids() {
        let Some(c) = state.registry.get_mut(id) else {
            continue;
        };
        if c.birthday % DAYS_PER_YEAR != today {
            continue;
        }
        c.age += 1;
        if Some(id) == player {
            c.happiness += roll(rng, 10, 20);
            attributes::normalize(c);
        }
        lines.push(format!("Today is {}'s {} birthday!", c.name, ordinal(c.age)));
        report.birthdays.push(id);
    }
    for line in lines {
        state.log(line, "birthday");
    }
    if !report.birthdays.is_empty() {
        let eldest = state
            .registry
            .iter()
            .filter(|(_, c)| c.alive)
            .map(|(_, c)| c.age)
            .max()
            .unwrap_or(0);
        state.advance_achievement(AchievementId::Longevity, f64::from(eldest));
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn season_line(season: Season) -> &'static str {
    match season {
        Season::Spring => "Spring has come and everything is turning green again.",
        Season::Summer => "Summer arrived with long, hot days.",
        Season::Autumn => "Autumn set in under clear, crisp skies.",
        Season::Winter => "Winter drew in and the air turned cold.",
    }
}

fn economy_line(status: EconomyStatus) -> &'static str {
    match status {
        EconomyStatus::Boom => "The economy is booming! Every industry sees new opportunities.",
        EconomyStatus::Normal => "The economy has settled into steady, ordinary growth.",
        EconomyStatus::Recession => {
            "The economy slid into recession. Jobs and investments are harder to come by."
        }
    }
}

fn mental_line(name: &str, from: MentalState, to: MentalState) -> String {
    match (from, to) {
        (MentalState::Normal, _) => format!("{name} has grown anxious under prolonged pressure."),
        (MentalState::Anxious, MentalState::Normal) => {
            format!("{name}'s anxiety eased and they feel like themselves again.")
        }
        (MentalState::Anxious, _) => format!("{name}'s anxiety deepened into depression."),
        (MentalState::Depressed, _) => {
            format!("{name}'s depression lifted a little, though the anxiety lingers.")
        }
    }
}
