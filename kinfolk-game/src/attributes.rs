//! Attribute model: physique-derived values and the clamping rules every mutation ends with.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::character::{Character, Gender};
use crate::constants::{
    BMI_APPEARANCE_HEAVY, BMI_NORMAL_CEILING, BMI_OVERWEIGHT_CEILING, BMI_UNDERWEIGHT,
    ENERGY_MAX, EVENT_STAT_FLOOR, IDEAL_BMI_FEMALE, IDEAL_BMI_MALE, STAT_MAX, STAT_MIN,
};
use crate::numbers::trunc_f64_to_i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStatus {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl WeightStatus {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < BMI_UNDERWEIGHT {
            Self::Underweight
        } else if bmi < BMI_NORMAL_CEILING {
            Self::Normal
        } else if bmi < BMI_OVERWEIGHT_CEILING {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

impl fmt::Display for WeightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-mass index from kilograms and centimetres. Zero height yields 0.
#[must_use]
pub fn bmi_of(weight_kg: f64, height_cm: f64) -> f64 {
    let metres = height_cm / 100.0;
    if metres <= 0.0 {
        return 0.0;
    }
    weight_kg / (metres * metres)
}

#[must_use]
pub fn bmi(character: &Character) -> f64 {
    bmi_of(character.weight, character.height)
}

#[must_use]
pub fn weight_status(character: &Character) -> WeightStatus {
    WeightStatus::from_bmi(bmi(character))
}

#[must_use]
pub fn ideal_weight(gender: Gender, height_cm: f64) -> f64 {
    let metres = height_cm / 100.0;
    let target = match gender {
        Gender::Male => IDEAL_BMI_MALE,
        Gender::Female => IDEAL_BMI_FEMALE,
    };
    metres * metres * target
}

/// Appearance shift from height alone.
#[must_use]
pub fn height_adjustment(gender: Gender, height_cm: f64) -> f64 {
    let height = height_cm.floor();
    match gender {
        Gender::Male if height > 180.0 => ((height - 180.0) / 2.0).floor().min(10.0),
        Gender::Male if height < 170.0 => -((170.0 - height) / 2.0).floor().min(10.0),
        Gender::Female if height > 170.0 => ((height - 170.0) / 2.0).floor().min(5.0),
        Gender::Female if height < 160.0 => -((160.0 - height) / 3.0).floor().min(5.0),
        _ => 0.0,
    }
}

/// Appearance shift from body mass.
#[must_use]
pub fn weight_adjustment(bmi: f64) -> f64 {
    if bmi < BMI_UNDERWEIGHT {
        -f64::from(trunc_f64_to_i32((BMI_UNDERWEIGHT - bmi) * 2.0).min(5))
    } else if bmi > BMI_APPEARANCE_HEAVY {
        -f64::from(trunc_f64_to_i32((bmi - BMI_APPEARANCE_HEAVY) * 3.0).min(15))
    } else {
        0.0
    }
}

/// One-off health cost of starting life outside the healthy BMI band.
#[must_use]
pub fn genesis_health_penalty(bmi: f64) -> f64 {
    if bmi < BMI_UNDERWEIGHT {
        f64::from(trunc_f64_to_i32((BMI_UNDERWEIGHT - bmi) * 3.0).min(10))
    } else if bmi > BMI_APPEARANCE_HEAVY {
        f64::from(trunc_f64_to_i32((bmi - BMI_APPEARANCE_HEAVY) * 3.0).min(15))
    } else {
        0.0
    }
}

/// Reset appearance to its baseline (surgery quality when operated) and reapply
/// the physique adjustments. Pure with respect to everything but `appearance`.
pub fn recompute_appearance(character: &mut Character) {
    let baseline = character.appearance_baseline();
    let adjusted = baseline
        + height_adjustment(character.gender, character.height)
        + weight_adjustment(bmi(character));
    character.appearance = clamp_stat(adjusted);
}

#[must_use]
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Clamp used by narrated random-event effects, which never push a stat below 1.
#[must_use]
pub fn clamp_event_stat(value: f64) -> f64 {
    if value.is_nan() {
        return EVENT_STAT_FLOOR;
    }
    value.clamp(EVENT_STAT_FLOOR, STAT_MAX)
}

#[must_use]
pub fn floor_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

/// Apply every clamp rule to a character.
pub fn normalize(character: &mut Character) {
    let c = character;
    c.energy = c.energy.clamp(0.0, ENERGY_MAX);
    for stat in [
        &mut c.health,
        &mut c.innate_appearance,
        &mut c.appearance,
        &mut c.charm,
        &mut c.intelligence,
        &mut c.emotional_intelligence,
        &mut c.financial_intelligence,
        &mut c.luck,
        &mut c.self_esteem,
        &mut c.happiness,
        &mut c.leadership,
        &mut c.business_vision,
        &mut c.risk_management,
        &mut c.relationship_satisfaction,
        &mut c.loyalty,
        &mut c.sex_drive,
    ] {
        *stat = clamp_stat(*stat);
    }
    for floored in [
        &mut c.stress_level,
        &mut c.trauma,
        &mut c.depression_risk,
        &mut c.anxiety_risk,
        &mut c.career_prestige,
        &mut c.personal_connections,
        &mut c.debt,
        &mut c.salary,
        &mut c.business_idea_bonus,
    ] {
        *floored = floor_zero(*floored);
    }
    c.network.clamp();
    if let Some(business) = c.business.as_mut() {
        business.scale = clamp_stat(business.scale);
        business.reputation = clamp_stat(business.reputation);
    }
    if let Some(quality) = c.surgery.quality.as_mut() {
        *quality = clamp_stat(*quality);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;

    #[test]
    fn weight_status_bands() {
        assert_eq!(WeightStatus::from_bmi(17.0), WeightStatus::Underweight);
        assert_eq!(WeightStatus::from_bmi(22.0), WeightStatus::Normal);
        assert_eq!(WeightStatus::from_bmi(26.0), WeightStatus::Overweight);
        assert_eq!(WeightStatus::from_bmi(31.0), WeightStatus::Obese);
    }

    #[test]
    fn height_adjustments_are_capped() {
        assert!((height_adjustment(Gender::Male, 186.0) - 3.0).abs() < 1e-9);
        assert!((height_adjustment(Gender::Male, 210.0) - 10.0).abs() < 1e-9);
        assert!((height_adjustment(Gender::Male, 165.0) + 2.0).abs() < 1e-9);
        assert!((height_adjustment(Gender::Female, 176.0) - 3.0).abs() < 1e-9);
        assert!((height_adjustment(Gender::Female, 154.0) + 2.0).abs() < 1e-9);
        assert!(height_adjustment(Gender::Female, 165.0).abs() < 1e-9);
    }

    #[test]
    fn weight_adjustment_penalises_extremes() {
        assert!(weight_adjustment(22.0).abs() < 1e-9);
        assert!((weight_adjustment(17.0) + 3.0).abs() < 1e-9);
        assert!((weight_adjustment(40.0) + 15.0).abs() < 1e-9);
        assert!((genesis_health_penalty(15.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn recompute_appearance_is_idempotent() {
        let mut character = Character::new("Mara Quinn", Gender::Female, 28);
        character.height = 178.0;
        character.weight = 90.0;
        recompute_appearance(&mut character);
        let first = character.appearance;
        recompute_appearance(&mut character);
        assert!((first - character.appearance).abs() < f64::EPSILON);
    }

    #[test]
    fn recompute_uses_surgery_baseline() {
        let mut character = Character::new("Ivo Brandt", Gender::Male, 35);
        character.height = 175.0;
        character.weight = 67.0;
        character.surgery.original_appearance = Some(character.innate_appearance);
        character.surgery.quality = Some(88.0);
        recompute_appearance(&mut character);
        assert!((character.appearance - 88.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_clamps_every_bounded_stat() {
        let mut character = Character::new("Tess Vale", Gender::Female, 40);
        character.health = 140.0;
        character.happiness = -12.0;
        character.stress_level = -3.0;
        character.energy = 180.0;
        normalize(&mut character);
        assert!((character.health - 100.0).abs() < f64::EPSILON);
        assert!(character.happiness.abs() < f64::EPSILON);
        assert!(character.stress_level.abs() < f64::EPSILON);
        assert!((character.energy - 100.0).abs() < f64::EPSILON);
    }
}
