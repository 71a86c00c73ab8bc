//! Centralized balance and tuning constants for Kinfolk simulation logic.
//!
//! Values that more than one system reads live here so that balance changes
//! stay in one reviewed place. Activity-local magnitudes stay next to the
//! activity that rolls them.

// Attribute bounds ----------------------------------------------------------
pub(crate) const STAT_MIN: f64 = 0.0;
pub(crate) const STAT_MAX: f64 = 100.0;
pub(crate) const EVENT_STAT_FLOOR: f64 = 1.0;
pub(crate) const ENERGY_MAX: f64 = 100.0;

// Physique --------------------------------------------------------------------
pub(crate) const BMI_UNDERWEIGHT: f64 = 18.5;
pub(crate) const BMI_NORMAL_CEILING: f64 = 24.0;
pub(crate) const BMI_OVERWEIGHT_CEILING: f64 = 28.0;
pub(crate) const BMI_APPEARANCE_HEAVY: f64 = 25.0;
pub(crate) const IDEAL_BMI_MALE: f64 = 22.0;
pub(crate) const IDEAL_BMI_FEMALE: f64 = 21.0;

// Character genesis -------------------------------------------------------------
pub(crate) const STARTING_ASSETS: f64 = 1_000.0;
pub(crate) const STARTING_STRESS: f64 = 20.0;
pub(crate) const STARTING_HAPPINESS: f64 = 70.0;
pub(crate) const STARTING_PRESTIGE: f64 = 10.0;
pub(crate) const STARTING_CONNECTIONS: f64 = 10.0;
pub(crate) const STARTING_SATISFACTION: f64 = 80.0;
pub(crate) const STARTER_JOB: &str = "Junior Clerk";
pub(crate) const STARTER_SALARY: f64 = 5_000.0;
pub(crate) const UNEMPLOYED: &str = "Unemployed";
pub(crate) const ADULT_AGE: u32 = 18;
pub(crate) const DAYS_PER_YEAR: u32 = 365;

// World -------------------------------------------------------------------------
pub(crate) const STARTING_FORTUNE: f64 = 10_000.0;
pub(crate) const STARTING_FAMILY_PRESTIGE: f64 = 50.0;
pub(crate) const RANDOM_EVENT_CHANCE: f64 = 0.30;
pub(crate) const ECONOMY_CYCLE_DAYS: u32 = 90;
pub(crate) const ECONOMY_SHIFT_CHANCE: f64 = 0.30;
pub(crate) const SURGERY_COMPLICATION_DAILY: f64 = 0.001;
pub(crate) const HIGH_STRESS: f64 = 70.0;

// Mental health thresholds --------------------------------------------------------
pub(crate) const ANXIETY_ONSET: f64 = 50.0;
pub(crate) const DEPRESSION_ONSET: f64 = 70.0;
pub(crate) const ANXIETY_RECOVERY: f64 = 30.0;
pub(crate) const DEPRESSION_RECOVERY: f64 = 40.0;
pub(crate) const TREATED_DEPRESSION_RECOVERY: f64 = 50.0;
pub(crate) const TREATED_ANXIETY_RECOVERY: f64 = 40.0;

// Money gates -----------------------------------------------------------------------
pub(crate) const MIN_INVESTMENT: f64 = 1_000.0;
pub(crate) const MIN_DONATION: f64 = 1_000.0;
pub(crate) const STARTUP_COST: f64 = 50_000.0;
pub(crate) const SURGERY_MIN_ASSETS: f64 = 20_000.0;
pub(crate) const THERAPY_FEE: f64 = 3_000.0;
pub(crate) const MAJOR_DONATION: f64 = 100_000.0;
pub(crate) const WEDDING_ASSET_SHARE: f64 = 0.7;
pub(crate) const BIRTH_ASSET_SHARE: f64 = 0.5;
pub(crate) const PROPOSAL_ENERGY: f64 = 15.0;

// Narrative -------------------------------------------------------------------------
pub(crate) const NARRATIVE_CACHE_CAPACITY: usize = 500;
pub(crate) const NARRATIVE_FALLBACK: &str = "The narrative system is temporarily unavailable.";
pub(crate) const SNAPSHOT_EVENT_WINDOW: usize = 20;
