//! Character entity: identity, attributes, economy and relationship links.
//!
//! Characters never own each other. Spouse, parent and child links are
//! [`CharacterId`] values resolved through the family registry.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::achievements::{FamilyTrait, FamilyTraits};
use crate::attributes::{self, bmi_of, genesis_health_penalty, ideal_weight};
use crate::constants::{
    DAYS_PER_YEAR, STARTING_ASSETS, STARTING_CONNECTIONS, STARTING_HAPPINESS, STARTING_PRESTIGE,
    STARTING_SATISFACTION, STARTING_STRESS, STAT_MAX, UNEMPLOYED,
};
use crate::family::CharacterId;
use crate::rng::{pick_weighted, roll};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "man" => Ok(Self::Male),
            "female" | "f" | "woman" => Ok(Self::Female),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SexualOrientation {
    #[default]
    Heterosexual,
    Homosexual,
    Bisexual,
}

impl SexualOrientation {
    /// Roll an orientation with the population split 90/5/5.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let pool = [
            (Self::Heterosexual, 0.90),
            (Self::Homosexual, 0.05),
            (Self::Bisexual, 0.05),
        ];
        pick_weighted(&pool, rng).copied().unwrap_or_default()
    }

    /// Gender of a partner this character would pursue.
    pub fn partner_gender<R: Rng + ?Sized>(self, own: Gender, rng: &mut R) -> Gender {
        match self {
            Self::Heterosexual => own.opposite(),
            Self::Homosexual => own,
            Self::Bisexual => {
                if rng.gen_bool(0.5) {
                    own
                } else {
                    own.opposite()
                }
            }
        }
    }
}

/// Education ladder, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    MiddleSchool,
    #[default]
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MiddleSchool => "middle_school",
            Self::HighSchool => "high_school",
            Self::Associate => "associate",
            Self::Bachelor => "bachelor",
            Self::Master => "master",
            Self::Doctorate => "doctorate",
        }
    }

    /// Intelligence granted when a character is created with this education.
    #[must_use]
    pub const fn creation_bonus(self) -> f64 {
        match self {
            Self::MiddleSchool | Self::HighSchool => 0.0,
            Self::Associate => 5.0,
            Self::Bachelor => 10.0,
            Self::Master => 15.0,
            Self::Doctorate => 20.0,
        }
    }

    /// Additive hiring chance bonus.
    #[must_use]
    pub const fn hiring_bonus(self) -> f64 {
        match self {
            Self::MiddleSchool => 0.0,
            Self::HighSchool => 0.1,
            Self::Associate => 0.2,
            Self::Bachelor => 0.3,
            Self::Master => 0.4,
            Self::Doctorate => 0.5,
        }
    }

    /// Additive bonus for founding and running a business.
    #[must_use]
    pub const fn venture_bonus(self) -> f64 {
        match self {
            Self::MiddleSchool => 0.0,
            Self::HighSchool => 0.05,
            Self::Associate => 0.10,
            Self::Bachelor => 0.15,
            Self::Master => 0.20,
            Self::Doctorate => 0.25,
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "middle_school" | "middle" => Ok(Self::MiddleSchool),
            "high_school" | "high" => Ok(Self::HighSchool),
            "associate" | "associates" | "college" => Ok(Self::Associate),
            "bachelor" | "bachelors" | "undergraduate" => Ok(Self::Bachelor),
            "master" | "masters" => Ok(Self::Master),
            "doctorate" | "phd" | "doctor" => Ok(Self::Doctorate),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Single,
    Dating,
    Married,
}

impl RelationshipStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Dating => "dating",
            Self::Married => "married",
        }
    }
}

/// Mental health tiers, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum MentalState {
    #[default]
    Normal,
    Anxious,
    Depressed,
}

impl MentalState {
    #[must_use]
    pub const fn severity(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Anxious => "anxious",
            Self::Depressed => "depressed",
        }
    }

    /// One tier milder; `Normal` stays put.
    #[must_use]
    pub const fn milder(self) -> Self {
        match self {
            Self::Depressed => Self::Anxious,
            Self::Anxious | Self::Normal => Self::Normal,
        }
    }
}

impl fmt::Display for MentalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkDomain {
    Business,
    Political,
    Academic,
    Entertainment,
    Medical,
}

impl NetworkDomain {
    pub const ALL: [Self; 5] = [
        Self::Business,
        Self::Political,
        Self::Academic,
        Self::Entertainment,
        Self::Medical,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Political => "political",
            Self::Academic => "academic",
            Self::Entertainment => "entertainment",
            Self::Medical => "medical",
        }
    }
}

/// Social capital per domain. All five domains are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Network(BTreeMap<NetworkDomain, f64>);

impl Default for Network {
    fn default() -> Self {
        Self(NetworkDomain::ALL.into_iter().map(|domain| (domain, 0.0)).collect())
    }
}

impl Network {
    #[must_use]
    pub fn strength(&self, domain: NetworkDomain) -> f64 {
        self.0.get(&domain).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, domain: NetworkDomain, delta: f64) {
        let entry = self.0.entry(domain).or_insert(0.0);
        *entry = attributes::clamp_stat(*entry + delta);
    }

    pub fn iter(&self) -> impl Iterator<Item = (NetworkDomain, f64)> + '_ {
        self.0.iter().map(|(domain, value)| (*domain, *value))
    }

    /// Restore missing domains and clamp strengths.
    pub fn clamp(&mut self) {
        for domain in NetworkDomain::ALL {
            let entry = self.0.entry(domain).or_insert(0.0);
            *entry = attributes::clamp_stat(*entry);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Stock,
    Fund,
    Bond,
    RealEstate,
    Other,
}

impl AssetClass {
    pub const ALL: [Self; 5] = [
        Self::Stock,
        Self::Fund,
        Self::Bond,
        Self::RealEstate,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Fund => "fund",
            Self::Bond => "bond",
            Self::RealEstate => "real_estate",
            Self::Other => "other",
        }
    }

    /// Annual `(base rate, volatility)` used by the daily portfolio accrual.
    #[must_use]
    pub const fn accrual_profile(self) -> (f64, f64) {
        match self {
            Self::Stock => (0.12, 0.15),
            Self::Fund => (0.08, 0.08),
            Self::Bond => (0.05, 0.03),
            Self::RealEstate => (0.10, 0.05),
            Self::Other => (0.15, 0.20),
        }
    }

    /// `(base return, risk)` for a one-off investment decision.
    #[must_use]
    pub const fn trade_profile(self) -> (f64, f64) {
        match self {
            Self::Stock => (0.15, 0.25),
            Self::Fund | Self::Other => (0.08, 0.15),
            Self::Bond => (0.05, 0.05),
            Self::RealEstate => (0.20, 0.10),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "stock" | "stocks" => Ok(Self::Stock),
            "fund" | "funds" => Ok(Self::Fund),
            "bond" | "bonds" => Ok(Self::Bond),
            "real_estate" | "property" | "realestate" => Ok(Self::RealEstate),
            "other" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

/// Principal invested per class plus cumulative returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub principal: BTreeMap<AssetClass, f64>,
    #[serde(default)]
    pub returns: BTreeMap<AssetClass, f64>,
}

impl Portfolio {
    #[must_use]
    pub fn principal_in(&self, class: AssetClass) -> f64 {
        self.principal.get(&class).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn returns_in(&self, class: AssetClass) -> f64 {
        self.returns.get(&class).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn total_principal(&self) -> f64 {
        self.principal.values().sum()
    }

    pub fn deposit(&mut self, class: AssetClass, amount: f64) {
        *self.principal.entry(class).or_insert(0.0) += amount;
    }

    pub fn book_return(&mut self, class: AssetClass, amount: f64) {
        *self.returns.entry(class).or_insert(0.0) += amount;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusinessKind {
    #[default]
    Tech,
    Restaurant,
    Retail,
    Education,
}

impl BusinessKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Restaurant => "restaurant",
            Self::Retail => "retail",
            Self::Education => "education",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tech => "Tech",
            Self::Restaurant => "Restaurant",
            Self::Retail => "Retail",
            Self::Education => "Education",
        }
    }
}

impl FromStr for BusinessKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tech" | "technology" => Ok(Self::Tech),
            "restaurant" | "food" => Ok(Self::Restaurant),
            "retail" | "shop" => Ok(Self::Retail),
            "education" | "school" => Ok(Self::Education),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
    pub kind: BusinessKind,
    /// 0..=100
    pub scale: f64,
    pub profit: f64,
    pub valuation: f64,
    pub employees: u32,
    /// 0..=100
    pub reputation: f64,
}

impl Business {
    #[must_use]
    pub fn founded(name: impl Into<String>, kind: BusinessKind) -> Self {
        Self {
            name: name.into(),
            kind,
            scale: 10.0,
            profit: 0.0,
            valuation: 50_000.0,
            employees: 3,
            reputation: 50.0,
        }
    }

    /// Valuation implied by scale and reputation.
    #[must_use]
    pub fn implied_valuation(&self) -> f64 {
        self.scale * 10_000.0 * (self.reputation / 50.0)
    }
}

/// Cosmetic surgery history. `original_appearance` is written once, on the first procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurgeryRecord {
    #[serde(default)]
    pub original_appearance: Option<f64>,
    /// Post-surgery appearance baseline.
    #[serde(default)]
    pub quality: Option<f64>,
    #[serde(default)]
    pub complications: bool,
    #[serde(default)]
    pub procedures: u32,
}

impl SurgeryRecord {
    #[must_use]
    pub const fn has_had_surgery(&self) -> bool {
        self.original_appearance.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub day: u32,
    pub cause: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartnerBackground {
    #[default]
    Ordinary,
    Wealthy,
    Poor,
    Prominent,
}

/// Undisclosed motive of a generated partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenMotive {
    GoldDigger,
    LooksDriven,
}

/// Someone met while socializing or dating who is not yet part of the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCandidate {
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub job: String,
    pub charm: f64,
    pub appearance: f64,
    pub intelligence: f64,
    pub background: PartnerBackground,
    #[serde(default)]
    pub hidden_motive: Option<HiddenMotive>,
    pub affection: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    /// Day-of-year, 1..=365.
    pub birthday: u32,
    pub alive: bool,

    pub energy: f64,
    pub health: f64,
    /// Appearance before physique adjustments.
    pub innate_appearance: f64,
    pub appearance: f64,
    pub charm: f64,
    pub intelligence: f64,
    pub emotional_intelligence: f64,
    pub financial_intelligence: f64,
    pub luck: f64,
    pub height: f64,
    pub weight: f64,
    pub ideal_weight: f64,

    pub career_prestige: f64,
    pub personal_connections: f64,
    pub stress_level: f64,
    pub happiness: f64,
    pub sexual_orientation: SexualOrientation,
    pub sex_drive: f64,
    pub self_esteem: f64,
    pub trauma: f64,
    pub depression_risk: f64,
    pub anxiety_risk: f64,
    pub has_been_abused: bool,
    pub mental_state: MentalState,

    pub relationship_status: RelationshipStatus,
    pub relationship_satisfaction: f64,
    pub loyalty: f64,
    pub is_cheating: bool,
    pub courting: Option<PartnerCandidate>,
    pub spouse: Option<CharacterId>,
    pub children: Vec<CharacterId>,
    pub parents: Vec<CharacterId>,
    pub fertility_boosted: bool,
    pub contraception_active: bool,

    pub job: String,
    pub salary: f64,
    pub assets: f64,
    pub debt: f64,
    pub education_level: EducationLevel,
    pub network: Network,
    pub leadership: f64,
    pub business_vision: f64,
    pub risk_management: f64,
    pub business_idea_bonus: f64,
    pub business: Option<Business>,
    pub portfolio: Portfolio,
    pub surgery: SurgeryRecord,

    pub total_donations: f64,
    pub donations: Vec<Donation>,
    pub honorary_titles: Vec<String>,
}

impl Default for Character {
    fn default() -> Self {
        Self::new("", Gender::Male, 0)
    }
}

impl Character {
    /// Deterministic mid-range character. Used for fixtures and as the shell
    /// that [`Character::generate`] fills with rolled values.
    #[must_use]
    pub fn new(name: impl Into<String>, gender: Gender, age: u32) -> Self {
        let (height, weight) = match gender {
            Gender::Male => (176.0, 70.0),
            Gender::Female => (164.0, 56.0),
        };
        let mut character = Self {
            name: name.into(),
            gender,
            age,
            birthday: 1,
            alive: true,
            energy: 100.0,
            health: 80.0,
            innate_appearance: 65.0,
            appearance: 65.0,
            charm: 65.0,
            intelligence: 70.0,
            emotional_intelligence: 65.0,
            financial_intelligence: 65.0,
            luck: 65.0,
            height,
            weight,
            ideal_weight: ideal_weight(gender, height),
            career_prestige: STARTING_PRESTIGE,
            personal_connections: STARTING_CONNECTIONS,
            stress_level: STARTING_STRESS,
            happiness: STARTING_HAPPINESS,
            sexual_orientation: SexualOrientation::Heterosexual,
            sex_drive: 60.0,
            self_esteem: 70.0,
            trauma: 0.0,
            depression_risk: 0.0,
            anxiety_risk: 0.0,
            has_been_abused: false,
            mental_state: MentalState::Normal,
            relationship_status: RelationshipStatus::Single,
            relationship_satisfaction: STARTING_SATISFACTION,
            loyalty: 85.0,
            is_cheating: false,
            courting: None,
            spouse: None,
            children: Vec::new(),
            parents: Vec::new(),
            fertility_boosted: false,
            contraception_active: false,
            job: UNEMPLOYED.to_string(),
            salary: 0.0,
            assets: STARTING_ASSETS,
            debt: 0.0,
            education_level: EducationLevel::HighSchool,
            network: Network::default(),
            leadership: 65.0,
            business_vision: 65.0,
            risk_management: 65.0,
            business_idea_bonus: 0.0,
            business: None,
            portfolio: Portfolio::default(),
            surgery: SurgeryRecord::default(),
            total_donations: 0.0,
            donations: Vec::new(),
            honorary_titles: Vec::new(),
        };
        attributes::recompute_appearance(&mut character);
        character
    }

    /// Roll a fresh character. Unlocked family traits add their creation bonuses.
    pub fn generate<R: Rng + ?Sized>(
        name: impl Into<String>,
        gender: Gender,
        age: u32,
        traits: &FamilyTraits,
        rng: &mut R,
    ) -> Self {
        let mut c = Self::new(name, gender, age);
        c.birthday = rng.gen_range(1..=DAYS_PER_YEAR);
        c.health = roll(rng, 60, 100);
        c.innate_appearance = roll(rng, 40, 90);
        c.charm = roll(rng, 40, 90);
        c.intelligence = roll(rng, 40, 100);
        c.emotional_intelligence = roll(rng, 40, 90);
        c.financial_intelligence = roll(rng, 40, 90);
        c.luck = roll(rng, 30, 100);
        (c.height, c.weight) = match gender {
            Gender::Male => (roll(rng, 165, 190), roll(rng, 60, 90)),
            Gender::Female => (roll(rng, 155, 175), roll(rng, 45, 75)),
        };
        c.ideal_weight = ideal_weight(gender, c.height);
        c.sexual_orientation = SexualOrientation::roll(rng);
        c.sex_drive = roll(rng, 30, 90);
        c.self_esteem = roll(rng, 50, 90);
        c.loyalty = roll(rng, 70, 100);
        c.leadership = roll(rng, 40, 90);
        c.business_vision = roll(rng, 40, 90);
        c.risk_management = roll(rng, 40, 90);

        if traits.has(FamilyTrait::HealthyGenes) {
            c.health += 10.0;
        }
        if traits.has(FamilyTrait::CharismaticBearing) {
            c.charm += 5.0;
            c.innate_appearance += 5.0;
        }
        if traits.has(FamilyTrait::WisdomLegacy) {
            c.intelligence += 5.0;
        }
        if traits.has(FamilyTrait::BusinessAcumen) {
            c.financial_intelligence += 5.0;
        }
        if traits.has(FamilyTrait::FortunesFavor) {
            c.assets += 5_000.0;
        }

        c.health -= genesis_health_penalty(bmi_of(c.weight, c.height));
        c.innate_appearance = c.innate_appearance.min(STAT_MAX);
        attributes::normalize(&mut c);
        attributes::recompute_appearance(&mut c);
        c
    }

    #[must_use]
    pub fn is_employed(&self) -> bool {
        self.job != UNEMPLOYED
    }

    #[must_use]
    pub const fn has_business(&self) -> bool {
        self.business.is_some()
    }

    /// Appearance before physique adjustments: surgery quality once operated.
    #[must_use]
    pub fn appearance_baseline(&self) -> f64 {
        self.surgery.quality.unwrap_or(self.innate_appearance)
    }
}
