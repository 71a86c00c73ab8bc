//! Name generation from the embedded name catalog.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::character::Gender;

const DEFAULT_NAME_DATA: &str = include_str!("../data/names.json");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameCatalog {
    #[serde(default)]
    pub surnames: Vec<String>,
    #[serde(default)]
    pub male: Vec<String>,
    #[serde(default)]
    pub female: Vec<String>,
}

impl NameCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_NAME_DATA).unwrap_or_default()
    }

    fn given_pool(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    /// Given name, with a middle name 30% of the time.
    pub fn given_name<R: Rng + ?Sized>(&self, gender: Gender, rng: &mut R) -> String {
        let pool = self.given_pool(gender);
        let first = pool.choose(rng).map_or("Alex", String::as_str);
        if rng.gen_bool(0.3)
            && let Some(middle) = pool.choose(rng)
            && middle != first
        {
            return format!("{first} {middle}");
        }
        first.to_string()
    }

    /// Full name with a random surname.
    pub fn full_name<R: Rng + ?Sized>(&self, gender: Gender, rng: &mut R) -> String {
        let surname = self.surnames.choose(rng).map_or("Doe", String::as_str);
        format!("{} {surname}", self.given_name(gender, rng))
    }

    /// Full name carrying an existing surname, for children born into the family.
    pub fn family_name<R: Rng + ?Sized>(&self, surname: &str, gender: Gender, rng: &mut R) -> String {
        format!("{} {surname}", self.given_name(gender, rng))
    }
}

#[must_use]
pub fn catalog() -> &'static NameCatalog {
    static CATALOG: OnceLock<NameCatalog> = OnceLock::new();
    CATALOG.get_or_init(NameCatalog::load_from_static)
}

/// Last whitespace-separated token of a full name.
#[must_use]
pub fn surname_of(full_name: &str) -> &str {
    full_name.split_whitespace().last().unwrap_or(full_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn catalog_loads_twenty_surnames() {
        assert_eq!(catalog().surnames.len(), 20);
        assert!(!catalog().male.is_empty());
        assert!(!catalog().female.is_empty());
    }

    #[test]
    fn family_names_keep_the_surname() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            let name = catalog().family_name("Holloway", Gender::Female, &mut rng);
            assert_eq!(surname_of(&name), "Holloway");
            let random = catalog().full_name(Gender::Male, &mut rng);
            assert!(catalog().surnames.iter().any(|s| s == surname_of(&random)));
        }
    }
}
