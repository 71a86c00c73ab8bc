//! Job catalog used by job hunting and partner generation.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::character::EducationLevel;

const DEFAULT_JOB_DATA: &str = include_str!("../data/jobs.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobOpening {
    pub title: String,
    pub min_salary: i32,
    pub max_salary: i32,
    pub min_education: EducationLevel,
}

impl JobOpening {
    /// Roll the monthly salary offered for this opening.
    pub fn roll_salary<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (low, high) = if self.min_salary <= self.max_salary {
            (self.min_salary, self.max_salary)
        } else {
            (self.max_salary, self.min_salary)
        };
        f64::from(rng.gen_range(low..=high))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobCatalog {
    #[serde(default)]
    pub standard: Vec<JobOpening>,
    #[serde(default)]
    pub advanced: Vec<JobOpening>,
    #[serde(default)]
    pub fallback: Vec<JobOpening>,
    #[serde(default)]
    pub partner_jobs: Vec<String>,
    #[serde(default)]
    pub high_status_jobs: Vec<String>,
    #[serde(default)]
    pub spouse_jobs: Vec<String>,
}

impl JobCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_JOB_DATA).unwrap_or_default()
    }

    /// Openings a candidate with `education` qualifies for. Advanced roles open
    /// at bachelor level; anyone left without options gets the fallback pool.
    #[must_use]
    pub fn eligible(&self, education: EducationLevel) -> Vec<&JobOpening> {
        let mut openings: Vec<&JobOpening> = self
            .standard
            .iter()
            .filter(|job| education >= job.min_education)
            .collect();
        if education >= EducationLevel::Bachelor {
            openings.extend(
                self.advanced
                    .iter()
                    .filter(|job| education >= job.min_education),
            );
        }
        if openings.is_empty() {
            openings.extend(self.fallback.iter());
        }
        openings
    }

    /// Occupation for a generated partner; well-off characters meet high-status people.
    pub fn partner_job<R: Rng + ?Sized>(&self, high_status: bool, rng: &mut R) -> String {
        let pool = if high_status && !self.high_status_jobs.is_empty() {
            &self.high_status_jobs
        } else {
            &self.partner_jobs
        };
        pool.choose(rng)
            .cloned()
            .unwrap_or_else(|| "Freelancer".to_string())
    }

    pub fn spouse_job<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.spouse_jobs
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "Freelancer".to_string())
    }
}

#[must_use]
pub fn catalog() -> &'static JobCatalog {
    static CATALOG: OnceLock<JobCatalog> = OnceLock::new();
    CATALOG.get_or_init(JobCatalog::load_from_static)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn middle_school_gets_fallback_jobs() {
        let openings = catalog().eligible(EducationLevel::MiddleSchool);
        assert_eq!(openings.len(), 4);
        assert!(openings.iter().any(|job| job.title == "Courier"));
    }

    #[test]
    fn advanced_roles_respect_minimum_education() {
        let bachelor = catalog().eligible(EducationLevel::Bachelor);
        assert!(bachelor.iter().any(|job| job.title == "Senior Engineer"));
        assert!(!bachelor.iter().any(|job| job.title == "Professor"));
        let doctorate = catalog().eligible(EducationLevel::Doctorate);
        assert!(doctorate.iter().any(|job| job.title == "Professor"));
        assert_eq!(doctorate.len(), 16);
    }

    #[test]
    fn salary_roll_stays_in_band() {
        let mut rng = StepRng::new(0, 0);
        let job = &catalog().standard[0];
        let salary = job.roll_salary(&mut rng);
        assert!((f64::from(job.min_salary)..=f64::from(job.max_salary)).contains(&salary));
    }
}
