//! National salary bands per job title, scaled by a city factor.

use chrono::NaiveDate;
use serde::Serialize;

use crate::job_value::market::{MarketSource, SalaryRange};

const DEFAULT_TITLE: &str = "software developer";

/// (title, min, max, median)
const TITLE_SALARIES: &[(&str, f64, f64, f64)] = &[
    ("software engineer", 75_000.0, 150_000.0, 105_000.0),
    ("senior software engineer", 110_000.0, 180_000.0, 140_000.0),
    ("software developer", 70_000.0, 140_000.0, 95_000.0),
    ("frontend developer", 70_000.0, 135_000.0, 90_000.0),
    ("backend developer", 80_000.0, 150_000.0, 105_000.0),
    ("fullstack developer", 85_000.0, 160_000.0, 110_000.0),
    ("product manager", 90_000.0, 170_000.0, 120_000.0),
    ("project manager", 75_000.0, 150_000.0, 100_000.0),
    ("data scientist", 90_000.0, 170_000.0, 120_000.0),
    ("data analyst", 65_000.0, 120_000.0, 85_000.0),
    ("ux designer", 70_000.0, 130_000.0, 90_000.0),
    ("ui designer", 65_000.0, 125_000.0, 85_000.0),
    ("devops engineer", 90_000.0, 160_000.0, 120_000.0),
    ("qa engineer", 65_000.0, 120_000.0, 85_000.0),
    ("marketing manager", 60_000.0, 120_000.0, 80_000.0),
    ("sales manager", 65_000.0, 140_000.0, 90_000.0),
    ("hr manager", 60_000.0, 110_000.0, 80_000.0),
    ("recruiter", 45_000.0, 90_000.0, 60_000.0),
];

const CITY_FACTORS: &[(&str, f64)] = &[
    ("new york", 1.3),
    ("san francisco", 1.4),
    ("silicon valley", 1.4),
    ("los angeles", 1.25),
    ("chicago", 1.1),
    ("austin", 1.05),
    ("denver", 1.05),
    ("seattle", 1.2),
    ("boston", 1.2),
    ("dallas", 1.0),
    ("miami", 1.0),
    ("atlanta", 1.0),
    ("detroit", 0.9),
    ("cleveland", 0.85),
    ("phoenix", 0.95),
    ("las vegas", 0.9),
    ("portland", 1.05),
    ("nashville", 0.95),
    ("remote", 1.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryData {
    pub title: String,
    pub matched_title: &'static str,
    pub location: String,
    pub national_salary: SalaryRange,
    pub local_salary: SalaryRange,
    pub location_factor: f64,
    pub source: MarketSource,
    pub last_updated: NaiveDate,
}

/// Either string contains the other, case-insensitively.
fn overlaps(input: &str, key: &str) -> bool {
    input.contains(key) || key.contains(input)
}

/// The most specific table title overlapping `title`, else software developer.
fn match_title(title: &str) -> (&'static str, SalaryRange) {
    let title = title.trim().to_lowercase();
    let row = TITLE_SALARIES
        .iter()
        .filter(|(key, ..)| !title.is_empty() && overlaps(&title, key))
        .max_by_key(|(key, ..)| key.len())
        .or_else(|| TITLE_SALARIES.iter().find(|(key, ..)| *key == DEFAULT_TITLE));

    match row {
        Some(&(key, min, max, median)) => (key, SalaryRange { min, max, median }),
        None => (
            DEFAULT_TITLE,
            SalaryRange {
                min: 70_000.0,
                max: 140_000.0,
                median: 95_000.0,
            },
        ),
    }
}

fn city_factor(location: &str) -> f64 {
    let location = location.trim().to_lowercase();
    if location.is_empty() {
        return 1.0;
    }
    CITY_FACTORS
        .iter()
        .find(|(city, _)| overlaps(&location, city))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

pub fn salary_data(title: &str, location: Option<&str>, today: NaiveDate) -> SalaryData {
    let (matched_title, national) = match_title(title);
    let factor = location.map(city_factor).unwrap_or(1.0);
    let scale = |v: f64| (v * factor).round();

    SalaryData {
        title: title.to_string(),
        matched_title,
        location: location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or("National Average")
            .to_string(),
        national_salary: national,
        local_salary: SalaryRange {
            min: scale(national.min),
            max: scale(national.max),
            median: scale(national.median),
        },
        location_factor: factor,
        source: MarketSource::LocalEstimate,
        last_updated: today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_most_specific_title_wins() {
        let data = salary_data("Senior Software Engineer", None, today());
        assert_eq!(data.matched_title, "senior software engineer");
        assert_eq!(data.national_salary.median, 140_000.0);
        assert_eq!(data.location, "National Average");
        assert_eq!(data.location_factor, 1.0);
    }

    #[test]
    fn test_unknown_title_falls_back_to_developer() {
        let data = salary_data("Lighthouse Keeper", Some("Detroit"), today());
        assert_eq!(data.matched_title, "software developer");
        assert_eq!(data.location_factor, 0.9);
        assert_eq!(data.local_salary.median, (95_000.0_f64 * 0.9).round());
    }

    #[test]
    fn test_city_scales_local_band() {
        let data = salary_data("Data Analyst", Some("San Francisco, CA"), today());
        assert_eq!(data.national_salary.min, 65_000.0);
        assert_eq!(data.local_salary.min, 91_000.0);
        assert_eq!(data.local_salary.max, 168_000.0);
        assert_eq!(data.last_updated, today());
    }

    #[test]
    fn test_unknown_city_is_national() {
        let data = salary_data("Recruiter", Some("Omaha"), today());
        assert_eq!(data.local_salary, data.national_salary);
    }
}
