use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// A job posting from the catalog. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub mode: Mode,
    pub experience: String, // band label: "Fresher", "0-1", "1-3", "3-5"
    pub salary_range: String,
    pub skills: Vec<String>,
    pub posted_days_ago: u32,
    pub source: String, // "LinkedIn", "Indeed", etc.
    pub apply_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Remote,
    Hybrid,
    Onsite,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(Mode::Remote),
            "hybrid" => Ok(Mode::Hybrid),
            "onsite" => Ok(Mode::Onsite),
            other => Err(anyhow!("Unknown work mode: '{}'", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Remote => write!(f, "Remote"),
            Mode::Hybrid => write!(f, "Hybrid"),
            Mode::Onsite => write!(f, "Onsite"),
        }
    }
}

/// The user's matching criteria. At most one active set; stored as a single
/// JSON blob and replaced wholesale on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub role_keywords: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub preferred_modes: Vec<Mode>,
    pub experience_level: String, // exact band match only
    pub skills: Vec<String>,
    pub min_match_score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    NotApplied,
    Applied,
    Rejected,
    Selected,
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "notapplied" => Ok(ApplicationStatus::NotApplied),
            "applied" => Ok(ApplicationStatus::Applied),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "selected" => Ok(ApplicationStatus::Selected),
            other => Err(anyhow!(
                "Unknown status: '{}' (expected not-applied, applied, rejected, selected)",
                other
            )),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationStatus::NotApplied => write!(f, "Not Applied"),
            ApplicationStatus::Applied => write!(f, "Applied"),
            ApplicationStatus::Rejected => write!(f, "Rejected"),
            ApplicationStatus::Selected => write!(f, "Selected"),
        }
    }
}

/// One entry of the application activity log. The log is global,
/// most-recent-first, and capped at 20 entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub job_id: i64,
    pub status: ApplicationStatus,
    pub changed_at: String,
}

/// A persisted daily digest: the top-ranked jobs for one calendar date.
/// Exactly one snapshot per date key; regeneration overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestSnapshot {
    pub date: String, // local date, YYYY-MM-DD
    pub entries: Vec<DigestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestEntry {
    pub job_id: i64,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for s in ["Remote", "Hybrid", "Onsite"] {
            let mode: Mode = s.parse().unwrap();
            assert_eq!(mode.to_string(), s);
        }
        assert_eq!("remote".parse::<Mode>().unwrap(), Mode::Remote);
        assert!("office".parse::<Mode>().is_err());
    }

    #[test]
    fn test_status_parse_variants() {
        assert_eq!(
            "not-applied".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::NotApplied
        );
        assert_eq!(
            "Not Applied".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::NotApplied
        );
        assert_eq!(
            "APPLIED".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Applied
        );
        assert!("ghosted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_default_is_not_applied() {
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::NotApplied);
    }

    #[test]
    fn test_job_deserializes_camel_case() {
        let json = r#"{
            "id": 1,
            "title": "React Developer",
            "company": "Acme",
            "description": "Build UIs",
            "location": "Bangalore",
            "mode": "Remote",
            "experience": "1-3",
            "salaryRange": "15-20 LPA",
            "skills": ["React", "CSS"],
            "postedDaysAgo": 1,
            "source": "LinkedIn",
            "applyUrl": "https://example.com/1"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.salary_range, "15-20 LPA");
        assert_eq!(job.posted_days_ago, 1);
        assert_eq!(job.mode, Mode::Remote);
    }
}
