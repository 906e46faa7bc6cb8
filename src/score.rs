use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Job, Preferences};

static SALARY_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Match score in [0, 100] for a job against the active preferences.
/// No preferences configured is a defined state: every job scores 0.
pub fn match_score(job: &Job, prefs: Option<&Preferences>) -> u32 {
    let Some(prefs) = prefs else {
        return 0;
    };
    let total: u32 = score_breakdown(job, prefs).iter().map(|(_, pts)| pts).sum();
    total.min(100)
}

/// The satisfied scoring signals by name. Independent, non-overlapping
/// contributions; the raw sum tops out at 100 so clamping in `match_score`
/// is a safety net, not a normal path.
pub fn score_breakdown(job: &Job, prefs: &Preferences) -> Vec<(&'static str, u32)> {
    let mut signals = Vec::new();

    let title = job.title.to_lowercase();
    let description = job.description.to_lowercase();

    if prefs
        .role_keywords
        .iter()
        .any(|kw| title.contains(&kw.to_lowercase()))
    {
        signals.push(("Title keyword", 25));
    }
    if prefs
        .role_keywords
        .iter()
        .any(|kw| description.contains(&kw.to_lowercase()))
    {
        signals.push(("Description keyword", 15));
    }
    if prefs.preferred_locations.iter().any(|l| *l == job.location) {
        signals.push(("Location", 15));
    }
    if prefs.preferred_modes.contains(&job.mode) {
        signals.push(("Work mode", 10));
    }
    // Exact band match only ("1-3" never matches "3-5").
    if !prefs.experience_level.is_empty() && prefs.experience_level == job.experience {
        signals.push(("Experience", 10));
    }
    if job.skills.iter().any(|js| {
        prefs
            .skills
            .iter()
            .any(|ps| ps.eq_ignore_ascii_case(js))
    }) {
        signals.push(("Skill overlap", 15));
    }
    if job.posted_days_ago <= 2 {
        signals.push(("Recently posted", 5));
    }
    if job.source == "LinkedIn" {
        signals.push(("LinkedIn source", 5));
    }

    signals
}

/// Presentation tier for a score.
pub fn tier(score: u32) -> &'static str {
    if score >= 80 {
        "high"
    } else if score >= 60 {
        "mid"
    } else if score >= 40 {
        "low"
    } else {
        "critical"
    }
}

/// Extract a comparable annual figure from free-text salary ranges like
/// "15-20 LPA" or "₹25k/month". Takes the last integer in the text (the high
/// end of a range); monthly figures are scaled by 0.12 to an annual-ish
/// basis. No digits parses as 0.
pub fn parse_salary(text: &str) -> f64 {
    let last = SALARY_DIGITS
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .last();

    let Some(value) = last else {
        return 0.0;
    };

    if text.to_lowercase().contains("month") {
        value as f64 * 0.12
    } else {
        value as f64
    }
}
