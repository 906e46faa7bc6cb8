use anyhow::Result;
use chrono::{DateTime, Local};

use crate::db::Database;
use crate::models::{DigestEntry, DigestSnapshot, Job, Preferences};
use crate::score::match_score;

/// A digest holds at most this many jobs.
const DIGEST_SIZE: usize = 10;

/// Local calendar date key for digest storage, YYYY-MM-DD.
pub fn date_key(when: DateTime<Local>) -> String {
    when.format("%Y-%m-%d").to_string()
}

/// Every job scored and ordered: score descending, ties broken by recency
/// (lower posted_days_ago first). The sort is stable, so identical inputs
/// always produce the same ordering.
pub fn rank_jobs(jobs: &[Job], prefs: &Preferences) -> Vec<(Job, u32)> {
    let mut scored: Vec<(Job, u32)> = jobs
        .iter()
        .map(|job| {
            let score = match_score(job, Some(prefs));
            (job.clone(), score)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then(a.0.posted_days_ago.cmp(&b.0.posted_days_ago))
    });
    scored
}

/// Generate and persist today's digest: the top 10 ranked jobs under the
/// given date key, overwriting any snapshot already stored for that date.
/// With no preferences configured this is a no-op and returns `None`.
pub fn generate_digest(
    db: &Database,
    jobs: &[Job],
    prefs: Option<&Preferences>,
    date: &str,
) -> Result<Option<DigestSnapshot>> {
    let Some(prefs) = prefs else {
        return Ok(None);
    };

    let entries: Vec<DigestEntry> = rank_jobs(jobs, prefs)
        .into_iter()
        .take(DIGEST_SIZE)
        .map(|(job, score)| DigestEntry {
            job_id: job.id,
            score,
        })
        .collect();

    let snapshot = DigestSnapshot {
        date: date.to_string(),
        entries,
    };
    db.put_digest(&snapshot)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    fn job(id: i64, title: &str, posted_days_ago: u32) -> Job {
        Job {
            id,
            title: title.to_string(),
            company: "Acme".to_string(),
            description: String::new(),
            location: "Bangalore".to_string(),
            mode: Mode::Remote,
            experience: "1-3".to_string(),
            salary_range: "10 LPA".to_string(),
            skills: vec![],
            posted_days_ago,
            source: "Indeed".to_string(),
            apply_url: String::new(),
        }
    }

    fn prefs() -> Preferences {
        Preferences {
            role_keywords: vec!["react".to_string()],
            preferred_locations: vec!["Bangalore".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_rank_score_descending_recency_breaks_ties() {
        let jobs = vec![
            job(1, "Java Developer", 5),   // 15 (location)
            job(2, "React Developer", 4),  // 40 (title + location)
            job(3, "React Developer", 3),  // 40, more recent than #2
        ];
        let ranked = rank_jobs(&jobs, &prefs());
        let ids: Vec<i64> = ranked.iter().map(|(j, _)| j.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(ranked[0].1, 40);
        assert_eq!(ranked[2].1, 15);
    }

    #[test]
    fn test_digest_capped_at_ten() {
        let db = Database::open_in_memory().unwrap();
        let jobs: Vec<Job> = (1..=15).map(|i| job(i, "React Developer", 3)).collect();
        let snapshot = generate_digest(&db, &jobs, Some(&prefs()), "2026-08-30")
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.entries.len(), 10);
    }

    #[test]
    fn test_digest_noop_without_preferences() {
        let db = Database::open_in_memory().unwrap();
        let jobs = vec![job(1, "React Developer", 1)];
        let result = generate_digest(&db, &jobs, None, "2026-08-30").unwrap();
        assert!(result.is_none());
        assert!(db.get_digest("2026-08-30").unwrap().is_none());
    }

    #[test]
    fn test_digest_idempotent_for_fixed_inputs() {
        let db = Database::open_in_memory().unwrap();
        let jobs: Vec<Job> = (1..=12).map(|i| job(i, "React Developer", i as u32 % 4)).collect();
        let p = prefs();

        let first = generate_digest(&db, &jobs, Some(&p), "2026-08-30")
            .unwrap()
            .unwrap();
        let second = generate_digest(&db, &jobs, Some(&p), "2026-08-30")
            .unwrap()
            .unwrap();

        let first_ids: Vec<i64> = first.entries.iter().map(|e| e.job_id).collect();
        let second_ids: Vec<i64> = second.entries.iter().map(|e| e.job_id).collect();
        assert_eq!(first_ids, second_ids);

        let stored = db.get_digest("2026-08-30").unwrap().unwrap();
        let stored_ids: Vec<i64> = stored.entries.iter().map(|e| e.job_id).collect();
        assert_eq!(stored_ids, first_ids);
    }

    #[test]
    fn test_digest_entries_ordered() {
        let db = Database::open_in_memory().unwrap();
        let jobs = vec![
            job(1, "Tester", 0),          // 20: location + recency
            job(2, "React Developer", 0), // 45
            job(3, "React Developer", 5), // 40
        ];
        let snapshot = generate_digest(&db, &jobs, Some(&prefs()), "2026-08-30")
            .unwrap()
            .unwrap();
        let scores: Vec<u32> = snapshot.entries.iter().map(|e| e.score).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(snapshot.entries[0].job_id, 2);
    }

    #[test]
    fn test_date_key_format() {
        use chrono::TimeZone;
        let when = Local.with_ymd_and_hms(2026, 8, 30, 23, 59, 0).unwrap();
        assert_eq!(date_key(when), "2026-08-30");
    }
}
