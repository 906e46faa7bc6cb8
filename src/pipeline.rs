use std::collections::HashMap;

use crate::models::{ApplicationStatus, Job, Mode, Preferences};
use crate::score::{match_score, parse_salary};

/// Filter and ordering criteria for one view of the catalog. Every `None`
/// filter means "any"; active predicates are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ViewCriteria {
    pub search: Option<String>, // substring on title OR company
    pub location: Option<String>,
    pub mode: Option<Mode>,
    pub experience: Option<String>, // exact band label
    pub status: Option<ApplicationStatus>,
    pub only_matches: bool, // score >= prefs.min_match_score, needs prefs
    pub sort: SortKey,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Latest, // posted_days_ago ascending
    Score,  // match score descending
    Salary, // parsed salary descending
}

/// Produce a new ordered view of the catalog. The catalog itself is never
/// mutated; `statuses` is the job-id -> status map read at the start of the
/// operation, jobs without a recorded status default to Not Applied.
/// An empty result is a normal outcome.
pub fn view(
    jobs: &[Job],
    criteria: &ViewCriteria,
    prefs: Option<&Preferences>,
    statuses: &HashMap<i64, ApplicationStatus>,
) -> Vec<Job> {
    let search = criteria.search.as_deref().map(str::to_lowercase);

    let mut result: Vec<Job> = jobs
        .iter()
        .filter(|job| {
            if let Some(term) = &search {
                let hit = job.title.to_lowercase().contains(term)
                    || job.company.to_lowercase().contains(term);
                if !hit {
                    return false;
                }
            }
            if let Some(loc) = &criteria.location {
                if job.location != *loc {
                    return false;
                }
            }
            if let Some(mode) = criteria.mode {
                if job.mode != mode {
                    return false;
                }
            }
            if let Some(exp) = &criteria.experience {
                if job.experience != *exp {
                    return false;
                }
            }
            if let Some(status) = criteria.status {
                let current = statuses.get(&job.id).copied().unwrap_or_default();
                if current != status {
                    return false;
                }
            }
            if criteria.only_matches {
                // Threshold only applies once preferences exist.
                if let Some(prefs) = prefs {
                    if match_score(job, Some(prefs)) < prefs.min_match_score {
                        return false;
                    }
                }
            }
            true
        })
        .cloned()
        .collect();

    match criteria.sort {
        SortKey::Latest => result.sort_by_key(|job| job.posted_days_ago),
        SortKey::Score => {
            result.sort_by_key(|job| std::cmp::Reverse(match_score(job, prefs)));
        }
        SortKey::Salary => {
            result.sort_by(|a, b| {
                parse_salary(&b.salary_range)
                    .partial_cmp(&parse_salary(&a.salary_range))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: i64, title: &str, company: &str, location: &str, mode: Mode) -> Job {
        Job {
            id,
            title: title.to_string(),
            company: company.to_string(),
            description: String::new(),
            location: location.to_string(),
            mode,
            experience: "1-3".to_string(),
            salary_range: "10-12 LPA".to_string(),
            skills: vec![],
            posted_days_ago: id as u32,
            source: "LinkedIn".to_string(),
            apply_url: String::new(),
        }
    }

    fn catalog() -> Vec<Job> {
        vec![
            job(1, "React Developer", "PixelWorks", "Bangalore", Mode::Remote),
            job(2, "Backend Engineer", "DataNest", "Mumbai", Mode::Onsite),
            job(3, "Frontend Intern", "PixelWorks", "Bangalore", Mode::Hybrid),
            job(4, "DevOps Engineer", "CloudKite", "Remote", Mode::Remote),
        ]
    }

    fn no_statuses() -> HashMap<i64, ApplicationStatus> {
        HashMap::new()
    }

    #[test]
    fn test_search_matches_title_or_company() {
        let jobs = catalog();
        let criteria = ViewCriteria {
            search: Some("pixel".to_string()),
            ..Default::default()
        };
        let result = view(&jobs, &criteria, None, &no_statuses());
        let ids: Vec<i64> = result.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let jobs = catalog();
        let combined = ViewCriteria {
            search: Some("engineer".to_string()),
            mode: Some(Mode::Remote),
            ..Default::default()
        };
        let result = view(&jobs, &combined, None, &no_statuses());
        let ids: Vec<i64> = result.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![4]);

        // Combined view is a subset of each single-criterion view.
        let by_search = view(
            &jobs,
            &ViewCriteria {
                search: Some("engineer".to_string()),
                ..Default::default()
            },
            None,
            &no_statuses(),
        );
        let by_mode = view(
            &jobs,
            &ViewCriteria {
                mode: Some(Mode::Remote),
                ..Default::default()
            },
            None,
            &no_statuses(),
        );
        for j in &result {
            assert!(by_search.iter().any(|x| x.id == j.id));
            assert!(by_mode.iter().any(|x| x.id == j.id));
        }
    }

    #[test]
    fn test_status_filter_defaults_missing_to_not_applied() {
        let jobs = catalog();
        let mut statuses = HashMap::new();
        statuses.insert(2, ApplicationStatus::Applied);

        let applied = view(
            &jobs,
            &ViewCriteria {
                status: Some(ApplicationStatus::Applied),
                ..Default::default()
            },
            None,
            &statuses,
        );
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].id, 2);

        let not_applied = view(
            &jobs,
            &ViewCriteria {
                status: Some(ApplicationStatus::NotApplied),
                ..Default::default()
            },
            None,
            &statuses,
        );
        assert_eq!(not_applied.len(), 3);
    }

    #[test]
    fn test_threshold_needs_preferences() {
        let jobs = catalog();
        let criteria = ViewCriteria {
            only_matches: true,
            ..Default::default()
        };
        // No preferences: the toggle is inert, everything passes.
        assert_eq!(view(&jobs, &criteria, None, &no_statuses()).len(), 4);

        let prefs = Preferences {
            role_keywords: vec!["react".to_string()],
            min_match_score: 25,
            ..Default::default()
        };
        let result = view(&jobs, &criteria, Some(&prefs), &no_statuses());
        let ids: Vec<i64> = result.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1]); // only the title-keyword hit clears 25
    }

    #[test]
    fn test_sort_latest_is_nondecreasing_in_age() {
        let mut jobs = catalog();
        jobs.reverse();
        let result = view(
            &jobs,
            &ViewCriteria::default(),
            None,
            &no_statuses(),
        );
        let ages: Vec<u32> = result.iter().map(|j| j.posted_days_ago).collect();
        let mut sorted = ages.clone();
        sorted.sort();
        assert_eq!(ages, sorted);
    }

    #[test]
    fn test_sort_score_is_nonincreasing() {
        let jobs = catalog();
        let prefs = Preferences {
            role_keywords: vec!["react".to_string(), "devops".to_string()],
            preferred_locations: vec!["Bangalore".to_string()],
            ..Default::default()
        };
        let result = view(
            &jobs,
            &ViewCriteria {
                sort: SortKey::Score,
                ..Default::default()
            },
            Some(&prefs),
            &no_statuses(),
        );
        let scores: Vec<u32> = result
            .iter()
            .map(|j| match_score(j, Some(&prefs)))
            .collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_sort_salary_descending_unparseable_last() {
        let mut jobs = catalog();
        jobs[0].salary_range = "15-20 LPA".to_string();
        jobs[1].salary_range = "₹90k/month".to_string(); // 10.8
        jobs[2].salary_range = "Competitive".to_string(); // 0
        jobs[3].salary_range = "25 LPA".to_string();
        let result = view(
            &jobs,
            &ViewCriteria {
                sort: SortKey::Salary,
                ..Default::default()
            },
            None,
            &no_statuses(),
        );
        let ids: Vec<i64> = result.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_empty_result_is_valid() {
        let jobs = catalog();
        let criteria = ViewCriteria {
            search: Some("quantum".to_string()),
            ..Default::default()
        };
        assert!(view(&jobs, &criteria, None, &no_statuses()).is_empty());
    }

    #[test]
    fn test_view_does_not_mutate_catalog() {
        let jobs = catalog();
        let before: Vec<i64> = jobs.iter().map(|j| j.id).collect();
        let _ = view(
            &jobs,
            &ViewCriteria {
                sort: SortKey::Score,
                ..Default::default()
            },
            None,
            &no_statuses(),
        );
        let after: Vec<i64> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(before, after);
    }
}
