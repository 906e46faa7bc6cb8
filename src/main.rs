mod catalog;
mod db;
mod digest;
mod models;
mod pipeline;
mod score;
mod tui;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use db::Database;
use models::{ApplicationStatus, Job, Mode, Preferences};
use pipeline::{SortKey, ViewCriteria};
use score::{match_score, score_breakdown, tier};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Job listing tracker - filter, score, save, and digest job postings")]
struct Cli {
    /// Path to a catalog JSON file (defaults to the bundled dataset)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// List jobs from the catalog
    List {
        /// Substring match against title or company
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by location (exact)
        #[arg(short, long)]
        location: Option<String>,

        /// Filter by work mode (remote, hybrid, onsite)
        #[arg(short, long)]
        mode: Option<String>,

        /// Filter by experience band (exact, e.g. "1-3")
        #[arg(short, long)]
        experience: Option<String>,

        /// Filter by application status (not-applied, applied, rejected, selected)
        #[arg(long)]
        status: Option<String>,

        /// Only show jobs at or above your minimum match score
        #[arg(long)]
        matches: bool,

        /// Sort order (latest, score, salary)
        #[arg(long, default_value = "latest")]
        sort: String,
    },

    /// Show job details with the score breakdown
    Show {
        /// Job ID
        id: i64,
    },

    /// Save a job for later
    Save {
        /// Job ID
        id: i64,
    },

    /// Remove a job from the saved collection
    Unsave {
        /// Job ID
        id: i64,
    },

    /// List saved jobs
    Saved,

    /// Record an application status for a job
    Status {
        /// Job ID
        id: i64,

        /// New status (not-applied, applied, rejected, selected)
        status: String,
    },

    /// Show the application activity log (most recent first)
    History,

    /// Show the per-signal match score for a job
    Score {
        /// Job ID
        id: i64,
    },

    /// Manage matching preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Daily digest of your top matches
    Digest {
        #[command(subcommand)]
        command: DigestCommands,
    },

    /// Browse jobs interactively
    Browse {
        /// Substring match against title or company
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by location (exact)
        #[arg(short, long)]
        location: Option<String>,

        /// Filter by work mode (remote, hybrid, onsite)
        #[arg(short, long)]
        mode: Option<String>,

        /// Sort order (latest, score, salary)
        #[arg(long, default_value = "score")]
        sort: String,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Replace the stored preferences
    Set {
        /// Role keywords, comma-separated (e.g. "react,frontend")
        #[arg(long, default_value = "")]
        keywords: String,

        /// Preferred locations, comma-separated
        #[arg(long, default_value = "")]
        locations: String,

        /// Preferred work modes, comma-separated (remote, hybrid, onsite)
        #[arg(long, default_value = "")]
        modes: String,

        /// Experience band, exact (e.g. "1-3")
        #[arg(long, default_value = "")]
        experience: String,

        /// Skills, comma-separated
        #[arg(long, default_value = "")]
        skills: String,

        /// Minimum match score for --matches filtering (0-100)
        #[arg(long, default_value = "0")]
        min_score: u32,
    },

    /// Show the stored preferences
    Show,

    /// Remove the stored preferences
    Clear,
}

#[derive(Subcommand)]
enum DigestCommands {
    /// Generate (or regenerate) the digest for a date
    Generate {
        /// Date key YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the digest stored for a date
    Show {
        /// Date key YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db = Database::open()?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::List {
            search,
            location,
            mode,
            experience,
            status,
            matches,
            sort,
        } => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            let prefs = db.load_preferences()?;

            let criteria = ViewCriteria {
                search,
                location,
                mode: parse_opt_mode(mode.as_deref())?,
                experience,
                status: parse_opt_status(status.as_deref())?,
                only_matches: matches,
                sort: parse_sort(&sort)?,
            };

            if matches && prefs.is_none() {
                println!("(--matches ignored: no preferences set)");
            }

            let statuses = status_map(&db)?;
            let view = pipeline::view(&jobs, &criteria, prefs.as_ref(), &statuses);

            if jobs.is_empty() {
                println!("Catalog is empty.");
            } else if view.is_empty() {
                println!("No matches found. Try adjusting your filters or search keywords.");
            } else {
                print_job_table(&view, prefs.as_ref(), &statuses);
            }
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            match catalog::find_job(&jobs, id) {
                Some(job) => {
                    let prefs = db.load_preferences()?;
                    print_job_detail(job, prefs.as_ref(), &db)?;
                }
                None => {
                    println!("Job #{} not found in the catalog.", id);
                }
            }
        }

        Commands::Save { id } => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            let job = catalog::find_job(&jobs, id)
                .ok_or_else(|| anyhow!("Job #{} not found in the catalog", id))?;
            db.save_job(id)?;
            println!("Saved #{} - {} at {}", id, job.title, job.company);
        }

        Commands::Unsave { id } => {
            db.ensure_initialized()?;
            db.unsave_job(id)?;
            println!("Removed #{} from saved jobs.", id);
        }

        Commands::Saved => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            let prefs = db.load_preferences()?;
            let saved_ids = db.saved_ids()?;
            let saved: Vec<Job> = jobs
                .iter()
                .filter(|j| saved_ids.contains(&j.id))
                .cloned()
                .collect();
            if saved.is_empty() {
                println!("Your collection is empty. Save jobs with 'jobtrack save <id>'.");
            } else {
                let statuses = status_map(&db)?;
                print_job_table(&saved, prefs.as_ref(), &statuses);
            }
        }

        Commands::Status { id, status } => {
            db.ensure_initialized()?;
            let status: ApplicationStatus = status.parse()?;
            db.record_status(id, status)?;
            println!("Job #{} marked as {}.", id, status);
        }

        Commands::History => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            let events = db.history()?;
            if events.is_empty() {
                println!("No application activity yet.");
            } else {
                println!("{:<21} {:<6} {:<12} {:<30}", "WHEN", "JOB", "STATUS", "TITLE");
                println!("{}", "-".repeat(71));
                for event in events {
                    let title = catalog::find_job(&jobs, event.job_id)
                        .map(|j| j.title.clone())
                        .unwrap_or_else(|| "(not in catalog)".to_string());
                    println!(
                        "{:<21} {:<6} {:<12} {:<30}",
                        event.changed_at,
                        event.job_id,
                        event.status.to_string(),
                        truncate(&title, 28)
                    );
                }
            }
        }

        Commands::Score { id } => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            let job = catalog::find_job(&jobs, id)
                .ok_or_else(|| anyhow!("Job #{} not found in the catalog", id))?;

            match db.load_preferences()? {
                Some(prefs) => {
                    println!("{} at {}", job.title, job.company);
                    for (signal, points) in score_breakdown(job, &prefs) {
                        println!("  +{:<3} {}", points, signal);
                    }
                    let total = match_score(job, Some(&prefs));
                    println!("Match score: {} ({})", total, tier(total));
                }
                None => {
                    println!("No preferences set; every job scores 0.");
                    println!("Configure matching with 'jobtrack prefs set'.");
                }
            }
        }

        Commands::Prefs { command } => {
            db.ensure_initialized()?;
            match command {
                PrefsCommands::Set {
                    keywords,
                    locations,
                    modes,
                    experience,
                    skills,
                    min_score,
                } => {
                    if min_score > 100 {
                        return Err(anyhow!("--min-score must be between 0 and 100"));
                    }
                    let preferred_modes = split_list(&modes)
                        .iter()
                        .map(|m| m.parse::<Mode>())
                        .collect::<Result<Vec<_>>>()?;

                    let prefs = Preferences {
                        role_keywords: split_list(&keywords),
                        preferred_locations: split_list(&locations),
                        preferred_modes,
                        experience_level: experience.trim().to_string(),
                        skills: split_list(&skills),
                        min_match_score: min_score,
                    };
                    db.save_preferences(&prefs)?;
                    println!("Preferences saved.");
                }

                PrefsCommands::Show => match db.load_preferences()? {
                    Some(prefs) => {
                        println!("Role keywords:       {}", join_or_dash(&prefs.role_keywords));
                        println!(
                            "Preferred locations: {}",
                            join_or_dash(&prefs.preferred_locations)
                        );
                        let modes: Vec<String> = prefs
                            .preferred_modes
                            .iter()
                            .map(|m| m.to_string())
                            .collect();
                        println!("Preferred modes:     {}", join_or_dash(&modes));
                        println!(
                            "Experience level:    {}",
                            if prefs.experience_level.is_empty() {
                                "-"
                            } else {
                                prefs.experience_level.as_str()
                            }
                        );
                        println!("Skills:              {}", join_or_dash(&prefs.skills));
                        println!("Minimum match score: {}", prefs.min_match_score);
                    }
                    None => {
                        println!("No preferences set. Configure with 'jobtrack prefs set'.");
                    }
                },

                PrefsCommands::Clear => {
                    db.clear_preferences()?;
                    println!("Preferences cleared.");
                }
            }
        }

        Commands::Digest { command } => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            match command {
                DigestCommands::Generate { date } => {
                    let date = date.unwrap_or_else(|| digest::date_key(chrono::Local::now()));
                    let prefs = db.load_preferences()?;
                    match digest::generate_digest(&db, &jobs, prefs.as_ref(), &date)? {
                        Some(snapshot) => {
                            println!(
                                "Digest for {} generated ({} jobs).",
                                snapshot.date,
                                snapshot.entries.len()
                            );
                            print_digest(&snapshot, &jobs);
                        }
                        None => {
                            println!("No preferences set; nothing to curate.");
                            println!("Configure matching with 'jobtrack prefs set' first.");
                        }
                    }
                }

                DigestCommands::Show { date } => {
                    let date = date.unwrap_or_else(|| digest::date_key(chrono::Local::now()));
                    if db.load_preferences()?.is_none() {
                        println!("No preferences set; digests are disabled until you configure matching.");
                    } else {
                        match db.get_digest(&date)? {
                            Some(snapshot) => print_digest(&snapshot, &jobs),
                            None => {
                                println!(
                                    "No digest generated for {}. Run 'jobtrack digest generate'.",
                                    date
                                );
                            }
                        }
                    }
                }
            }
        }

        Commands::Browse {
            search,
            location,
            mode,
            sort,
        } => {
            db.ensure_initialized()?;
            let jobs = catalog::load(cli.catalog.as_deref())?;
            let prefs = db.load_preferences()?;
            let criteria = ViewCriteria {
                search,
                location,
                mode: parse_opt_mode(mode.as_deref())?,
                sort: parse_sort(&sort)?,
                ..Default::default()
            };
            let statuses = status_map(&db)?;
            let view = pipeline::view(&jobs, &criteria, prefs.as_ref(), &statuses);
            tui::run_browse(&db, view, prefs)?;
        }
    }

    Ok(())
}

fn parse_sort(s: &str) -> Result<SortKey> {
    match s.to_lowercase().as_str() {
        "latest" => Ok(SortKey::Latest),
        "score" => Ok(SortKey::Score),
        "salary" => Ok(SortKey::Salary),
        other => Err(anyhow!(
            "Unknown sort key: '{}' (expected latest, score, salary)",
            other
        )),
    }
}

fn parse_opt_mode(s: Option<&str>) -> Result<Option<Mode>> {
    s.map(|m| m.parse()).transpose()
}

fn parse_opt_status(s: Option<&str>) -> Result<Option<ApplicationStatus>> {
    s.map(|st| st.parse()).transpose()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn status_map(db: &Database) -> Result<HashMap<i64, ApplicationStatus>> {
    Ok(db.all_statuses()?.into_iter().collect())
}

fn print_job_table(
    jobs: &[Job],
    prefs: Option<&Preferences>,
    statuses: &HashMap<i64, ApplicationStatus>,
) {
    println!(
        "{:<5} {:>5} {:<28} {:<16} {:<12} {:<8} {:<6} {:<12}",
        "ID", "SCORE", "TITLE", "COMPANY", "LOCATION", "MODE", "AGE", "STATUS"
    );
    println!("{}", "-".repeat(98));
    for job in jobs {
        let score = match (prefs, match_score(job, prefs)) {
            (None, _) => "-".to_string(),
            (Some(_), s) => s.to_string(),
        };
        let status = statuses.get(&job.id).copied().unwrap_or_default();
        println!(
            "{:<5} {:>5} {:<28} {:<16} {:<12} {:<8} {:<6} {:<12}",
            job.id,
            score,
            truncate(&job.title, 26),
            truncate(&job.company, 14),
            truncate(&job.location, 10),
            job.mode.to_string(),
            format!("{}d", job.posted_days_ago),
            status.to_string()
        );
    }
}

fn print_digest(snapshot: &models::DigestSnapshot, jobs: &[Job]) {
    println!("Top matches for {}:", snapshot.date);
    println!(
        "{:<5} {:<5} {:>5} {:<28} {:<16} {:<12}",
        "RANK", "ID", "SCORE", "TITLE", "COMPANY", "LOCATION"
    );
    println!("{}", "-".repeat(76));
    for (i, entry) in snapshot.entries.iter().enumerate() {
        match catalog::find_job(jobs, entry.job_id) {
            Some(job) => println!(
                "{:<5} {:<5} {:>5} {:<28} {:<16} {:<12}",
                i + 1,
                job.id,
                entry.score,
                truncate(&job.title, 26),
                truncate(&job.company, 14),
                truncate(&job.location, 10)
            ),
            None => println!(
                "{:<5} {:<5} {:>5} (job no longer in catalog)",
                i + 1,
                entry.job_id,
                entry.score
            ),
        }
    }
}

fn print_job_detail(job: &Job, prefs: Option<&Preferences>, db: &Database) -> Result<()> {
    println!("Job #{}", job.id);
    println!("Title: {}", job.title);
    println!("Company: {}", job.company);
    println!("Location: {} ({})", job.location, job.mode);
    println!("Experience: {}", job.experience);
    println!("Salary: {}", job.salary_range);
    println!("Posted: {} day(s) ago", job.posted_days_ago);
    println!("Source: {}", job.source);
    println!("Skills: {}", job.skills.join(", "));
    println!("Status: {}", db.current_status(job.id)?);
    if db.is_saved(job.id)? {
        println!("Saved: yes");
    }

    match prefs {
        Some(prefs) => {
            let total = match_score(job, Some(prefs));
            println!("Match score: {} ({})", total, tier(total));
            for (signal, points) in score_breakdown(job, prefs) {
                println!("  +{:<3} {}", points, signal);
            }
        }
        None => println!("Match score: - (no preferences set)"),
    }

    println!("\nAbout the role:");
    for line in textwrap::fill(&job.description, 78).lines() {
        println!("  {}", line);
    }
    println!("\nApply: {}", job.apply_url);
    Ok(())
}

// Counts chars, not bytes, so multibyte titles never split mid-character.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
