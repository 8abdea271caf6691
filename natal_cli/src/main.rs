use chrono::Utc;
use clap::{Parser, Subcommand};
use natal_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "natal")]
#[command(about = "Prenatal symptom triage and contraction timing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a symptom report and log the result
    Check {
        /// Symptom category (pain, digestive, bleeding, respiratory,
        /// neurological, skin, urinary, emotional, movement, other)
        #[arg(long)]
        category: String,

        /// Current trimester (first, second, third)
        #[arg(long)]
        trimester: String,

        /// How long the symptom has been present
        /// (just_started, hours, days, week_plus)
        #[arg(long, default_value = "just_started")]
        duration: String,

        /// How often it occurs (once, intermittent, constant)
        #[arg(long, default_value = "once")]
        frequency: String,

        /// Pain scale 1-10 (pain category only)
        #[arg(long)]
        pain_scale: Option<u8>,

        /// The symptom interferes with daily activities
        #[arg(long)]
        affecting_daily_life: bool,

        /// Associated symptom label (repeatable)
        #[arg(long = "associated")]
        associated_symptoms: Vec<String>,

        /// Dry run - show the recommendation without logging
        #[arg(long)]
        dry_run: bool,
    },

    /// Time contractions and watch for the 5-1-1 pattern
    Contraction {
        #[command(subcommand)]
        command: ContractionCommands,
    },

    /// Show recent assessment history
    History {
        /// How many days back to load (defaults to config)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Mark a logged assessment as resolved
    Resolve {
        /// Assessment id, as shown by `history`
        id: String,
    },

    /// Roll up WAL assessments to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum ContractionCommands {
    /// Start timing a contraction
    Start,
    /// Stop timing the current contraction
    Stop {
        /// Subjective intensity (mild, moderate, strong, very_strong)
        #[arg(long)]
        intensity: Option<String>,
    },
    /// Show session statistics and the current labor pattern
    Status,
    /// Clear the session log
    Reset,
    /// Export the contraction log as CSV
    Export {
        /// Output path (defaults to contractions.csv in the data dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

struct Paths {
    wal: PathBuf,
    csv: PathBuf,
    session: PathBuf,
    wal_dir: PathBuf,
    data_dir: PathBuf,
}

impl Paths {
    fn new(data_dir: PathBuf) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal: wal_dir.join("assessments.wal"),
            csv: data_dir.join("assessments.csv"),
            session: data_dir.join("contraction_session.json"),
            wal_dir,
            data_dir,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    natal_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(data_dir);

    match cli.command {
        Commands::Check {
            category,
            trimester,
            duration,
            frequency,
            pain_scale,
            affecting_daily_life,
            associated_symptoms,
            dry_run,
        } => cmd_check(
            &paths,
            SymptomReport {
                category: parse_category(&category)?,
                duration: parse_duration(&duration)?,
                frequency: parse_frequency(&frequency)?,
                pain_scale,
                affecting_daily_life,
                associated_symptoms,
                trimester: parse_trimester(&trimester)?,
            },
            dry_run,
        ),
        Commands::Contraction { command } => cmd_contraction(&paths, command),
        Commands::History { days } => cmd_history(&paths, days.unwrap_or(config.history.recent_days)),
        Commands::Resolve { id } => cmd_resolve(&paths, &id),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
    }
}

fn cmd_check(paths: &Paths, report: SymptomReport, dry_run: bool) -> Result<()> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let recommendation = assess(catalog, &report)?;
    display_recommendation(&recommendation);

    if dry_run {
        println!("\n[Dry run - not logging assessment]");
        return Ok(());
    }

    std::fs::create_dir_all(&paths.wal_dir)?;
    let record = AssessmentRecord::new(Utc::now(), report, recommendation);
    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&record)?;

    println!("\n✓ Assessment logged!");
    Ok(())
}

fn cmd_contraction(paths: &Paths, command: ContractionCommands) -> Result<()> {
    let now = Utc::now();

    match command {
        ContractionCommands::Start => {
            ContractionSession::update(&paths.session, |session| {
                session.start_contraction(now)?;
                Ok(())
            })?;
            println!("✓ Contraction started");
            Ok(())
        }

        ContractionCommands::Stop { intensity } => {
            let intensity = intensity.as_deref().map(parse_intensity).transpose()?;
            let session = ContractionSession::update(&paths.session, |session| {
                session.stop_contraction(now, intensity)?;
                Ok(())
            })?;

            let logged = session
                .contractions
                .last()
                .ok_or_else(|| Error::Session("no contraction was logged".into()))?;
            let duration = logged
                .duration()
                .ok_or_else(|| Error::Session("logged contraction has no end time".into()))?;
            println!("✓ Contraction logged ({} seconds)", duration.num_seconds());
            if let Some(interval) =
                session.interval_before(session.contractions.len().saturating_sub(1))
            {
                println!("  Interval from previous: {}", format_mins_secs(interval));
            }

            display_status(&session, now);
            Ok(())
        }

        ContractionCommands::Status => {
            let session = ContractionSession::load(&paths.session)?;
            if let Some(elapsed) = session.elapsed_in_progress(now) {
                println!(
                    "Timing a contraction ({} seconds elapsed)",
                    elapsed.num_seconds()
                );
            }
            display_status(&session, now);
            Ok(())
        }

        ContractionCommands::Reset => {
            ContractionSession::update(&paths.session, |session| {
                session.reset();
                Ok(())
            })?;
            println!("✓ Session cleared");
            Ok(())
        }

        ContractionCommands::Export { out } => {
            let session = ContractionSession::load(&paths.session)?;
            let out = out.unwrap_or_else(|| paths.data_dir.join("contractions.csv"));
            let count = natal_core::csv_rollup::session_to_csv(&session, &out)?;
            println!("✓ Exported {} contractions", count);
            println!("  CSV: {}", out.display());
            Ok(())
        }
    }
}

fn cmd_history(paths: &Paths, days: i64) -> Result<()> {
    let records = load_recent_records(&paths.wal, &paths.csv, days)?;

    if records.is_empty() {
        println!("No assessments in the last {} days.", days);
        return Ok(());
    }

    println!("Assessments from the last {} days:\n", days);
    for record in &records {
        println!(
            "  {}  {}  {:?}  urgency {:?}, action {:?}{}",
            record.id,
            record.reported_at.format("%Y-%m-%d %H:%M"),
            record.report.category,
            record.recommendation.urgency,
            record.recommendation.action,
            if record.resolved { "  (resolved)" } else { "" },
        );
    }

    Ok(())
}

fn cmd_resolve(paths: &Paths, id: &str) -> Result<()> {
    let id = Uuid::parse_str(id.trim())
        .map_err(|e| Error::Validation(format!("invalid assessment id '{}': {}", id, e)))?;
    mark_resolved(&paths.wal, &paths.csv, id, Utc::now())?;
    println!("✓ Assessment {} marked resolved", id);
    Ok(())
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = natal_core::csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} assessments to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = natal_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn display_recommendation(rec: &AssessmentRecommendation) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  URGENCY: {:?}", rec.urgency);
    println!("│  ACTION:  {}", action_label(rec.action));
    println!("╰─────────────────────────────────────────╯");

    if !rec.emergency_reasons.is_empty() {
        println!("\n  ⚠ Emergency indicators:");
        for reason in &rec.emergency_reasons {
            println!("    - {}", reason);
        }
    }

    if !rec.call_provider_reasons.is_empty() {
        println!("\n  Reasons to contact your provider:");
        for reason in &rec.call_provider_reasons {
            println!("    - {}", reason);
        }
    }

    if !rec.recommendations.is_empty() {
        println!("\n  Recommendations:");
        for line in &rec.recommendations {
            println!("    - {}", line);
        }
    }

    if !rec.self_care_instructions.is_empty() {
        println!("\n  Self-care:");
        for line in &rec.self_care_instructions {
            println!("    - {}", line);
        }
    }

    println!("\n  Warning signs to watch:");
    for sign in &rec.warning_signs {
        println!("    - {}", sign);
    }
}

fn display_status(session: &ContractionSession, now: chrono::DateTime<Utc>) {
    println!("\n  Contractions logged: {}", session.contractions.len());

    let window = natal_core::contraction::pattern_window();
    match (
        session.average_duration_recent(now, window),
        session.average_interval_recent(now, window),
    ) {
        (Some(duration), Some(interval)) => {
            println!("  Average duration (last hour): {}s", duration.num_seconds());
            println!(
                "  Average interval (last hour): {}",
                format_mins_secs(interval)
            );
        }
        _ => println!("  Not enough data for averages yet"),
    }

    let pattern = session.classify_pattern(now);
    println!("  Pattern: {}", pattern.description());
}

fn action_label(action: AssessmentAction) -> &'static str {
    match action {
        AssessmentAction::SelfCare => "Self-care at home",
        AssessmentAction::Monitoring => "Monitoring",
        AssessmentAction::CallProvider => "Call provider",
        AssessmentAction::VisitProvider => "Visit provider",
        AssessmentAction::Emergency => "Seek emergency care",
    }
}

fn format_mins_secs(duration: chrono::Duration) -> String {
    let total = duration.num_seconds();
    format!("{}m {:02}s", total / 60, total % 60)
}

// Flag values accept hyphens or underscores interchangeably.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase().replace('-', "_")
}

fn parse_category(value: &str) -> Result<SymptomCategory> {
    match normalize(value).as_str() {
        "pain" => Ok(SymptomCategory::Pain),
        "digestive" => Ok(SymptomCategory::Digestive),
        "bleeding" => Ok(SymptomCategory::Bleeding),
        "respiratory" => Ok(SymptomCategory::Respiratory),
        "neurological" => Ok(SymptomCategory::Neurological),
        "skin" => Ok(SymptomCategory::Skin),
        "urinary" => Ok(SymptomCategory::Urinary),
        "emotional" => Ok(SymptomCategory::Emotional),
        "movement" => Ok(SymptomCategory::Movement),
        "other" => Ok(SymptomCategory::Other),
        _ => Err(Error::Validation(format!("unknown category '{}'", value))),
    }
}

fn parse_trimester(value: &str) -> Result<Trimester> {
    match normalize(value).as_str() {
        "first" | "1" => Ok(Trimester::First),
        "second" | "2" => Ok(Trimester::Second),
        "third" | "3" => Ok(Trimester::Third),
        _ => Err(Error::Validation(format!("unknown trimester '{}'", value))),
    }
}

fn parse_duration(value: &str) -> Result<SymptomDuration> {
    match normalize(value).as_str() {
        "just_started" => Ok(SymptomDuration::JustStarted),
        "hours" => Ok(SymptomDuration::Hours),
        "days" => Ok(SymptomDuration::Days),
        "week_plus" => Ok(SymptomDuration::WeekPlus),
        _ => Err(Error::Validation(format!("unknown duration '{}'", value))),
    }
}

fn parse_frequency(value: &str) -> Result<SymptomFrequency> {
    match normalize(value).as_str() {
        "once" => Ok(SymptomFrequency::Once),
        "intermittent" => Ok(SymptomFrequency::Intermittent),
        "constant" => Ok(SymptomFrequency::Constant),
        _ => Err(Error::Validation(format!("unknown frequency '{}'", value))),
    }
}

fn parse_intensity(value: &str) -> Result<ContractionIntensity> {
    match normalize(value).as_str() {
        "mild" => Ok(ContractionIntensity::Mild),
        "moderate" => Ok(ContractionIntensity::Moderate),
        "strong" => Ok(ContractionIntensity::Strong),
        "very_strong" => Ok(ContractionIntensity::VeryStrong),
        _ => Err(Error::Validation(format!("unknown intensity '{}'", value))),
    }
}
