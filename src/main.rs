//! Command-line entry point for the follow-up interview service.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use followup::channels::{ConsoleTransport, SendPacer, stdin_inbound};
use followup::config::Config;
use followup::db::InterviewDb;
use followup::identity::{IdentityResolver, PassthroughResolver, StaticResolver};
use followup::interview::{BatchEvent, Interviewer, PhraseBook};
use followup::questions::QuestionSet;

#[derive(Parser)]
#[command(name = "followup", version, about = "Automated candidate follow-up interviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interview service on the console transport.
    Run {
        /// Exit once the last active interview completes.
        #[arg(long)]
        batch: bool,
    },
    /// Register a candidate and send them the welcome message.
    Register {
        /// Contact reference, e.g. a phone number.
        contact: String,
        /// Question file, one question per line.
        #[arg(long)]
        questions: Option<PathBuf>,
    },
    /// Move completed interviews to cold storage and reclaim space.
    Archive,
    /// Show session counts.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run { batch } => run_service(&config, batch).await,
        Commands::Register { contact, questions } => register(&config, &contact, questions).await,
        Commands::Archive => archive(&config).await,
        Commands::Status => status(&config).await,
    }
}

async fn run_service(config: &Config, batch: bool) -> anyhow::Result<()> {
    let interviewer = build_interviewer(config).await?;
    let mut events = interviewer.subscribe();
    let inbound = stdin_inbound();

    println!("Console transport ready. Send lines as '<candidate_id> <text>'.");

    if batch {
        tokio::select! {
            _ = interviewer.run(inbound) => {}
            _ = log_events_until_drained(&mut events) => {
                tracing::info!("Batch drained; exiting");
            }
        }
    } else {
        tokio::spawn(async move {
            log_events_until_drained(&mut events).await;
        });
        interviewer.run(inbound).await;
    }
    Ok(())
}

/// Log completion events; returns when the batch drains (or the service is
/// dropped).
async fn log_events_until_drained(events: &mut broadcast::Receiver<BatchEvent>) {
    loop {
        match events.recv().await {
            Ok(BatchEvent::CandidateCompleted { candidate_id }) => {
                tracing::info!(%candidate_id, "Candidate completed their follow-up");
            }
            Ok(BatchEvent::Drained) => return,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Missed lifecycle events");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn register(
    config: &Config,
    contact: &str,
    questions: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = questions
        .or_else(|| config.interview.questions_file.clone())
        .unwrap_or_else(|| PathBuf::from("followup_questions.txt"));
    let set = QuestionSet::from_file(&path)?;

    let interviewer = build_interviewer(config).await?;
    let candidate_id = interviewer
        .register_candidate(contact, set.iter().map(String::from).collect())
        .await?;

    println!(
        "Registered candidate {candidate_id} ({contact}) with {} questions",
        set.len()
    );
    Ok(())
}

async fn archive(config: &Config) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let stats = db.archive_completed().await?;
    println!(
        "Archived {} sessions ({} transcript entries)",
        stats.sessions, stats.transcript_entries
    );
    Ok(())
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let counts = db.session_counts().await?;

    println!("Follow-up Status");
    println!("================\n");
    println!("  Database:     {}", config.database.path.display());
    println!("  Pending:      {}", counts.pending);
    println!("  In progress:  {}", counts.in_progress);
    println!("  Paused:       {}", counts.paused);
    println!("  Completed:    {}", counts.completed);
    println!("  Archived:     {}", counts.archived);
    Ok(())
}

async fn open_db(config: &Config) -> anyhow::Result<Arc<InterviewDb>> {
    let db = InterviewDb::open(&config.database.path).await?;
    db.run_migrations().await?;
    Ok(Arc::new(db))
}

async fn build_interviewer(config: &Config) -> anyhow::Result<Interviewer> {
    let db = open_db(config).await?;

    let resolver: Arc<dyn IdentityResolver> = match &config.interview.contacts_file {
        Some(path) => Arc::new(StaticResolver::from_file(path)?),
        None => Arc::new(PassthroughResolver),
    };

    let phrases = match &config.interview.starters_file {
        Some(path) => PhraseBook::from_file(path)?,
        None => PhraseBook::default(),
    };

    let pacer = SendPacer::new(config.channel.send_delay_min, config.channel.send_delay_max);

    Ok(Interviewer::new(
        db,
        Arc::new(ConsoleTransport::new()),
        resolver,
        pacer,
        phrases,
    ))
}
