//! LeadPilot — priority job scheduler and channel-pacing engine for
//! automated sales-lead engagement.

mod crm;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leadpilot_channels::pacer::ChannelPacer;
use leadpilot_channels::session::spawn_session_worker;
use leadpilot_channels::transport::{CloudApiTransport, StubTransport};
use leadpilot_channels::email::SmtpMailer;
use leadpilot_core::clock::{Clock, SystemClock};
use leadpilot_core::config::LeadPilotConfig;
use leadpilot_handlers::{HandlerDeps, OpenAiProvider, register_all};
use leadpilot_queue::dispatch::Dispatcher;
use leadpilot_queue::job::JobType;
use leadpilot_queue::retry::RetryPolicy;
use leadpilot_queue::store::JobStore;

use crate::crm::SqliteCrm;

#[derive(Parser)]
#[command(name = "leadpilot", version, about = "Lead engagement engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the dispatcher with all task handlers.
    Run,
    /// Record an inbound message and enqueue an engage job for it.
    Ingest {
        #[arg(long)]
        lead_id: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        body: String,
    },
    /// Submit a job directly.
    Submit {
        /// Job type wire name (engage, bump-up, summarize, sequence-step,
        /// email-sequence, webhook-reminder).
        #[arg(long)]
        job_type: String,
        /// JSON payload.
        #[arg(long)]
        payload: String,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Show per-status queue counts.
    Stats,
    /// Replay dead-letter jobs back into the queue.
    ReplayDlq {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = LeadPilotConfig::load().context("load config")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(
        JobStore::open(
            &config.store.resolve_db_path(),
            clock.clone(),
            config.retry.max_attempts,
        )
        .context("open job store")?,
    );

    match cli.command {
        Command::Run => run(config, store, clock).await,
        Command::Ingest {
            lead_id,
            phone,
            body,
        } => {
            let crm = SqliteCrm::open(&LeadPilotConfig::home_dir().join("crm.db"))?;
            crm.upsert_lead(&leadpilot_core::types::Lead {
                id: lead_id.clone(),
                phone,
                email: None,
                name: None,
                stage: "New".into(),
                attributes: serde_json::Value::Null,
            })?;
            let message_id = crm.record_inbound(&lead_id, "wa_web", &body)?;
            // One inbound message admits exactly one engage job.
            let key = format!("engage_{lead_id}_{message_id}");
            let job_id = store.submit(
                JobType::Engage,
                serde_json::json!({ "lead_id": lead_id }),
                Some(&key),
            )?;
            println!("{job_id}");
            Ok(())
        }
        Command::Submit {
            job_type,
            payload,
            idempotency_key,
        } => {
            let job_type = JobType::parse(&job_type)
                .ok_or_else(|| anyhow!("unknown job type '{job_type}'"))?;
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("parse payload JSON")?;
            let job_id = store.submit(job_type, payload, idempotency_key.as_deref())?;
            println!("{job_id}");
            Ok(())
        }
        Command::Stats => {
            let counts = store.counts()?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
            Ok(())
        }
        Command::ReplayDlq { limit } => {
            let replayed = store.replay_dlq(limit)?;
            println!("replayed {replayed} job(s)");
            Ok(())
        }
    }
}

async fn run(
    config: LeadPilotConfig,
    store: Arc<JobStore>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<()> {
    let crm = Arc::new(SqliteCrm::open(&LeadPilotConfig::home_dir().join("crm.db"))?);
    let pacer = Arc::new(ChannelPacer::new(config.pacing.clone(), clock.clone()));

    // The web-client automation itself lives outside this process; the
    // session actor runs against a dry-run transport until one is wired in.
    let web_transport = Arc::new(StubTransport::new());
    let session = spawn_session_worker(pacer.clone(), web_transport);

    let deps = Arc::new(HandlerDeps {
        store: store.clone(),
        conversations: crm,
        provider: Arc::new(OpenAiProvider::new(config.provider.clone())),
        pacer,
        session,
        cloud: Arc::new(CloudApiTransport::new(config.cloud_api.clone())),
        mailer: Arc::new(SmtpMailer::new(&config.smtp)?),
        http: reqwest::Client::new(),
        clock: clock.clone(),
        gate: HandlerDeps::default_gate(),
    });

    let mut dispatcher = Dispatcher::new(
        store,
        RetryPolicy::from_config(&config.retry),
        clock,
        config.workers.count,
        Duration::from_millis(config.workers.poll_interval_ms),
    );
    register_all(&mut dispatcher, &deps);
    let dispatcher = Arc::new(dispatcher);

    let handles = dispatcher.start();
    tracing::info!("🚀 LeadPilot running — Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    dispatcher.shutdown();
    for handle in handles {
        let _ = handle.await;
    }

    let counts = dispatcher.stats()?;
    tracing::info!(
        "Final queue state: {} queued, {} processing, {} completed, {} dlq",
        counts.queued,
        counts.processing,
        counts.completed,
        counts.dlq
    );
    Ok(())
}
