mod api;
mod campaign;
mod import;
mod outbox;
#[cfg(test)]
mod testing;

use anyhow::Context;
use clap::{Parser, Subcommand};
use herald_core::{
    config::{self, Config},
    shellexpand,
    tenant::{SchemaName, TenantContext},
    traits::{Dispatcher, WebhookTarget},
};
use herald_store::Store;
use herald_webhook::WebhookClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "herald",
    version,
    about = "Herald — WhatsApp campaign manager backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, env = "HERALD_CONFIG", default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API and the outbox drainer.
    Serve,
    /// Import contacts from a CSV or plain text file into a tenant.
    Import {
        /// File with one contact per line, optionally with a header row.
        file: PathBuf,
        /// Tenant schema to import into.
        #[arg(long)]
        schema: String,
        /// Country code for numbers written without `+` (e.g. 44).
        #[arg(long)]
        country: Option<String>,
        /// Keep stored names instead of replacing them.
        #[arg(long)]
        keep_names: bool,
    },
    /// Assign a user to a tenant schema.
    Tenant {
        user_id: String,
        schema: String,
    },
    /// Retry pending webhook deliveries once.
    Outbox,
    /// Show configuration and storage health.
    Status,
}

/// Daily rolling `herald.log` under `dir`, creating the directory first.
fn log_appender(dir: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log dir {}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("herald")
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("cannot open log file in {}", dir.display()))
}

/// Stderr logging plus a daily rolling file when a data dir is configured.
fn init_tracing(cfg: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.herald.log_level));

    let (file_layer, guard) = if cfg.herald.data_dir.trim().is_empty() {
        (None, None)
    } else {
        let dir = PathBuf::from(shellexpand(&cfg.herald.data_dir)).join("logs");
        let (writer, guard) = tracing_appender::non_blocking(log_appender(&dir)?);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(&cli.config)?;
    cfg.apply_env(|key| std::env::var(key).ok());
    let _log_guard = init_tracing(&cfg)?;

    match cli.command {
        Commands::Serve => {
            let store = Store::new(&cfg.store).await?;
            let dispatcher: Arc<dyn Dispatcher> = Arc::new(WebhookClient::from_config(&cfg.webhook)?);

            if !dispatcher.is_configured(WebhookTarget::Campaign) {
                tracing::warn!("campaign webhook not configured; campaigns will be stored only");
            }

            if cfg.outbox.enabled {
                tokio::spawn(outbox::outbox_loop(
                    store.clone(),
                    Arc::clone(&dispatcher),
                    cfg.outbox.poll_interval_secs,
                    cfg.outbox.max_attempts,
                ));
                info!(
                    "outbox drainer started (every {}s, max {} attempts)",
                    cfg.outbox.poll_interval_secs, cfg.outbox.max_attempts
                );
            }

            println!(
                "{} — Starting API on {}:{}",
                cfg.herald.name, cfg.api.host, cfg.api.port
            );
            let state = api::ApiState::new(store, dispatcher, &cfg);
            api::serve(cfg.api.clone(), state).await?;
        }
        Commands::Import {
            file,
            schema,
            country,
            keep_names,
        } => {
            let text = std::fs::read_to_string(&file)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;
            let tenant = TenantContext::new(SchemaName::parse(&schema)?);
            let store = Store::new(&cfg.store).await?;

            let options = import::ImportOptions {
                default_country_code: country
                    .or_else(|| Some(cfg.import.default_country_code.clone())),
                update_names: !keep_names,
            };
            let summary = import::run(&store, &tenant, &text, &options).await?;

            println!("Imported into {}:", tenant.schema);
            println!("  created:           {}", summary.created);
            println!("  updated:           {}", summary.updated);
            println!("  duplicates merged: {}", summary.duplicates_merged);
            println!("  skipped:           {}", summary.skipped_count);
            if let Some(msg) = &summary.skipped_message {
                println!("  {msg}");
            }
            for err in &summary.errors {
                println!("  error: {err}");
            }
            println!("  fields: {}", summary.available_fields.join(", "));
        }
        Commands::Tenant { user_id, schema } => {
            let schema = SchemaName::parse(&schema)?;
            let store = Store::new(&cfg.store).await?;
            store.register_user_schema(&user_id, &schema, None).await?;
            println!("{user_id} → {schema}");
        }
        Commands::Outbox => {
            let store = Store::new(&cfg.store).await?;
            let client = WebhookClient::from_config(&cfg.webhook)?;
            let summary =
                outbox::drain_once(&store, &client, None, cfg.outbox.max_attempts).await?;
            println!(
                "Outbox: {} delivered, {} retrying, {} exhausted",
                summary.delivered, summary.retrying, summary.exhausted
            );
        }
        Commands::Status => {
            println!("{} — Status Check\n", cfg.herald.name);
            println!("Config: {}", cli.config);
            println!("API:    {}:{}", cfg.api.host, cfg.api.port);
            println!(
                "Auth:   {}",
                if cfg.api.api_key.is_empty() { "open" } else { "bearer token" }
            );
            println!();

            let client = WebhookClient::from_config(&cfg.webhook)?;
            for target in [WebhookTarget::Campaign, WebhookTarget::SingleMessage] {
                println!(
                    "  {} webhook: {}",
                    target.as_str(),
                    if client.is_configured(target) { "configured" } else { "not configured" }
                );
            }
            println!(
                "  template catalog: {}",
                if cfg.webhook.template_catalog_url.is_empty() { "not configured" } else { "configured" }
            );
            println!();

            let store = Store::new(&cfg.store).await?;
            println!("  database: {} ({} bytes)", cfg.store.db_path, store.db_size().await?);
            let pending = store.pending_outbox(None, i64::MAX).await?;
            println!("  outbox pending: {}", pending.len());
        }
    }

    Ok(())
}
