use anyhow::{bail, Context, Result};
use background_service::{BackgroundService, SettingsRequest};
use clap::{Parser, Subcommand};
use database::Database;
use feed_scanner::{HostPage, ScanEngine, SnapshotPage};
use reply_popup::{MemoryClipboard, RecordingLauncher, RecordingSurface};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use xbird::{ContentScript, PageEvent};
use xbird_core::{AppConfig, Intensity, Mood, PostId, SettingsStore};

const DEFAULT_LOG_FILTER: &str = "xbird=info,feed_scanner=info,reply_client=info";

#[derive(Parser)]
#[command(name = "xbird", version, about = "Inline reply generation for the X feed")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `feed_scanner=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the posts in an HTML snapshot that would get a reply button
    Scan {
        html: PathBuf,
        #[arg(long, default_value = "https://x.com/home")]
        url: String,
    },
    /// Generate a reply for one post of an HTML snapshot
    Reply {
        html: PathBuf,
        post_id: String,
        #[arg(long, default_value = "https://x.com/home")]
        url: String,
        #[arg(long)]
        intent: Option<String>,
        #[arg(long)]
        mood: Option<Mood>,
        #[arg(long)]
        intensity: Option<i64>,
    },
    /// Show or change the extension settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage the Hugging Face API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Get,
    Set {
        #[arg(long)]
        intensity: Option<i64>,
        #[arg(long)]
        mood: Option<Mood>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Restore the install-time defaults
    Reset,
}

#[derive(Subcommand)]
enum KeyAction {
    Set { key: String },
    Clear,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

async fn open_database(config: &AppConfig) -> Result<Arc<Database>> {
    let db = Database::open(config.storage.database_url.clone())
        .await
        .context("opening settings database")?;
    Ok(Arc::new(db))
}

fn read_snapshot(html: &Path, url: &str) -> Result<SnapshotPage> {
    let raw = std::fs::read_to_string(html)
        .with_context(|| format!("reading {}", html.display()))?;
    Ok(SnapshotPage::parse(url, &raw))
}

fn scan(config: &AppConfig, html: &Path, url: &str) -> Result<()> {
    let mut page = read_snapshot(html, url)?;
    let mut engine = ScanEngine::new(&config.scan)?;
    let report = engine.start(&mut page);

    if let Some(fault) = &report.fault {
        bail!("scan failed: {fault}");
    }
    for affordance in page.affordances() {
        println!(
            "{}\t{}\t{:?}\t{}",
            affordance.post.id,
            affordance.view_count,
            affordance.tier(),
            affordance.title
        );
    }
    println!(
        "{} eligible, {} skipped on {}",
        report.attached.len(),
        report.skipped,
        page.location()
    );
    Ok(())
}

async fn reply(
    config: &AppConfig,
    html: &Path,
    url: &str,
    post_id: &str,
    intent: Option<String>,
    mood: Option<Mood>,
    intensity: Option<i64>,
) -> Result<()> {
    let db = open_database(config).await?;
    let settings = db.load_settings().await?;

    let mut script = ContentScript::new(
        config,
        read_snapshot(html, url)?,
        RecordingSurface::default(),
        MemoryClipboard::default(),
        RecordingLauncher::default(),
        db,
    )?;
    script.set_enabled(settings.extension_enabled);
    script.start();

    let Some(affordance) = script.page().affordance(&PostId::new(post_id)).cloned() else {
        bail!("post {post_id} is not eligible for a reply in this snapshot");
    };

    let (events, receiver) = mpsc::channel(8);
    if let Some(intent) = intent {
        events.send(PageEvent::SetIntent(intent)).await?;
    }
    if let Some(mood) = mood {
        events.send(PageEvent::SetMood(mood)).await?;
    }
    if let Some(intensity) = intensity {
        events
            .send(PageEvent::SetIntensity(Intensity::new(intensity)))
            .await?;
    }
    events.send(PageEvent::Activate(affordance)).await?;
    drop(events);

    script.run(receiver).await;

    let view = script.controller().view();
    if let Some(score) = &view.score {
        for line in score.lines() {
            println!("{line}");
        }
    }
    println!();
    println!("{}", view.body.text());
    Ok(())
}

async fn settings(config: &AppConfig, action: SettingsAction) -> Result<()> {
    let service = BackgroundService::new(open_database(config).await?);

    match action {
        SettingsAction::Get => {}
        SettingsAction::Reset => service.on_installed().await?,
        SettingsAction::Set {
            intensity,
            mood,
            enabled,
        } => {
            let mut settings = service.store().load_settings().await?;
            if let Some(intensity) = intensity {
                settings.brainrot_intensity = Intensity::new(intensity);
            }
            if let Some(mood) = mood {
                settings.default_mood = mood;
            }
            if let Some(enabled) = enabled {
                settings.extension_enabled = enabled;
            }
            let response = service
                .handle(SettingsRequest::SaveSettings { settings })
                .await;
            println!("{}", serde_json::to_string(&response)?);
        }
    }

    let current = service.handle(SettingsRequest::GetSettings).await;
    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}

async fn key(config: &AppConfig, action: KeyAction) -> Result<()> {
    let db = open_database(config).await?;
    match action {
        KeyAction::Set { key } => {
            db.save_credential(&key).await?;
            println!("API Key saved successfully!");
        }
        KeyAction::Clear => {
            db.clear_credential().await?;
            println!("API key cleared");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_ref())?;
    tracing::debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Command::Scan { html, url } => scan(&config, &html, &url),
        Command::Reply {
            html,
            post_id,
            url,
            intent,
            mood,
            intensity,
        } => reply(&config, &html, &url, &post_id, intent, mood, intensity).await,
        Command::Settings { action } => settings(&config, action).await,
        Command::Key { action } => key(&config, action).await,
    }
}
