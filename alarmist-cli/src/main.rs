//! CLI entry point for alarmist

use alarmist_agent::{friendly_date, DialogueEngine, Execution, TurnOutcome};
use alarmist_core::alarm::{Alarm, AlarmService};
use alarmist_core::config::{Config, ConfigLoader};
use alarmist_core::logging::init_logging;
use alarmist_core::session::SessionManager;
use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_SESSION: &str = "cli:direct";

#[derive(Parser)]
#[command(name = "alarmist")]
#[command(about = "A conversational alarm assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Init,
    /// Start an interactive conversation
    Chat {
        /// Session key for conversation continuity
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Send a single utterance
    Say {
        /// Utterance to send
        #[arg(short, long)]
        message: String,
        /// Session key for conversation continuity
        #[arg(short, long)]
        session: Option<String>,
        /// Print the generated command
        #[arg(long)]
        show_command: bool,
    },
    /// Inspect and trigger alarms
    Alarms {
        #[command(subcommand)]
        command: AlarmCommands,
    },
    /// Inspect conversation sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum AlarmCommands {
    /// List all alarms
    List,
    /// Fire the earliest alarm whose time has come
    Due,
    /// Poll for due alarms until interrupted
    Watch {
        /// Seconds between checks
        #[arg(short, long, default_value_t = 30)]
        interval_secs: u64,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Show conversation statistics
    Show {
        #[arg(short, long)]
        session: String,
    },
    /// Export the conversation as JSON
    Export {
        #[arg(short, long)]
        session: String,
    },
    /// List saved sessions
    List,
}

/// Everything a command needs, resolved from the loaded configuration
struct Context {
    loader: ConfigLoader,
    config: Config,
}

impl Context {
    fn load(loader: ConfigLoader) -> Result<Self> {
        let config = loader.load()?;
        Ok(Self { loader, config })
    }

    fn alarms(&self) -> Arc<AlarmService> {
        Arc::new(AlarmService::new(self.loader.resolve(&self.config.store.file)))
    }

    fn sessions(&self) -> SessionManager {
        SessionManager::new(self.loader.resolve(&self.config.sessions.dir))
    }

    fn engine(&self, store: Arc<AlarmService>) -> DialogueEngine {
        DialogueEngine::new(&self.config.dialogue).with_store(store)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };

    let command = match cli.command {
        Commands::Init => return run_init(&loader),
        other => other,
    };

    let ctx = Context::load(loader)?;
    let log_dir = ctx.loader.resolve(&ctx.config.logging.dir);
    std::fs::create_dir_all(&log_dir)?;
    let _guard = init_logging(&ctx.config.logging, &log_dir);

    match command {
        Commands::Init => {}
        Commands::Chat { session } => run_chat(&ctx, session).await?,
        Commands::Say {
            message,
            session,
            show_command,
        } => run_say(&ctx, &message, session, show_command).await?,
        Commands::Alarms { command } => match command {
            AlarmCommands::List => run_alarms_list(&ctx).await?,
            AlarmCommands::Due => run_alarms_due(&ctx).await?,
            AlarmCommands::Watch { interval_secs } => {
                run_alarms_watch(&ctx, interval_secs).await?
            }
        },
        Commands::Session { command } => match command {
            SessionCommands::Show { session } => run_session_show(&ctx, &session)?,
            SessionCommands::Export { session } => run_session_export(&ctx, &session)?,
            SessionCommands::List => run_session_list(&ctx),
        },
    }

    Ok(())
}

fn run_init(loader: &ConfigLoader) -> Result<()> {
    let config_path = loader.config_dir().join("config.json");
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Init cancelled.");
            return Ok(());
        }
    }

    let config = Config::default();
    loader.save(&config)?;
    std::fs::create_dir_all(loader.resolve(&config.sessions.dir))?;

    println!("{}", style("Configuration saved successfully!").green().bold());
    println!("Config location: {}", config_path.display());
    println!("\nYou can now run:");
    println!("  {} - Start chatting", style("alarmist chat").cyan());
    println!(
        "  {} - Send a single message",
        style("alarmist say --message 'set workout alarm for 7 AM'").cyan()
    );
    Ok(())
}

async fn run_chat(ctx: &Context, session: Option<String>) -> Result<()> {
    let engine = ctx.engine(ctx.alarms());
    let mut sessions = ctx.sessions();
    let key = session.unwrap_or_else(|| format!("cli:{}", Uuid::new_v4()));
    info!("Starting chat in session {}", key);

    println!("{}", style("Alarmist").bold().cyan());
    println!(
        "Session {}. Type {} for examples, {} to leave.\n",
        style(&key).dim(),
        style("help").cyan(),
        style("quit").cyan()
    );

    loop {
        let line: String = Input::new()
            .with_prompt(style("You").green().to_string())
            .allow_empty(true)
            .interact_text()?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text.to_lowercase().as_str(), "quit" | "exit") {
            break;
        }

        let outcome = {
            let session = sessions.get_or_create(key.as_str());
            engine.handle_turn(session, text).await
        };
        print_reply(&outcome, false);

        if let Err(e) = sessions.save(&key) {
            warn!("Failed to save session {}: {}", key, e);
        }
    }

    println!("{}", style("Goodbye!").cyan());
    Ok(())
}

async fn run_say(
    ctx: &Context,
    message: &str,
    session: Option<String>,
    show_command: bool,
) -> Result<()> {
    let engine = ctx.engine(ctx.alarms());
    let mut sessions = ctx.sessions();
    let key = session.unwrap_or_else(|| DEFAULT_SESSION.to_string());

    let outcome = {
        let session = sessions.get_or_create(key.as_str());
        engine.handle_turn(session, message).await
    };
    print_reply(&outcome, show_command);

    if let Err(e) = sessions.save(&key) {
        error!("Failed to save session {}: {}", key, e);
        anyhow::bail!("Failed to save session {}: {}", key, e);
    }
    Ok(())
}

fn print_reply(outcome: &TurnOutcome, show_command: bool) {
    println!("{} {}\n", style("Alarmist:").bold().cyan(), outcome.reply);

    if show_command {
        if let Some(command) = &outcome.command {
            println!("{} {}", style("Command:").bold(), command);
        }
    }
    if let Some(Execution::Failed { error }) = &outcome.execution {
        println!("{} {}\n", style("Store error:").red().bold(), error);
    }
}

async fn run_alarms_list(ctx: &Context) -> Result<()> {
    let alarms = ctx.alarms().list().await?;
    if alarms.is_empty() {
        println!("No alarms.");
        return Ok(());
    }

    println!("{}", style("Alarms").bold().cyan());
    println!();
    for alarm in &alarms {
        print_alarm(alarm);
    }
    Ok(())
}

fn print_alarm(alarm: &Alarm) {
    let today = Local::now().date_naive();
    let next = alarm
        .next_trigger
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("  {} ({})", style(&alarm.label).bold(), alarm.id);
    println!(
        "    When: {} {}",
        alarm.time,
        friendly_date(&alarm.date, today)
    );
    println!("    Repeat: {}", alarm.repeat);
    println!("    Status: {}", alarm.status);
    println!("    Next trigger: {}", next);
    println!();
}

async fn run_alarms_due(ctx: &Context) -> Result<()> {
    match ctx.alarms().due().await? {
        Some(due) => println!(
            "{} '{}' ({})",
            style("⏰ Ring!").yellow().bold(),
            due.alarm.label,
            due.scheduled_for.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Nothing due."),
    }
    Ok(())
}

async fn run_alarms_watch(ctx: &Context, interval_secs: u64) -> Result<()> {
    let service = ctx.alarms();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    info!("Watching alarms every {}s", interval_secs.max(1));
    println!("Watching for due alarms. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Drain everything that came due since the last tick
                loop {
                    match service.due().await {
                        Ok(Some(due)) => println!(
                            "{} '{}' ({})",
                            style("⏰ Ring!").yellow().bold(),
                            due.alarm.label,
                            due.scheduled_for.format("%Y-%m-%d %H:%M")
                        ),
                        Ok(None) => break,
                        Err(e) => {
                            error!("Failed to check alarms: {}", e);
                            break;
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping alarm watch");
                break;
            }
        }
    }
    Ok(())
}

fn run_session_show(ctx: &Context, key: &str) -> Result<()> {
    let mut sessions = ctx.sessions();
    let session = sessions.get_or_create(key);
    let stats = session.stats();

    println!("{}", style(format!("Session {}", key)).bold().cyan());
    println!("  State: {}", stats.current_state);
    println!(
        "  Intent: {}",
        stats
            .current_intent
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  Entities collected: {}", stats.entities_collected);
    println!("  Missing fields: {}", stats.missing_fields);
    println!("  Turns: {}", stats.conversation_turns);
    println!("  Retries: {}", stats.retry_count);
    println!(
        "  User: {}",
        stats.user_name.as_deref().unwrap_or("-")
    );
    if let Some(last) = &session.last_action {
        println!("  Last action: {} at {}", last.intent, last.timestamp);
    }
    Ok(())
}

fn run_session_export(ctx: &Context, key: &str) -> Result<()> {
    let mut sessions = ctx.sessions();
    let log = sessions.get_or_create(key).export();
    println!("{}", serde_json::to_string_pretty(&log)?);
    Ok(())
}

fn run_session_list(ctx: &Context) {
    let sessions = ctx.sessions().list_sessions();
    if sessions.is_empty() {
        println!("No saved sessions.");
        return;
    }
    for info in sessions {
        println!(
            "  {} [{}] {} turn(s), updated {}",
            style(&info.key).bold(),
            info.state.as_deref().unwrap_or("-"),
            info.turns,
            info.updated_at.as_deref().unwrap_or("-")
        );
    }
}
