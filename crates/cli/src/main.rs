//! VAULT CLI - terminal front end for the escape-room vault.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vault_core::{format_clock, LevelId, LevelStatus};
use vault_leaderboard::{LeaderboardService, DEFAULT_LIMIT};
use vault_progress::ProgressionTracker;
use vault_session::{
    Challenge, ChallengeFeedback, ChallengePack, LeaderboardView, Notice, SessionConfig,
    SessionEvent, SessionState, Timer, Vault,
};
use vault_storage::{RestConfig, ScoreStore, StoreConfig, StoreKind, LEADERBOARD_TABLE};

#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "Timed escape-room vault with a shared leaderboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Leaderboard backend
    #[arg(long, value_enum, env = "VAULT_STORE", default_value = "json", global = true)]
    store: StoreArg,

    /// Directory for the JSON backend
    #[arg(long, env = "VAULT_DATA_DIR", default_value = ".vault", global = true)]
    data_dir: PathBuf,

    /// Base URL of the REST backend
    #[arg(long, env = "VAULT_STORE_URL", default_value = "", global = true)]
    url: String,

    /// API key for the REST backend
    #[arg(long, env = "VAULT_STORE_KEY", default_value = "", hide_env_values = true, global = true)]
    api_key: String,

    /// Table holding the scores
    #[arg(long, default_value = LEADERBOARD_TABLE, global = true)]
    table: String,

    /// REST request timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout_secs: u64,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the vault interactively
    Play {
        /// Challenge pack with the level passwords
        #[arg(long, default_value = "demos/challenges.json")]
        pack: PathBuf,
        /// Name used for every submission instead of prompting
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the fastest runs for a level
    Leaderboard {
        /// Level number
        level: LevelId,
        /// Number of entries
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Append a run to the leaderboard
    Submit {
        /// Level number
        #[arg(long)]
        level: LevelId,
        /// Completion time in seconds
        #[arg(long)]
        seconds: u32,
        /// Player name
        #[arg(long, default_value = "")]
        name: String,
    },
    /// List the levels
    Levels,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreArg {
    Memory,
    Json,
    Rest,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreKind::Memory,
            StoreArg::Json => StoreKind::Json,
            StoreArg::Rest => StoreKind::Rest,
        }
    }
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            kind: self.store.into(),
            data_dir: self.data_dir.clone(),
            rest: RestConfig {
                url: self.url.clone(),
                api_key: self.api_key.clone(),
                table: self.table.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            },
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let store_config = cli.store_config();

    match cli.command {
        Commands::Play { pack, name } => {
            let pack = ChallengePack::load(&pack)
                .await
                .with_context(|| format!("Failed to load challenge pack {}", pack.display()))?;
            let service = open_service(&store_config).await?;
            let vault = Vault::new(ProgressionTracker::standard(), service, SessionConfig::default());
            play(vault, pack, name).await?;
        }
        Commands::Leaderboard { level, limit } => {
            let service = open_service(&store_config).await?;
            match service.fetch_top(level, limit).await {
                Ok(snapshot) => print_entries(level, &LeaderboardView::Ready(snapshot)),
                Err(e) => {
                    warn!("{}", e);
                    print_entries(level, &LeaderboardView::Unavailable);
                }
            }
        }
        Commands::Submit { level, seconds, name } => {
            if ProgressionTracker::standard().level(level).is_none() {
                bail!("Unknown level {}", level);
            }
            let service = open_service(&store_config).await?;
            let entry = service.submit(&name, level, seconds).await?;
            println!(
                "Recorded {} for {} on level {} ({})",
                format_clock(u64::from(entry.completion_time)),
                entry.player_name,
                entry.level_id,
                entry.id
            );
        }
        Commands::Levels => {
            print_levels(&ProgressionTracker::standard());
        }
    }

    Ok(())
}

async fn open_service(config: &StoreConfig) -> Result<LeaderboardService<Box<dyn ScoreStore>>> {
    let store = config.open().await.context("Failed to open score store")?;
    if !store.health_check().await {
        warn!("Score store did not answer its health check");
    }
    Ok(LeaderboardService::new(store))
}

/// Input that shows the leaderboard mid-attempt.
const TOP_COMMAND: &str = "top";

fn is_top_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(TOP_COMMAND)
}

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, text: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}

async fn play<S: ScoreStore + 'static>(
    mut vault: Vault<S>,
    pack: ChallengePack,
    name: Option<String>,
) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_levels(vault.tracker());
        if vault.tracker().is_finished() {
            println!("The vault is open. Well done.");
            return Ok(());
        }

        let Some(line) = prompt(&mut input, "Level (q to quit) > ").await? else {
            return Ok(());
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let Ok(id) = line.parse::<LevelId>() else {
            println!("Enter a level number.");
            continue;
        };

        let Some(level) = vault.tracker().level(id).cloned() else {
            println!("There is no level {}.", id);
            continue;
        };
        let Some(mut challenge) = pack.challenge_for(&level) else {
            println!("No challenge installed for level {}.", id);
            continue;
        };

        let callbacks = match vault.enter(id) {
            Ok(callbacks) => callbacks,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        challenge.mount(callbacks);
        println!("\n== {} ==\n{}\n(type `top` for the leaderboard, `back` to leave)", challenge.title(), level.description);

        if !attempt(&mut vault, &mut challenge, &mut input, name.as_deref()).await? {
            return Ok(());
        }
    }
}

/// Run one level attempt. Returns `false` when input ended.
async fn attempt<S: ScoreStore + 'static>(
    vault: &mut Vault<S>,
    challenge: &mut dyn Challenge,
    input: &mut Input,
    name: Option<&str>,
) -> Result<bool> {
    loop {
        let clock = vault
            .active()
            .map(|a| a.formatted_time())
            .unwrap_or_else(|| format_clock(0));
        let Some(line) = prompt(input, &format!("[{}] > ", clock)).await? else {
            vault.leave();
            return Ok(false);
        };

        if is_top_command(&line) {
            if let Some(active) = vault.active_mut() {
                let level_id = active.level_id();
                let view = active.open_leaderboard().await.clone();
                active.close_leaderboard();
                print_entries(level_id, &view);
            }
            continue;
        }

        match challenge.input(&line) {
            ChallengeFeedback::Rejected(hint) => println!("{}", hint),
            ChallengeFeedback::Accepted => println!("Unlocked!"),
            ChallengeFeedback::Back | ChallengeFeedback::Ignored => {}
        }

        let events = vault.drain();
        if events.contains(&SessionEvent::ChallengeAbandoned) {
            return Ok(true);
        }
        let awaiting = vault
            .active()
            .map(|a| a.state() == SessionState::AwaitingName)
            .unwrap_or(false);
        if awaiting {
            return finish(vault, input, name).await;
        }
    }
}

/// Capture a name and submit, offering retries.
async fn finish<S: ScoreStore + 'static>(
    vault: &mut Vault<S>,
    input: &mut Input,
    name: Option<&str>,
) -> Result<bool> {
    let Some(active) = vault.active_mut() else {
        return Ok(true);
    };
    let level_id = active.level_id();
    println!("Solved in {}.", active.timer().formatted());

    let player_name = match name {
        Some(name) => name.to_string(),
        None => match prompt(input, "Your name > ").await? {
            Some(line) => line,
            None => {
                vault.leave();
                return Ok(false);
            }
        },
    };
    active.set_player_name(&player_name)?;

    loop {
        let result = vault.submit().await;
        if let Some(active) = vault.active_mut() {
            print_notices(active.take_notices());
        }

        match result {
            Ok(completion) => {
                if let Some(next) = completion.unlocked {
                    info!("Level {} is now open", next);
                }
                print_entries(level_id, &completion.leaderboard);
                vault.leave();
                return Ok(true);
            }
            Err(e) => {
                warn!("{}", e);
                match prompt(input, "Retry? [Y/n] > ").await? {
                    Some(answer) if !answer.trim().eq_ignore_ascii_case("n") => continue,
                    Some(_) => {
                        vault.leave();
                        return Ok(true);
                    }
                    None => {
                        vault.leave();
                        return Ok(false);
                    }
                }
            }
        }
    }
}

fn print_levels(tracker: &ProgressionTracker) {
    let progress = tracker.progress();
    println!(
        "\nVAULT  {}/{} ({:.0}%)",
        progress.completed, progress.total, progress.percentage
    );
    for level in tracker.levels() {
        let marker = match level.status() {
            LevelStatus::Completed => "[x]",
            LevelStatus::Available => "[ ]",
            LevelStatus::Locked => "[#]",
        };
        println!(
            "  {} {:>2}. {} ({})",
            marker, level.id, level.title, level.difficulty
        );
    }
}

fn print_entries(level_id: LevelId, view: &LeaderboardView) {
    println!("Leaderboard - level {}", level_id);
    let entries = view.entries();
    if entries.is_empty() {
        match view {
            LeaderboardView::Unavailable => println!("  (leaderboard unavailable)"),
            _ => println!("  No times yet."),
        }
        return;
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<20} {}",
            rank + 1,
            entry.player_name,
            format_clock(u64::from(entry.completion_time))
        );
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice {
            Notice::Success(message) => println!("{}", message),
            Notice::Error(message) => eprintln!("{}", message),
        }
    }
}
