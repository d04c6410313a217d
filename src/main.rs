//! passrake: adaptive credential auditing for digests and login forms.
//!
//! Thin CLI over the library coordinator: parse flags, load the wordlist
//! and proxies, run the attack, print a summary.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use passrake::attack::wordlist;
use passrake::{
    ApprovalGate, AttackCoordinator, AttackReport, CoordinatorError, FeasibilityReport, ProxyPool,
    RuleEngine, TargetKind,
};

#[derive(Parser)]
#[command(name = "passrake")]
#[command(version)]
#[command(about = "Adaptive credential auditing for offline digests and web login forms")]
struct Cli {
    /// Target digest (hash mode) or login form URL (web mode)
    #[arg(long)]
    target: String,

    /// Attack class
    #[arg(long = "type", value_enum)]
    kind: AttackTypeArg,

    /// Newline-delimited candidate wordlist
    #[arg(long)]
    wordlist: PathBuf,

    /// Username submitted with every web guess
    #[arg(long, default_value = "admin")]
    username: String,

    /// Newline-delimited proxy endpoints
    #[arg(long)]
    proxies: Option<PathBuf>,

    /// Checkpoint file backing resumable sessions
    #[arg(long, default_value = "session.json")]
    checkpoint: PathBuf,

    /// Requests admitted per sliding second in web mode
    #[arg(long, default_value = "50")]
    rate: usize,

    /// Expand the wordlist with mangling rules before the run
    #[arg(long)]
    enhance: bool,

    /// Skip the confirmation gate on long estimates
    #[arg(long)]
    yes: bool,

    /// Probe proxies against echo targets before the run
    #[arg(long)]
    verify_proxies: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum AttackTypeArg {
    Hash,
    Web,
    Ssh,
}

impl From<AttackTypeArg> for TargetKind {
    fn from(arg: AttackTypeArg) -> Self {
        match arg {
            AttackTypeArg::Hash => TargetKind::Hash,
            AttackTypeArg::Web => TargetKind::Web,
            AttackTypeArg::Ssh => TargetKind::Ssh,
        }
    }
}

/// Interactive go/no-go prompt for long-running estimates.
struct PromptGate;

impl ApprovalGate for PromptGate {
    fn confirm(&self, feasibility: &FeasibilityReport) -> bool {
        print!(
            "Estimated {} for {} operations. Continue? [y/N] ",
            feasibility.formatted, feasibility.total_operations
        );
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

async fn run(cli: Cli) -> Result<AttackReport, CoordinatorError> {
    let kind = TargetKind::from(cli.kind);

    let mut candidates = wordlist::load(&cli.wordlist)?;
    if cli.enhance {
        let before = candidates.len();
        candidates = RuleEngine::new().enhance(&candidates);
        log::info!(
            "rule engine expanded {before} words into {} candidates",
            candidates.len()
        );
    }

    let mut pool = ProxyPool::default();
    if let Some(path) = cli.proxies.as_ref() {
        match pool.load_file(path) {
            Ok(added) => log::info!("loaded {added} proxies from {}", path.display()),
            Err(err) => log::warn!("{err}; continuing with direct connections"),
        }
    } else if kind == TargetKind::Web {
        log::info!("no proxies specified, using direct connections");
    }
    if cli.verify_proxies && pool.healthy_len() > 0 {
        let alive = pool.verify_all().await;
        log::info!("{alive} proxies verified reachable");
    }

    let mut coordinator = AttackCoordinator::new(kind, &cli.target)
        .with_candidates(candidates)
        .with_username(&cli.username)
        .with_proxy_pool(pool)
        .with_checkpoint_path(&cli.checkpoint)
        .with_rate_ceiling(cli.rate);
    if !cli.yes {
        coordinator = coordinator.with_gate(PromptGate);
    }

    coordinator.run().await
}

fn print_summary(report: &AttackReport) {
    let elapsed = report.elapsed.as_secs_f64();
    println!();
    println!("{}", "=".repeat(50));
    println!("RESULTS");
    println!("{}", "=".repeat(50));
    println!("Success:  {}", report.success);
    if let Some(value) = &report.value {
        println!("Value:    {value}");
    }
    println!("Attempts: {}", report.attempts);
    println!("Elapsed:  {elapsed:.2}s");
    if elapsed > 0.0 && report.attempts > 0 {
        println!("Rate:     {:.0} attempts/s", report.attempts as f64 / elapsed);
    }
    println!("Strategy: {}", report.strategy);
    println!("{}", "=".repeat(50));
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) => {
            print_summary(&report);
            std::process::exit(if report.success { 0 } else { 1 });
        }
        Err(err) => {
            log::error!("{err}");
            std::process::exit(2);
        }
    }
}
