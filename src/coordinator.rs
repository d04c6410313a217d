//! Top-level attack lifecycle.
//!
//! The coordinator resolves the target, runs the feasibility gate, picks
//! the engine, and owns the session for the run. Whatever happens after
//! `run` starts, a final checkpoint is written before it returns.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::attack::estimate::{self, FeasibilityReport};
use crate::attack::form::{FormSubmitter, HttpFormSubmitter};
use crate::attack::hash::{HashAttackEngine, HashAttackError, HashEngineConfig};
use crate::attack::target::{AttackTarget, DigestTarget, FormTarget, TargetError, TargetKind};
use crate::attack::web::{WebAttackEngine, WebEngineConfig};
use crate::attack::wordlist::{self, WordlistError};
use crate::modules::checkpoint::{Checkpoint, CheckpointStore};
use crate::modules::proxy::ProxyPool;
use crate::modules::session::SessionTracker;
use crate::modules::strategy::{ProtectionLevel, StrategyConfig, StrategyController};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no engine available for {0} targets")]
    UnsupportedAttackType(&'static str),
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),
    #[error("wordlist produced no candidates")]
    EmptyWordlist,
    #[error(transparent)]
    Wordlist(#[from] WordlistError),
    #[error(transparent)]
    Hash(#[from] HashAttackError),
}

/// Lifecycle phases. Ordering is part of the contract; phases only move
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttackPhase {
    Idle,
    Analyzing,
    AwaitingConfirmation,
    Running,
    Terminated,
}

/// Final record of one run.
#[derive(Debug, Clone)]
pub struct AttackReport {
    pub success: bool,
    pub value: Option<String>,
    pub attempts: u64,
    pub elapsed: Duration,
    pub strategy: String,
}

/// Go/no-go decision point consulted when the estimate crosses the
/// confirmation threshold.
pub trait ApprovalGate: Send + Sync {
    fn confirm(&self, feasibility: &FeasibilityReport) -> bool;
}

/// Gate that always proceeds. The default for library use; the binary
/// installs an interactive gate instead.
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn confirm(&self, _feasibility: &FeasibilityReport) -> bool {
        true
    }
}

pub struct AttackCoordinator {
    kind: TargetKind,
    raw_target: String,
    username: String,
    candidates: Vec<String>,
    level: ProtectionLevel,
    controller: StrategyController,
    pool: ProxyPool,
    store: CheckpointStore,
    session: SessionTracker,
    submitter: Arc<dyn FormSubmitter>,
    gate: Box<dyn ApprovalGate>,
    hash_config: HashEngineConfig,
    web_config: WebEngineConfig,
    confirmation_threshold: Duration,
    phase: AttackPhase,
}

impl AttackCoordinator {
    pub fn new(kind: TargetKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            raw_target: target.into(),
            username: "admin".to_string(),
            candidates: Vec::new(),
            level: ProtectionLevel::Medium,
            controller: StrategyController::default(),
            pool: ProxyPool::default(),
            store: CheckpointStore::new("session.json"),
            session: SessionTracker::new(),
            submitter: Arc::new(HttpFormSubmitter::new()),
            gate: Box::new(AutoApprove),
            hash_config: HashEngineConfig::default(),
            web_config: WebEngineConfig::default(),
            confirmation_threshold: Duration::from_secs(3_600),
            phase: AttackPhase::Idle,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Loads candidates from a newline-delimited file.
    pub fn with_wordlist_file(mut self, path: impl AsRef<Path>) -> Result<Self, CoordinatorError> {
        self.candidates = wordlist::load(path)?;
        Ok(self)
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Seeds both the feasibility posture and the starting strategy.
    pub fn with_protection_level(mut self, level: ProtectionLevel) -> Self {
        self.level = level;
        self.controller = StrategyController::new(StrategyConfig::for_protection_level(level));
        self
    }

    pub fn with_strategy(mut self, config: StrategyConfig) -> Self {
        self.controller = StrategyController::new(config);
        self
    }

    pub fn with_proxy_pool(mut self, pool: ProxyPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_checkpoint_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.store = CheckpointStore::new(path);
        self
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn FormSubmitter>) -> Self {
        self.submitter = submitter;
        self
    }

    pub fn with_gate(mut self, gate: impl ApprovalGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_rate_ceiling(mut self, ceiling: usize) -> Self {
        self.web_config.rate_ceiling = ceiling;
        self
    }

    pub fn with_confirmation_threshold(mut self, threshold: Duration) -> Self {
        self.confirmation_threshold = threshold;
        self
    }

    pub fn with_hash_config(mut self, config: HashEngineConfig) -> Self {
        self.hash_config = config;
        self
    }

    pub fn with_web_config(mut self, config: WebEngineConfig) -> Self {
        self.web_config = config;
        self
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Runs the attack to completion. A final checkpoint is written on
    /// every path out, including faults and the declined gate.
    pub async fn run(&mut self) -> Result<AttackReport, CoordinatorError> {
        let outcome = self.execute().await;
        self.finish();
        outcome
    }

    async fn execute(&mut self) -> Result<AttackReport, CoordinatorError> {
        self.advance(AttackPhase::Analyzing);
        let target = self.resolve_target()?;
        if self.candidates.is_empty() {
            return Err(CoordinatorError::EmptyWordlist);
        }

        let feasibility = self.estimate(&target);
        log::info!(
            "{} attack: {} operations at {:.0}/s, about {} ({})",
            self.kind.name(),
            feasibility.total_operations,
            feasibility.rate,
            feasibility.formatted,
            feasibility.complexity.name()
        );
        for line in &feasibility.recommendations {
            log::info!("advice: {line}");
        }
        for tool in estimate::advise(self.kind) {
            log::info!("consider {}: {}", tool.name, tool.note);
        }

        if feasibility.duration > self.confirmation_threshold {
            self.advance(AttackPhase::AwaitingConfirmation);
            if !self.gate.confirm(&feasibility) {
                log::warn!("run declined at the confirmation gate");
                return Ok(self.report(false, None, "aborted"));
            }
        }

        self.advance(AttackPhase::Running);
        match target {
            AttackTarget::Digest(digest) => {
                let engine = HashAttackEngine::new(self.hash_config.clone());
                let (strategy, outcome) =
                    engine.run(&digest, &self.candidates, &self.session).await?;
                let success = outcome.is_some();
                Ok(self.report(success, outcome, strategy.name()))
            }
            AttackTarget::Form(form) => {
                let loaded = self.store.load();
                self.session = SessionTracker::resume(loaded.attempts, loaded.cursor, loaded.found);
                self.pool.seed_blacklist(loaded.blacklist);
                let engine =
                    WebAttackEngine::with_config(self.submitter.clone(), self.web_config.clone());
                let outcome = engine
                    .run(
                        &form,
                        &self.candidates,
                        &self.session,
                        &mut self.controller,
                        &mut self.pool,
                        &self.store,
                    )
                    .await;
                let success = outcome.is_some();
                Ok(self.report(success, outcome, "web-sequential"))
            }
        }
    }

    fn resolve_target(&self) -> Result<AttackTarget, CoordinatorError> {
        match self.kind {
            TargetKind::Hash => Ok(AttackTarget::Digest(DigestTarget::parse(&self.raw_target)?)),
            TargetKind::Web => Ok(AttackTarget::Form(FormTarget::new(
                &self.raw_target,
                self.username.clone(),
            )?)),
            TargetKind::Ssh => Err(CoordinatorError::UnsupportedAttackType("ssh")),
        }
    }

    fn estimate(&self, target: &AttackTarget) -> FeasibilityReport {
        let count = self.candidates.len() as u64;
        match target {
            AttackTarget::Digest(_) => estimate::estimate_digest(count),
            AttackTarget::Form(_) => estimate::estimate_form(count, self.level),
        }
    }

    fn report(&self, success: bool, value: Option<String>, strategy: &str) -> AttackReport {
        let snapshot = self.session.snapshot();
        AttackReport {
            success,
            value,
            attempts: snapshot.attempts,
            elapsed: snapshot.elapsed,
            strategy: strategy.to_string(),
        }
    }

    fn advance(&mut self, next: AttackPhase) {
        debug_assert!(next >= self.phase, "phase may only move forward");
        if next != self.phase {
            log::debug!("phase {:?} -> {next:?}", self.phase);
            self.phase = next;
        }
    }

    /// Terminal cleanup: best-effort checkpoint, then the phase latch.
    fn finish(&mut self) {
        let snapshot = self.session.snapshot();
        let checkpoint = Checkpoint::new(
            snapshot.attempts,
            snapshot.cursor,
            snapshot.found,
            self.pool.blacklist_snapshot(),
        );
        if let Err(err) = self.store.save(&checkpoint) {
            log::warn!("final checkpoint write failed: {err}");
        }
        self.advance(AttackPhase::Terminated);
        log::info!(
            "terminated after {} attempts in {:?}",
            snapshot.attempts,
            snapshot.elapsed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::hash::HashStrategy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HUNTER2_MD5: &str = "2ab96390c7dbe3439de74d0c9b0b1767";

    struct DenyAll;

    impl ApprovalGate for DenyAll {
        fn confirm(&self, _feasibility: &FeasibilityReport) -> bool {
            false
        }
    }

    struct CountingGate(Arc<AtomicUsize>);

    impl ApprovalGate for CountingGate {
        fn confirm(&self, _feasibility: &FeasibilityReport) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn ssh_targets_are_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut coordinator = AttackCoordinator::new(TargetKind::Ssh, "10.0.0.5:22")
            .with_candidates(words(&["root"]))
            .with_checkpoint_path(&path);

        let result = coordinator.run().await;
        assert!(matches!(
            result,
            Err(CoordinatorError::UnsupportedAttackType("ssh"))
        ));
        assert_eq!(coordinator.phase(), AttackPhase::Terminated);
        // The final checkpoint is written even on the rejection path.
        assert!(path.exists());
    }

    #[tokio::test]
    async fn hash_run_recovers_the_preimage() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
            .with_candidates(words(&["abc", "hunter2", "xyz"]))
            .with_checkpoint_path(dir.path().join("session.json"))
            .with_hash_config(HashEngineConfig {
                force: Some(HashStrategy::Sequential),
                ..HashEngineConfig::default()
            });

        let report = coordinator.run().await.unwrap();
        assert!(report.success);
        assert_eq!(report.value.as_deref(), Some("hunter2"));
        assert_eq!(report.attempts, 2);
        assert_eq!(report.strategy, "sequential");
        assert_eq!(coordinator.phase(), AttackPhase::Terminated);
    }

    #[tokio::test]
    async fn declined_gate_aborts_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
            .with_candidates(words(&["abc", "hunter2"]))
            .with_checkpoint_path(dir.path().join("session.json"))
            .with_confirmation_threshold(Duration::ZERO)
            .with_gate(DenyAll);

        let report = coordinator.run().await.unwrap();
        assert!(!report.success);
        assert_eq!(report.value, None);
        assert_eq!(report.strategy, "aborted");
        assert_eq!(report.attempts, 0);
        assert_eq!(coordinator.phase(), AttackPhase::Terminated);
    }

    #[tokio::test]
    async fn gate_is_consulted_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
            .with_candidates(words(&["abc", "hunter2"]))
            .with_checkpoint_path(dir.path().join("session.json"))
            .with_confirmation_threshold(Duration::ZERO)
            .with_gate(CountingGate(calls.clone()));

        coordinator.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_runs_skip_the_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
            .with_candidates(words(&["abc", "hunter2"]))
            .with_checkpoint_path(dir.path().join("session.json"))
            .with_gate(CountingGate(calls.clone()));

        coordinator.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_digest_is_an_invalid_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, "not-a-digest")
            .with_candidates(words(&["abc"]))
            .with_checkpoint_path(dir.path().join("session.json"));

        let result = coordinator.run().await;
        assert!(matches!(result, Err(CoordinatorError::InvalidTarget(_))));
        assert_eq!(coordinator.phase(), AttackPhase::Terminated);
    }

    #[tokio::test]
    async fn empty_wordlists_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
            .with_checkpoint_path(dir.path().join("session.json"));

        let result = coordinator.run().await;
        assert!(matches!(result, Err(CoordinatorError::EmptyWordlist)));
    }

    #[test]
    fn phases_order_forward() {
        assert!(AttackPhase::Idle < AttackPhase::Analyzing);
        assert!(AttackPhase::Analyzing < AttackPhase::AwaitingConfirmation);
        assert!(AttackPhase::AwaitingConfirmation < AttackPhase::Running);
        assert!(AttackPhase::Running < AttackPhase::Terminated);
    }
}
