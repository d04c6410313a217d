//! End-to-end runs through the public coordinator API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use passrake::{
    AttackCoordinator,
    Checkpoint,
    CheckpointStore,
    FormReply,
    FormRequest,
    FormSubmitter,
    HashEngineConfig,
    HashStrategy,
    ProxyPool,
    StrategyConfig,
    SubmitError,
    TargetKind,
};

const HUNTER2_MD5: &str = "2ab96390c7dbe3439de74d0c9b0b1767";

/// Replays a canned verdict sequence and records every request it saw.
struct ScriptedSubmitter {
    script: Mutex<VecDeque<Result<FormReply, SubmitError>>>,
    seen: Mutex<Vec<FormRequest>>,
}

impl ScriptedSubmitter {
    fn new(script: Vec<Result<FormReply, SubmitError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<FormRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormSubmitter for ScriptedSubmitter {
    async fn submit(&self, request: &FormRequest) -> Result<FormReply, SubmitError> {
        self.seen.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FormReply::new(200, "invalid credentials")))
    }
}

fn rejected() -> Result<FormReply, SubmitError> {
    Ok(FormReply::new(200, "Invalid username or password"))
}

fn accepted() -> Result<FormReply, SubmitError> {
    Ok(FormReply::new(200, "Welcome back"))
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn quiet_strategy() -> StrategyConfig {
    StrategyConfig {
        delay: Duration::ZERO,
        proxy_rotate: false,
        identity_rotate: false,
        random_delay: false,
        ..StrategyConfig::default()
    }
}

#[tokio::test]
async fn every_hash_strategy_recovers_the_known_preimage() {
    for strategy in [
        HashStrategy::Sequential,
        HashStrategy::BatchedParallel,
        HashStrategy::VectorizedBatch,
    ] {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
            .with_candidates(words(&["abc", "hunter2", "xyz"]))
            .with_checkpoint_path(dir.path().join("session.json"))
            .with_hash_config(HashEngineConfig {
                force: Some(strategy),
                batch_size: 2,
                vector_batch: 2,
                ..HashEngineConfig::default()
            });

        let report = coordinator.run().await.unwrap();
        assert!(report.success, "{} did not succeed", strategy.name());
        assert_eq!(report.value.as_deref(), Some("hunter2"));
        assert_eq!(report.strategy, strategy.name());
        match strategy {
            HashStrategy::Sequential => assert_eq!(report.attempts, 2),
            _ => assert!(
                (2..=3).contains(&report.attempts),
                "{} reported {} attempts",
                strategy.name(),
                report.attempts
            ),
        }
    }
}

#[tokio::test]
async fn exhausted_hash_runs_report_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let mut coordinator = AttackCoordinator::new(TargetKind::Hash, HUNTER2_MD5)
        .with_candidates(words(&["one", "two", "three", "four"]))
        .with_checkpoint_path(dir.path().join("session.json"))
        .with_hash_config(HashEngineConfig {
            force: Some(HashStrategy::Sequential),
            ..HashEngineConfig::default()
        });

    let report = coordinator.run().await.unwrap();
    assert!(!report.success);
    assert_eq!(report.value, None);
    assert_eq!(report.attempts, 4);
}

#[tokio::test]
async fn web_runs_resume_from_the_stored_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_path = dir.path().join("session.json");

    // A previous session consumed 50 candidates and burned one proxy.
    let store = CheckpointStore::new(&checkpoint_path);
    store
        .save(&Checkpoint::new(
            50,
            50,
            false,
            vec!["http://10.9.8.7:3128".to_string()],
        ))
        .unwrap();

    let wordlist_path = dir.path().join("words.txt");
    let lines: Vec<String> = (0..60).map(|i| format!("word{i}")).collect();
    std::fs::write(&wordlist_path, lines.join("\n")).unwrap();

    let mut pool = ProxyPool::default();
    pool.add_endpoint("http://10.9.8.7:3128");

    let submitter = ScriptedSubmitter::new(vec![accepted()]);
    let mut coordinator =
        AttackCoordinator::new(TargetKind::Web, "http://victim.example/login")
            .with_wordlist_file(&wordlist_path)
            .unwrap()
            .with_checkpoint_path(&checkpoint_path)
            .with_proxy_pool(pool)
            .with_strategy(StrategyConfig {
                delay: Duration::ZERO,
                identity_rotate: false,
                random_delay: false,
                ..StrategyConfig::default()
            })
            .with_submitter(submitter.clone());

    let report = coordinator.run().await.unwrap();
    assert!(report.success);
    assert_eq!(report.value.as_deref(), Some("word50"));
    assert_eq!(report.attempts, 51);
    assert_eq!(report.strategy, "web-sequential");

    // First submission carried candidate index 50, and the blacklisted
    // proxy was never used even with rotation enabled.
    let requests = submitter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].fields[1].1, "word50");
    assert_eq!(requests[0].proxy, None);
}

#[tokio::test]
async fn interrupted_web_runs_continue_where_they_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_path = dir.path().join("session.json");

    // First pass exhausts a three-word list.
    let first = ScriptedSubmitter::new(vec![rejected(), rejected(), rejected()]);
    let mut coordinator = AttackCoordinator::new(TargetKind::Web, "http://victim.example/login")
        .with_candidates(words(&["a", "b", "c"]))
        .with_checkpoint_path(&checkpoint_path)
        .with_strategy(quiet_strategy())
        .with_submitter(first.clone());
    let report = coordinator.run().await.unwrap();
    assert!(!report.success);
    assert_eq!(report.attempts, 3);

    // Second pass gets a longer list and picks up at index 3.
    let second = ScriptedSubmitter::new(vec![rejected(), accepted()]);
    let mut coordinator = AttackCoordinator::new(TargetKind::Web, "http://victim.example/login")
        .with_candidates(words(&["a", "b", "c", "d", "letmein"]))
        .with_checkpoint_path(&checkpoint_path)
        .with_strategy(quiet_strategy())
        .with_submitter(second.clone());
    let report = coordinator.run().await.unwrap();

    assert!(report.success);
    assert_eq!(report.value.as_deref(), Some("letmein"));
    assert_eq!(report.attempts, 5);
    let requests = second.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].fields[1].1, "d");
}
