//! # passrake
//!
//! An adaptive credential-audit orchestrator for offline digests and web
//! login forms.
//!
//! Point it at an MD5/SHA digest or a login endpoint and hand it a
//! wordlist. The coordinator estimates the run before starting, then the
//! selected engine adapts its pacing and rotation whenever the target
//! pushes back. Use it only against systems you are authorized to test.
//!
//! ## Features
//!
//! - Offline digest recovery with sequential, batched-parallel, and
//!   vectorized-batch strategies
//! - Strictly sequential web form guessing with resumable checkpoints
//! - Protection detection (Cloudflare, CAPTCHA, WAF, rate limits, bans)
//!   feeding live strategy adaptation
//! - Proxy pool with health probing and a one-way blacklist
//! - Sliding-window rate limiting and identity rotation
//! - Pre-flight feasibility estimates with a confirmation gate
//!
//! ## Example
//!
//! ```no_run
//! use passrake::{AttackCoordinator, TargetKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut coordinator =
//!         AttackCoordinator::new(TargetKind::Hash, "2ab96390c7dbe3439de74d0c9b0b1767")
//!             .with_wordlist_file("wordlist.txt")?;
//!     let report = coordinator.run().await?;
//!     println!("recovered: {:?}", report.value);
//!     Ok(())
//! }
//! ```

mod coordinator;

pub mod attack;
pub mod modules;

pub use crate::coordinator::{
    ApprovalGate,
    AttackCoordinator,
    AttackPhase,
    AttackReport,
    AutoApprove,
    CoordinatorError,
};

pub use crate::attack::{
    AttackTarget,
    ComplexityTier,
    DigestTarget,
    FeasibilityReport,
    FormReply,
    FormRequest,
    FormSubmitter,
    FormTarget,
    HashAlgorithm,
    HashAttackEngine,
    HashAttackError,
    HashEngineConfig,
    HashStrategy,
    HttpFormSubmitter,
    RuleEngine,
    SubmitError,
    TargetError,
    TargetKind,
    ToolProfile,
    WebAttackEngine,
    WebEngineConfig,
    WordlistError,
};

pub use crate::modules::{
    Checkpoint,
    CheckpointError,
    CheckpointStore,
    Identity,
    IdentityRotator,
    PatternMatcher,
    PoolHealthReport,
    ProtectionCategory,
    ProtectionLevel,
    ProtectionSignal,
    ProxyError,
    ProxyPool,
    ProxyPoolConfig,
    RateLimiter,
    SessionSnapshot,
    SessionTracker,
    StrategyAdjustment,
    StrategyConfig,
    StrategyController,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
