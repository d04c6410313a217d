//! Cross-cutting services module
//!
//! Everything the engines lean on between submissions: request pacing,
//! proxy health, protection detection, live strategy state, session
//! counters, durable checkpoints, and identity rotation.

pub mod checkpoint;
pub mod detection;
pub mod identity;
pub mod proxy;
pub mod rate_limit;
pub mod session;
pub mod strategy;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use detection::{PatternMatcher, ProtectionCategory, ProtectionSignal};
pub use identity::{Identity, IdentityRotator};
pub use proxy::{PoolHealthReport, ProxyError, ProxyPool, ProxyPoolConfig};
pub use rate_limit::RateLimiter;
pub use session::{SessionSnapshot, SessionTracker};
pub use strategy::{ProtectionLevel, StrategyAdjustment, StrategyConfig, StrategyController};
