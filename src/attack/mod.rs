//! Attack engines and their shared vocabulary.
//!
//! Targets describe what is being guessed against and wordlists supply
//! the candidates the hash/web engines consume. Estimation stays pure so
//! it can run before anything touches the network.

pub mod estimate;
pub mod form;
pub mod hash;
pub mod target;
pub mod web;
pub mod wordlist;

// Re-export commonly used types
pub use estimate::{ComplexityTier, FeasibilityReport, ToolProfile, advise};
pub use form::{FormReply, FormRequest, FormSubmitter, HttpFormSubmitter, SubmitError};
pub use hash::{HashAttackEngine, HashAttackError, HashEngineConfig, HashStrategy};
pub use target::{
    AttackTarget, DigestTarget, FormTarget, HashAlgorithm, TargetError, TargetKind,
};
pub use web::{WebAttackEngine, WebEngineConfig};
pub use wordlist::{RuleEngine, WordlistError};
