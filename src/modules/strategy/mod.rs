//! Live execution strategy state.
//!
//! The tunable parameters a run observes (delay, concurrency, rotation
//! toggles) live in an immutable `StrategyConfig`. Evasion adjustments are
//! applied as functional merges through the controller, so snapshots taken
//! earlier are never disturbed.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::modules::detection::ProtectionSignal;

/// Coarse protection posture of a target, used for presets and estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtectionLevel {
    Low,
    Medium,
    High,
    Extreme,
}

/// Immutable parameter set a run observes.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub delay: Duration,
    pub concurrency: usize,
    pub proxy_rotate: bool,
    pub identity_rotate: bool,
    pub random_delay: bool,
    pub batch_size: usize,
    /// Free-form evasion keys carried alongside the typed fields.
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            concurrency: 50,
            proxy_rotate: true,
            identity_rotate: true,
            random_delay: true,
            batch_size: 1000,
            extras: BTreeMap::new(),
        }
    }
}

impl StrategyConfig {
    /// Functional update: unspecified fields keep their values and extras
    /// merge by key upsert. Returns a new value, never mutates in place.
    pub fn merged(&self, adjustment: &StrategyAdjustment) -> StrategyConfig {
        let mut next = self.clone();
        if let Some(delay) = adjustment.delay {
            next.delay = delay;
        }
        if let Some(concurrency) = adjustment.concurrency {
            next.concurrency = concurrency;
        }
        if let Some(proxy_rotate) = adjustment.proxy_rotate {
            next.proxy_rotate = proxy_rotate;
        }
        if let Some(identity_rotate) = adjustment.identity_rotate {
            next.identity_rotate = identity_rotate;
        }
        if let Some(random_delay) = adjustment.random_delay {
            next.random_delay = random_delay;
        }
        for (key, value) in &adjustment.extras {
            next.extras.insert(key.clone(), value.clone());
        }
        next
    }

    /// Presets for manual configuration against a known posture.
    pub fn for_protection_level(level: ProtectionLevel) -> StrategyConfig {
        let base = StrategyConfig::default();
        match level {
            ProtectionLevel::Low => StrategyConfig {
                delay: Duration::from_millis(50),
                concurrency: 100,
                proxy_rotate: false,
                identity_rotate: false,
                random_delay: false,
                ..base
            },
            ProtectionLevel::Medium => base,
            ProtectionLevel::High => StrategyConfig {
                delay: Duration::from_millis(500),
                concurrency: 10,
                ..base
            },
            ProtectionLevel::Extreme => StrategyConfig {
                delay: Duration::from_secs(2),
                concurrency: 1,
                ..base
            },
        }
    }
}

/// Partial overlay produced by evasion analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyAdjustment {
    pub delay: Option<Duration>,
    pub concurrency: Option<usize>,
    pub proxy_rotate: Option<bool>,
    pub identity_rotate: Option<bool>,
    pub random_delay: Option<bool>,
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl StrategyAdjustment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_proxy_rotate(mut self, enabled: bool) -> Self {
        self.proxy_rotate = Some(enabled);
        self
    }

    pub fn with_identity_rotate(mut self, enabled: bool) -> Self {
        self.identity_rotate = Some(enabled);
        self
    }

    pub fn with_random_delay(mut self, enabled: bool) -> Self {
        self.random_delay = Some(enabled);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// Sole owner of the live strategy for a run.
///
/// Outside manual configuration, `adapt` is the only place execution
/// parameters change while an attack is in flight.
#[derive(Debug)]
pub struct StrategyController {
    live: StrategyConfig,
}

impl StrategyController {
    pub fn new(initial: StrategyConfig) -> Self {
        Self { live: initial }
    }

    /// Snapshot of the live config.
    pub fn current(&self) -> StrategyConfig {
        self.live.clone()
    }

    /// Applies an adjustment as a functional merge and logs the change.
    pub fn adapt(&mut self, signal: &ProtectionSignal) {
        self.live = self.live.merged(&signal.adjustment);
        log::warn!(
            "{} detected, adapting: delay {:?}, proxy rotation {}",
            signal.category.name(),
            self.live.delay,
            self.live.proxy_rotate,
        );
    }
}

impl Default for StrategyController {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::detection::ProtectionCategory;

    #[test]
    fn merge_keeps_unspecified_fields() {
        let base = StrategyConfig::default();
        let merged = base.merged(&StrategyAdjustment::new().with_delay(Duration::from_secs(9)));
        assert_eq!(merged.delay, Duration::from_secs(9));
        assert_eq!(merged.concurrency, base.concurrency);
        assert_eq!(merged.proxy_rotate, base.proxy_rotate);
        assert_eq!(merged.batch_size, base.batch_size);
    }

    #[test]
    fn merge_upserts_extras_without_removal() {
        let base = StrategyConfig::default()
            .merged(&StrategyAdjustment::new().with_extra("headers_rotate", true));
        let merged = base.merged(
            &StrategyAdjustment::new()
                .with_extra("change_ip", true)
                .with_extra("headers_rotate", false),
        );
        assert_eq!(merged.extras["change_ip"], serde_json::Value::Bool(true));
        assert_eq!(merged.extras["headers_rotate"], serde_json::Value::Bool(false));
        assert_eq!(merged.extras.len(), 2);
    }

    #[test]
    fn merge_never_mutates_the_original() {
        let base = StrategyConfig::default();
        let before = base.clone();
        let _ = base.merged(&StrategyAdjustment::new().with_concurrency(1));
        assert_eq!(base, before);
    }

    #[test]
    fn controller_accumulates_adjustments() {
        let mut controller = StrategyController::default();
        let earlier = controller.current();

        controller.adapt(&ProtectionSignal {
            category: ProtectionCategory::Waf,
            adjustment: StrategyAdjustment::new()
                .with_delay(Duration::from_secs(3))
                .with_extra("headers_rotate", true),
        });
        controller.adapt(&ProtectionSignal {
            category: ProtectionCategory::Block,
            adjustment: StrategyAdjustment::new()
                .with_delay(Duration::from_secs(15))
                .with_extra("change_ip", true),
        });

        let live = controller.current();
        assert_eq!(live.delay, Duration::from_secs(15));
        assert_eq!(live.extras.len(), 2);
        // The snapshot taken before adapting is untouched.
        assert_eq!(earlier.delay, Duration::from_millis(100));
        assert!(earlier.extras.is_empty());
    }

    #[test]
    fn presets_scale_with_protection_level() {
        let low = StrategyConfig::for_protection_level(ProtectionLevel::Low);
        let extreme = StrategyConfig::for_protection_level(ProtectionLevel::Extreme);
        assert!(low.delay < extreme.delay);
        assert!(low.concurrency > extreme.concurrency);
        assert!(!low.proxy_rotate);
        assert!(extreme.proxy_rotate);
    }
}
