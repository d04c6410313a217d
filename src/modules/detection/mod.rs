//! Response classification for protection and blocking signals.
//!
//! Scans error responses against an ordered table of known protection
//! signatures. Each category carries the strategy adjustment the run should
//! merge in when that protection shows up.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use crate::modules::strategy::StrategyAdjustment;

/// Protection classes the matcher can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtectionCategory {
    Cloudflare,
    Captcha,
    Waf,
    RateLimit,
    Block,
}

impl ProtectionCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cloudflare => "cloudflare",
            Self::Captcha => "captcha",
            Self::Waf => "waf",
            Self::RateLimit => "rate_limit",
            Self::Block => "block",
        }
    }
}

/// A classified response with the adjustment the matcher recommends.
#[derive(Debug, Clone)]
pub struct ProtectionSignal {
    pub category: ProtectionCategory,
    pub adjustment: StrategyAdjustment,
}

/// Signature set for one protection category.
#[derive(Debug, Clone)]
struct CategoryEntry {
    category: ProtectionCategory,
    patterns: Vec<Regex>,
    adjustment: StrategyAdjustment,
}

impl CategoryEntry {
    fn new(category: ProtectionCategory, raw_patterns: &[&str], adjustment: StrategyAdjustment) -> Self {
        let patterns = raw_patterns
            .iter()
            .map(|pattern| build_regex(pattern))
            .collect();
        Self {
            category,
            patterns,
            adjustment,
        }
    }

    fn signal(&self) -> ProtectionSignal {
        ProtectionSignal {
            category: self.category,
            adjustment: self.adjustment.clone(),
        }
    }
}

/// Known protection signatures. Declaration order is scan order, so a body
/// matching several categories always resolves to the first one listed.
static CATEGORY_TABLE: Lazy<Vec<CategoryEntry>> = Lazy::new(|| {
    vec![
        CategoryEntry::new(
            ProtectionCategory::Cloudflare,
            &["cloudflare", "cf-ray", "__cfduid"],
            StrategyAdjustment::new()
                .with_delay(Duration::from_secs(2))
                .with_proxy_rotate(true)
                .with_identity_rotate(true),
        ),
        CategoryEntry::new(
            ProtectionCategory::Captcha,
            &["captcha", "recaptcha", "hcaptcha"],
            StrategyAdjustment::new()
                .with_delay(Duration::from_secs(5))
                .with_proxy_rotate(true)
                .with_extra("change_strategy", true),
        ),
        CategoryEntry::new(
            ProtectionCategory::Waf,
            &["waf", "security", "firewall", "forbidden"],
            StrategyAdjustment::new()
                .with_delay(Duration::from_secs(3))
                .with_proxy_rotate(true)
                .with_extra("headers_rotate", true),
        ),
        CategoryEntry::new(
            ProtectionCategory::RateLimit,
            &["rate.*limit", "too.*many", "429"],
            StrategyAdjustment::new()
                .with_delay(Duration::from_secs(10))
                .with_proxy_rotate(true)
                .with_extra("reduce_concurrency", true),
        ),
        CategoryEntry::new(
            ProtectionCategory::Block,
            &["block", "banned", "ip.*block"],
            StrategyAdjustment::new()
                .with_delay(Duration::from_secs(15))
                .with_proxy_rotate(true)
                .with_extra("change_ip", true),
        ),
    ]
});

/// Stateless classifier over the static category table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternMatcher;

impl PatternMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Classifies a response. A 429 maps straight to the rate-limit
    /// category regardless of body contents; other error statuses are
    /// resolved by the first category with a matching signature. Statuses
    /// below 400 never produce a signal.
    pub fn analyze(&self, body: &str, status: u16) -> Option<ProtectionSignal> {
        if status == 429 {
            return CATEGORY_TABLE
                .iter()
                .find(|entry| entry.category == ProtectionCategory::RateLimit)
                .map(CategoryEntry::signal);
        }
        if status < 400 {
            return None;
        }
        for entry in CATEGORY_TABLE.iter() {
            if entry.patterns.iter().any(|pattern| pattern.is_match(body)) {
                log::debug!("protection signature matched: {}", entry.category.name());
                return Some(entry.signal());
            }
        }
        None
    }
}

fn build_regex(pattern: &str) -> Regex {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
        .unwrap_or_else(|err| panic!("invalid protection signature `{}`: {}", pattern, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(body: &str, status: u16) -> Option<ProtectionSignal> {
        PatternMatcher::new().analyze(body, status)
    }

    #[test]
    fn status_429_short_circuits_regardless_of_body() {
        let signal = analyze("everything looks perfectly fine here", 429).expect("signal");
        assert_eq!(signal.category, ProtectionCategory::RateLimit);
        assert_eq!(signal.adjustment.delay, Some(Duration::from_secs(10)));
    }

    #[test]
    fn classifies_cloudflare_interstitial() {
        let body = "<html>Checking your browser before accessing... CF-RAY: 8a2f</html>";
        let signal = analyze(body, 403).expect("signal");
        assert_eq!(signal.category, ProtectionCategory::Cloudflare);
        assert_eq!(signal.adjustment.identity_rotate, Some(true));
    }

    #[test]
    fn classifies_captcha_page() {
        let signal = analyze("please solve the reCAPTCHA to continue", 403).expect("signal");
        assert_eq!(signal.category, ProtectionCategory::Captcha);
        assert_eq!(signal.adjustment.delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn classifies_block_page() {
        let signal = analyze("Your IP has been BANNED by the administrator", 403).expect("signal");
        assert_eq!(signal.category, ProtectionCategory::Block);
    }

    #[test]
    fn first_listed_category_wins_on_overlap() {
        // Mentions both cloudflare and captcha; declaration order decides.
        let body = "cloudflare says: complete the captcha";
        let signal = analyze(body, 403).expect("signal");
        assert_eq!(signal.category, ProtectionCategory::Cloudflare);
    }

    #[test]
    fn success_statuses_yield_nothing() {
        assert!(analyze("cloudflare cdn served this page", 200).is_none());
    }

    #[test]
    fn unrecognized_error_body_yields_nothing() {
        assert!(analyze("internal server error", 500).is_none());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let signal = analyze("FIREWALL policy violation", 403).expect("signal");
        assert_eq!(signal.category, ProtectionCategory::Waf);
    }
}
