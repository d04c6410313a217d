//! Client identity rotation for form submissions.
//!
//! Supplies a randomized browser user agent and a fabricated forwarding
//! address so consecutive submissions do not share an obvious fingerprint.

use http::header::USER_AGENT;
use http::{HeaderMap, HeaderName, HeaderValue};
use rand::Rng;
use rand::seq::SliceRandom;

static AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7 Pro) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

/// One client-facing identity for a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub forwarded_for: String,
}

impl Identity {
    /// Headers to attach to an outgoing form submission.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.forwarded_for) {
            headers.insert(HeaderName::from_static("x-forwarded-for"), value);
        }
        headers
    }
}

/// Draws random identities from the embedded agent pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRotator;

impl IdentityRotator {
    pub fn new() -> Self {
        Self
    }

    pub fn next(&self) -> Identity {
        let mut rng = rand::thread_rng();
        let user_agent = AGENT_POOL
            .choose(&mut rng)
            .copied()
            .unwrap_or("Mozilla/5.0")
            .to_string();
        Identity {
            user_agent,
            forwarded_for: random_ipv4(&mut rng),
        }
    }
}

fn random_ipv4<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.gen_range(1..=255u8),
        rng.gen_range(1..=255u8),
        rng.gen_range(1..=255u8),
        rng.gen_range(1..=255u8),
    )
}
