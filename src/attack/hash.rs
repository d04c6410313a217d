//! Offline digest-matching engine.
//!
//! Three strategies over the same candidate sequence: a plain sequential
//! scan, a chunked scan on a bounded pool of blocking workers, and a
//! batch-digest scan that hashes a whole batch before one equality pass.
//! Selection is by candidate count alone unless a strategy is forced.

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::attack::target::DigestTarget;
use crate::modules::session::SessionTracker;

#[derive(Debug, Error)]
pub enum HashAttackError {
    #[error("digest worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStrategy {
    Sequential,
    BatchedParallel,
    VectorizedBatch,
}

impl HashStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::BatchedParallel => "batched-parallel",
            Self::VectorizedBatch => "vectorized-batch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HashEngineConfig {
    /// Pause between attempts in the sequential strategy. Zero by
    /// default; offline scans need no cadence.
    pub delay: Duration,
    /// Chunk length handed to each blocking worker.
    pub batch_size: usize,
    /// Batch length digested at once in the vectorized strategy.
    pub vector_batch: usize,
    /// Candidate count above which the vectorized strategy is picked.
    pub vectorized_threshold: usize,
    /// Blocking workers kept in flight at once.
    pub workers: usize,
    /// Overrides count-based selection when set.
    pub force: Option<HashStrategy>,
}

impl Default for HashEngineConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1);
        Self {
            delay: Duration::ZERO,
            batch_size: 1_000,
            vector_batch: 5_000,
            vectorized_threshold: 10_000,
            workers,
            force: None,
        }
    }
}

/// Result of scanning one chunk. Matches carry the in-chunk index so the
/// dispatcher can count attempts up to and including the hit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkOutcome {
    Match { index: usize, value: String },
    Exhausted { scanned: usize },
}

fn scan_chunk(target: &DigestTarget, chunk: &[String]) -> ChunkOutcome {
    for (index, candidate) in chunk.iter().enumerate() {
        if target.matches(candidate) {
            return ChunkOutcome::Match {
                index,
                value: candidate.clone(),
            };
        }
    }
    ChunkOutcome::Exhausted {
        scanned: chunk.len(),
    }
}

pub struct HashAttackEngine {
    config: HashEngineConfig,
}

impl HashAttackEngine {
    pub fn new(config: HashEngineConfig) -> Self {
        Self { config }
    }

    /// Picks a strategy from the candidate count, or the forced override.
    /// Lists that fit inside one worker chunk are not worth dispatching.
    pub fn select_strategy(&self, candidates: usize) -> HashStrategy {
        if let Some(forced) = self.config.force {
            return forced;
        }
        if candidates > self.config.vectorized_threshold {
            HashStrategy::VectorizedBatch
        } else if candidates > self.config.batch_size {
            HashStrategy::BatchedParallel
        } else {
            HashStrategy::Sequential
        }
    }

    /// Runs the auto-selected strategy and reports which one ran.
    pub async fn run(
        &self,
        target: &DigestTarget,
        candidates: &[String],
        session: &SessionTracker,
    ) -> Result<(HashStrategy, Option<String>), HashAttackError> {
        let strategy = self.select_strategy(candidates.len());
        log::info!(
            "scanning {} candidates against {} digest with {} strategy",
            candidates.len(),
            target.algorithm.name(),
            strategy.name()
        );
        let outcome = self.run_with(strategy, target, candidates, session).await?;
        Ok((strategy, outcome))
    }

    pub async fn run_with(
        &self,
        strategy: HashStrategy,
        target: &DigestTarget,
        candidates: &[String],
        session: &SessionTracker,
    ) -> Result<Option<String>, HashAttackError> {
        match strategy {
            HashStrategy::Sequential => Ok(self.sequential(target, candidates, session).await),
            HashStrategy::BatchedParallel => self.batched(target, candidates, session).await,
            HashStrategy::VectorizedBatch => Ok(self.vectorized(target, candidates, session).await),
        }
    }

    /// One candidate at a time. Attempts increment exactly once per
    /// candidate examined.
    async fn sequential(
        &self,
        target: &DigestTarget,
        candidates: &[String],
        session: &SessionTracker,
    ) -> Option<String> {
        for candidate in candidates {
            if session.found() {
                break;
            }
            session.record_attempt();
            if target.matches(candidate) {
                session.mark_found();
                return Some(candidate.clone());
            }
            if !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }
        None
    }

    /// Chunked scan on a bounded pool of blocking workers. On the first
    /// match no further chunks are dispatched and in-flight chunks are
    /// dropped unjoined; blocking workers are not preemptible, so their
    /// scanned counts are lost. The matching chunk counts up to and
    /// including the hit, raised to at least the match's global position
    /// so the total never falls short of it.
    async fn batched(
        &self,
        target: &DigestTarget,
        candidates: &[String],
        session: &SessionTracker,
    ) -> Result<Option<String>, HashAttackError> {
        let chunk_size = self.config.batch_size.max(1);
        let workers = self.config.workers.max(1);
        let total_chunks = candidates.len().div_ceil(chunk_size);
        let mut pending = candidates
            .chunks(chunk_size)
            .map(<[String]>::to_vec)
            .enumerate();
        let mut pool: JoinSet<(usize, ChunkOutcome)> = JoinSet::new();
        let mut counted: u64 = 0;

        loop {
            while pool.len() < workers && !session.found() {
                let Some((chunk_index, chunk)) = pending.next() else {
                    break;
                };
                let target = target.clone();
                pool.spawn_blocking(move || (chunk_index, scan_chunk(&target, &chunk)));
            }

            let Some(joined) = pool.join_next().await else {
                return Ok(None);
            };
            let (chunk_index, outcome) = joined?;
            match outcome {
                ChunkOutcome::Exhausted { scanned } => {
                    counted += scanned as u64;
                    session.record_attempts(scanned as u64);
                    log::debug!("chunk {}/{total_chunks} exhausted", chunk_index + 1);
                }
                ChunkOutcome::Match { index, value } => {
                    counted += (index + 1) as u64;
                    session.record_attempts((index + 1) as u64);
                    let floor = (chunk_index * chunk_size + index + 1) as u64;
                    if counted < floor {
                        session.record_attempts(floor - counted);
                    }
                    session.mark_found();
                    pool.abort_all();
                    return Ok(Some(value));
                }
            }
        }
    }

    /// Digests a whole batch, then scans it in one equality pass. On a
    /// hit the lowest matching index in the batch wins, so duplicate
    /// candidates resolve to their first occurrence.
    async fn vectorized(
        &self,
        target: &DigestTarget,
        candidates: &[String],
        session: &SessionTracker,
    ) -> Option<String> {
        let batch_size = self.config.vector_batch.max(1);
        let total_batches = candidates.len().div_ceil(batch_size);
        for (batch_index, batch) in candidates.chunks(batch_size).enumerate() {
            if session.found() {
                break;
            }
            log::debug!(
                "digesting batch {}/{total_batches} ({} candidates)",
                batch_index + 1,
                batch.len()
            );
            let digests: Vec<Vec<u8>> = batch
                .iter()
                .map(|candidate| target.algorithm.digest(candidate.as_bytes()))
                .collect();
            match digests.iter().position(|digest| target.matches_digest(digest)) {
                Some(index) => {
                    session.record_attempts((index + 1) as u64);
                    session.mark_found();
                    return Some(batch[index].clone());
                }
                None => session.record_attempts(batch.len() as u64),
            }
            tokio::task::yield_now().await;
        }
        None
    }
}
