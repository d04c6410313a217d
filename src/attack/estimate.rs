//! Pre-flight feasibility arithmetic and tool advice.
//!
//! Pure lookup-table math, no side effects. The coordinator runs this
//! during its analysis phase and decides whether to ask for confirmation.

use crate::attack::target::TargetKind;
use crate::modules::strategy::ProtectionLevel;
use std::time::Duration;

/// Benchmark constant for local digest scanning on a stock CPU core.
pub const HASH_CPU_RATE: f64 = 5_000_000.0;

const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const MONTH: f64 = 2_592_000.0;

/// Bucketed operation-count magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityTier {
    Trivial,
    Moderate,
    Significant,
    Infeasible,
}

impl ComplexityTier {
    pub fn for_operations(count: u64) -> Self {
        match count {
            0..=999_999 => Self::Trivial,
            1_000_000..=999_999_999 => Self::Moderate,
            1_000_000_000..=999_999_999_999 => Self::Significant,
            _ => Self::Infeasible,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Moderate => "moderate",
            Self::Significant => "significant",
            Self::Infeasible => "infeasible",
        }
    }
}

/// Outcome of a feasibility pass over one target.
#[derive(Debug, Clone)]
pub struct FeasibilityReport {
    pub total_operations: u64,
    pub rate: f64,
    pub duration: Duration,
    pub formatted: String,
    pub complexity: ComplexityTier,
    pub recommendations: Vec<String>,
}

/// Estimates an offline digest scan at the CPU benchmark rate.
pub fn estimate_digest(candidates: u64) -> FeasibilityReport {
    build_report(candidates, HASH_CPU_RATE, TargetKind::Hash)
}

/// Estimates an online form run at the posture implied by the
/// protection level.
pub fn estimate_form(candidates: u64, level: ProtectionLevel) -> FeasibilityReport {
    let rate = match level {
        ProtectionLevel::Low => 10.0,
        ProtectionLevel::Medium => 5.0,
        ProtectionLevel::High => 2.0,
        ProtectionLevel::Extreme => 1.0,
    };
    build_report(candidates, rate, TargetKind::Web)
}

fn build_report(total: u64, rate: f64, kind: TargetKind) -> FeasibilityReport {
    let seconds = total as f64 / rate;
    FeasibilityReport {
        total_operations: total,
        rate,
        duration: Duration::from_secs_f64(seconds),
        formatted: format_duration(seconds),
        complexity: ComplexityTier::for_operations(total),
        recommendations: recommendations(kind, seconds),
    }
}

/// Humanizes a second count into the largest sensible unit.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1} seconds")
    } else if seconds < HOUR {
        format!("{:.1} minutes", seconds / 60.0)
    } else if seconds < DAY {
        format!("{:.1} hours", seconds / HOUR)
    } else if seconds < MONTH {
        format!("{:.1} days", seconds / DAY)
    } else {
        format!("{:.1} months", seconds / MONTH)
    }
}

fn recommendations(kind: TargetKind, seconds: f64) -> Vec<String> {
    let mut out = Vec::new();
    if seconds > MONTH {
        out.push("infeasible in reasonable time with this wordlist".to_string());
        match kind {
            TargetKind::Hash => {
                out.push("offload to a GPU cracker and check breach corpora first".to_string());
            }
            TargetKind::Web | TargetKind::Ssh => {
                out.push("verify default credentials and weaker entry points first".to_string());
            }
        }
    } else if seconds > DAY {
        out.push("multi-day run; a specialist tool will finish sooner".to_string());
        out.push(optimization_tip(kind));
    } else if seconds > HOUR {
        out.push("several hours of runtime; worth optimizing before launch".to_string());
        out.push(optimization_tip(kind));
    } else {
        out.push("feasible; ready to run".to_string());
    }
    out
}

fn optimization_tip(kind: TargetKind) -> String {
    match kind {
        TargetKind::Hash => "deduplicate the wordlist and apply mangling rules offline".to_string(),
        TargetKind::Web | TargetKind::Ssh => {
            "add proxies and tune delays to the observed rate limit".to_string()
        }
    }
}

/// One entry in the specialist-tool catalog.
#[derive(Debug, Clone, Copy)]
pub struct ToolProfile {
    pub name: &'static str,
    pub kinds: &'static [TargetKind],
    pub weight: u8,
    pub note: &'static str,
}

static TOOL_CATALOG: &[ToolProfile] = &[
    ToolProfile {
        name: "hashcat",
        kinds: &[TargetKind::Hash],
        weight: 10,
        note: "GPU digest cracking, rule support",
    },
    ToolProfile {
        name: "john",
        kinds: &[TargetKind::Hash],
        weight: 8,
        note: "CPU digest cracking, broad format coverage",
    },
    ToolProfile {
        name: "hydra",
        kinds: &[TargetKind::Web, TargetKind::Ssh],
        weight: 7,
        note: "network login brute forcing, many protocols",
    },
    ToolProfile {
        name: "medusa",
        kinds: &[TargetKind::Web, TargetKind::Ssh],
        weight: 6,
        note: "parallel network login brute forcing",
    },
];

/// Catalog entries suited to the target kind, best ranked first.
pub fn advise(kind: TargetKind) -> Vec<ToolProfile> {
    let mut matches: Vec<ToolProfile> = TOOL_CATALOG
        .iter()
        .filter(|tool| tool.kinds.contains(&kind))
        .copied()
        .collect();
    matches.sort_by(|a, b| b.weight.cmp(&a.weight));
    matches
}
