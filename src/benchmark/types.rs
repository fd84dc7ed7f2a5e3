// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Benchmark samples and per-pair progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::client::InferenceError;
use crate::discovery::Peer;

/// Why a request produced no usable measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureReason {
    Network,
    HttpStatus { status: u16 },
    Timeout,
    /// Undecodable body, or no positive `eval_duration`
    InvalidResponse,
}

impl From<&InferenceError> for FailureReason {
    fn from(err: &InferenceError) -> Self {
        match err {
            InferenceError::Network(_) => FailureReason::Network,
            InferenceError::HttpStatus { status, .. } => FailureReason::HttpStatus { status: *status },
            InferenceError::Timeout { .. } => FailureReason::Timeout,
            InferenceError::InvalidResponse(_) => FailureReason::InvalidResponse,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Network => write!(f, "network"),
            FailureReason::HttpStatus { status } => write!(f, "http {}", status),
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// One measured generation on one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub host: Peer,
    pub model: String,
    /// Zero-based index of the measured pass
    pub run_index: u32,
    pub tokens_generated: u64,
    pub eval_duration_ns: u64,
    /// Zero for failed samples; never used in that case
    pub tokens_per_second: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BenchmarkSample {
    pub fn succeeded(
        host: Peer,
        model: &str,
        run_index: u32,
        tokens_generated: u64,
        eval_duration_ns: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        let tokens_per_second = if eval_duration_ns > 0 {
            tokens_generated as f64 / (eval_duration_ns as f64 / 1e9)
        } else {
            0.0
        };
        Self {
            host,
            model: model.to_string(),
            run_index,
            tokens_generated,
            eval_duration_ns,
            tokens_per_second,
            success: true,
            failure_reason: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(
        host: Peer,
        model: &str,
        run_index: u32,
        reason: FailureReason,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            host,
            model: model.to_string(),
            run_index,
            tokens_generated: 0,
            eval_duration_ns: 0,
            tokens_per_second: 0.0,
            success: false,
            failure_reason: Some(reason),
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// The warm-up request for a (host, model) pair failed
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("Warm-up failed ({reason}): {message}")]
pub struct WarmupFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl From<&InferenceError> for WarmupFailure {
    fn from(err: &InferenceError) -> Self {
        Self {
            reason: err.into(),
            message: err.to_string(),
        }
    }
}

/// Progress of one (host, model) pair
///
/// `NotLoaded → Warming → Measuring(k of N) → Done`, or `Failed` when the
/// warm-up does not succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PairState {
    NotLoaded,
    Warming,
    Measuring { completed: u32, of: u32 },
    Done { successful: u32, of: u32 },
    Failed { warmup: WarmupFailure },
}

impl PairState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PairState::Done { .. } | PairState::Failed { .. })
    }
}

/// Terminal state of a benchmarked pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOutcome {
    pub host: Peer,
    pub model: String,
    pub state: PairState,
}

/// Everything a benchmark run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub samples: Vec<BenchmarkSample>,
    pub outcomes: Vec<PairOutcome>,
}

impl BenchmarkRun {
    pub fn successful_samples(&self) -> impl Iterator<Item = &BenchmarkSample> {
        self.samples.iter().filter(|s| s.success)
    }

    /// Pairs whose warm-up failed
    pub fn warmup_failures(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, PairState::Failed { .. }))
    }

    pub fn samples_for<'a>(
        &'a self,
        host: &'a Peer,
        model: &'a str,
    ) -> impl Iterator<Item = &'a BenchmarkSample> + 'a {
        self.samples
            .iter()
            .filter(move |s| s.host.address == host.address && s.model == model)
    }
}
