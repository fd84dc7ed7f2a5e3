// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Throughput benchmarking
//!
//! Key properties:
//! - One task per host, hosts bounded by the `workers` setting
//! - Models on a host are benchmarked strictly one after another
//! - Warm-up pass before `runs` measured passes, then a cooldown
//! - Failures are recorded per sample or per pair and never abort the run

pub mod runner;
pub mod types;

pub use runner::BenchmarkRunner;
pub use types::{
    BenchmarkRun, BenchmarkSample, FailureReason, PairOutcome, PairState, WarmupFailure,
};
