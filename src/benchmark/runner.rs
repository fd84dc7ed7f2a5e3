// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Host-parallel, model-sequential throughput benchmarks
//!
//! Each host gets exactly one task. The task walks that host's models one
//! at a time: warm-up, `runs` measured passes, then a cooldown before the
//! next model. Models on a host never overlap. Hosts run in parallel, at
//! most `workers` at once.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use super::types::{
    BenchmarkRun, BenchmarkSample, FailureReason, PairOutcome, PairState, WarmupFailure,
};
use crate::client::{GenerateRequest, GenerateResponse, InferenceClient, InferenceError};
use crate::config::BenchmarkConfig;
use crate::inventory::{Inventory, InventoryEntry};

/// Messages from host tasks to the collecting loop
#[derive(Debug)]
enum HostEvent {
    Sample(BenchmarkSample),
    Outcome(PairOutcome),
}

/// Runs throughput benchmarks across an inventory
pub struct BenchmarkRunner {
    client: Arc<dyn InferenceClient>,
    config: Arc<BenchmarkConfig>,
}

impl BenchmarkRunner {
    pub fn new(client: Arc<dyn InferenceClient>, config: BenchmarkConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Benchmark every (host, model) pair in the inventory
    ///
    /// Never fails: broken hosts and models show up as failed samples or
    /// failed outcomes.
    pub async fn run(&self, inventory: &Inventory) -> BenchmarkRun {
        info!(
            "Starting distributed benchmarks: {} hosts, {} models, {} workers",
            inventory.len(),
            inventory.pair_count(),
            self.config.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let (tx, mut rx) = mpsc::channel::<HostEvent>(100);

        let mut handles = Vec::new();
        for entry in inventory.iter().filter(|e| !e.models.is_empty()) {
            let task = HostTask {
                client: self.client.clone(),
                config: self.config.clone(),
                entry: entry.clone(),
                tx: tx.clone(),
            };
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquire cannot fail
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                task.run().await;
            }));
        }
        drop(tx);

        let mut run = BenchmarkRun::default();
        while let Some(event) = rx.recv().await {
            match event {
                HostEvent::Sample(sample) => run.samples.push(sample),
                HostEvent::Outcome(outcome) => run.outcomes.push(outcome),
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Host benchmark task aborted: {}", e);
            }
        }

        info!(
            "Benchmarks complete: {} samples ({} successful), {} warm-up failures",
            run.samples.len(),
            run.successful_samples().count(),
            run.warmup_failures().count()
        );
        run
    }
}

/// Benchmarks every model of one host, strictly in order
struct HostTask {
    client: Arc<dyn InferenceClient>,
    config: Arc<BenchmarkConfig>,
    entry: InventoryEntry,
    tx: mpsc::Sender<HostEvent>,
}

impl HostTask {
    async fn run(self) {
        let host = self.entry.host;
        info!("Benchmarking {} ({} models)...", host, self.entry.models.len());

        for (index, model) in self.entry.models.iter().enumerate() {
            if index > 0 && !self.config.cooldown.is_zero() {
                debug!("{}: cooling down for {:?}", host, self.config.cooldown);
                tokio::time::sleep(self.config.cooldown).await;
            }

            let state = self.benchmark_model(model).await;
            match &state {
                PairState::Done { successful, of } => {
                    info!("{} / {}: {}/{} successful samples", host, model, successful, of)
                }
                PairState::Failed { warmup } => warn!("{} / {}: {}", host, model, warmup),
                _ => {}
            }
            self.emit(HostEvent::Outcome(PairOutcome {
                host,
                model: model.clone(),
                state,
            }))
            .await;
        }
    }

    async fn benchmark_model(&self, model: &str) -> PairState {
        let host = self.entry.host;
        let request = GenerateRequest::benchmark(
            model,
            &self.config.prompt,
            self.config.num_predict,
            self.config.seed,
        );

        let mut state = PairState::Warming;
        debug!("{} / {}: {:?}", host, model, state);

        if let Err(e) = self.generate(&request, self.config.timeout_load).await {
            return PairState::Failed {
                warmup: WarmupFailure::from(&e),
            };
        }

        let runs = self.config.runs;
        state = PairState::Measuring {
            completed: 0,
            of: runs,
        };
        let mut successful = 0;

        for run_index in 0..runs {
            let sample = self.measure(model, run_index, &request).await;
            if sample.success {
                successful += 1;
            }
            self.emit(HostEvent::Sample(sample)).await;

            if let PairState::Measuring { completed, .. } = &mut state {
                *completed += 1;
            }
        }

        debug!("{} / {}: {:?} -> Done", host, model, state);
        PairState::Done {
            successful,
            of: runs,
        }
    }

    async fn measure(&self, model: &str, run_index: u32, request: &GenerateRequest) -> BenchmarkSample {
        let host = self.entry.host;
        let started_at = Utc::now();

        match self.generate(request, self.config.timeout_bench).await {
            Ok(response) => match (response.eval_count, response.eval_duration) {
                (Some(tokens), Some(duration_ns)) if duration_ns > 0 => {
                    let sample = BenchmarkSample::succeeded(
                        host, model, run_index, tokens, duration_ns, started_at,
                    );
                    debug!(
                        "{} / {} run {}: {:.2} tok/s",
                        host, model, run_index, sample.tokens_per_second
                    );
                    sample
                }
                _ => {
                    debug!("{} / {} run {}: no eval timing in response", host, model, run_index);
                    BenchmarkSample::failed(
                        host,
                        model,
                        run_index,
                        FailureReason::InvalidResponse,
                        started_at,
                    )
                }
            },
            Err(e) => {
                debug!("{} / {} run {} failed: {}", host, model, run_index, e);
                BenchmarkSample::failed(host, model, run_index, FailureReason::from(&e), started_at)
            }
        }
    }

    /// One generation bounded by `timeout`, whatever the client does
    async fn generate(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse, InferenceError> {
        match tokio::time::timeout(
            timeout,
            self.client.generate(&self.entry.host, request, timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn emit(&self, event: HostEvent) {
        // The receiver lives until every task has finished
        if self.tx.send(event).await.is_err() {
            warn!("{}: result channel closed", self.entry.host);
        }
    }
}
