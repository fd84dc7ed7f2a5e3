// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference API client
//!
//! The pipeline talks to hosts only through [`InferenceClient`], so
//! inventory and benchmarking can be exercised without a live server.

pub mod ollama;
pub mod types;

pub use ollama::OllamaClient;
pub use types::{GenerateRequest, GenerateResponse, InferenceError};

use async_trait::async_trait;
use std::time::Duration;

use crate::discovery::Peer;

/// Trait for the per-host inference API
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// List the models loaded on `peer`, in server order
    async fn list_models(&self, peer: &Peer, timeout: Duration)
        -> Result<Vec<String>, InferenceError>;

    /// Run one non-streaming generation on `peer`
    async fn generate(
        &self,
        peer: &Peer,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse, InferenceError>;
}
