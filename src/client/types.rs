// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire types for the Ollama-compatible inference API

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST /api/generate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

/// Sampling options pinned for reproducible measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
    pub temperature: f32,
    pub seed: u64,
}

impl GenerateRequest {
    /// A non-streaming, greedy, seeded request
    pub fn benchmark(model: &str, prompt: &str, num_predict: u32, seed: u64) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                num_predict,
                temperature: 0.0,
                seed,
            },
        }
    }
}

/// Fields of the `/api/generate` response used for throughput
///
/// Durations are nanoseconds as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub eval_count: Option<u64>,
    #[serde(default)]
    pub eval_duration: Option<u64>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub load_duration: Option<u64>,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

impl GenerateResponse {
    /// Generated tokens per second of pure evaluation time
    ///
    /// `None` when the server did not report a positive eval duration.
    pub fn tokens_per_second(&self) -> Option<f64> {
        let duration_ns = self.eval_duration.filter(|d| *d > 0)?;
        let tokens = self.eval_count.unwrap_or(0);
        Some(tokens as f64 / (duration_ns as f64 / 1e9))
    }
}

/// Body of `GET /api/tags`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Errors from a single inference API call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Connection refused, reset, DNS failure and the like
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("HTTP error: {status} - {message}")]
    HttpStatus { status: u16, message: String },

    /// The call did not complete within its deadline
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The body could not be decoded or lacked required fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout { .. })
    }
}
