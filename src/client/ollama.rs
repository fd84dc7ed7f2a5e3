// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ollama HTTP API client

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::types::{GenerateRequest, GenerateResponse, InferenceError, TagsResponse};
use super::InferenceClient;
use crate::discovery::Peer;

/// Client for `/api/tags` and `/api/generate`
#[derive(Clone, Default)]
pub struct OllamaClient {
    client: Client,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(InferenceError::HttpStatus {
            status: status.as_u16(),
            message,
        })
    }
}

fn map_send_error(e: reqwest::Error, timeout: Duration) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        InferenceError::Network(e.to_string())
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn list_models(
        &self,
        peer: &Peer,
        timeout: Duration,
    ) -> Result<Vec<String>, InferenceError> {
        let url = format!("{}/api/tags", peer.base_url());
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;
        let response = Self::check_status(response).await?;

        let tags: TagsResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                map_send_error(e, timeout)
            } else {
                InferenceError::InvalidResponse(format!("JSON parse error: {}", e))
            }
        })?;

        debug!("{} lists {} models", peer, tags.models.len());
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(
        &self,
        peer: &Peer,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse, InferenceError> {
        let url = format!("{}/api/generate", peer.base_url());
        let response = self
            .client
            .post(&url)
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;
        let response = Self::check_status(response).await?;

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                map_send_error(e, timeout)
            } else {
                InferenceError::InvalidResponse(format!("JSON parse error: {}", e))
            }
        })
    }
}
