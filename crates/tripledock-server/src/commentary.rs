//! Flavor commentary for finished games.
//!
//! The commentator is an optional external collaborator. It receives a bare
//! outcome and may answer with a line of text; failures never reach game
//! state.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tripledock_core::Outcome;

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("Commentary request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Commentary service answered {0}")]
    Status(u16),

    #[error("Commentary service returned no text")]
    Empty,
}

/// Anything that can comment on a finished game
pub trait Commentator: Send + Sync {
    fn comment(&self, outcome: Outcome) -> BoxFuture<'_, Result<String, CommentaryError>>;
}

#[derive(Debug, Serialize)]
struct CommentaryRequest {
    outcome: Outcome,
}

#[derive(Debug, Deserialize)]
struct CommentaryResponse {
    text: String,
}

/// Commentator backed by a text-generation HTTP endpoint.
///
/// Posts `{"outcome": "won"}` and expects `{"text": "..."}` back.
pub struct HttpCommentator {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpCommentator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

impl Commentator for HttpCommentator {
    fn comment(&self, outcome: Outcome) -> BoxFuture<'_, Result<String, CommentaryError>> {
        async move {
            let response = self
                .client
                .post(&self.url)
                .timeout(self.timeout)
                .json(&CommentaryRequest { outcome })
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(CommentaryError::Status(response.status().as_u16()));
            }

            let body: CommentaryResponse = response.json().await?;
            let text = body.text.trim();
            if text.is_empty() {
                return Err(CommentaryError::Empty);
            }
            Ok(text.to_string())
        }
        .boxed()
    }
}
