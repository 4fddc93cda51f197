//! Response recorder.
//!
//! Allocates a unique share token, then persists the answer set and its
//! score result as two related records.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::error::{RecordError, StoreError};
use crate::model::AnswerSet;
use crate::record::{
    Diagnostic, FormResponse, NewDiagnostic, NewFormResponse, ResponseWithDiagnostic, ShareToken,
};
use crate::scoring::ScoreResult;
use crate::traits::ResponseStore;

/// Default bound on share-token allocation attempts.
pub const DEFAULT_MAX_TOKEN_ATTEMPTS: u32 = 10;

/// Configuration for the recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Tokens tried before giving up with `RecordError::TokenExhausted`.
    pub max_token_attempts: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_token_attempts: DEFAULT_MAX_TOKEN_ATTEMPTS,
        }
    }
}

type TokenSource = Arc<dyn Fn() -> ShareToken + Send + Sync>;

/// A response and the diagnostic recorded with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedResponse {
    pub response: FormResponse,
    pub diagnostic: Diagnostic,
}

impl RecordedResponse {
    pub fn share_token(&self) -> &ShareToken {
        &self.response.share_token
    }
}

/// Records completed diagnostics and serves them back by share token.
pub struct ResponseRecorder {
    store: Arc<dyn ResponseStore>,
    config: RecorderConfig,
    token_source: TokenSource,
}

impl ResponseRecorder {
    pub fn new(store: Arc<dyn ResponseStore>, config: RecorderConfig) -> Self {
        Self {
            store,
            config,
            token_source: Arc::new(ShareToken::generate),
        }
    }

    /// Replace the random token generator (deterministic tests).
    pub fn with_token_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> ShareToken + Send + Sync + 'static,
    {
        self.token_source = Arc::new(source);
        self
    }

    pub fn store(&self) -> &dyn ResponseStore {
        self.store.as_ref()
    }

    /// Persist an answer set and its score result under a fresh share token.
    pub async fn record(
        &self,
        form_id: &str,
        user_id: Option<&str>,
        answers: &AnswerSet,
        result: &ScoreResult,
    ) -> Result<RecordedResponse> {
        let response = self.insert_with_unique_token(form_id, user_id, answers).await?;

        let diagnostic = self
            .store
            .insert_diagnostic(NewDiagnostic {
                form_response_id: response.id,
                result: result.clone(),
            })
            .await
            .context("failed to save diagnostic")?;

        tracing::info!(
            form = %form_id,
            response = %response.id,
            token = %response.share_token,
            bottleneck = %diagnostic.result.bottleneck_pillar_id,
            "recorded diagnostic"
        );

        Ok(RecordedResponse {
            response,
            diagnostic,
        })
    }

    async fn insert_with_unique_token(
        &self,
        form_id: &str,
        user_id: Option<&str>,
        answers: &AnswerSet,
    ) -> Result<FormResponse> {
        for attempt in 1..=self.config.max_token_attempts {
            let token = (self.token_source)();

            if self
                .store
                .token_exists(&token)
                .await
                .context("failed to check share token")?
            {
                tracing::warn!(attempt, token = %token, "share token collision, regenerating");
                continue;
            }

            let insert = self
                .store
                .insert_response(NewFormResponse {
                    form_id: form_id.to_string(),
                    user_id: user_id.map(str::to_string),
                    share_token: token.clone(),
                    answers: answers.clone(),
                })
                .await;

            match insert {
                Ok(response) => return Ok(response),
                Err(e) if is_token_collision(&e) => {
                    tracing::warn!(
                        attempt,
                        token = %token,
                        "share token taken on insert, regenerating"
                    );
                }
                Err(e) => return Err(e.context("failed to save response")),
            }
        }

        Err(RecordError::TokenExhausted {
            attempts: self.config.max_token_attempts,
        }
        .into())
    }

    /// Response and diagnostic behind a share token; `None` if either is missing.
    pub async fn find_by_token(&self, token: &ShareToken) -> Result<Option<RecordedResponse>> {
        let Some(response) = self.store.response_by_token(token).await? else {
            return Ok(None);
        };
        let Some(diagnostic) = self.store.diagnostic_for_response(response.id).await? else {
            tracing::warn!(response = %response.id, "response has no diagnostic");
            return Ok(None);
        };
        Ok(Some(RecordedResponse {
            response,
            diagnostic,
        }))
    }

    /// Every response to a form, newest first, with its diagnostic if recorded.
    pub async fn form_responses(&self, form_id: &str) -> Result<Vec<ResponseWithDiagnostic>> {
        let responses = self
            .store
            .responses_for_form(form_id)
            .await
            .context("failed to fetch responses")?;
        if responses.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = responses.iter().map(|r| r.id).collect();
        let mut diagnostics: HashMap<_, _> = self
            .store
            .diagnostics_for_responses(&ids)
            .await
            .context("failed to fetch diagnostics")?
            .into_iter()
            .map(|d| (d.form_response_id, d))
            .collect();

        Ok(responses
            .into_iter()
            .map(|response| {
                let diagnostic = diagnostics.remove(&response.id);
                ResponseWithDiagnostic {
                    response,
                    diagnostic,
                }
            })
            .collect())
    }

    /// A user's responses, newest first.
    pub async fn user_responses(&self, user_id: &str) -> Result<Vec<FormResponse>> {
        self.store
            .responses_for_user(user_id)
            .await
            .context("failed to fetch responses")
    }
}

fn is_token_collision(err: &anyhow::Error) -> bool {
    err.downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_token_collision)
}
