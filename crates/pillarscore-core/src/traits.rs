//! Core trait definitions for persistence backends.
//!
//! Implemented by the `pillarscore-store` crate. Backends report failures as
//! `anyhow::Error` wrapping a [`StoreError`](crate::error::StoreError) so the
//! recorder can tell a token collision from any other failure.

use async_trait::async_trait;
use uuid::Uuid;

use crate::record::{Diagnostic, FormResponse, NewDiagnostic, NewFormResponse, ShareToken};

/// Trait for backends that persist responses and their diagnostics.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Human-readable backend name (e.g. "file").
    fn name(&self) -> &str;

    /// Whether a response already uses this share token.
    async fn token_exists(&self, token: &ShareToken) -> anyhow::Result<bool>;

    /// Insert a response. Fails with `StoreError::DuplicateShareToken` when
    /// the token is already taken.
    async fn insert_response(&self, response: NewFormResponse) -> anyhow::Result<FormResponse>;

    /// Insert the diagnostic for a previously inserted response.
    async fn insert_diagnostic(&self, diagnostic: NewDiagnostic) -> anyhow::Result<Diagnostic>;

    /// Look up a response by its share token.
    async fn response_by_token(&self, token: &ShareToken) -> anyhow::Result<Option<FormResponse>>;

    /// The diagnostic recorded for a response, if any.
    async fn diagnostic_for_response(&self, response_id: Uuid)
        -> anyhow::Result<Option<Diagnostic>>;

    /// All responses to a form, newest first.
    async fn responses_for_form(&self, form_id: &str) -> anyhow::Result<Vec<FormResponse>>;

    /// All responses by a user, newest first.
    async fn responses_for_user(&self, user_id: &str) -> anyhow::Result<Vec<FormResponse>>;

    /// Diagnostics belonging to any of the given responses.
    async fn diagnostics_for_responses(
        &self,
        response_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Diagnostic>>;
}
