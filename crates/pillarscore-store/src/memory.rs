//! In-memory store.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use pillarscore_core::error::StoreError;
use pillarscore_core::record::{
    Diagnostic, FormResponse, NewDiagnostic, NewFormResponse, ShareToken,
};
use pillarscore_core::traits::ResponseStore;

#[derive(Default)]
struct Tables {
    responses: Vec<FormResponse>,
    diagnostics: Vec<Diagnostic>,
}

/// A process-local store, useful for tests and one-off scoring runs.
///
/// Share tokens are unique across all stored responses.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored responses.
    pub fn response_count(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Tables only change through single pushes, so a poisoned lock is still consistent.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn newest_first<'a>(
    responses: impl DoubleEndedIterator<Item = &'a FormResponse>,
) -> Vec<FormResponse> {
    let mut found: Vec<FormResponse> = responses.rev().cloned().collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

#[async_trait]
impl ResponseStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn token_exists(&self, token: &ShareToken) -> anyhow::Result<bool> {
        Ok(self.lock().responses.iter().any(|r| &r.share_token == token))
    }

    async fn insert_response(&self, response: NewFormResponse) -> anyhow::Result<FormResponse> {
        let mut tables = self.lock();
        if tables
            .responses
            .iter()
            .any(|r| r.share_token == response.share_token)
        {
            return Err(StoreError::DuplicateShareToken(response.share_token.to_string()).into());
        }
        let record = response.into_record();
        tables.responses.push(record.clone());
        Ok(record)
    }

    async fn insert_diagnostic(&self, diagnostic: NewDiagnostic) -> anyhow::Result<Diagnostic> {
        let mut tables = self.lock();
        if !tables
            .responses
            .iter()
            .any(|r| r.id == diagnostic.form_response_id)
        {
            anyhow::bail!(
                "cannot attach diagnostic to unknown response {}",
                diagnostic.form_response_id
            );
        }
        let record = diagnostic.into_record();
        tables.diagnostics.push(record.clone());
        Ok(record)
    }

    async fn response_by_token(&self, token: &ShareToken) -> anyhow::Result<Option<FormResponse>> {
        Ok(self
            .lock()
            .responses
            .iter()
            .find(|r| &r.share_token == token)
            .cloned())
    }

    async fn diagnostic_for_response(
        &self,
        response_id: Uuid,
    ) -> anyhow::Result<Option<Diagnostic>> {
        Ok(self
            .lock()
            .diagnostics
            .iter()
            .find(|d| d.form_response_id == response_id)
            .cloned())
    }

    async fn responses_for_form(&self, form_id: &str) -> anyhow::Result<Vec<FormResponse>> {
        let tables = self.lock();
        Ok(newest_first(
            tables.responses.iter().filter(|r| r.form_id == form_id),
        ))
    }

    async fn responses_for_user(&self, user_id: &str) -> anyhow::Result<Vec<FormResponse>> {
        let tables = self.lock();
        Ok(newest_first(
            tables
                .responses
                .iter()
                .filter(|r| r.user_id.as_deref() == Some(user_id)),
        ))
    }

    async fn diagnostics_for_responses(
        &self,
        response_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Diagnostic>> {
        Ok(self
            .lock()
            .diagnostics
            .iter()
            .filter(|d| response_ids.contains(&d.form_response_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use pillarscore_core::scoring::ScoreResult;

    fn new_response(form_id: &str, token: &ShareToken) -> NewFormResponse {
        NewFormResponse {
            form_id: form_id.into(),
            user_id: None,
            share_token: token.clone(),
            answers: [("q1".to_string(), 3)].into(),
        }
    }

    fn empty_result() -> ScoreResult {
        ScoreResult {
            raw_scores: BTreeMap::new(),
            max_scores: BTreeMap::new(),
            percentages: BTreeMap::new(),
            levels: BTreeMap::new(),
            bottleneck_pillar_id: "p".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_token_is_rejected() {
        let store = MemoryStore::new();
        let token = ShareToken::generate();
        store.insert_response(new_response("f", &token)).await.unwrap();

        let err = store
            .insert_response(new_response("f", &token))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::DuplicateShareToken(_))
        ));
        assert!(store.token_exists(&token).await.unwrap());
        assert_eq!(store.response_count(), 1);
    }

    #[tokio::test]
    async fn diagnostic_requires_response() {
        let store = MemoryStore::new();
        let err = store
            .insert_diagnostic(NewDiagnostic {
                form_response_id: Uuid::new_v4(),
                result: empty_result(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown response"));
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = MemoryStore::new();
        let first = store
            .insert_response(new_response("f", &ShareToken::generate()))
            .await
            .unwrap();
        let second = store
            .insert_response(new_response("f", &ShareToken::generate()))
            .await
            .unwrap();
        store
            .insert_response(new_response("other", &ShareToken::generate()))
            .await
            .unwrap();

        let listed = store.responses_for_form("f").await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
