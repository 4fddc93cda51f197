//! JSON file-directory store.
//!
//! Layout under the root directory:
//!
//! ```text
//! responses/<response id>.json
//! diagnostics/<response id>.json
//! tokens/<SHARE TOKEN>          (contains the response id)
//! ```
//!
//! Token files are created with `create_new`, so two writers can never claim
//! the same token.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use pillarscore_core::error::StoreError;
use pillarscore_core::record::{
    Diagnostic, FormResponse, NewDiagnostic, NewFormResponse, ShareToken,
};
use pillarscore_core::traits::ResponseStore;

const READ_CONCURRENCY: usize = 16;

/// Stores each record as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn responses_dir(&self) -> PathBuf {
        self.root.join("responses")
    }

    fn diagnostics_dir(&self) -> PathBuf {
        self.root.join("diagnostics")
    }

    fn tokens_dir(&self) -> PathBuf {
        self.root.join("tokens")
    }

    fn response_path(&self, id: Uuid) -> PathBuf {
        self.responses_dir().join(format!("{id}.json"))
    }

    fn diagnostic_path(&self, response_id: Uuid) -> PathBuf {
        self.diagnostics_dir().join(format!("{response_id}.json"))
    }

    fn token_path(&self, token: &ShareToken) -> PathBuf {
        self.tokens_dir().join(token.as_str())
    }

    /// Claim a token by creating its index file; fails if it already exists.
    async fn claim_token(&self, token: &ShareToken, response_id: Uuid) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(self.tokens_dir())
            .await
            .map_err(StoreError::Io)?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.token_path(token))
            .await;

        match file {
            Ok(mut file) => {
                file.write_all(response_id.to_string().as_bytes())
                    .await
                    .map_err(StoreError::Io)?;
                file.flush().await.map_err(StoreError::Io)?;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::DuplicateShareToken(token.to_string()).into())
            }
            Err(e) => Err(StoreError::Io(e).into()),
        }
    }

    async fn response_by_id(&self, id: Uuid) -> anyhow::Result<Option<FormResponse>> {
        read_json(&self.response_path(id)).await
    }

    async fn all_responses(&self) -> anyhow::Result<Vec<FormResponse>> {
        let dir = self.responses_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e).into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StoreError::Io)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }

        let responses: Vec<Option<FormResponse>> = stream::iter(paths)
            .map(|path| async move { read_json::<FormResponse>(&path).await })
            .buffer_unordered(READ_CONCURRENCY)
            .try_collect()
            .await?;

        let mut responses: Vec<FormResponse> = responses.into_iter().flatten().collect();
        responses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(responses)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::Io(e).into()),
    };
    let value = serde_json::from_str(&content)
        .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
    Ok(Some(value))
}

/// Write through a temporary file so readers never see a partial record.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize record")?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(StoreError::Io)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await.map_err(StoreError::Io)?;
    tokio::fs::rename(&tmp, path).await.map_err(StoreError::Io)?;
    Ok(())
}

#[async_trait]
impl ResponseStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn token_exists(&self, token: &ShareToken) -> anyhow::Result<bool> {
        Ok(tokio::fs::try_exists(self.token_path(token))
            .await
            .map_err(StoreError::Io)?)
    }

    #[instrument(skip(self, response), fields(form = %response.form_id))]
    async fn insert_response(&self, response: NewFormResponse) -> anyhow::Result<FormResponse> {
        let record = response.into_record();
        self.claim_token(&record.share_token, record.id).await?;
        if let Err(e) = write_json(&self.response_path(record.id), &record).await {
            // Release the token so it does not point at a missing response.
            if let Err(cleanup) = tokio::fs::remove_file(self.token_path(&record.share_token)).await
            {
                tracing::warn!(
                    token = %record.share_token,
                    "failed to release share token: {cleanup}"
                );
            }
            return Err(e);
        }
        Ok(record)
    }

    #[instrument(skip(self, diagnostic), fields(response = %diagnostic.form_response_id))]
    async fn insert_diagnostic(&self, diagnostic: NewDiagnostic) -> anyhow::Result<Diagnostic> {
        if !tokio::fs::try_exists(self.response_path(diagnostic.form_response_id))
            .await
            .map_err(StoreError::Io)?
        {
            anyhow::bail!(
                "cannot attach diagnostic to unknown response {}",
                diagnostic.form_response_id
            );
        }
        let record = diagnostic.into_record();
        write_json(&self.diagnostic_path(record.form_response_id), &record).await?;
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn response_by_token(&self, token: &ShareToken) -> anyhow::Result<Option<FormResponse>> {
        let id = match tokio::fs::read_to_string(self.token_path(token)).await {
            Ok(id) => id,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e).into()),
        };
        let id: Uuid = id
            .trim()
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("token index {token}: {e}")))?;
        self.response_by_id(id).await
    }

    #[instrument(skip(self))]
    async fn diagnostic_for_response(
        &self,
        response_id: Uuid,
    ) -> anyhow::Result<Option<Diagnostic>> {
        read_json(&self.diagnostic_path(response_id)).await
    }

    #[instrument(skip(self))]
    async fn responses_for_form(&self, form_id: &str) -> anyhow::Result<Vec<FormResponse>> {
        let mut responses = self.all_responses().await?;
        responses.retain(|r| r.form_id == form_id);
        Ok(responses)
    }

    #[instrument(skip(self))]
    async fn responses_for_user(&self, user_id: &str) -> anyhow::Result<Vec<FormResponse>> {
        let mut responses = self.all_responses().await?;
        responses.retain(|r| r.user_id.as_deref() == Some(user_id));
        Ok(responses)
    }

    #[instrument(skip(self, response_ids), fields(count = response_ids.len()))]
    async fn diagnostics_for_responses(
        &self,
        response_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Diagnostic>> {
        let found: Vec<Option<Diagnostic>> = stream::iter(response_ids.iter().copied())
            .map(|id| self.diagnostic_for_response(id))
            .buffered(READ_CONCURRENCY)
            .try_collect()
            .await?;
        Ok(found.into_iter().flatten().collect())
    }
}
