//! PostgREST-compatible HTTP store.
//!
//! Expects two tables, `form_responses` and `diagnostics`, with a unique
//! constraint on `form_responses.share_token`.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use pillarscore_core::error::StoreError;
use pillarscore_core::model::{AnswerSet, PillarScores};
use pillarscore_core::record::{
    Diagnostic, FormResponse, NewDiagnostic, NewFormResponse, ShareToken,
};
use pillarscore_core::scoring::ScoreResult;
use pillarscore_core::traits::ResponseStore;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const UNIQUE_VIOLATION: &str = "23505";

/// Store backed by a PostgREST endpoint such as a Supabase project.
pub struct RestStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestStore {
    /// `base_url` is the PostgREST root, e.g. `https://<project>.supabase.co/rest/v1`.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&format!("{}/{table}", self.base_url))
            .with_context(|| format!("invalid store URL: {}", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (key, value) in filters {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn select<T: DeserializeOwned>(&self, url: Url) -> anyhow::Result<Vec<T>> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        decode(response).await
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let url = self.table_url(table, &[])?;
        let response = self
            .authorized(self.client.post(url))
            .header("content-type", "application/json")
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let mut rows: Vec<T> = decode(response).await?;
        if rows.is_empty() {
            return Err(StoreError::Corrupt(format!("insert into {table} returned no row")).into());
        }
        Ok(rows.swap_remove(0))
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        StoreError::Network(e.to_string())
    }
}

#[derive(Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

async fn check_status(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: Option<PostgrestError> = serde_json::from_str(&body).ok();
    let is_unique_violation = status == 409
        || parsed
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == UNIQUE_VIOLATION);

    if is_unique_violation {
        let detail = parsed
            .and_then(|e| e.details.or(e.message))
            .unwrap_or(body);
        return Err(StoreError::DuplicateShareToken(detail).into());
    }

    let message = parsed.and_then(|e| e.message).unwrap_or(body);
    Err(StoreError::Http { status, message }.into())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<Vec<T>> {
    let rows = response
        .json::<Vec<T>>()
        .await
        .map_err(|e| StoreError::Corrupt(format!("failed to parse response: {e}")))?;
    Ok(rows)
}

#[derive(Serialize, Deserialize)]
struct ResponseRow {
    id: Uuid,
    form_id: String,
    #[serde(default)]
    user_id: Option<String>,
    share_token: String,
    answers: AnswerSet,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FormResponse> for ResponseRow {
    fn from(r: FormResponse) -> Self {
        Self {
            id: r.id,
            form_id: r.form_id,
            user_id: r.user_id,
            share_token: r.share_token.into(),
            answers: r.answers,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl TryFrom<ResponseRow> for FormResponse {
    type Error = StoreError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        let share_token = row
            .share_token
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("response {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            form_id: row.form_id,
            user_id: row.user_id,
            share_token,
            answers: row.answers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct DiagnosticRow {
    id: Uuid,
    form_response_id: Uuid,
    scores: PillarScores,
    max_scores: PillarScores,
    percentages: PillarScores,
    #[serde(default)]
    levels: BTreeMap<String, String>,
    bottleneck: String,
    created_at: DateTime<Utc>,
}

impl From<Diagnostic> for DiagnosticRow {
    fn from(d: Diagnostic) -> Self {
        Self {
            id: d.id,
            form_response_id: d.form_response_id,
            scores: d.result.raw_scores,
            max_scores: d.result.max_scores,
            percentages: d.result.percentages,
            levels: d.result.levels,
            bottleneck: d.result.bottleneck_pillar_id,
            created_at: d.created_at,
        }
    }
}

impl From<DiagnosticRow> for Diagnostic {
    fn from(row: DiagnosticRow) -> Self {
        Self {
            id: row.id,
            form_response_id: row.form_response_id,
            result: ScoreResult {
                raw_scores: row.scores,
                max_scores: row.max_scores,
                percentages: row.percentages,
                levels: row.levels,
                bottleneck_pillar_id: row.bottleneck,
            },
            created_at: row.created_at,
        }
    }
}

fn into_responses(rows: Vec<ResponseRow>) -> anyhow::Result<Vec<FormResponse>> {
    Ok(rows
        .into_iter()
        .map(FormResponse::try_from)
        .collect::<Result<_, _>>()?)
}

#[async_trait]
impl ResponseStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    #[instrument(skip(self))]
    async fn token_exists(&self, token: &ShareToken) -> anyhow::Result<bool> {
        let url = self.table_url(
            "form_responses",
            &[
                ("share_token", format!("eq.{token}")),
                ("limit", "1".to_string()),
            ],
        )?;
        let rows: Vec<serde_json::Value> = self.select(url).await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip(self, response), fields(form = %response.form_id))]
    async fn insert_response(&self, response: NewFormResponse) -> anyhow::Result<FormResponse> {
        let row = ResponseRow::from(response.into_record());
        let stored: ResponseRow = self.insert("form_responses", &row).await?;
        Ok(FormResponse::try_from(stored)?)
    }

    #[instrument(skip(self, diagnostic), fields(response = %diagnostic.form_response_id))]
    async fn insert_diagnostic(&self, diagnostic: NewDiagnostic) -> anyhow::Result<Diagnostic> {
        let row = DiagnosticRow::from(diagnostic.into_record());
        let stored: DiagnosticRow = self.insert("diagnostics", &row).await?;
        Ok(stored.into())
    }

    #[instrument(skip(self))]
    async fn response_by_token(&self, token: &ShareToken) -> anyhow::Result<Option<FormResponse>> {
        let url = self.table_url(
            "form_responses",
            &[
                ("share_token", format!("eq.{token}")),
                ("limit", "1".to_string()),
            ],
        )?;
        let rows: Vec<ResponseRow> = self.select(url).await?;
        Ok(into_responses(rows)?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn diagnostic_for_response(
        &self,
        response_id: Uuid,
    ) -> anyhow::Result<Option<Diagnostic>> {
        let url = self.table_url(
            "diagnostics",
            &[
                ("form_response_id", format!("eq.{response_id}")),
                ("limit", "1".to_string()),
            ],
        )?;
        let rows: Vec<DiagnosticRow> = self.select(url).await?;
        Ok(rows.into_iter().next().map(Diagnostic::from))
    }

    #[instrument(skip(self))]
    async fn responses_for_form(&self, form_id: &str) -> anyhow::Result<Vec<FormResponse>> {
        let url = self.table_url(
            "form_responses",
            &[
                ("form_id", format!("eq.{form_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )?;
        into_responses(self.select(url).await?)
    }

    #[instrument(skip(self))]
    async fn responses_for_user(&self, user_id: &str) -> anyhow::Result<Vec<FormResponse>> {
        let url = self.table_url(
            "form_responses",
            &[
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )?;
        into_responses(self.select(url).await?)
    }

    #[instrument(skip(self, response_ids), fields(count = response_ids.len()))]
    async fn diagnostics_for_responses(
        &self,
        response_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Diagnostic>> {
        if response_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = response_ids.iter().map(Uuid::to_string).collect();
        let url = self.table_url(
            "diagnostics",
            &[("form_response_id", format!("in.({})", ids.join(",")))],
        )?;
        let rows: Vec<DiagnosticRow> = self.select(url).await?;
        Ok(rows.into_iter().map(Diagnostic::from).collect())
    }
}
