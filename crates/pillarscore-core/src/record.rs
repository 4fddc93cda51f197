//! Persisted records: form responses, diagnostics and share tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::AnswerSet;
use crate::scoring::ScoreResult;

/// Length of a share token in hex characters (16 random bytes).
pub const SHARE_TOKEN_LEN: usize = 32;

/// A random identifier granting authentication-free access to a diagnostic.
///
/// Always stored as uppercase hex; parsing accepts either case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareToken(String);

impl ShareToken {
    /// Generate a fresh token from 16 random bytes.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != SHARE_TOKEN_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!(
                "invalid share token: expected {SHARE_TOKEN_LEN} hex characters, got \"{s}\""
            ));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for ShareToken {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ShareToken> for String {
    fn from(token: ShareToken) -> Self {
        token.0
    }
}

/// Public link for a recorded diagnostic.
pub fn share_url(base_url: &str, token: &ShareToken) -> String {
    format!("{}/share/{}", base_url.trim_end_matches('/'), token)
}

/// A submitted answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormResponse {
    pub id: Uuid,
    pub form_id: String,
    /// `None` for anonymous respondents.
    #[serde(default)]
    pub user_id: Option<String>,
    pub share_token: ShareToken,
    pub answers: AnswerSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The score result computed for a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: Uuid,
    pub form_response_id: Uuid,
    pub result: ScoreResult,
    pub created_at: DateTime<Utc>,
}

/// A response waiting to be inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFormResponse {
    pub form_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub share_token: ShareToken,
    pub answers: AnswerSet,
}

impl NewFormResponse {
    /// Materialize the record a store will hold.
    pub fn into_record(self) -> FormResponse {
        let now = Utc::now();
        FormResponse {
            id: Uuid::new_v4(),
            form_id: self.form_id,
            user_id: self.user_id,
            share_token: self.share_token,
            answers: self.answers,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A diagnostic waiting to be inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiagnostic {
    pub form_response_id: Uuid,
    pub result: ScoreResult,
}

impl NewDiagnostic {
    pub fn into_record(self) -> Diagnostic {
        Diagnostic {
            id: Uuid::new_v4(),
            form_response_id: self.form_response_id,
            result: self.result,
            created_at: Utc::now(),
        }
    }
}

/// A response together with its diagnostic, when one was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseWithDiagnostic {
    pub response: FormResponse,
    pub diagnostic: Option<Diagnostic>,
}
