//! Most of the structs in `web` module and their implementations live here.
//! Includes the request structs that need to be validated, their parsing implementations,
//! the response bodies and tests for those.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::store::{NewSignup, SignupReceipt, SignupSummary};

pub const DEFAULT_SIGNUP_SOURCE: &str = "landing-page";
pub const UNKNOWN_CLIENT_INFO: &str = "unknown";
pub const SIGNUP_SUCCESS_MESSAGE: &str = "You're on the list!";

const BYTE_ORDER_MARK: char = '\u{feff}';

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const USER_AGENT: &str = "user-agent";

// ###################################
// ->   REQUEST STRUCTS
// ###################################
/// Deserializable Signup
/// The raw POST body, fields can be missing or invalid
#[derive(Debug, Default, Deserialize)]
pub struct DeserSignup {
    pub email: Option<String>,
    pub source: Option<String>,
}

/// Validated Signup
/// A Signup with all the fields validated and normalized
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub email: ValidEmail,
    pub source: SignupSource,
}

impl TryFrom<DeserSignup> for ValidSignup {
    type Error = DataParsingError;

    fn try_from(deser_signup: DeserSignup) -> Result<Self, Self::Error> {
        let email = deser_signup.email.ok_or(DataParsingError::EmailMissing)?;

        Ok(ValidSignup {
            email: ValidEmail::parse(email)?,
            source: SignupSource::parse(deser_signup.source),
        })
    }
}

impl ValidSignup {
    pub fn into_new_signup(self, client: ClientInfo) -> NewSignup {
        NewSignup {
            email: self.email.0,
            source: self.source.0,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        }
    }
}

/// Validated and normalized (trimmed, lower-cased) Signup Email.
/// Only a sanity check: it has to be non-empty and contain an `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value
            .as_ref()
            .trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK);

        if value.is_empty() {
            return Err(DataParsingError::EmailMissing);
        }
        if !value.contains('@') {
            return Err(DataParsingError::EmailInvalid);
        }

        Ok(ValidEmail(value.to_lowercase()))
    }
}

/// Where the signup came from, `landing-page` unless the client says otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupSource(String);

impl AsRef<str> for SignupSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SignupSource {
    pub fn parse(value: Option<String>) -> Self {
        match value {
            Some(source) if !source.is_empty() => SignupSource(source),
            _ => SignupSource(DEFAULT_SIGNUP_SOURCE.to_string()),
        }
    }
}

/// Best-effort client information taken from the request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// `x-forwarded-for`, then `x-real-ip`, then `unknown` for the address.
    /// Header values are taken verbatim.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|val| val.to_str().ok())
                .filter(|val| !val.is_empty())
                .map(str::to_string)
        };

        let ip_address = header_str(X_FORWARDED_FOR)
            .or_else(|| header_str(X_REAL_IP))
            .unwrap_or_else(|| UNKNOWN_CLIENT_INFO.to_string());
        let user_agent = header_str(USER_AGENT).unwrap_or_else(|| UNKNOWN_CLIENT_INFO.to_string());

        Self {
            ip_address,
            user_agent,
        }
    }
}

/// A deserializable struct that contains the shared `secret` to be deserialized from the query
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub secret: Option<String>,
}

impl ListQuery {
    /// Exact string comparison against the configured secret.
    // NOTE: not constant-time.
    pub fn is_authorized(&self, list_secret: &SecretString) -> bool {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret == list_secret.expose_secret(),
            _ => false,
        }
    }
}

// ###################################
// ->   RESPONSE STRUCTS
// ###################################
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: &'static str,
    pub signup: SignupView,
}

#[derive(Debug, Serialize)]
pub struct SignupView {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<SignupReceipt> for SignupResponse {
    fn from(receipt: SignupReceipt) -> Self {
        SignupResponse {
            success: true,
            message: SIGNUP_SUCCESS_MESSAGE,
            signup: SignupView {
                email: receipt.email,
                created_at: receipt.created_at,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub total: usize,
    pub signups: Vec<SignupSummary>,
}

impl From<Vec<SignupSummary>> for ListResponse {
    fn from(signups: Vec<SignupSummary>) -> Self {
        ListResponse {
            total: signups.len(),
            signups,
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,

    #[error("malformed signup body: {0}")]
    MalformedBody(String),
}
