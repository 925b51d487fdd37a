use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use strum_macros::AsRefStr;

use crate::store::StoreError;

use super::types::DataParsingError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("the list secret was missing or did not match")]
    Unauthorized,
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::DataParsing(_) => (StatusCode::BAD_REQUEST, InvalidInput),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, Unauthorized),
            Error::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, MethodNotAllowed),
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The only error information that ever reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Valid email required")]
    InvalidInput,
    #[display("Unauthorized")]
    Unauthorized,
    #[display("Method not allowed")]
    MethodNotAllowed,
    #[display("Internal server error")]
    ServiceError,
}

impl ClientError {
    /// `{"error": "<message>"}`
    pub fn into_body(self) -> Json<serde_json::Value> {
        Json(json!({ "error": self.to_string() }))
    }
}
