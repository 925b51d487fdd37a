use std::{any::Any, sync::Arc};

use axum::{
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, StatusCode, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::web::{log, ClientError, Error, REQUEST_ID_HEADER};

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Adds the permissive CORS headers to every response.
pub async fn cors_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );

    resp
}

/// Turns a `web::Error` stashed in the response extensions into the client facing JSON body.
/// Server errors are logged here with their full detail, the client only ever sees the `ClientError`.
/// Logs use the propagated `x-request-id` so they can be matched to the response.
pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    let request_id = resp.headers().get(REQUEST_ID_HEADER).cloned();
    let uuid = request_id
        .as_ref()
        .and_then(|val| val.to_str().ok())
        .and_then(|val| Uuid::parse_str(val).ok())
        .unwrap_or_else(Uuid::new_v4);

    let web_error: Option<&Error> = resp.extensions().get::<Arc<Error>>().map(|er| er.as_ref());
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    if let (Some(er), Some((status, _))) = (web_error, &client_status_and_error) {
        if status.is_server_error() {
            tracing::error!(error = ?er, "SERVER ERROR: {er} ID: {uuid}");
        }
    }

    let err_resp = client_status_and_error.map(|(status, cl_err)| {
        let mut err_resp = (status, cl_err.into_body()).into_response();
        if let Some(request_id) = request_id {
            err_resp.headers_mut().insert(REQUEST_ID_HEADER, request_id);
        }
        err_resp
    });

    log::log_request(
        uuid,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}

/// Response for a handler that panicked.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("SERVER ERROR: handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ClientError::ServiceError.into_body(),
    )
        .into_response()
}
