use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{HeaderMap, Method, StatusCode},
    Json,
};
use tracing::info;

use crate::{
    store::RECENT_SIGNUPS_LIMIT,
    web::{
        types::{
            ClientInfo, DataParsingError, DeserSignup, ListQuery, ListResponse, SignupResponse,
            ValidSignup,
        },
        Error, WebResult,
    },
    AppState,
};

/// POST - adds an email to the waitlist, or touches it when it is already there.
#[tracing::instrument(
    name = "Adding signup to the waitlist",
    skip_all,
    fields(email = tracing::field::Empty)
)]
pub async fn signup(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<DeserSignup>, JsonRejection>,
) -> WebResult<Json<SignupResponse>> {
    let Json(deser_signup) =
        body.map_err(|rejection| DataParsingError::MalformedBody(rejection.body_text()))?;
    let signup = ValidSignup::try_from(deser_signup)?;
    tracing::Span::current().record("email", signup.email.as_ref());

    let new_signup = signup.into_new_signup(ClientInfo::from_headers(&headers));
    let receipt = app_state.store.upsert_signup(new_signup).await?;

    info!(email = %receipt.email, "Signup stored");

    Ok(Json(SignupResponse::from(receipt)))
}

/// GET - lists the most recent signups, gated by the shared `secret` query param.
#[tracing::instrument(name = "Listing waitlist signups", skip_all)]
pub async fn list(
    State(app_state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> WebResult<Json<ListResponse>> {
    let Query(query) = query.map_err(|_| Error::Unauthorized)?;
    if !query.is_authorized(&app_state.list_secret) {
        return Err(Error::Unauthorized);
    }

    let signups = app_state
        .store
        .recent_signups(RECENT_SIGNUPS_LIMIT)
        .await?;

    info!("Listed {} signups", signups.len());

    Ok(Json(ListResponse::from(signups)))
}

/// OPTIONS - CORS preflight, the headers are added by `midware::cors_headers`.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed(method: Method) -> WebResult<()> {
    Err(Error::MethodNotAllowed(method))
}
