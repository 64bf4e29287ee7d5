//! Axum extractor for CurrentUser.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use super::types::{CurrentUser, IdentityRejection, RequestId};

pub const USER_ID_HEADER: &str = "x-user-id";

fn extract_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(RequestId::from_uuid)
        .unwrap_or_else(RequestId::new)
}

fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, IdentityRejection> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or(IdentityRejection::Missing)?;
    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or(IdentityRejection::Invalid)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = extract_request_id(&parts.headers);
        let user_id = extract_user_id(&parts.headers).inspect_err(|rejection| {
            tracing::debug!(%request_id, ?rejection, "Rejected request without caller identity");
        })?;

        Ok(CurrentUser {
            user_id,
            request_id,
        })
    }
}
