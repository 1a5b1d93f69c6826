use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::auth::token::TokenIssuer;
use crate::error::AppError;

/// Header carried by the single-page client.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// The caller of a protected route, resolved from its session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => token_from_custom_header(&parts.headers)
                .ok_or_else(|| AppError::Auth("No token, authorization denied".into()))?,
        };

        let issuer = Arc::<TokenIssuer>::from_ref(state);
        let user_id = issuer.verify(&token)?;

        Ok(AuthUser { user_id })
    }
}

fn token_from_custom_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
