use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{jwt::TokenError, services::AuthService};
use crate::{
    config::{AppConfig, TokenLocation},
    error::AppError,
    users::User,
};

/// The authenticated, active user behind the request's access token.
pub struct AuthUser(pub User);

/// Pulls the raw bearer token out of the configured location.
fn bearer_token(parts: &Parts, location: TokenLocation) -> Result<&str, TokenError> {
    match location {
        TokenLocation::Headers => {
            let auth = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or(TokenError::Missing)?;

            // Expect "Bearer <token>"
            auth.strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(TokenError::Missing)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
    Arc<AppConfig>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);
        let token = bearer_token(parts, config.jwt.token_location)?;
        let user = AuthService::from_ref(state).current_user(token).await?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(h) = header {
            builder = builder.header("Authorization", h);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_bearer_tokens_from_headers() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts, TokenLocation::Headers).unwrap(), "abc.def.ghi");
        let parts = parts_with(Some("bearer abc"));
        assert_eq!(bearer_token(&parts, TokenLocation::Headers).unwrap(), "abc");
    }

    #[test]
    fn missing_or_foreign_schemes_are_rejected() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer "), Some("abc")] {
            let parts = parts_with(header);
            assert_eq!(
                bearer_token(&parts, TokenLocation::Headers).unwrap_err(),
                TokenError::Missing
            );
        }
    }
}
