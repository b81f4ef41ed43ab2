use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AccessToken, LoginRequest, RefreshRequest, TokenPair},
        extractors::AuthUser,
        services::AuthService,
    },
    error::AppError,
    extract::Json,
    state::AppState,
    users::{
        dto::{PublicUser, RegisterRequest},
        UserService,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/auth/register", post(register))
        .route("/users/auth/login", post(login))
        .route("/users/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(users, payload))]
pub async fn register(
    State(users): State<UserService>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let payload = payload.validate()?;
    let user = users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(auth, payload), fields(username = %payload.username))]
pub async fn login(
    State(auth): State<AuthService>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let pair = auth
        .authenticate_and_issue_tokens(&payload.username, &payload.password)
        .await?;
    Ok(Json(pair))
}

#[instrument(skip(auth, payload))]
pub async fn refresh(
    State(auth): State<AuthService>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let token = auth.refresh_access_token(&payload.refresh_token).await?;
    Ok(Json(token))
}

#[instrument(skip(user), fields(user_id = user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}
