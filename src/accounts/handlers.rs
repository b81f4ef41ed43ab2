use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::instrument;

use super::{
    dto::{AccountResponse, CreateAccount},
    services::AccountService,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{Json, Path},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id", get(get_account).delete(delete_account))
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn list_accounts(
    State(svc): State<AccountService>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let items = svc
        .list_accounts(user.id)
        .await?
        .into_iter()
        .map(AccountResponse::from)
        .collect();
    Ok(Json(items))
}

#[instrument(skip(svc, user, payload), fields(user_id = user.id))]
pub async fn create_account(
    State(svc): State<AccountService>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateAccount>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let payload = payload.validate()?;
    let account = svc.add_account(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn get_account(
    State(svc): State<AccountService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(svc.get_account(id, user.id).await?.into()))
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn delete_account(
    State(svc): State<AccountService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    svc.delete_account(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
