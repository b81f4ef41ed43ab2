use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::instrument;

use super::{
    dto::{CreateTransaction, ListParams, TransactionResponse, TransactionSummary, UpdateTransaction},
    services::TransactionService,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{Json, Path, Query},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/total", get(transaction_summary))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn list_transactions(
    State(svc): State<TransactionService>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let (skip, limit) = params.window();
    let items = svc
        .get_transactions(user.id, params.kind, skip, limit)
        .await?
        .into_iter()
        .map(TransactionResponse::from)
        .collect();
    Ok(Json(items))
}

#[instrument(skip(svc, user, payload), fields(user_id = user.id))]
pub async fn create_transaction(
    State(svc): State<TransactionService>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateTransaction>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.validate()?;
    let t = svc.add_transaction(payload, user.id).await?;
    let location = format!("/api/v1/transactions/{}", t.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TransactionResponse::from(t)),
    ))
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn get_transaction(
    State(svc): State<TransactionService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransactionResponse>, AppError> {
    let t = svc.get_transaction(id, user.id).await?;
    Ok(Json(t.into()))
}

#[instrument(skip(svc, user, payload), fields(user_id = user.id))]
pub async fn update_transaction(
    State(svc): State<TransactionService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTransaction>,
) -> Result<Json<TransactionResponse>, AppError> {
    let payload = payload.validate()?;
    let t = svc.update_transaction(id, payload, user.id).await?;
    Ok(Json(t.into()))
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn delete_transaction(
    State(svc): State<TransactionService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    svc.delete_transaction(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(svc, user), fields(user_id = user.id))]
pub async fn transaction_summary(
    State(svc): State<TransactionService>,
    AuthUser(user): AuthUser,
) -> Result<Json<TransactionSummary>, AppError> {
    Ok(Json(svc.summary(user.id).await?))
}
