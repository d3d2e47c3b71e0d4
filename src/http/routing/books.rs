use axum::{extract::{rejection::JsonRejection, Path, State}, routing::{get, post}, Router, Json};
use axum::http::StatusCode;
use serde_json::Value;

use crate::{
    application::book_service::BookService,
    domain::{book::Book, validation},
    http::types::ApiError,
};

#[derive(Clone)]
pub struct AppState<S: BookService> { pub service: S }

pub fn router<S: BookService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/books", post(create_book::<S>).get(list_books::<S>))
        .route("/books/:id", get(get_book::<S>).put(update_book::<S>).delete(delete_book::<S>))
        .with_state(state)
}

async fn create_book<S: BookService>(State(state): State<AppState<S>>, payload: Result<Json<Value>, JsonRejection>) -> Result<(StatusCode, Json<Book>), ApiError> {
    let input = validation::parse_create(&body(payload)?).map_err(ApiError::validation)?;
    let book = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books<S: BookService>(State(state): State<AppState<S>>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.service.find_all().await?))
}

async fn get_book<S: BookService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.service.find_one(&id).await?))
}

async fn update_book<S: BookService>(State(state): State<AppState<S>>, Path(id): Path<String>, payload: Result<Json<Value>, JsonRejection>) -> Result<Json<Book>, ApiError> {
    let patch = validation::parse_update(&body(payload)?).map_err(ApiError::validation)?;
    Ok(Json(state.service.update(&id, patch).await?))
}

async fn delete_book<S: BookService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.service.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Malformed or non-JSON bodies are client errors like any other bad input.
fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload.map(|Json(v)| v).map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}
