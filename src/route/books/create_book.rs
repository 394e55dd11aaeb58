use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorVerbosityProvider},
    extractor::json::ApiJson,
    schema::{ValidationMode, BOOK_SCHEMA},
    state::ApiState,
    types::book::{Book, NewBook},
};

use super::{invalid_book, store_error, Payload};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBookResponse {
    pub book: Book,
}

impl IntoResponse for CreateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = CreateBookResponse),
        (status = 400, description = "Invalid book", body = crate::error::ApiErrorMessage),
        (status = 409, description = "A book with this isbn already exists", body = crate::error::ApiErrorMessage),
    )
)]
#[tracing::instrument(name = "create_book", skip_all)]
pub async fn create_book(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<Payload<NewBook>>,
) -> Result<CreateBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    let new_book: NewBook = BOOK_SCHEMA
        .parse(payload.into_inner(), ValidationMode::Create)
        .map_err(|violations| invalid_book(verbosity, &violations))?;

    let book = state
        .store()
        .insert(new_book)
        .await
        .map_err(|err| store_error(verbosity, err))?;

    tracing::info!(isbn = %book.isbn, "Book created");

    Ok(CreateBookResponse { book })
}
