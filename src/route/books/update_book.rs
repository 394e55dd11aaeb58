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
    extractor::{json::ApiJson, path::ApiPath},
    schema::{ValidationMode, Violation, BOOK_SCHEMA},
    state::ApiState,
    types::book::{Book, BookChanges},
};

use super::{book_error, invalid_book, not_found, store_error, BookErrorType, IsbnPath, Payload};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateBookResponse {
    pub book: Book,
}

impl IntoResponse for UpdateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Replaces every field of a book except its isbn.
#[utoipa::path(
    put,
    path = "/books/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "ISBN of the book")),
    request_body = BookChanges,
    responses(
        (status = 200, description = "Book updated", body = UpdateBookResponse),
        (status = 400, description = "Invalid book or the payload contains an isbn", body = crate::error::ApiErrorMessage),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorMessage),
    )
)]
#[tracing::instrument(name = "update_book", skip_all, fields(isbn = %isbn))]
pub async fn update_book(
    State(state): State<ApiState>,
    ApiPath(IsbnPath { isbn }): ApiPath<IsbnPath>,
    ApiJson(payload): ApiJson<Payload<BookChanges>>,
) -> Result<UpdateBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    let changes: BookChanges = BOOK_SCHEMA
        .parse(payload.into_inner(), ValidationMode::Update)
        .map_err(|violations| match violations.iter().any(Violation::is_immutable) {
            true => {
                tracing::warn!("Attempt to change isbn");

                book_error(verbosity, BookErrorType::IsbnImmutable)
            }
            false => invalid_book(verbosity, &violations),
        })?;

    let book = state
        .store()
        .update(&isbn, changes)
        .await
        .map_err(|err| store_error(verbosity, err))?;

    match book {
        Some(book) => {
            tracing::info!("Book updated");

            Ok(UpdateBookResponse { book })
        }
        None => Err(not_found(verbosity, isbn)),
    }
}
