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
    extractor::path::ApiPath,
    state::ApiState,
    types::book::Book,
};

use super::{not_found, store_error, IsbnPath};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GetBookResponse {
    pub book: Book,
}

impl IntoResponse for GetBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/books/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "ISBN of the book")),
    responses(
        (status = 200, description = "The book", body = GetBookResponse),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorMessage),
    )
)]
#[tracing::instrument(name = "get_book", skip_all, fields(isbn = %isbn))]
pub async fn get_book(
    State(state): State<ApiState>,
    ApiPath(IsbnPath { isbn }): ApiPath<IsbnPath>,
) -> Result<GetBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    let book = state
        .store()
        .get(&isbn)
        .await
        .map_err(|err| store_error(verbosity, err))?;

    match book {
        Some(book) => Ok(GetBookResponse { book }),
        None => Err(not_found(verbosity, isbn)),
    }
}
