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
};

use super::{not_found, store_error, IsbnPath};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteBookResponse {
    pub message: String,
}

impl IntoResponse for DeleteBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[utoipa::path(
    delete,
    path = "/books/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "ISBN of the book")),
    responses(
        (status = 200, description = "Book deleted", body = DeleteBookResponse),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorMessage),
    )
)]
#[tracing::instrument(name = "delete_book", skip_all, fields(isbn = %isbn))]
pub async fn delete_book(
    State(state): State<ApiState>,
    ApiPath(IsbnPath { isbn }): ApiPath<IsbnPath>,
) -> Result<DeleteBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    let deleted = state
        .store()
        .delete(&isbn)
        .await
        .map_err(|err| store_error(verbosity, err))?;

    match deleted {
        true => {
            tracing::info!("Book deleted");

            Ok(DeleteBookResponse {
                message: String::from("Book deleted"),
            })
        }
        false => Err(not_found(verbosity, isbn)),
    }
}
