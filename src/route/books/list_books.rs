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
    state::ApiState,
    types::book::Book,
};

use super::store_error;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
}

impl IntoResponse for ListBooksResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books, ordered by title", body = ListBooksResponse),
        (status = 500, description = "Storage failure", body = crate::error::ApiErrorMessage),
    )
)]
#[tracing::instrument(name = "list_books", skip_all)]
pub async fn list_books(State(state): State<ApiState>) -> Result<ListBooksResponse, ApiError> {
    let books = state
        .store()
        .list()
        .await
        .map_err(|err| store_error(state.error_verbosity(), err))?;

    tracing::debug!(count = books.len(), "Listed books");

    Ok(ListBooksResponse { books })
}
