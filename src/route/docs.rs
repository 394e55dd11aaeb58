use axum::{routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};

use crate::{
    error::ApiErrorMessage,
    route::books::{
        create_book::{self, CreateBookResponse},
        delete_book::{self, DeleteBookResponse},
        get_book::{self, GetBookResponse},
        list_books::{self, ListBooksResponse},
        update_book::{self, UpdateBookResponse},
    },
    state::ApiState,
    types::book::{Book, BookChanges, NewBook},
};

const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(
        create_book::create_book,
        list_books::list_books,
        get_book::get_book,
        update_book::update_book,
        delete_book::delete_book,
    ),
    components(schemas(
        Book,
        NewBook,
        BookChanges,
        CreateBookResponse,
        ListBooksResponse,
        GetBookResponse,
        UpdateBookResponse,
        DeleteBookResponse,
        ApiErrorMessage,
    )),
    tags((name = "books", description = "Book resource"))
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn app() -> Router<ApiState> {
    Router::<ApiState>::new()
        .route(OPENAPI_PATH, get(openapi))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new(OPENAPI_PATH).path("/rapidoc"))
}
