use std::borrow::Cow;

use axum::{
    extract::rejection::PathRejection,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::schema::Violation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
pub enum ErrorVerbosity {
    /// Server returns the message (and validation errors) with the appropriate status code.
    #[default]
    Message,
    /// Server returns the message, the error type with cleared error content and the appropriate status code.
    Type,
    /// Server returns the message, the error type with the error content and the appropriate status code.
    Full,
}

impl ErrorVerbosity {
    pub fn should_generate_error_reason(&self) -> bool {
        matches!(self, ErrorVerbosity::Full)
    }
}

pub trait ErrorVerbosityProvider {
    fn error_verbosity(&self) -> ErrorVerbosity;
}

#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    #[serde(flatten)]
    error: ApiError,
    message: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

/// Error body returned with the default [`ErrorVerbosity::Message`].
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorMessage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl From<ApiErrorResponse> for ApiErrorMessage {
    fn from(response: ApiErrorResponse) -> Self {
        ApiErrorMessage {
            message: response.message.into_owned(),
            errors: response.errors,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let headers = self.error.headers();
        let status_code = self.error.status_code();

        match self.error.verbosity() {
            ErrorVerbosity::Message => {
                (status_code, headers, Json(ApiErrorMessage::from(self))).into_response()
            }
            ErrorVerbosity::Type | ErrorVerbosity::Full => {
                (status_code, headers, Json(self)).into_response()
            }
        }
    }
}

#[derive(Debug, From, Serialize)]
#[serde(tag = "error_type", content = "error")]
/// API error
pub enum ApiError {
    /// Internal server error
    ///
    /// This error is returned when an internal server error occurs.
    InternalServerError(InternalServerError),
    /// Body error
    ///
    /// This error is returned when the body is not as expected.
    Body(BodyError),
    /// Path error
    ///
    /// This error is returned when the path is not as expected.
    Path(PathError),
    /// Method not allowed
    ///
    /// This error is returned when the method is not allowed.
    MethodNotAllowed(MethodNotAllowedError),
    /// Not found error
    ///
    /// This error is returned when no route matches the request.
    NotFound(NotFoundError),
    /// Validation error
    ///
    /// This error is returned when a payload does not satisfy the resource schema.
    Validation(ValidationError),
    /// Resource error
    ///
    /// This error is returned by a resource handler, e.g. when a book does not exist.
    Resource(ResourceError),
}

impl ApiError {
    fn verbosity(&self) -> ErrorVerbosity {
        match self {
            ApiError::InternalServerError(err) => err.verbosity,
            ApiError::Body(err) => err.verbosity,
            ApiError::Path(err) => err.verbosity,
            ApiError::MethodNotAllowed(err) => err.verbosity,
            ApiError::NotFound(err) => err.verbosity,
            ApiError::Validation(err) => err.verbosity,
            ApiError::Resource(err) => err.verbosity,
        }
    }

    fn message(&self) -> Cow<'static, str> {
        match self {
            ApiError::InternalServerError(_) => "An internal server error has occurred".into(),
            ApiError::Body(_) => "Failed to parse request body".into(),
            ApiError::Path(_) => "Failed to parse path parameters".into(),
            ApiError::MethodNotAllowed(_) => "Method not allowed".into(),
            ApiError::NotFound(_) => "The requested resource was not found".into(),
            ApiError::Validation(err) => err.message.into(),
            ApiError::Resource(err) => err.message.into(),
        }
    }

    fn errors(&self) -> Option<Vec<String>> {
        match self {
            ApiError::Validation(err) => Some(err.errors.clone()),
            _ => None,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalServerError(err) => err.status_code(),
            ApiError::Body(err) => err.status_code(),
            ApiError::Path(err) => err.status_code(),
            ApiError::MethodNotAllowed(err) => err.status_code(),
            ApiError::NotFound(err) => err.status_code(),
            ApiError::Validation(err) => err.status_code(),
            ApiError::Resource(err) => err.status_code,
        }
    }

    fn headers(&self) -> HeaderMap {
        match self {
            ApiError::Resource(err) => err.headers.clone(),
            _ => HeaderMap::new(),
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        let message = error.message();
        let errors = error.errors();

        ApiErrorResponse {
            error,
            message,
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiErrorResponse::from(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct InternalServerError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    internal_server_error: Option<String>,
}

impl InternalServerError {
    pub fn from_generic_error<E: Into<anyhow::Error>>(verbosity: ErrorVerbosity, err: E) -> Self {
        let err: anyhow::Error = err.into();
        let err = format!("{err:#}");
        tracing::error!(%err, "Internal server error");

        let internal_server_error = verbosity.should_generate_error_reason().then_some(err);

        InternalServerError {
            verbosity,
            internal_server_error,
        }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[derive(Debug, Serialize)]
pub struct BodyError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    body_error_reason: Option<String>,
    body_expected_schema: Option<String>,
}

impl BodyError {
    pub fn new(
        verbosity: ErrorVerbosity,
        body_error_reason: String,
        body_expected_schema: String,
    ) -> Self {
        let (body_error_reason, body_expected_schema) =
            match verbosity.should_generate_error_reason() {
                true => (Some(body_error_reason), Some(body_expected_schema)),
                false => (None, None),
            };

        BodyError {
            verbosity,
            body_error_reason,
            body_expected_schema,
        }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

#[derive(Debug, Serialize)]
pub struct PathError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    path_error_reason: Option<String>,
}

impl PathError {
    pub fn new(verbosity: ErrorVerbosity, path_error_reason: String) -> Self {
        let path_error_reason = verbosity
            .should_generate_error_reason()
            .then_some(path_error_reason);

        PathError {
            verbosity,
            path_error_reason,
        }
    }

    pub fn from_path_rejection(verbosity: ErrorVerbosity, rejection: PathRejection) -> Self {
        Self::new(verbosity, rejection.body_text())
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

#[derive(Debug, Serialize)]
pub struct MethodNotAllowedError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl MethodNotAllowedError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        MethodNotAllowedError { verbosity }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::METHOD_NOT_ALLOWED
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl NotFoundError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        NotFoundError { verbosity }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip)]
    message: &'static str,
    #[serde(skip)]
    errors: Vec<String>,
}

impl ValidationError {
    pub fn from_violations(
        verbosity: ErrorVerbosity,
        message: &'static str,
        violations: &[Violation],
    ) -> Self {
        ValidationError {
            verbosity,
            message,
            errors: violations.iter().map(ToString::to_string).collect(),
        }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Implemented by the error types of a single resource.
///
/// Serializing the implementor yields the `error` content for [`ErrorVerbosity::Type`] and above.
pub trait ResourceErrorProvider: Serialize {
    fn headers(&self) -> Option<HeaderMap>;

    fn status_code(&self) -> StatusCode;

    fn message(&self) -> &'static str;

    /// Detailed reason, only rendered with [`ErrorVerbosity::Full`].
    fn reason(&self) -> String;
}

#[derive(Debug, Serialize)]
pub struct ResourceError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip)]
    status_code: StatusCode,
    #[serde(skip)]
    headers: HeaderMap,
    #[serde(skip)]
    message: &'static str,
    resource_error_type: serde_json::Value,
    resource_error_reason: Option<String>,
}

impl ResourceError {
    pub fn new<T: ResourceErrorProvider>(verbosity: ErrorVerbosity, error_type: T) -> Self {
        let resource_error_reason = verbosity
            .should_generate_error_reason()
            .then(|| error_type.reason());

        ResourceError {
            verbosity,
            status_code: error_type.status_code(),
            headers: error_type.headers().unwrap_or_default(),
            message: error_type.message(),
            resource_error_type: serde_json::to_value(&error_type).unwrap_or_default(),
            resource_error_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[derive(Serialize)]
    #[serde(tag = "type")]
    enum WidgetError {
        Missing {
            #[serde(skip)]
            id: u32,
        },
    }

    impl ResourceErrorProvider for WidgetError {
        fn headers(&self) -> Option<HeaderMap> {
            None
        }

        fn status_code(&self) -> StatusCode {
            StatusCode::NOT_FOUND
        }

        fn message(&self) -> &'static str {
            "Widget not found"
        }

        fn reason(&self) -> String {
            match self {
                WidgetError::Missing { id } => format!("Widget {id} not found"),
            }
        }
    }

    async fn render(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let body = match bytes.is_empty() {
            true => serde_json::Value::Null,
            false => serde_json::from_slice(&bytes).unwrap(),
        };

        (status, body)
    }

    #[tokio::test]
    async fn message_verbosity_renders_only_the_message() {
        let error = ResourceError::new(ErrorVerbosity::Message, WidgetError::Missing { id: 7 });

        let (status, body) = render(error.into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "message": "Widget not found" }));
    }

    #[tokio::test]
    async fn full_verbosity_renders_the_reason() {
        let error = ResourceError::new(ErrorVerbosity::Full, WidgetError::Missing { id: 7 });

        let (_, body) = render(error.into()).await;

        assert_eq!(body["error_type"], "Resource");
        assert_eq!(body["error"]["resource_error_type"]["type"], "Missing");
        assert_eq!(body["error"]["resource_error_reason"], "Widget 7 not found");
    }

    #[tokio::test]
    async fn type_verbosity_clears_the_reason() {
        let error = ResourceError::new(ErrorVerbosity::Type, WidgetError::Missing { id: 7 });

        let (_, body) = render(error.into()).await;

        assert_eq!(body["error"]["resource_error_reason"], serde_json::Value::Null);
        assert_eq!(body["message"], "Widget not found");
    }

    #[tokio::test]
    async fn validation_errors_are_listed() {
        let violations = [
            Violation::Missing { field: "isbn" },
            Violation::Missing { field: "title" },
        ];
        let error =
            ValidationError::from_violations(ErrorVerbosity::Message, "Invalid book", &violations);

        let (status, body) = render(error.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid book");
        assert_eq!(
            body["errors"],
            serde_json::json!(["\"isbn\" is required", "\"title\" is required"])
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause_below_full() {
        let error = InternalServerError::from_generic_error(
            ErrorVerbosity::Type,
            anyhow::anyhow!("connection refused"),
        );

        let (status, body) = render(error.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["internal_server_error"], serde_json::Value::Null);
    }
}
