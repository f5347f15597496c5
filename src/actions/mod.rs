//! Mutation entry points.
//!
//! Every action follows the same sequence: resolve the caller, validate the
//! submitted form, call the owning service with the caller's id, fire page
//! revalidation on success. Failures of every kind come back as an
//! [`ActionError`], so clients only branch on "is there an `error`?".

use axum::{
    extract::{rejection::FormRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use validator::ValidationErrors;

use crate::{middleware::auth_guard::AuthUser, services::ServiceError};

pub mod goals;
pub mod preferences;
pub mod regions;
pub mod tasks;
pub mod users;
pub mod validation;
pub mod weekly_tasks;

pub use validation::FieldError;

pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthorized,
    ValidationError,
    NotFound,
    DatabaseError,
    UnknownError,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized    => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound        => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError
            | ErrorCode::UnknownError  => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionError {
    pub error: String,
    pub code:  ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<FieldError>>,
}

impl ActionError {
    pub fn unauthorized() -> Self {
        Self { error: "Unauthorized".into(), code: ErrorCode::Unauthorized, validation_errors: None }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            error: "Validation failed".into(),
            code: ErrorCode::ValidationError,
            validation_errors: Some(errors),
        }
    }

    /// Missing and not-owned are reported identically.
    pub fn not_found(entity: &str) -> Self {
        Self {
            error: format!("{entity} not found or unauthorized"),
            code: ErrorCode::NotFound,
            validation_errors: None,
        }
    }

    /// Log the underlying failure and hand back a generic message.
    pub fn service(operation: &str, err: ServiceError) -> Self {
        match err {
            ServiceError::Database(err) => {
                tracing::error!(operation, error = %err, "Database error in action");
                Self {
                    error: format!("Failed to {operation}"),
                    code: ErrorCode::DatabaseError,
                    validation_errors: None,
                }
            }
            ServiceError::Invariant(reason) => {
                tracing::error!(operation, %reason, "Unexpected error in action");
                Self {
                    error: "An unexpected error occurred".into(),
                    code: ErrorCode::UnknownError,
                    validation_errors: None,
                }
            }
        }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ActionError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(validation::field_errors(&errors))
    }
}

/// The acting user, or `UNAUTHORIZED` before anything else runs.
pub fn authenticate(session: Option<&AuthUser>) -> ActionResult<&AuthUser> {
    session.ok_or_else(ActionError::unauthorized)
}

/// Form body of an action request.
///
/// A body that cannot be decoded (wrong content type, malformed encoding)
/// still answers with an [`ActionError`]: `UNAUTHORIZED` when there is no
/// session, `VALIDATION_ERROR` naming the `form` field otherwise.
pub struct ActionForm<T>(pub T);

impl<S, T> FromRequest<S> for ActionForm<T>
where
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = ActionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let has_session = req.extensions().get::<AuthUser>().is_some();

        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(_) if !has_session => Err(ActionError::unauthorized()),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Undecodable action form");
                Err(ActionError::validation(vec![FieldError {
                    field:   "form".into(),
                    message: rejection.body_text(),
                }]))
            }
        }
    }
}

/// Payload for successful deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub const YES: Deleted = Deleted { deleted: true };
}

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    data:    T,
}

/// HTTP form of an action outcome: `{ success, data }` or the error body.
pub struct Envelope<T>(pub ActionResult<T>);

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match self.0 {
            Ok(data) => (StatusCode::OK, Json(Success { success: true, data })).into_response(),
            Err(err) => err.into_response(),
        }
    }
}
