#![allow(non_snake_case)]

use axum::body::HttpBody;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, RequestParts};
use axum::http::header::LOCATION;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{async_trait, BoxError, Json};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::events::Route;

pub async fn handler404(path: Uri) -> (StatusCode, Json<Error>) {
    (
        StatusCode::NOT_FOUND,
        Json(Error::NotFound {
            message: format!("Invalid path: {}", path),
        }),
    )
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Maybe<T> {
    Nothing(Error),
    Fine(Success<T>),
}

pub fn Fine<V>(v: V) -> Maybe<V>
where
    V: Serialize,
{
    Maybe::Fine(Success::of(v))
}

pub fn Nothing<V>(err: Error) -> Maybe<V> {
    Maybe::Nothing(err)
}

#[derive(Debug, Clone, Serialize)]
pub struct Success<V> {
    success: bool,
    #[serde(flatten)]
    value: V,
}

impl<T> IntoResponse for Maybe<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match self {
            Maybe::Nothing(err) => err.into_response(),
            Maybe::Fine(success) => Json::into_response(Json(success)),
        }
    }
}

impl<V: Serialize> Success<V> {
    pub fn of(value: V) -> Self {
        Self {
            success: true,
            value,
        }
    }
}

/// Every failure the service reports. User-recoverable conditions
/// (`InvalidCredentials`, `UnsupportedFileType`, `EmptyQuery`, `NoFileAvailable`)
/// never leave state half-mutated.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(tag = "error")]
pub enum Error {
    #[error("{message}")]
    InvalidCredentials { message: String },
    #[error("{message}")]
    UnsupportedFileType { mime_type: String, message: String },
    #[error("{message}")]
    EmptyQuery { message: String },
    #[error("{message}")]
    NoFileAvailable { certificate_id: Uuid, message: String },
    #[error("{message}")]
    CertificateNotFound { certificate_id: Uuid, message: String },
    #[error("{message}")]
    Redirect { location: Route, message: String },
    #[error("{message}")]
    NoSessionContext { message: String },
    #[error("{message}")]
    InvalidPayload { message: String },
    #[error("{message}")]
    NotFound { message: String },
    #[error("{kind}: {message}")]
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn invalid_credentials() -> Error {
        Error::InvalidCredentials {
            message: "Invalid credentials".to_string(),
        }
    }

    pub fn unsupported_file_type<S: Into<String>>(mime_type: S) -> Error {
        let mime_type = mime_type.into();
        Error::UnsupportedFileType {
            message: format!(
                "`{}` is not supported. Please upload PDF or image files only.",
                mime_type
            ),
            mime_type,
        }
    }

    pub fn empty_query() -> Error {
        Error::EmptyQuery {
            message: "Please enter a student name to search.".to_string(),
        }
    }

    pub fn no_file_available(certificate_id: Uuid) -> Error {
        Error::NoFileAvailable {
            certificate_id,
            message: format!("Certificate `{}` has no file attached", certificate_id),
        }
    }

    pub fn certificate_not_found(certificate_id: Uuid) -> Error {
        Error::CertificateNotFound {
            certificate_id,
            message: format!("Certificate `{}` does not exist!", certificate_id),
        }
    }

    pub fn redirect(location: Route) -> Error {
        Error::Redirect {
            message: format!("Redirecting to {}", location.path()),
            location,
        }
    }

    pub fn no_session_context<S: Into<String>>(msg: S) -> Error {
        Error::NoSessionContext {
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            Error::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::EmptyQuery { .. } | Error::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            Error::NoFileAvailable { .. }
            | Error::CertificateNotFound { .. }
            | Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Redirect { .. } => StatusCode::SEE_OTHER,
            Error::NoSessionContext { .. } | Error::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Error::Redirect { location, .. } = &self {
            let location = location.path().to_string();
            return (status, [(LOCATION, location)], Json(self)).into_response();
        }
        (status, Json(self)).into_response()
    }
}

/// `Json` whose rejection is reported as `InvalidPayload`.
pub struct Body<T>(pub T);

#[async_trait]
impl<T, B> FromRequest<B> for Body<T>
where
    T: DeserializeOwned + Send,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req).await?;
        Ok(Body(value))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidPayload {
            message: rejection.to_string(),
        }
    }
}

impl From<uuid::Error> for Error {
    fn from(id: uuid::Error) -> Self {
        Self::InvalidPayload {
            message: id.to_string(),
        }
    }
}

impl From<pbkdf2::password_hash::Error> for Error {
    fn from(err: pbkdf2::password_hash::Error) -> Self {
        Self::InternalError {
            kind: "PasswordHashError",
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors_are_tagged_by_kind() {
        let json = serde_json::to_value(Error::empty_query()).unwrap();
        assert_eq!(json["error"], "EmptyQuery");
        assert_eq!(json["message"], "Please enter a student name to search.");

        let json = serde_json::to_value(Error::unsupported_file_type("text/plain")).unwrap();
        assert_eq!(json["error"], "UnsupportedFileType");
        assert_eq!(json["mime_type"], "text/plain");
    }

    #[test]
    fn redirect_carries_location_header() {
        let response = Error::redirect(Route::Login).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[test]
    fn success_envelope_flattens_value() {
        #[derive(Serialize)]
        struct Value {
            id: u32,
        }
        let json = serde_json::to_value(Fine(Value { id: 7 })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["id"], 7);
    }
}
