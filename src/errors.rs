use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::errors::{DomainError, Rejection};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.message)]
    Validation(Rejection),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(rejection) => AppError::Validation(rejection),
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Store(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(rejection) => {
                let mut body = rejection.details.clone();
                body.insert("error".to_string(), Value::String(rejection.message.clone()));
                Value::Object(body)
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) => json!({ "error": msg }),
            AppError::Internal(detail) => {
                log::error!("request failed: {detail}");
                json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    async fn body_of(err: AppError) -> Value {
        let bytes = to_bytes(err.error_response().into_body())
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (AppError::Validation(Rejection::new("bad")), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".into()), StatusCode::CONFLICT),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.error_response().status(), status);
        }
    }

    #[actix_web::test]
    async fn validation_body_echoes_details() {
        let rejection =
            Rejection::new("Invalid page size").with("pageSize", serde_json::json!(500));
        let body = body_of(AppError::Validation(rejection)).await;
        assert_eq!(body["error"], "Invalid page size");
        assert_eq!(body["pageSize"], 500);
    }

    #[actix_web::test]
    async fn internal_error_hides_detail() {
        let body = body_of(AppError::Internal("connection refused".into())).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[test]
    fn domain_errors_map_to_app_errors() {
        let app_err: AppError = DomainError::not_found("Customer not found").into();
        assert!(matches!(app_err, AppError::NotFound(ref m) if m == "Customer not found"));

        let app_err: AppError = DomainError::conflict("Slug already in use").into();
        assert!(matches!(app_err, AppError::Conflict(_)));

        let app_err: AppError = DomainError::Store("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }
}
