use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_core::errors::Error as CoreError;
use bookshelf_core::fx::FxError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) if e.is_storage() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(CoreError::Fx(FxError::MissingRate(_) | FxError::InvalidRate(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Core(
                CoreError::Fx(FxError::InvalidCurrencyCode(_))
                | CoreError::UnsupportedCurrency(_)
                | CoreError::Validation(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::errors::DatabaseError;

    #[test]
    fn test_status_mapping() {
        let missing: ApiError = CoreError::from(FxError::MissingRate("JPY".into())).into();
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let overflow: ApiError = CoreError::from(FxError::InvalidRate("overflow".into())).into();
        assert_eq!(overflow.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let invalid: ApiError = CoreError::from(FxError::InvalidCurrencyCode("X".into())).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let unsupported: ApiError = CoreError::UnsupportedCurrency("JPY".into()).into();
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);

        let storage: ApiError =
            CoreError::from(DatabaseError::QueryFailed("locked".into())).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let persistence: ApiError = CoreError::from(FxError::Persistence("disk".into())).into();
        assert_eq!(persistence.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
