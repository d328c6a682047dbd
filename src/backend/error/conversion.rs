/**
 * Error Conversion
 *
 * This module provides conversion implementations for backend errors:
 * database errors into the taxonomy, and errors and envelopes into HTTP
 * responses.
 *
 * # Response Format
 *
 * Error responses use the shared error envelope:
 * ```json
 * {
 *   "version": 1,
 *   "statusCode": 404,
 *   "message": "Chat not found"
 * }
 * ```
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::backend::error::types::BackendError;
use crate::shared::envelope::{ApiResponse, ErrorBody};

impl From<sqlx::Error> for BackendError {
    /// Unique violations become `Conflict`, missing rows `NotFound`
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return BackendError::not_found("Record not found");
        }
        if matches!(&err, sqlx::Error::Database(db_err) if db_err.is_unique_violation()) {
            return BackendError::conflict("Record already exists");
        }
        BackendError::Database(err)
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_internal() {
            tracing::error!("[Error] {} ({})", self.message(), status);
        } else {
            tracing::debug!("[Error] {} ({})", self.message(), status);
        }

        let body = ErrorBody::new(status.as_u16(), self.public_message());
        (status, Json(body)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
