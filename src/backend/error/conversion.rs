/**
 * Error Conversion
 *
 * Turns backend errors into the two shapes a client can observe:
 *
 * - an HTTP response (`IntoResponse`), for REST handlers
 * - an `error` server event, for failures of socket events
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Thread not found",
 *   "code": "not_found",
 *   "status": 404
 * }
 * ```
 */

use axum::{
    response::{Response, IntoResponse},
    Json,
};
use tracing::error;

use crate::backend::error::types::BackendError;
use crate::shared::ServerEvent;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_internal() {
            error!("[Server] Request failed: {}", self);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "code": self.code(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl BackendError {
    /// Render as the `error` event sent back to the requesting connection
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.code(), self.message())
    }
}
