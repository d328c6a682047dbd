/**
 * Response Envelope
 *
 * Every HTTP response body is wrapped in a fixed envelope:
 *
 * ```json
 * { "version": 1, "statusCode": 200, "data": { ... }, "message": "...", "code": 2005 }
 * ```
 *
 * Errors carry the same header without `data`:
 *
 * ```json
 * { "version": 1, "statusCode": 403, "message": "..." }
 * ```
 *
 * The payload type is fixed per endpoint through the type parameter, so
 * clients can deserialize `ApiResponse<Message>`, `ApiResponse<Vec<ChatCard>>`
 * and so on.
 */
use serde::{Deserialize, Serialize};

/// Current envelope version
pub const ENVELOPE_VERSION: u16 = 1;

/// Application codes attached to some successful responses
pub mod codes {
    pub const USER_REGISTERED: u32 = 1002;
    pub const USER_LOGGED_IN: u32 = 2005;
    pub const USERS_SEARCHED: u32 = 6001;
    pub const USER_FETCHED: u32 = 9000;
}

fn envelope_version() -> u16 {
    ENVELOPE_VERSION
}

/// Successful response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default = "envelope_version")]
    pub version: u16,
    pub status_code: u16,
    pub data: T,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            status_code,
            data,
            message: message.into(),
            code: None,
        }
    }

    /// 200 OK
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(200, data, message)
    }

    /// 201 Created
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(201, data, message)
    }

    /// Attach an application code
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }
}

/// Error response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default = "envelope_version")]
    pub version: u16,
    pub status_code: u16,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            status_code,
            message: message.into(),
        }
    }
}
