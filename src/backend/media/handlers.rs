/**
 * Media Upload Handler
 *
 * POST /api/v1/media/upload
 *
 * Accepts a multipart form with a `file` field and returns the stored URL
 * and media kind. Clients then send a message referencing that URL.
 *
 * # Example Response
 *
 * ```json
 * {
 *   "version": 1,
 *   "statusCode": 201,
 *   "data": { "url": "/media/2b1f...c9.png", "mediaType": "image" },
 *   "message": "File uploaded"
 * }
 * ```
 */

use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::media::MediaStore;
use crate::backend::middleware::auth::AuthUser;
use crate::shared::envelope::ApiResponse;
use crate::shared::messaging::MediaKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub media_type: MediaKind,
}

pub async fn upload_media(
    State(media): State<Arc<dyn MediaStore>>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> BackendResult<ApiResponse<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BackendError::invalid_argument(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| BackendError::invalid_argument(format!("Failed to read upload: {}", e)))?;

        let stored = media
            .store(file_name.as_deref(), content_type.as_deref(), data)
            .await?;
        tracing::info!("[Media] User {} uploaded {}", user.user_id, stored.url);

        return Ok(ApiResponse::created(
            UploadResponse {
                url: stored.url,
                media_type: stored.kind,
            },
            "File uploaded",
        ));
    }

    Err(BackendError::invalid_argument("Missing 'file' field in multipart form"))
}
