//! Background image upload.

use actix_web::{HttpRequest, HttpResponse, http::header, web};

use quill_core::ports::MediaFile;
use quill_shared::ApiResponse;
use quill_shared::dto::MediaUploadResponse;

use crate::middleware::auth::Actor;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Optional original file name, used only for its extension.
const FILE_NAME_HEADER: &str = "x-file-name";

/// POST /api/media
///
/// The raw request body is the file; `Content-Type` must be an image type.
pub async fn upload(
    state: web::Data<AppState>,
    actor: Actor,
    req: HttpRequest,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = req
        .headers()
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let file = MediaFile {
        file_name,
        content_type,
        bytes: body.to_vec(),
    };
    let url = state.media.upload(actor.0.id, file).await?;

    tracing::info!(owner_id = %actor.0.id, url = %url, "Media uploaded");
    Ok(HttpResponse::Created().json(ApiResponse::ok(MediaUploadResponse { url })))
}
