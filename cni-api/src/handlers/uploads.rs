use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use cni_core::CoreError;
use serde_json::{json, Value};
use uuid::Uuid;

const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;
const DOCUMENT_MAX_BYTES: usize = 10 * 1024 * 1024;

fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn document_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "text/plain" => Some("txt"),
        _ => None,
    }
}

/// Writes the payload under the media dir with a uuid filename and returns
/// the public path.
async fn store_file(state: &AppState, data: &[u8], extension: &str) -> ApiResult<String> {
    tokio::fs::create_dir_all(&state.config.media_dir)
        .await
        .map_err(CoreError::from)?;

    let filename = format!("{}.{extension}", Uuid::new_v4());
    tokio::fs::write(state.config.media_dir.join(&filename), data)
        .await
        .map_err(CoreError::from)?;

    Ok(format!("/media/{filename}"))
}

async fn handle_upload(
    state: &AppState,
    mut multipart: Multipart,
    max_bytes: usize,
    extension_for: fn(&str) -> Option<&'static str>,
    kind: &str,
) -> ApiResult<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("upload is missing a content type"))?;
        let extension = extension_for(&content_type)
            .ok_or_else(|| ApiError::bad_request(format!("unsupported {kind} type {content_type}")))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
        if data.len() > max_bytes {
            return Err(ApiError::bad_request(format!(
                "{kind} exceeds the {} MB limit",
                max_bytes / (1024 * 1024)
            )));
        }

        let url = store_file(state, &data, extension).await?;
        return Ok(Json(json!({ "url": url })));
    }

    Err(ApiError::bad_request("no 'file' field in upload"))
}

pub async fn upload_profile_image(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    handle_upload(&state, multipart, IMAGE_MAX_BYTES, image_extension, "image").await
}

pub async fn upload_document(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    handle_upload(
        &state,
        multipart,
        DOCUMENT_MAX_BYTES,
        document_extension,
        "document",
    )
    .await
}
