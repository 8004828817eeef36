use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use log::{error, info, warn};

use crate::error::{AppError, Result};
use crate::media::{MediaFile, UploadedMedia};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

fn file_missing() -> AppError {
    AppError::bad_request("File missing".into())
}

fn upload_failed() -> AppError {
    AppError::internal_server_error("Upload failed".into())
}

// POST /upload
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadedMedia>> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload request is not a multipart form: {}", e);
        file_missing()
    })?;

    let mut file: Option<MediaFile> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read multipart form: {}", e);
                return Err(upload_failed());
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let data = field.bytes().await.map_err(|e| {
            error!("Failed to read uploaded file: {}", e);
            upload_failed()
        })?;
        file = Some(MediaFile {
            file_name,
            content_type,
            data: data.to_vec(),
        });
        break;
    }

    let file = file.ok_or_else(|| {
        warn!("Upload request without a '{}' field", FILE_FIELD);
        file_missing()
    })?;

    let size = file.data.len();
    let uploaded = state.media.upload(file).await.map_err(|e| {
        error!("Upload error: {}", e);
        upload_failed()
    })?;

    info!("Uploaded {} bytes as {}", size, uploaded.public_id);
    Ok(Json(uploaded))
}
