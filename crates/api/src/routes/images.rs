//! Serves images written by the local image store.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use domain::services::image_store::is_valid_image_key;

use crate::app::AppState;
use crate::error::ApiError;

/// Every upload gets a fresh key, so a stored file never changes.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// GET /images/:key
pub async fn serve_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    if !is_valid_image_key(&key) {
        return Err(ApiError::NotFound("Image not found".to_string()));
    }

    let path = std::path::Path::new(&state.config.storage.images_dir).join(&key);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Image not found".to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, key = %key, "Failed to read image");
            return Err(ApiError::Internal(format!("Failed to read image: {}", e)));
        }
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, IMAGE_CACHE_CONTROL)
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
