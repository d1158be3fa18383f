use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use futures_util::StreamExt;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    app_state::AppState,
    errors::AppError,
    services::images::{allowed_extension, mime_for_extension, to_data_url},
};

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    /// `data:` URL holding the image.
    pub image_path: String,
}

/// Multipart form with a single `image` file field.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image encoded as data URL", body = UploadResponse),
        (status = 400, description = "Missing, oversized or non-image file")
    )
)]
#[post("")]
pub async fn upload_image(
    app_state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let max_bytes = app_state.config.effective_max_upload_bytes();

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::InvalidInput(format!("Invalid upload: {}", e)))?;

        let is_image_field = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .is_some_and(|name| name == IMAGE_FIELD);
        if !is_image_field {
            // Drain fields we do not care about.
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::InvalidInput(format!("Invalid upload: {}", e)))?;
            }
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        if filename.is_empty() {
            return Err(AppError::InvalidInput("No image file provided".to_string()));
        }
        let extension = allowed_extension(&filename)
            .ok_or_else(|| AppError::InvalidInput("Only image files are allowed".to_string()))?;
        let mime = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .filter(|mime| mime.starts_with("image/"))
            .unwrap_or_else(|| mime_for_extension(&extension).to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::InvalidInput(format!("Invalid upload: {}", e)))?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::InvalidInput(format!(
                    "Image must be at most {} bytes",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(AppError::InvalidInput("No image file provided".to_string()));
        }

        log::info!("encoded upload {} ({} bytes, {})", filename, bytes.len(), mime);
        return Ok(HttpResponse::Ok().json(UploadResponse {
            success: true,
            image_path: to_data_url(&mime, &bytes),
        }));
    }

    Err(AppError::InvalidInput("No image file provided".to_string()))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/upload").service(upload_image));
}
