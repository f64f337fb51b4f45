use crate::api::models::images::{ImageUrlResponse, PolaroidListResponse, TestimonialListResponse};
use crate::config::StorageConfig;
use crate::db::handlers::Images;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use url::Url;

#[utoipa::path(
    get,
    path = "/api/images/polaroids",
    tag = "images",
    summary = "List polaroids",
    description = "Gallery polaroids, newest first",
    responses(
        (status = 200, description = "Polaroid images", body = PolaroidListResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_polaroids(State(state): State<AppState>) -> Result<Json<PolaroidListResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let images = Images::new(&mut conn).list_polaroids().await?;

    Ok(Json(images.into()))
}

#[utoipa::path(
    get,
    path = "/api/images/testimonials",
    tag = "images",
    summary = "List testimonial images",
    responses(
        (status = 200, description = "Testimonial images in display order", body = TestimonialListResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_testimonials(State(state): State<AppState>) -> Result<Json<TestimonialListResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let images = Images::new(&mut conn).list_testimonials().await?;

    Ok(Json(images.into()))
}

/// Public URL of an object in one of the allowed storage buckets.
pub fn public_object_url(storage: &StorageConfig, bucket: &str, filename: &str) -> Result<String> {
    if !storage.allowed_buckets.iter().any(|allowed| allowed == bucket) {
        return Err(Error::BadRequest {
            message: "Invalid bucket specified".to_string(),
        });
    }

    if filename.is_empty() || filename.contains('/') || filename.contains('\\') || filename == "." || filename == ".." {
        return Err(Error::BadRequest {
            message: "Invalid filename specified".to_string(),
        });
    }

    let mut url = Url::parse(&storage.public_base_url).map_err(|e| Error::Internal {
        operation: format!("parse storage base URL: {e}"),
    })?;

    url.path_segments_mut()
        .map_err(|_| Error::Internal {
            operation: "build storage URL from a non-hierarchical base".to_string(),
        })?
        .pop_if_empty()
        .push(bucket)
        .push(filename);

    Ok(url.into())
}

#[utoipa::path(
    get,
    path = "/api/images/{bucket}/{filename}",
    tag = "images",
    summary = "Get image URL",
    params(
        ("bucket" = String, Path, description = "Storage bucket"),
        ("filename" = String, Path, description = "Object name within the bucket")
    ),
    responses(
        (status = 200, description = "Public URL of the image", body = ImageUrlResponse),
        (status = 400, description = "Bucket not allowed or invalid filename")
    )
)]
#[tracing::instrument(skip_all, fields(bucket = %bucket))]
pub async fn get_image_url(
    State(state): State<AppState>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<Json<ImageUrlResponse>> {
    let url = public_object_url(&state.config.storage, &bucket, &filename)?;

    Ok(Json(ImageUrlResponse { success: true, url }))
}
