use crate::server::{Result, ServerError, ServerRouter, auth::SessionUser, json::Json};
use axum::{body::Bytes, extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use chronik_common::model::post::ImageRef;
use chronik_core::blob::BlobStore;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(upload_image)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/images", rejection(ServerError))]
struct UploadImagePath();

/// Two-step image flow: upload first, then put the returned reference
/// on the post form.
async fn upload_image(
    UploadImagePath(): UploadImagePath,
    State(blobs): State<Arc<dyn BlobStore>>,
    _user: SessionUser,
    body: Bytes,
) -> Result<(StatusCode, Json<ImageRef>)> {
    let reference = blobs.put(body.to_vec()).await?;

    Ok((StatusCode::CREATED, Json(reference)))
}
