use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    BlogQuery, CreateBlogRequest, CreateGalleryImageRequest, GalleryQuery, UpdateBlogRequest,
    UpdateGalleryImageRequest,
};
use crate::services::{BlogService, GalleryService};

// ==============================================================================
// BLOG HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_blogs(
    State(state): State<Arc<AppConfig>>,
    staff: Option<Extension<User>>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Value>, AppError> {
    let include_drafts = staff.is_some() && query.include_drafts.unwrap_or(false);

    let service = BlogService::new(&state);
    let blogs = service.list_blogs(&query, include_drafts).await?;

    Ok(Json(json!({
        "blogs": blogs,
        "total": blogs.len()
    })))
}

#[axum::debug_handler]
pub async fn get_blog(
    State(state): State<Arc<AppConfig>>,
    staff: Option<Extension<User>>,
    Path(slug_or_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&state);
    let blog = service.get_blog(&slug_or_id, staff.is_some()).await?;
    Ok(Json(json!(blog)))
}

#[axum::debug_handler]
pub async fn create_blog(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBlogRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} creating blog {:?}", user.id, request.title);

    let service = BlogService::new(&state);
    let blog = service.create_blog(request, auth.token(), Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "blog": blog
    })))
}

#[axum::debug_handler]
pub async fn update_blog(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(blog_id): Path<String>,
    Json(request): Json<UpdateBlogRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} updating blog {}", user.id, blog_id);

    let service = BlogService::new(&state);
    let blog = service.update_blog(&blog_id, request, auth.token(), Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "blog": blog
    })))
}

#[axum::debug_handler]
pub async fn delete_blog(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(blog_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("User {} deleting blog {}", user.id, blog_id);

    let service = BlogService::new(&state);
    service.delete_blog(&blog_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "blog_id": blog_id
    })))
}

// ==============================================================================
// GALLERY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_gallery(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Value>, AppError> {
    let service = GalleryService::new(&state);
    let images = service.list_images(&query).await?;

    Ok(Json(json!({
        "images": images,
        "total": images.len()
    })))
}

#[axum::debug_handler]
pub async fn create_gallery_image(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateGalleryImageRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} adding gallery image", user.id);

    let service = GalleryService::new(&state);
    let image = service.create_image(request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "image": image
    })))
}

#[axum::debug_handler]
pub async fn update_gallery_image(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(image_id): Path<String>,
    Json(request): Json<UpdateGalleryImageRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} updating gallery image {}", user.id, image_id);

    let service = GalleryService::new(&state);
    let image = service.update_image(&image_id, request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "image": image
    })))
}

#[axum::debug_handler]
pub async fn delete_gallery_image(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(image_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("User {} deleting gallery image {}", user.id, image_id);

    let service = GalleryService::new(&state);
    service.delete_image(&image_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "image_id": image_id
    })))
}
