use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;
use shared_models::wire::id_string;

// ==============================================================================
// BLOGS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Blog {
    #[serde(deserialize_with = "id_string", alias = "BlogId", alias = "blogId")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, alias = "Content", alias = "body")]
    pub content: String,
    #[serde(default, alias = "summary")]
    pub excerpt: Option<String>,
    #[serde(default, alias = "Author")]
    pub author: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "cover_image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "isPublished", alias = "published")]
    pub is_published: bool,
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Blog {
    /// Publication time, falling back to creation time for ordering.
    pub fn sort_time(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.created_at)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    /// Honoured for staff only.
    pub include_drafts: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlogRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// ==============================================================================
// GALLERY
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    #[serde(deserialize_with = "id_string", alias = "ImageId", alias = "imageId")]
    pub id: String,
    #[serde(default, alias = "Title")]
    pub title: Option<String>,
    #[serde(alias = "imageUrl", alias = "url")]
    pub image_url: String,
    #[serde(default, alias = "Category")]
    pub category: Option<String>,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "sortOrder", alias = "order")]
    pub sort_order: Option<i32>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGalleryImageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGalleryImageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl ContentError {
    pub fn from_upstream(err: anyhow::Error, what: &'static str) -> Self {
        if ApiError::is_not_found(&err) {
            ContentError::NotFound(what)
        } else {
            ContentError::Upstream(err.to_string())
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(_) => AppError::NotFound(err.to_string()),
            ContentError::Validation(msg) => AppError::ValidationError(msg),
            ContentError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}
