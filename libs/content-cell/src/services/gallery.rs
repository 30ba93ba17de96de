use reqwest::Method;
use serde_json::Value;
use tracing::info;

use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};
use shared_utils::validation::is_http_url;

use crate::models::{
    ContentError, CreateGalleryImageRequest, GalleryImage, GalleryQuery, UpdateGalleryImageRequest,
};

pub struct GalleryService {
    api: HospitalApiClient,
}

impl GalleryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
        }
    }

    pub async fn list_images(&self, query: &GalleryQuery) -> Result<Vec<GalleryImage>, ContentError> {
        let result: Value = self.api
            .request(Method::GET, "/gallery", None, None)
            .await
            .map_err(|e| ContentError::from_upstream(e, "Gallery"))?;

        let images = unwrap_list(result)
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<GalleryImage>, _>>()
            .map_err(|e| ContentError::Upstream(format!("Malformed gallery: {}", e)))?;

        Ok(apply_gallery_filters(images, query))
    }

    pub async fn create_image(
        &self,
        request: CreateGalleryImageRequest,
        auth_token: &str,
    ) -> Result<GalleryImage, ContentError> {
        validate_url(&request.image_url)?;

        let body = serde_json::to_value(&request)
            .map_err(|e| ContentError::Upstream(e.to_string()))?;
        let result: Value = self.api
            .request(Method::POST, "/gallery", Some(auth_token), Some(body))
            .await
            .map_err(|e| ContentError::from_upstream(e, "Gallery image"))?;

        let image = parse_image(result)?;
        info!("Added gallery image {}", image.id);
        Ok(image)
    }

    pub async fn update_image(
        &self,
        image_id: &str,
        request: UpdateGalleryImageRequest,
        auth_token: &str,
    ) -> Result<GalleryImage, ContentError> {
        if let Some(ref url) = request.image_url {
            validate_url(url)?;
        }

        let path = format!("/gallery/{}", urlencoding::encode(image_id));
        let body = serde_json::to_value(&request)
            .map_err(|e| ContentError::Upstream(e.to_string()))?;
        let result: Value = self.api
            .request(Method::PUT, &path, Some(auth_token), Some(body))
            .await
            .map_err(|e| ContentError::from_upstream(e, "Gallery image"))?;

        info!("Updated gallery image {}", image_id);
        parse_image(result)
    }

    pub async fn delete_image(&self, image_id: &str, auth_token: &str) -> Result<(), ContentError> {
        let path = format!("/gallery/{}", urlencoding::encode(image_id));
        let _: Value = self.api
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| ContentError::from_upstream(e, "Gallery image"))?;

        info!("Deleted gallery image {}", image_id);
        Ok(())
    }
}

/// Category filter (case-insensitive), then `sort_order` with unordered images last,
/// then oldest first.
pub fn apply_gallery_filters(images: Vec<GalleryImage>, query: &GalleryQuery) -> Vec<GalleryImage> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let mut filtered: Vec<GalleryImage> = images
        .into_iter()
        .filter(|image| match category {
            Some(category) => image
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category)),
            None => true,
        })
        .collect();

    filtered.sort_by(|a, b| {
        (a.sort_order.is_none(), a.sort_order, a.created_at)
            .cmp(&(b.sort_order.is_none(), b.sort_order, b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    filtered
}

fn validate_url(url: &str) -> Result<(), ContentError> {
    if !is_http_url(url.trim()) {
        return Err(ContentError::Validation("image_url must be an http(s) URL".to_string()));
    }
    Ok(())
}

fn parse_image(result: Value) -> Result<GalleryImage, ContentError> {
    serde_json::from_value(unwrap_item(result))
        .map_err(|e| ContentError::Upstream(format!("Malformed gallery image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, category: &str, sort_order: Option<i32>) -> GalleryImage {
        GalleryImage {
            id: id.to_string(),
            title: None,
            image_url: format!("https://cdn.example.com/{}.jpg", id),
            category: Some(category.to_string()),
            description: None,
            sort_order,
            created_at: None,
        }
    }

    #[test]
    fn test_sort_order_then_unordered_last() {
        let images = vec![
            image("a", "wards", None),
            image("b", "wards", Some(2)),
            image("c", "wards", Some(1)),
        ];

        let sorted = apply_gallery_filters(images, &GalleryQuery::default());
        let ids: Vec<&str> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_category_filter() {
        let images = vec![image("a", "Wards", Some(1)), image("b", "events", Some(1))];
        let query = GalleryQuery {
            category: Some("wards".to_string()),
        };

        let filtered = apply_gallery_filters(images, &query);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a");
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(validate_url("ftp://cdn.example.com/x.jpg").is_err());
        assert!(validate_url("https://cdn.example.com/x.jpg").is_ok());
    }
}
