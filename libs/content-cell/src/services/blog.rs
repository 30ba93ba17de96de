use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};
use shared_utils::validation::{contains_ignore_case, is_http_url, require_non_empty};

use crate::models::{Blog, BlogQuery, ContentError, CreateBlogRequest, UpdateBlogRequest};

pub struct BlogService {
    api: HospitalApiClient,
}

impl BlogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
        }
    }

    /// Published posts, newest first. Drafts are included only when `include_drafts` is set.
    pub async fn list_blogs(&self, query: &BlogQuery, include_drafts: bool) -> Result<Vec<Blog>, ContentError> {
        let result: Value = self.api
            .request(Method::GET, "/blogs", None, None)
            .await
            .map_err(|e| ContentError::from_upstream(e, "Blog"))?;

        let blogs = unwrap_list(result)
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Blog>, _>>()
            .map_err(|e| ContentError::Upstream(format!("Malformed blog list: {}", e)))?;

        Ok(apply_blog_filters(blogs, query, include_drafts))
    }

    /// Looks a post up by id, then by slug. Drafts stay hidden unless `include_drafts`.
    pub async fn get_blog(&self, slug_or_id: &str, include_drafts: bool) -> Result<Blog, ContentError> {
        let path = format!("/blogs/{}", urlencoding::encode(slug_or_id));
        let blog = match self.api.request::<Value>(Method::GET, &path, None, None).await {
            Ok(result) => parse_blog(result)?,
            Err(e) => match ContentError::from_upstream(e, "Blog") {
                ContentError::NotFound(_) => {
                    debug!("No blog with id {}, trying slug", slug_or_id);
                    self.list_blogs(&BlogQuery::default(), true)
                        .await?
                        .into_iter()
                        .find(|b| b.slug == slug_or_id)
                        .ok_or(ContentError::NotFound("Blog"))?
                }
                other => return Err(other),
            },
        };

        if !blog.is_published && !include_drafts {
            return Err(ContentError::NotFound("Blog"));
        }
        Ok(blog)
    }

    pub async fn create_blog(
        &self,
        mut request: CreateBlogRequest,
        auth_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Blog, ContentError> {
        require_non_empty("title", &request.title).map_err(ContentError::Validation)?;
        require_non_empty("content", &request.content).map_err(ContentError::Validation)?;
        validate_image_url(request.image_url.as_deref())?;

        request.title = request.title.trim().to_string();
        let slug = slugify(request.slug.as_deref().unwrap_or(&request.title));
        if slug.is_empty() {
            return Err(ContentError::Validation("slug must contain letters or digits".to_string()));
        }
        request.slug = Some(slug);
        if request.is_published && request.published_at.is_none() {
            request.published_at = Some(now);
        }

        let body = serde_json::to_value(&request)
            .map_err(|e| ContentError::Upstream(e.to_string()))?;
        let result: Value = self.api
            .request(Method::POST, "/blogs", Some(auth_token), Some(body))
            .await
            .map_err(|e| ContentError::from_upstream(e, "Blog"))?;

        let blog = parse_blog(result)?;
        info!("Created blog {} ({})", blog.id, blog.slug);
        Ok(blog)
    }

    /// Partial update. The slug stays put when only the title changes, so links keep working.
    pub async fn update_blog(
        &self,
        blog_id: &str,
        mut request: UpdateBlogRequest,
        auth_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Blog, ContentError> {
        if let Some(ref title) = request.title {
            require_non_empty("title", title).map_err(ContentError::Validation)?;
        }
        if let Some(ref content) = request.content {
            require_non_empty("content", content).map_err(ContentError::Validation)?;
        }
        validate_image_url(request.image_url.as_deref())?;

        if let Some(slug) = request.slug.take() {
            let slug = slugify(&slug);
            if slug.is_empty() {
                return Err(ContentError::Validation("slug must contain letters or digits".to_string()));
            }
            request.slug = Some(slug);
        }
        if request.is_published == Some(true) && request.published_at.is_none() {
            request.published_at = Some(now);
        }

        let path = format!("/blogs/{}", urlencoding::encode(blog_id));
        let body = serde_json::to_value(&request)
            .map_err(|e| ContentError::Upstream(e.to_string()))?;
        let result: Value = self.api
            .request(Method::PUT, &path, Some(auth_token), Some(body))
            .await
            .map_err(|e| ContentError::from_upstream(e, "Blog"))?;

        info!("Updated blog {}", blog_id);
        parse_blog(result)
    }

    pub async fn delete_blog(&self, blog_id: &str, auth_token: &str) -> Result<(), ContentError> {
        let path = format!("/blogs/{}", urlencoding::encode(blog_id));
        let _: Value = self.api
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| ContentError::from_upstream(e, "Blog"))?;

        info!("Deleted blog {}", blog_id);
        Ok(())
    }
}

/// Lowercase ASCII letters and digits joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Publish state, title search and tag filters, newest first.
pub fn apply_blog_filters(blogs: Vec<Blog>, query: &BlogQuery, include_drafts: bool) -> Vec<Blog> {
    let search = query.search.as_deref().unwrap_or("");
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let mut filtered: Vec<Blog> = blogs
        .into_iter()
        .filter(|b| include_drafts || b.is_published)
        .filter(|b| contains_ignore_case(&b.title, search))
        .filter(|b| match tag {
            Some(tag) => b.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            None => true,
        })
        .collect();

    filtered.sort_by_key(|b| (Reverse(b.sort_time()), b.id.clone()));
    filtered
}

fn validate_image_url(url: Option<&str>) -> Result<(), ContentError> {
    match url {
        Some(url) if !is_http_url(url) => Err(ContentError::Validation(
            "image_url must be an http(s) URL".to_string(),
        )),
        _ => Ok(()),
    }
}

fn parse_blog(result: Value) -> Result<Blog, ContentError> {
    let item = unwrap_item(result);
    if item.is_null() || item == json!({}) {
        return Err(ContentError::NotFound("Blog"));
    }
    serde_json::from_value(item).map_err(|e| ContentError::Upstream(format!("Malformed blog: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn blog(id: &str, title: &str, published: bool, day: u32) -> Blog {
        Blog {
            id: id.to_string(),
            title: title.to_string(),
            slug: slugify(title),
            content: "text".to_string(),
            excerpt: None,
            author: None,
            image_url: None,
            tags: vec!["Heart".to_string()],
            is_published: published,
            published_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).single(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Caring for Your Heart!"), "caring-for-your-heart");
        assert_eq!(slugify("  --Knee  pain: 5 tips-- "), "knee-pain-5-tips");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_filters_hide_drafts_and_sort_newest_first() {
        let blogs = vec![
            blog("1", "Older post", true, 1),
            blog("2", "Draft post", false, 9),
            blog("3", "Newer post", true, 5),
        ];

        let public = apply_blog_filters(blogs.clone(), &BlogQuery::default(), false);
        let ids: Vec<&str> = public.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);

        let staff = apply_blog_filters(blogs, &BlogQuery::default(), true);
        assert_eq!(staff[0].id, "2");
    }

    #[test]
    fn test_tag_filter_ignores_case() {
        let query = BlogQuery {
            tag: Some("heart".to_string()),
            ..BlogQuery::default()
        };
        assert_eq!(apply_blog_filters(vec![blog("1", "A", true, 1)], &query, false).len(), 1);

        let query = BlogQuery {
            tag: Some("knee".to_string()),
            ..BlogQuery::default()
        };
        assert!(apply_blog_filters(vec![blog("1", "A", true, 1)], &query, false).is_empty());
    }
}
