use tracing::debug;

use super::{ApiClient, GatewayError, Request};
use crate::models::{Blog, BlogFilter, BlogStatus, BlogUpdate, NewBlog, ResourceId};

const POSTS_PATH: &str = "/posts";

/// Blog post operations against `/posts`.
#[derive(Clone)]
pub struct BlogGateway {
    client: ApiClient,
}

impl BlogGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Build the list request; each filter is its own optional query parameter.
    pub fn list_request(filter: &BlogFilter) -> Request {
        Request::get(POSTS_PATH)
            .query_opt("title_like", filter.search.as_deref())
            .query_opt("tags_like", filter.tag.as_deref())
            .query_opt("status", filter.status.as_ref().map(BlogStatus::as_str))
            .query_opt("categoryId", filter.category_id.as_deref())
    }

    pub async fn list(&self, filter: &BlogFilter) -> Result<Vec<Blog>, GatewayError> {
        let blogs: Vec<Blog> = self
            .client
            .send_json(Self::list_request(filter))
            .await
            .map_err(|e| GatewayError::new("Failed to fetch blogs", e))?;
        debug!(count = blogs.len(), "Fetched blogs");
        Ok(blogs)
    }

    pub async fn create(&self, blog: &NewBlog) -> Result<Blog, GatewayError> {
        const CONTEXT: &str = "Failed to create blog";
        let request = Request::post(POSTS_PATH)
            .json(blog)
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    pub async fn update(&self, update: &BlogUpdate) -> Result<Blog, GatewayError> {
        const CONTEXT: &str = "Failed to update blog";
        let request = Request::patch(item_path(&update.id))
            .json(update)
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    /// Publish or unpublish a post.
    pub async fn change_status(&self, id: &ResourceId, status: BlogStatus) -> Result<Blog, GatewayError> {
        const CONTEXT: &str = "Failed to change blog status";
        let request = Request::patch(item_path(id))
            .json(&serde_json::json!({ "status": status }))
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    pub async fn delete(&self, id: &ResourceId) -> Result<(), GatewayError> {
        self.client
            .send_unit(Request::delete(item_path(id)))
            .await
            .map_err(|e| GatewayError::new("Failed to delete blog", e))
    }
}

fn item_path(id: &ResourceId) -> String {
    format!("{}/{}", POSTS_PATH, id)
}
