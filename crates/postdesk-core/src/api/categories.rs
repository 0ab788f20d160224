use super::{ApiClient, GatewayError, Request};
use crate::models::{Category, CategoryUpdate, NewCategory, ResourceId};

const CATEGORIES_PATH: &str = "/categories";

/// Category operations against `/categories`.
#[derive(Clone)]
pub struct CategoryGateway {
    client: ApiClient,
}

impl CategoryGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Category>, GatewayError> {
        self.client
            .send_json(Request::get(CATEGORIES_PATH))
            .await
            .map_err(|e| GatewayError::new("Failed to fetch categories", e))
    }

    pub async fn create(&self, category: &NewCategory) -> Result<Category, GatewayError> {
        const CONTEXT: &str = "Failed to create category";
        let request = Request::post(CATEGORIES_PATH)
            .json(category)
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    /// Categories are replaced wholesale, so updates go out as `PUT`.
    pub async fn update(&self, update: &CategoryUpdate) -> Result<Category, GatewayError> {
        const CONTEXT: &str = "Failed to update category";
        let request = Request::put(format!("{}/{}", CATEGORIES_PATH, update.id))
            .json(update)
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    pub async fn delete(&self, id: &ResourceId) -> Result<(), GatewayError> {
        self.client
            .send_unit(Request::delete(format!("{}/{}", CATEGORIES_PATH, id)))
            .await
            .map_err(|e| GatewayError::new("Failed to delete category", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use httpmock::MockServer;

    use crate::api::ErrorKind;
    use crate::auth::{MockAuthority, SessionStore};

    fn gateway(server: &MockServer) -> CategoryGateway {
        let session = Arc::new(SessionStore::in_memory(Arc::new(MockAuthority::new())));
        let client = ApiClient::new(&server.base_url(), Duration::from_secs(5), session).expect("client");
        CategoryGateway::new(client)
    }

    #[tokio::test]
    async fn test_update_puts_title_only() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("PUT")
                    .path("/categories/4")
                    .json_body(serde_json::json!({"title": "Systems"}));
                then.status(200).json_body(serde_json::json!({"id": 4, "title": "Systems"}));
            })
            .await;

        let category = gateway(&server)
            .update(&CategoryUpdate {
                id: ResourceId::from("4"),
                title: "Systems".into(),
            })
            .await
            .expect("update");
        assert_eq!(category.title, "Systems");
        assert_eq!(category.id.as_str(), "4");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forbidden_delete_keeps_kind() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("DELETE").path("/categories/4");
                then.status(403);
            })
            .await;

        let err = gateway(&server)
            .delete(&ResourceId::from("4"))
            .await
            .expect_err("forbidden");
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.context(), "Failed to delete category");
    }
}
