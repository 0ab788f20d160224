use super::{ApiClient, GatewayError, Request};
use crate::models::{Author, AuthorUpdate, NewAuthor, ResourceId};

const AUTHORS_PATH: &str = "/authors";

/// Author operations against `/authors`.
#[derive(Clone)]
pub struct AuthorGateway {
    client: ApiClient,
}

impl AuthorGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Author>, GatewayError> {
        self.client
            .send_json(Request::get(AUTHORS_PATH))
            .await
            .map_err(|e| GatewayError::new("Failed to fetch authors", e))
    }

    pub async fn create(&self, author: &NewAuthor) -> Result<Author, GatewayError> {
        const CONTEXT: &str = "Failed to create an author";
        let request = Request::post(AUTHORS_PATH)
            .json(author)
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    pub async fn update(&self, update: &AuthorUpdate) -> Result<Author, GatewayError> {
        const CONTEXT: &str = "Failed to update an author";
        let request = Request::patch(format!("{}/{}", AUTHORS_PATH, update.id))
            .json(update)
            .map_err(|e| GatewayError::new(CONTEXT, e))?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| GatewayError::new(CONTEXT, e))
    }

    pub async fn delete(&self, id: &ResourceId) -> Result<(), GatewayError> {
        self.client
            .send_unit(Request::delete(format!("{}/{}", AUTHORS_PATH, id)))
            .await
            .map_err(|e| GatewayError::new("Failed to delete an author", e))
    }
}
