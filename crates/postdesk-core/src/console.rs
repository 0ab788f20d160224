//! Admin console state.
//!
//! `AdminConsole` wires the session, transport, gateways and cache together
//! and is the single surface the front end talks to. Reads go through the
//! cache; writes validate locally, then run through the cache's mutation
//! commit so dependent lists are dropped before the result comes back.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::api::{ApiClient, AuthorGateway, BlogGateway, CategoryGateway, GatewayError};
use crate::auth::{MockAuthority, SessionStore, User};
use crate::cache::{CacheKey, Mutation, MutationKind, Resource, SyncCache};
use crate::config::Config;
use crate::models::{
    Author, AuthorUpdate, Blog, BlogFilter, BlogStatus, BlogUpdate, Category, CategoryUpdate, NewAuthor,
    NewBlog, NewCategory, ResourceId,
};
use crate::preview::{BlobStore, PreviewField};
use crate::validation::Validate;

pub struct AdminConsole {
    config: Config,
    session: Arc<SessionStore>,
    cache: SyncCache,
    blogs: BlogGateway,
    categories: CategoryGateway,
    authors: AuthorGateway,
    blobs: BlobStore,
}

impl AdminConsole {
    /// Open the console with the session persisted under the configured
    /// data directory.
    pub fn new(config: Config) -> Result<Self> {
        let dir = config.session_dir()?;
        let session = Arc::new(SessionStore::open(&dir, Arc::new(MockAuthority::new())));
        Self::with_session(config, session)
    }

    pub fn with_session(config: Config, session: Arc<SessionStore>) -> Result<Self> {
        let client = ApiClient::new(&config.api_base_url, config.request_timeout(), Arc::clone(&session))?;
        let cache = SyncCache::with_session(config.freshness(), session.subscribe());
        debug!(base_url = %client.base_url(), "Console ready");

        Ok(Self {
            blogs: BlogGateway::new(client.clone()),
            categories: CategoryGateway::new(client.clone()),
            authors: AuthorGateway::new(client),
            config,
            session,
            cache,
            blobs: BlobStore::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &SyncCache {
        &self.cache
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in. `Ok(false)` means the credentials were rejected.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, GatewayError> {
        self.session
            .login(email, password)
            .await
            .map_err(|e| GatewayError::new("Login failed", e))
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn blogs(&self, filter: &BlogFilter) -> Result<Arc<Vec<Blog>>, GatewayError> {
        let gateway = self.blogs.clone();
        let filter = filter.clone();
        self.cache
            .get(CacheKey::blogs(&filter), move || async move { gateway.list(&filter).await })
            .await
    }

    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, GatewayError> {
        let gateway = self.categories.clone();
        self.cache
            .get(CacheKey::categories(), move || async move { gateway.list().await })
            .await
    }

    pub async fn authors(&self) -> Result<Arc<Vec<Author>>, GatewayError> {
        let gateway = self.authors.clone();
        self.cache
            .get(CacheKey::authors(), move || async move { gateway.list().await })
            .await
    }

    // =========================================================================
    // Blog writes
    // =========================================================================

    pub async fn create_blog(&self, blog: NewBlog) -> Result<Blog, GatewayError> {
        check("Failed to create blog", &blog)?;
        let gateway = self.blogs.clone();
        self.cache
            .mutate(Mutation::new(Resource::Blogs, MutationKind::Create), async move {
                gateway.create(&blog).await
            })
            .await
    }

    pub async fn update_blog(&self, update: BlogUpdate) -> Result<Blog, GatewayError> {
        check("Failed to update blog", &update)?;
        let gateway = self.blogs.clone();
        self.cache
            .mutate(Mutation::new(Resource::Blogs, MutationKind::Update), async move {
                gateway.update(&update).await
            })
            .await
    }

    /// Set a post's status, e.g. `blog.status.toggled()` for publish/unpublish.
    pub async fn change_blog_status(&self, id: &ResourceId, status: BlogStatus) -> Result<Blog, GatewayError> {
        let gateway = self.blogs.clone();
        let id = id.clone();
        self.cache
            .mutate(Mutation::new(Resource::Blogs, MutationKind::ChangeStatus), async move {
                gateway.change_status(&id, status).await
            })
            .await
    }

    pub async fn delete_blog(&self, id: &ResourceId) -> Result<(), GatewayError> {
        let gateway = self.blogs.clone();
        let id = id.clone();
        self.cache
            .mutate(Mutation::new(Resource::Blogs, MutationKind::Delete), async move {
                gateway.delete(&id).await
            })
            .await
    }

    // =========================================================================
    // Category writes
    // =========================================================================

    pub async fn create_category(&self, category: NewCategory) -> Result<Category, GatewayError> {
        check("Failed to create category", &category)?;
        let gateway = self.categories.clone();
        self.cache
            .mutate(Mutation::new(Resource::Categories, MutationKind::Create), async move {
                gateway.create(&category).await
            })
            .await
    }

    pub async fn update_category(&self, update: CategoryUpdate) -> Result<Category, GatewayError> {
        check("Failed to update category", &update)?;
        let gateway = self.categories.clone();
        self.cache
            .mutate(Mutation::new(Resource::Categories, MutationKind::Update), async move {
                gateway.update(&update).await
            })
            .await
    }

    pub async fn delete_category(&self, id: &ResourceId) -> Result<(), GatewayError> {
        let gateway = self.categories.clone();
        let id = id.clone();
        self.cache
            .mutate(Mutation::new(Resource::Categories, MutationKind::Delete), async move {
                gateway.delete(&id).await
            })
            .await
    }

    // =========================================================================
    // Author writes
    // =========================================================================

    pub async fn create_author(&self, author: NewAuthor) -> Result<Author, GatewayError> {
        check("Failed to create an author", &author)?;
        let gateway = self.authors.clone();
        self.cache
            .mutate(Mutation::new(Resource::Authors, MutationKind::Create), async move {
                gateway.create(&author).await
            })
            .await
    }

    pub async fn update_author(&self, update: AuthorUpdate) -> Result<Author, GatewayError> {
        check("Failed to update an author", &update)?;
        let gateway = self.authors.clone();
        self.cache
            .mutate(Mutation::new(Resource::Authors, MutationKind::Update), async move {
                gateway.update(&update).await
            })
            .await
    }

    pub async fn delete_author(&self, id: &ResourceId) -> Result<(), GatewayError> {
        let gateway = self.authors.clone();
        let id = id.clone();
        self.cache
            .mutate(Mutation::new(Resource::Authors, MutationKind::Delete), async move {
                gateway.delete(&id).await
            })
            .await
    }

    // =========================================================================
    // Image fields
    // =========================================================================

    /// Empty image field backed by this console's blob store.
    pub fn preview_field(&self) -> PreviewField {
        PreviewField::new(self.blobs.clone(), self.config.upload_policy())
    }

    /// Image field already showing an uploaded image, as on an edit form.
    pub fn preview_field_with_remote(&self, url: impl Into<String>) -> PreviewField {
        PreviewField::with_remote(self.blobs.clone(), self.config.upload_policy(), url)
    }
}

/// Run local validation, reporting failures under the write's own context.
fn check(context: &'static str, payload: &impl Validate) -> Result<(), GatewayError> {
    payload.validate().map_err(|e| GatewayError::new(context, e))
}
