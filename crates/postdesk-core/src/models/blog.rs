use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Author, Category, ResourceId};
use crate::utils::format_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "Draft",
            BlogStatus::Published => "Published",
        }
    }

    /// The status a publish/unpublish toggle moves to.
    pub fn toggled(&self) -> Self {
        match self {
            BlogStatus::Draft => BlogStatus::Published,
            BlogStatus::Published => BlogStatus::Draft,
        }
    }

    /// Label for the action that toggles away from this status.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "Publish",
            BlogStatus::Published => "Unpublish",
        }
    }
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BlogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(BlogStatus::Draft),
            "published" => Ok(BlogStatus::Published),
            other => Err(format!("unknown blog status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: BlogStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl Blog {
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map(|a| a.name.as_str()).unwrap_or("Unknown author")
    }

    pub fn category_title(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.title.as_str())
            .unwrap_or("Uncategorized")
    }

    pub fn created_display(&self) -> String {
        self.created_at
            .as_deref()
            .map(format_date)
            .unwrap_or_default()
    }
}

/// Filters for the blog list. Every field is independent; unset or empty
/// fields are left out of the query entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlogFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub status: Option<BlogStatus>,
    pub category_id: Option<String>,
}

impl BlogFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn status(mut self, status: BlogStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

/// Payload for `POST /posts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub status: BlogStatus,
    pub cover_image_url: Option<String>,
}

impl NewBlog {
    /// Add a tag from free-form input. Blank input and duplicates are ignored.
    pub fn add_tag(&mut self, input: &str) -> bool {
        let tag = input.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }
}

/// Payload for `PATCH /posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogUpdate {
    #[serde(skip_serializing)]
    pub id: ResourceId,
    #[serde(flatten)]
    pub fields: NewBlog,
}

impl BlogUpdate {
    /// Start an edit from an existing post.
    pub fn from_blog(blog: &Blog) -> Self {
        Self {
            id: blog.id.clone(),
            fields: NewBlog {
                title: blog.title.clone(),
                body: blog.body.clone(),
                author_id: blog
                    .author
                    .as_ref()
                    .map(|a| a.id.to_string())
                    .unwrap_or_default(),
                category_id: blog
                    .category
                    .as_ref()
                    .map(|c| c.id.to_string())
                    .unwrap_or_default(),
                tags: blog.tags.clone(),
                status: blog.status,
                cover_image_url: blog.cover_image_url.clone(),
            },
        }
    }
}
