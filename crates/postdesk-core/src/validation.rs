//! Local form validation.
//!
//! Payloads are checked before any request leaves the process. Failures come
//! back as `ApiError::Validation` with per-field messages, the same shape a
//! server-side 422 produces.

use crate::api::{ApiError, FieldErrors};
use crate::models::{AuthorUpdate, BlogUpdate, CategoryUpdate, NewAuthor, NewBlog, NewCategory};

/// Minimum body length for a blog post, in characters.
const MIN_BLOG_BODY_CHARS: usize = 10;

pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Collects field violations for one payload.
#[derive(Debug, Default)]
struct Violations(FieldErrors);

impl Violations {
    fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.add(field, message);
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::from_fields(self.0))
        }
    }
}

impl Validate for NewCategory {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Violations::default();
        v.require("title", &self.title, "Category title is required");
        v.finish()
    }
}

impl Validate for CategoryUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Violations::default();
        v.require("title", &self.title, "Category title is required");
        v.finish()
    }
}

impl Validate for NewBlog {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Violations::default();
        v.require("title", &self.title, "Title is required");
        v.min_chars(
            "body",
            &self.body,
            MIN_BLOG_BODY_CHARS,
            "Body must be at least 10 characters",
        );
        v.require("authorId", &self.author_id, "Author is required");
        v.require("categoryId", &self.category_id, "Category is required");
        v.finish()
    }
}

impl Validate for BlogUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        self.fields.validate()
    }
}

impl Validate for NewAuthor {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Violations::default();
        v.require("name", &self.name, "Author Name is Required.");
        v.finish()
    }
}

impl Validate for AuthorUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        self.fields.validate()
    }
}

/// Login form check: both fields must be present.
pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    if email.is_empty() || password.is_empty() {
        let mut fields = FieldErrors::new();
        if email.is_empty() {
            fields.insert("email".into(), vec!["Email is required".into()]);
        }
        if password.is_empty() {
            fields.insert("password".into(), vec!["Password is required".into()]);
        }
        return Err(ApiError::Validation {
            message: "Email and password are required".to_string(),
            fields,
        });
    }
    Ok(())
}
