//! Data models for admin console entities.
//!
//! - `Blog`, `BlogStatus`, `BlogFilter`: posts and their list filters
//! - `Category`, `Author`: the entities a post references
//! - `New*` / `*Update`: request payloads for create and update calls
//! - `ResourceId`: server ids, accepted as JSON strings or numbers

pub mod author;
pub mod blog;
pub mod category;
pub mod id;

pub use author::{Author, AuthorUpdate, NewAuthor};
pub use blog::{Blog, BlogFilter, BlogStatus, BlogUpdate, NewBlog};
pub use category::{Category, CategoryUpdate, NewCategory};
pub use id::ResourceId;
