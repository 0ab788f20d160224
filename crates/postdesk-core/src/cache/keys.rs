use std::collections::BTreeMap;
use std::fmt;

use crate::models::BlogFilter;

/// Top-level resource a cache key belongs to. Doubles as the key prefix
/// used for coarse invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Blogs,
    Categories,
    Authors,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Blogs, Resource::Categories, Resource::Authors];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Blogs => "blogs",
            Resource::Categories => "categories",
            Resource::Authors => "authors",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured cache key: resource prefix plus every parameter that shaped
/// the request. Two reads share an entry only if every parameter matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: Resource,
    params: BTreeMap<&'static str, String>,
}

impl CacheKey {
    /// Key with no parameters.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. Unset and empty values are skipped, matching how the
    /// gateways leave them out of the query string.
    pub fn param(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.params.insert(name, value.to_string());
        }
        self
    }

    pub fn blogs(filter: &BlogFilter) -> Self {
        Self::new(Resource::Blogs)
            .param("searchTerm", filter.search.as_deref())
            .param("tag", filter.tag.as_deref())
            .param("status", filter.status.as_ref().map(|s| s.as_str()))
            .param("categoryId", filter.category_id.as_deref())
    }

    pub fn categories() -> Self {
        Self::new(Resource::Categories)
    }

    pub fn authors() -> Self {
        Self::new(Resource::Authors)
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn params(&self) -> &BTreeMap<&'static str, String> {
        &self.params
    }

    /// Whether this key falls under `prefix`.
    pub fn matches(&self, prefix: Resource) -> bool {
        self.resource == prefix
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            write!(f, "::{{{}}}", params.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlogStatus;

    #[test]
    fn test_blog_key_encodes_every_filter() {
        let filter = BlogFilter::default()
            .search("rust")
            .tag("async")
            .status(BlogStatus::Published)
            .category("3");
        let key = CacheKey::blogs(&filter);
        assert_eq!(key.params().len(), 4);
        assert_eq!(
            key.to_string(),
            "blogs::{categoryId=3,searchTerm=rust,status=Published,tag=async}"
        );
    }

    #[test]
    fn test_distinct_filters_are_distinct_keys() {
        let all = CacheKey::blogs(&BlogFilter::default());
        let drafts = CacheKey::blogs(&BlogFilter::default().status(BlogStatus::Draft));
        assert_ne!(all, drafts);
        assert_eq!(all.to_string(), "blogs");
    }

    #[test]
    fn test_empty_filter_values_normalize_away() {
        let empty = CacheKey::blogs(&BlogFilter::default().search(""));
        assert_eq!(empty, CacheKey::blogs(&BlogFilter::default()));
    }

    #[test]
    fn test_matches_resource_prefix() {
        let key = CacheKey::blogs(&BlogFilter::default().tag("x"));
        assert!(key.matches(Resource::Blogs));
        assert!(!key.matches(Resource::Categories));
        assert!(CacheKey::authors().matches(Resource::Authors));
    }
}
