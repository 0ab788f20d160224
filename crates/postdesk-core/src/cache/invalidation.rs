//! Static invalidation edges.
//!
//! Every write names the resource it touched and what it did. The table maps
//! that pair to the key prefixes whose entries are discarded once the write
//! succeeds. A blog embeds its author and category, so renaming or removing
//! either also drops every cached blog list.

use std::fmt;

use super::Resource;
use super::Resource::{Authors, Blogs, Categories};
use MutationKind::{ChangeStatus, Create, Delete, Update};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    ChangeStatus,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::ChangeStatus => "change-status",
        };
        f.write_str(name)
    }
}

/// A write against one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mutation {
    pub resource: Resource,
    pub kind: MutationKind,
}

impl Mutation {
    pub const fn new(resource: Resource, kind: MutationKind) -> Self {
        Self { resource, kind }
    }

    /// Prefixes discarded after this mutation commits.
    ///
    /// A pair missing from the table invalidates everything.
    pub fn invalidates(&self) -> &'static [Resource] {
        INVALIDATION_EDGES
            .iter()
            .find(|(resource, kind, _)| *resource == self.resource && *kind == self.kind)
            .map(|(_, _, prefixes)| *prefixes)
            .unwrap_or(&Resource::ALL)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.resource)
    }
}

const INVALIDATION_EDGES: &[(Resource, MutationKind, &[Resource])] = &[
    (Blogs, Create, &[Blogs]),
    (Blogs, Update, &[Blogs]),
    (Blogs, Delete, &[Blogs]),
    (Blogs, ChangeStatus, &[Blogs]),
    (Categories, Create, &[Categories]),
    (Categories, Update, &[Categories, Blogs]),
    (Categories, Delete, &[Categories, Blogs]),
    (Authors, Create, &[Authors]),
    (Authors, Update, &[Authors, Blogs]),
    (Authors, Delete, &[Authors, Blogs]),
];
