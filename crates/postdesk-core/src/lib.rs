//! postdesk core library.
//!
//! Client-side data layer for the blog admin console: a persisted session,
//! an authenticated HTTP transport with uniform error classification,
//! per-resource gateways, an in-memory cache that coalesces reads and drops
//! dependent entries after writes, and preview handles for picked images.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod console;
pub mod models;
pub mod preview;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use console::AdminConsole;
