//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `SessionStore`: the current credential, persisted to disk and watched by
//!   anything that caches data fetched under it
//! - `Authority`: verifies login pairs; `MockAuthority` accepts one fixed account
//!
//! The persisted file holds `{ token, user, isAuthenticated }` and is rewritten
//! on every login and logout.

pub mod authority;
pub mod session;

pub use authority::{Authority, Credential, MockAuthority, MOCK_EMAIL, MOCK_PASSWORD};
pub use session::{SessionData, SessionError, SessionStore, User};
