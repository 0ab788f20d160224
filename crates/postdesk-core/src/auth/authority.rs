use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::api::ApiError;

use super::User;

/// Account accepted by [`MockAuthority`].
pub const MOCK_EMAIL: &str = "mock@example.com";
pub const MOCK_PASSWORD: &str = "password123";
const MOCK_TOKEN: &str = "mock-jwt-token";

/// A bearer token plus the identity it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub user: User,
}

/// Verifies an identity/secret pair.
///
/// `Ok(None)` means the pair was rejected; errors are reserved for the
/// authority itself being unreachable or broken.
pub trait Authority: Send + Sync {
    fn authenticate<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Option<Credential>, ApiError>>;
}

/// Accepts a single fixed account and issues a fixed token.
#[derive(Debug, Clone, Default)]
pub struct MockAuthority {
    latency: Duration,
}

impl MockAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a round trip before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Authority for MockAuthority {
    fn authenticate<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Option<Credential>, ApiError>> {
        async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            if email == MOCK_EMAIL && password == MOCK_PASSWORD {
                Ok(Some(Credential {
                    token: MOCK_TOKEN.to_string(),
                    user: User {
                        email: email.to_string(),
                    },
                }))
            } else {
                Ok(None)
            }
        }
        .boxed()
    }
}
