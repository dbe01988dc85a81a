//! Bearer token augmentation for outgoing API requests.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

use crate::config::SessionConfig;

/// Attaches `Authorization: Bearer <token>` to outgoing requests, except
/// those aimed at a public endpoint.
///
/// A missing token is not this layer's concern: the request goes out as is
/// and the API answers with its own authentication error.
#[derive(Debug, Clone)]
pub struct BearerAugmenter {
    public_endpoints: Vec<String>,
}

impl BearerAugmenter {
    /// Creates an augmenter skipping URLs that contain any of
    /// `public_endpoints`.
    pub fn new<I, S>(public_endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public_endpoints: public_endpoints.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an augmenter from the session configuration.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.public_endpoints.iter().cloned())
    }

    /// Checks if `url` targets a public endpoint.
    #[must_use]
    pub fn is_public(&self, url: &str) -> bool {
        self.public_endpoints.iter().any(|e| url.contains(e.as_str()))
    }

    /// Returns `request` with the bearer header attached when it applies.
    #[must_use]
    pub fn augment(&self, mut request: Request, token: Option<&str>) -> Request {
        let url = request.url().as_str();
        if self.is_public(url) {
            tracing::debug!(url, "Public endpoint, sending without credentials");
            return request;
        }
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            tracing::debug!(url, "No session token, sending without credentials");
            return request;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(url, "Session token is not a valid header value, not attaching it");
            }
        }
        request
    }
}

impl Default for BearerAugmenter {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
