//! Command implementations.

pub mod auth;
pub mod config;
pub mod empresa;
pub mod onboarding;
pub mod token;
pub mod user;

pub use auth::{forgot_password, login, logout, register, reset_password, whoami};
pub use config::run_config;
pub use empresa::run_empresa;
pub use onboarding::run_onboarding;
pub use token::run_decode_token;
pub use user::run_user;

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use kyc_session::api::server_message;
use kyc_session::{
    BearerAugmenter, FileStorage, HttpAuthApi, Navigation, Navigator, RouteTable, Router,
    SessionState, SessionStore,
};

use crate::cli::Cli;
use crate::config::OutputFormat;
use crate::output::info;
use crate::{CliConfig, CliError, CliResult};

/// Reports navigation on the terminal.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "Navigating");
        info(&format!("Redirected to {path}"));
    }
}

/// Everything a command needs: the session, the router and the API client.
pub struct Context {
    /// Loaded configuration.
    pub config: CliConfig,
    /// Effective output format.
    pub format: OutputFormat,
    /// The session of this invocation.
    pub session: Arc<SessionState>,
    /// Console router.
    pub router: Router,
    /// Client for console resources.
    pub client: ApiClient,
}

impl Context {
    /// Builds the context from the parsed command line and configuration.
    pub fn new(cli: &Cli, config: CliConfig) -> CliResult<Self> {
        let api_url = config.effective_api_url(cli.api_url.as_deref());
        let session_dir = config.effective_session_dir(cli.session_dir.as_deref())?;
        tracing::debug!(api_url = %api_url, session_dir = %session_dir.display(), "Opening session");

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let session = Arc::new(SessionState::new(
            Arc::new(HttpAuthApi::with_client(http.clone(), api_url.clone())),
            SessionStore::new(FileStorage::new(session_dir)),
            Arc::new(TerminalNavigator),
            config.session.clone(),
        ));
        let client = ApiClient::new(
            http,
            api_url,
            BearerAugmenter::from_config(&config.session),
            Arc::clone(&session),
        );

        Ok(Self {
            format: cli.output.unwrap_or(config.output_format),
            router: Router::new(RouteTable::console(), &config.session),
            config,
            session,
            client,
        })
    }

    /// Navigates to `path` and fails with the redirect if the guards refuse.
    pub fn enter(&self, path: &str) -> CliResult<()> {
        match self.router.navigate(self.session.as_ref(), path) {
            Navigation::Enter { path } => {
                tracing::debug!(path = %path, "Entered route");
                Ok(())
            }
            Navigation::Redirect(redirect) => Err(CliError::Redirected(redirect)),
        }
    }
}

/// API client for console resources.
///
/// Every request passes through the [`BearerAugmenter`] with the current
/// session token.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    augmenter: BearerAugmenter,
    session: Arc<SessionState>,
}

impl ApiClient {
    /// Creates a new API client.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        augmenter: BearerAugmenter,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            augmenter,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> CliResult<reqwest::Response> {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let request = self
            .augmenter
            .augment(builder.build()?, self.session.token().as_deref());
        tracing::debug!(method = %request.method(), url = %request.url(), "Sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        if matches!(status.as_u16(), 401 | 403) {
            tracing::warn!(status = status.as_u16(), path, "Request rejected by the API");
        }
        Err(CliError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Makes a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> CliResult<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    /// Makes a POST request.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CliResult<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// Makes a PUT request.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CliResult<T> {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// Makes a PATCH request with an empty JSON object body.
    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> CliResult<T> {
        let response = self
            .send(Method::PATCH, path, Some(&serde_json::json!({})))
            .await?;
        Ok(response.json().await?)
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> CliResult<()> {
        self.send::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Builds a query string from the present parameters.
pub(crate) fn query(params: &[(&str, Option<String>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(k, v)| {
            v.as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{k}={}", urlencoding::encode(v)))
        })
        .collect();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_skips_absent_values() {
        assert_eq!(
            query(&[
                ("page", Some("0".to_string())),
                ("nroDni", None),
                ("filtro", Some("Acme & Co".to_string())),
                ("estado", Some(String::new())),
            ]),
            "?page=0&filtro=Acme%20%26%20Co"
        );
        assert_eq!(query(&[("nroDni", None)]), "");
    }
}
