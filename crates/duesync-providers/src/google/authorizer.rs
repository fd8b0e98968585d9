//! Turns a stored token file into an authorized calendar client.

use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::client::GoogleCalendarClient;
use super::config::{GoogleConfig, OAuthCredentials};
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStorage};

/// Loads, refreshes, and hands out Google credentials.
#[derive(Debug)]
pub struct GoogleAuthorizer {
    config: GoogleConfig,
    storage: TokenStorage,
    token_url: Option<String>,
    api_base: Option<String>,
}

impl GoogleAuthorizer {
    /// Creates an authorizer for the token file named in `config`.
    pub fn new(config: GoogleConfig) -> Self {
        let storage = TokenStorage::new(&config.token_path);
        Self {
            config,
            storage,
            token_url: None,
            api_base: None,
        }
    }

    /// Overrides the OAuth token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Overrides the Calendar API root handed to the client.
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Returns the token storage.
    pub fn storage(&self) -> &TokenStorage {
        &self.storage
    }

    /// Returns true if a token file exists.
    pub fn has_token(&self) -> bool {
        self.storage.path().exists()
    }

    /// Produces a client with a usable access token.
    ///
    /// An expired token is refreshed and written back to the token file.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when there is no token file, the
    /// token is expired without a way to refresh it, or the refresh is
    /// rejected. Returns an authorization error when the token lacks the
    /// calendar scope.
    pub async fn authorize(&self) -> ProviderResult<GoogleCalendarClient> {
        let mut tokens = self.storage.load()?.ok_or_else(|| {
            ProviderError::authentication(format!(
                "no Google token at {}; complete the OAuth consent flow first",
                self.storage.path().display()
            ))
            .with_provider("google")
        })?;

        if !tokens.has_scope(&self.config.scope) {
            return Err(ProviderError::authorization(format!(
                "stored token was not granted {}",
                self.config.scope
            ))
            .with_provider("google"));
        }

        if tokens.is_expired() {
            self.refresh(&mut tokens).await?;
        } else {
            debug!("stored access token is still valid");
        }

        let client = GoogleCalendarClient::new(
            &tokens.access_token,
            &self.config.calendar_id,
            self.config.timeout,
        )?;
        Ok(match self.api_base {
            Some(ref base) => client.with_base_url(base),
            None => client,
        })
    }

    async fn refresh(&self, tokens: &mut TokenInfo) -> ProviderResult<()> {
        let refresh_token = tokens.refresh_token.clone().ok_or_else(|| {
            ProviderError::authentication("access token expired and no refresh token is stored")
                .with_provider("google")
        })?;

        let credentials = self.refresh_credentials(tokens).ok_or_else(|| {
            ProviderError::authentication(
                "access token expired and no client_id/client_secret is configured",
            )
            .with_provider("google")
        })?;

        let oauth = OAuthClient::new(credentials, self.config.timeout)?;
        let oauth = match self.token_url {
            Some(ref url) => oauth.with_token_url(url),
            None => oauth,
        };

        let (access_token, expires_in) = oauth.refresh_token(&refresh_token).await?;
        tokens.update_access_token(access_token, expires_in);
        self.storage.save(tokens)?;
        info!("refreshed Google access token");
        Ok(())
    }

    /// Configured credentials win over ones embedded in the token file.
    fn refresh_credentials(&self, tokens: &TokenInfo) -> Option<OAuthCredentials> {
        if let Some(ref credentials) = self.config.credentials {
            return Some(credentials.clone());
        }
        match (&tokens.client_id, &tokens.client_secret) {
            (Some(id), Some(secret)) => Some(OAuthCredentials::new(id, secret)),
            _ => None,
        }
    }
}
