//! OAuth2 refresh-token authentication for Google Drive.

use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::{
    ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken, TokenResponse, TokenUrl,
};

use driveagent_common::{Error, Result, Secret};

/// OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth2 client that only knows the token endpoint.
type RefreshClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// OAuth2 tokens with expiration tracking.
#[derive(Debug, Clone)]
pub struct Tokens {
    /// Access token for API requests. Empty until the first refresh.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: Secret,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Tokens holding only a refresh token.
    ///
    /// The access token starts out expired so the first API call performs
    /// the refresh.
    pub fn from_refresh_token(refresh_token: Secret) -> Self {
        Self {
            access_token: String::new(),
            refresh_token,
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Check if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        // Consider expired if less than 5 minutes remaining
        self.access_token.is_empty() || self.expires_at < Utc::now() + Duration::minutes(5)
    }
}

/// Configuration for OAuth2 authentication.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: Secret,
    /// Token endpoint, overridable for tests.
    pub token_url: String,
}

impl AuthConfig {
    /// Configuration against Google's token endpoint.
    pub fn new(client_id: impl Into<String>, client_secret: Secret) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }
}

/// OAuth2 authentication manager for Google Drive.
pub struct AuthManager {
    client: RefreshClient,
    http: oauth2::reqwest::Client,
}

impl AuthManager {
    /// Create a new authentication manager.
    ///
    /// No network traffic happens here; invalid credentials are only
    /// detected by [`AuthManager::refresh_token`].
    ///
    /// # Errors
    /// - Token URL is not a valid URL
    /// - HTTP client could not be built
    pub fn new(config: AuthConfig) -> Result<Self> {
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| Error::InvalidInput(format!("Invalid token URL: {}", e)))?;

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.expose().to_string()))
            .set_token_uri(token_url);

        // Redirects from the token endpoint are not followed
        let http = oauth2::reqwest::ClientBuilder::new()
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Network(format!("Failed to create OAuth2 HTTP client: {}", e)))?;

        Ok(Self { client, http })
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// # Errors
    /// - Invalid or revoked refresh token
    /// - Network errors
    pub async fn refresh_token(&self, refresh_token: &Secret) -> Result<Tokens> {
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.expose().to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();

        // Google rarely rotates refresh tokens; keep the old one otherwise
        let new_refresh_token = token_result
            .refresh_token()
            .map(|t| Secret::new(t.secret().clone()))
            .unwrap_or_else(|| refresh_token.clone());

        let expires_in = token_result
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));

        let expires_at =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        Ok(Tokens {
            access_token,
            refresh_token: new_refresh_token,
            expires_at,
        })
    }
}

/// Token manager that automatically refreshes expired tokens.
pub struct TokenManager {
    auth_manager: AuthManager,
    tokens: tokio::sync::RwLock<Tokens>,
}

impl TokenManager {
    /// Create a new token manager with initial tokens.
    pub fn new(auth_manager: AuthManager, tokens: Tokens) -> Self {
        Self {
            auth_manager,
            tokens: tokio::sync::RwLock::new(tokens),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    ///
    /// # Errors
    /// - Token refresh failed
    pub async fn get_access_token(&self) -> Result<String> {
        let tokens = self.tokens.read().await;

        if !tokens.is_expired() {
            return Ok(tokens.access_token.clone());
        }

        drop(tokens);

        let mut tokens = self.tokens.write().await;

        // Another caller may have refreshed while we waited for the lock
        if !tokens.is_expired() {
            return Ok(tokens.access_token.clone());
        }

        tracing::info!("Refreshing expired access token");

        let new_tokens = self
            .auth_manager
            .refresh_token(&tokens.refresh_token)
            .await?;

        *tokens = new_tokens;

        Ok(tokens.access_token.clone())
    }
}
