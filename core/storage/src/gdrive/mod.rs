//! Google Drive provider for DriveAgent.
//!
//! This module provides:
//! - OAuth2 refresh-token authentication with lazy, cached access tokens
//! - A reqwest client implementing [`crate::DriveApi`] against Drive v3

pub mod auth;
pub mod client;

use std::sync::Arc;

use driveagent_common::{Result, Secret};

pub use auth::{AuthConfig, AuthManager, TokenManager, Tokens};
pub use client::DriveClient;

/// Build a Drive client from OAuth2 client credentials and a refresh token.
///
/// Credentials are not checked here; the first API call performs the
/// token refresh and reports any authentication failure.
pub fn connect(client_id: &str, client_secret: Secret, refresh_token: Secret) -> Result<DriveClient> {
    let auth_manager = AuthManager::new(AuthConfig::new(client_id, client_secret))?;
    let token_manager = Arc::new(TokenManager::new(
        auth_manager,
        Tokens::from_refresh_token(refresh_token),
    ));
    DriveClient::new(token_manager)
}
