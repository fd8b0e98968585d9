//! Google Calendar backend.
//!
//! Writes entries through the Calendar API v3 using a token obtained by an
//! external OAuth consent flow.
//!
//! # Authorization
//!
//! 1. The user runs the consent flow once (outside duesync), producing a token file
//! 2. [`GoogleAuthorizer`] loads the token file and checks its scope
//! 3. An expired access token is refreshed with the stored refresh token
//! 4. The refreshed token is written back atomically
//! 5. A [`GoogleCalendarClient`] bound to the configured calendar is returned
//!
//! # Example
//!
//! ```ignore
//! use duesync_providers::google::{GoogleAuthorizer, GoogleConfig};
//!
//! let authorizer = GoogleAuthorizer::new(GoogleConfig::default());
//! let client = authorizer.authorize().await?;
//! let id = client.insert_event(&entry).await?;
//! ```

mod authorizer;
mod client;
mod config;
mod oauth;
mod tokens;

pub use authorizer::GoogleAuthorizer;
pub use client::{CALENDAR_API_BASE, GoogleCalendarClient};
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{GOOGLE_TOKEN_URL, OAuthClient};
pub use tokens::{TokenInfo, TokenStorage};
