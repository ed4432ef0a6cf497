//! External identity seam.
//!
//! A partner site can hand a user over by appending `auth_token` and
//! `user_data` (JSON) query parameters to the handoff URL. Identity never
//! gates the chat surface; a missing or malformed handoff just means an
//! anonymous session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::logging;

/// User record as the partner site serializes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IdentityHandoff {
    pub user: ExternalUser,
    pub token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the current user, if any. Returning `None` is not an error.
    async fn current_user(&self) -> Option<IdentityHandoff>;
}

/// Provider for deployments with no partner handoff configured.
pub struct NullIdentityProvider;

#[async_trait]
impl IdentityProvider for NullIdentityProvider {
    async fn current_user(&self) -> Option<IdentityHandoff> {
        None
    }
}

/// Decodes a handoff captured from the partner site's redirect parameters.
pub struct BridgeIdentityProvider {
    handoff: Option<IdentityHandoff>,
}

impl BridgeIdentityProvider {
    /// Build from raw `auth_token` and `user_data` parameter values.
    /// Malformed `user_data` is logged and absorbed.
    pub fn from_params(auth_token: Option<&str>, user_data: Option<&str>) -> Self {
        let handoff = match (auth_token, user_data) {
            (Some(token), Some(data)) if !token.is_empty() => {
                match serde_json::from_str::<ExternalUser>(data) {
                    Ok(user) => Some(IdentityHandoff {
                        user,
                        token: token.to_string(),
                    }),
                    Err(e) => {
                        logging::log_error(None, &format!("Bad identity handoff data: {}", e));
                        None
                    }
                }
            }
            _ => None,
        };
        Self { handoff }
    }
}

#[async_trait]
impl IdentityProvider for BridgeIdentityProvider {
    async fn current_user(&self) -> Option<IdentityHandoff> {
        self.handoff.clone()
    }
}
