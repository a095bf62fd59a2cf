use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use baleflow_workflow::{ExecuteContext, HookContext};

use crate::{Error, Result, api::BaleClient};

/// Credential type name the nodes request from the host.
pub const CREDENTIAL_NAME: &str = "baleMessengerApi";

/// Root of the Bale Bot API.
pub const DEFAULT_API_URL: &str = "https://tapi.bale.ai";

/// Stored credentials for a Bale bot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaleApiCredentials {
    /// Bot token from @botfather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// API root; only overridden for self-hosted gateways and tests.
    #[serde(default = "default_api_url")]
    pub base_api_url: String,
}

impl std::fmt::Debug for BaleApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaleApiCredentials")
            .field("token", &"[REDACTED]")
            .field("base_api_url", &self.base_api_url)
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl BaleApiCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
            base_api_url: default_api_url(),
        }
    }

    #[must_use]
    pub fn with_base_api_url(mut self, url: impl Into<String>) -> Self {
        self.base_api_url = url.into();
        self
    }

    /// Parse credentials as stored by the host. The token must be non-empty.
    pub fn from_value(value: Value) -> Result<Self> {
        let credentials: Self = serde_json::from_value(value)?;
        if credentials.token.expose_secret().trim().is_empty() {
            return Err(Error::message("bale bot token is required"));
        }
        Ok(credentials)
    }

    pub async fn from_execute_context(ctx: &dyn ExecuteContext) -> Result<Self> {
        Self::from_value(ctx.credentials(CREDENTIAL_NAME).await?)
    }

    pub async fn from_hook_context(ctx: &dyn HookContext) -> Result<Self> {
        Self::from_value(ctx.credentials(CREDENTIAL_NAME).await?)
    }

    pub fn client(&self) -> Result<BaleClient> {
        BaleClient::new(&self.base_api_url, self.token.clone())
    }
}
