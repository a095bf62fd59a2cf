//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaleflowConfig {
    pub credentials: CredentialsConfig,
    pub server: ServerConfig,
}

/// Bale bot credentials handed to the nodes.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Override the Bot API root (defaults to `https://tapi.bale.ai`).
    pub base_api_url: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_api_url", &self.base_api_url)
            .finish()
    }
}

impl CredentialsConfig {
    /// Credentials in the JSON shape the host stores them in, or `None`
    /// when no token is configured.
    pub fn to_value(&self) -> Option<Value> {
        let token = self.token.as_ref()?.expose_secret();
        if token.trim().is_empty() {
            return None;
        }
        let mut value = Map::new();
        value.insert("token".into(), Value::String(token.clone()));
        if let Some(url) = &self.base_api_url {
            value.insert("baseApiUrl".into(), Value::String(url.clone()));
        }
        Some(Value::Object(value))
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the webhook server binds to.
    pub bind: String,
    /// Public base URL Bale delivers updates to, e.g. `https://example.com`.
    pub public_url: Option<String>,
    /// Path of the webhook route under `public_url`.
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5678".into(),
            public_url: None,
            path: "webhook".into(),
        }
    }
}

impl ServerConfig {
    /// Route served locally, always with a leading slash.
    pub fn route(&self) -> String {
        format!("/{}", self.path.trim_matches('/'))
    }

    /// Public URL of the trigger webhook (`{public_url}/{path}`).
    pub fn webhook_url(&self) -> Option<String> {
        let base = self.public_url.as_deref()?.trim_end_matches('/');
        Some(format!("{base}{}", self.route()))
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
