// Platform credentials & HTTP settings, loaded from the environment

use config::{Config, ConfigError, Environment};
use std::time::Duration;
use subsync_core::domain::Platform;
use subsync_core::port::ProviderError;

/// OAuth client registration for one platform
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PlatformCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
}

// Secrets stay out of logs
impl std::fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl PlatformCredentials {
    /// A platform is offered when both client id and secret are present
    pub fn is_enabled(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Check every variable a provider needs, naming the first missing one
    pub fn validate(&self, platform: Platform) -> Result<&str, ProviderError> {
        let prefix = platform.as_str().to_ascii_uppercase();
        if self.client_id.is_empty() {
            return Err(missing(&prefix, "CLIENT_ID"));
        }
        if self.client_secret.is_empty() {
            return Err(missing(&prefix, "CLIENT_SECRET"));
        }
        match self.redirect_uri.as_deref() {
            Some(uri) if !uri.is_empty() => Ok(uri),
            _ => Err(missing(&prefix, "REDIRECT_URI")),
        }
    }
}

fn missing(prefix: &str, name: &str) -> ProviderError {
    ProviderError::Configuration(format!(
        "Missing {}_{} environment variable",
        prefix, name
    ))
}

/// Outbound HTTP behaviour shared by all providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Per-request timeout enforced by the client
    pub timeout: Duration,
    /// Pause between listing pages
    pub page_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlatformsConfig {
    pub reddit: PlatformCredentials,
    pub youtube: PlatformCredentials,
    pub http: HttpSettings,
}

impl PlatformsConfig {
    /// Load from process environment
    ///
    /// # Example
    /// ```text
    /// REDDIT_CLIENT_ID=abc REDDIT_CLIENT_SECRET=xyz \
    /// REDDIT_REDIRECT_URI=http://localhost:3000/auth/callback subsync-daemon
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    /// Load from an explicit environment source (tests pass a map)
    pub fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder().add_source(env).build()?;

        let credentials = |prefix: &str| PlatformCredentials {
            client_id: string_or_empty(&settings, &format!("{}_client_id", prefix)),
            client_secret: string_or_empty(&settings, &format!("{}_client_secret", prefix)),
            redirect_uri: settings
                .get_string(&format!("{}_redirect_uri", prefix))
                .ok()
                .filter(|s| !s.is_empty()),
        };

        let mut http = HttpSettings::default();
        if let Ok(secs) = settings.get_string("subsync_http_timeout_secs") {
            let secs: u64 = secs.parse().map_err(|_| {
                ConfigError::Message(format!("SUBSYNC_HTTP_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            http.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            reddit: credentials("reddit"),
            youtube: credentials("youtube"),
            http,
        })
    }

    pub fn credentials(&self, platform: Platform) -> &PlatformCredentials {
        match platform {
            Platform::Reddit => &self.reddit,
            Platform::Youtube => &self.youtube,
        }
    }

    pub fn enabled_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .iter()
            .copied()
            .filter(|p| self.credentials(*p).is_enabled())
            .collect()
    }
}

fn string_or_empty(settings: &Config, key: &str) -> String {
    settings.get_string(key).unwrap_or_default()
}
