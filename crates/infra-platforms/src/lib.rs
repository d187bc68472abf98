// SubSync Platform Adapters
// Reddit and YouTube implementations of the PlatformProvider port

pub mod config;
mod http;
pub mod reddit;
pub mod youtube;

pub use config::{HttpSettings, PlatformCredentials, PlatformsConfig};
pub use reddit::{RedditEndpoints, RedditProvider};
pub use youtube::{YouTubeEndpoints, YouTubeProvider};

use crate::http::build_client;
use std::sync::Arc;
use subsync_core::application::ProviderRegistry;
use subsync_core::domain::Platform;
use subsync_core::port::PlatformProvider;
use tracing::{error, info, warn};

/// Register a factory for every platform with complete credentials
///
/// Platforms missing a client id or secret are skipped. A missing redirect
/// URI surfaces later as a configuration error when the provider is built.
/// Each platform gets one HTTP client, shared by every provider the factory
/// creates.
pub fn register_enabled(registry: &mut ProviderRegistry, config: &PlatformsConfig) {
    for platform in Platform::ALL.iter().copied() {
        let credentials = config.credentials(platform).clone();
        if !credentials.is_enabled() {
            warn!(platform = %platform, "Platform credentials not configured, skipping");
            continue;
        }

        let settings = config.http;
        let client = match build_client(&settings) {
            Ok(client) => client,
            Err(e) => {
                error!(platform = %platform, error = %e, "HTTP client setup failed");
                registry.register(platform, move || Err(e.clone()));
                continue;
            }
        };

        match platform {
            Platform::Reddit => registry.register(platform, move || {
                let provider = RedditProvider::with_client(
                    client.clone(),
                    credentials.clone(),
                    RedditEndpoints::default(),
                    settings,
                )?;
                Ok(Arc::new(provider) as Arc<dyn PlatformProvider>)
            }),
            Platform::Youtube => registry.register(platform, move || {
                let provider = YouTubeProvider::with_client(
                    client.clone(),
                    credentials.clone(),
                    YouTubeEndpoints::default(),
                    settings,
                )?;
                Ok(Arc::new(provider) as Arc<dyn PlatformProvider>)
            }),
        }
        info!(platform = %platform, "Provider registered");
    }
}
