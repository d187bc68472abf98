// Provider Registry
// Platform -> provider factory table, built once at start-up

use crate::domain::Platform;
use crate::error::{AppError, Result};
use crate::port::{PlatformProvider, ProviderError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a fresh provider instance
pub type ProviderFactory =
    Arc<dyn Fn() -> std::result::Result<Arc<dyn PlatformProvider>, ProviderError> + Send + Sync>;

/// Read-only after construction; share it behind an `Arc`
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    factories: BTreeMap<Platform, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for a platform
    pub fn register<F>(&mut self, platform: Platform, factory: F)
    where
        F: Fn() -> std::result::Result<Arc<dyn PlatformProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(platform, Arc::new(factory));
    }

    /// Instantiate the provider for `platform`
    ///
    /// # Errors
    /// `AppError::Config` when no factory is registered or the factory
    /// rejects its configuration
    pub fn create(&self, platform: Platform) -> Result<Arc<dyn PlatformProvider>> {
        let factory = self.factories.get(&platform).ok_or_else(|| {
            AppError::Config(format!("Provider for {} is not registered", platform))
        })?;

        factory().map_err(|e| match e {
            ProviderError::Configuration(msg) => AppError::Config(msg),
            other => AppError::Config(format!("Failed to create {} provider: {}", platform, other)),
        })
    }

    pub fn is_registered(&self, platform: Platform) -> bool {
        self.factories.contains_key(&platform)
    }

    /// Registered platforms, sorted
    pub fn list_available(&self) -> Vec<Platform> {
        self.factories.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::platform_provider::mocks::MockPlatformProvider;

    #[test]
    fn test_unregistered_platform_is_config_error() {
        let registry = ProviderRegistry::new();
        assert!(!registry.is_registered(Platform::Youtube));

        let err = registry.create(Platform::Youtube).err().unwrap();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("youtube")));
    }

    #[test]
    fn test_list_available_is_sorted() {
        let mut registry = ProviderRegistry::new();
        registry.register(Platform::Youtube, || {
            Ok(Arc::new(MockPlatformProvider::new(Platform::Youtube)) as Arc<dyn PlatformProvider>)
        });
        registry.register(Platform::Reddit, || {
            Ok(Arc::new(MockPlatformProvider::new(Platform::Reddit)) as Arc<dyn PlatformProvider>)
        });

        assert_eq!(
            registry.list_available(),
            vec![Platform::Reddit, Platform::Youtube]
        );
        let provider = registry.create(Platform::Reddit).unwrap();
        assert_eq!(provider.platform(), Platform::Reddit);
    }

    #[test]
    fn test_factory_failure_maps_to_config() {
        let mut registry = ProviderRegistry::new();
        registry.register(Platform::Reddit, || {
            Err(ProviderError::Configuration(
                "REDDIT_REDIRECT_URI is not set".to_string(),
            ))
        });

        let err = registry.create(Platform::Reddit).err().unwrap();
        assert!(matches!(err, AppError::Config(msg) if msg == "REDDIT_REDIRECT_URI is not set"));
    }
}
