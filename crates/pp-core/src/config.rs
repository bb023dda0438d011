use serde::{Deserialize, Serialize};

/// Default namespace segment prefixed to every storage key.
pub const DEFAULT_STORAGE_NAMESPACE: &str = "pp_e2ee";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Prefix for identity record keys in the backing store
    pub storage_namespace: String,
    /// Run the crypto self-test when the messenger is constructed
    pub self_test_on_init: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
            self_test_on_init: true,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(namespace) = std::env::var("PP_STORAGE_NAMESPACE") {
            config.storage_namespace = namespace;
        }

        if let Ok(flag) = std::env::var("PP_SELF_TEST_ON_INIT") {
            config.self_test_on_init = flag.parse()?;
        }

        Ok(config)
    }

    pub fn from_toml(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CoreConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage_namespace.trim().is_empty() {
            anyhow::bail!("storage_namespace must not be empty");
        }

        // '/' separates segments inside storage keys
        if self.storage_namespace.contains('/') {
            anyhow::bail!("storage_namespace must not contain '/'");
        }

        Ok(())
    }
}
