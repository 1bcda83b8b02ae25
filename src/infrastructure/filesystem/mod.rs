pub mod config_store;

pub use config_store::{
    ConfigStoreError, ConfigurationStore, CredentialEntry, CredentialKind, HttpSettings,
    PluginConfiguration,
};
