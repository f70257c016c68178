mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, LlmSettings, LoggingSettings, QueueProviderSetting, QueueSettings,
    RetrySettings, ServerSettings, Settings, SettingsError, StorageProviderSetting,
    StorageSettings, WorkerSettings,
};
