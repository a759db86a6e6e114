//! Configuration file loading for fincounsel
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `FINCOUNSEL_<SECTION>__<KEY>` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./fincounsel.toml` or `./.fincounsel.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/fincounsel/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, EmbeddingProvider, FileBreakerConfig, FileConfig, FileEmbeddingConfig,
    FileLlmConfig, FileLoggingConfig, FileOutputConfig, FileOutputFormat, FileReplConfig,
    FileRetrievalConfig, FileSessionConfig, FileSynthesisConfig, FileVectorStoreConfig,
    VectorStoreProvider,
};
pub use loader::ConfigLoader;
