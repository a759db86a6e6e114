//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["fincounsel.toml", ".fincounsel.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `FINCOUNSEL_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./fincounsel.toml` or `./.fincounsel.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/fincounsel/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::project_config_path().as_deref())
            .merge(Env::prefixed("FINCOUNSEL_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: Option<&PathBuf>, project: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/fincounsel/config.toml if set,
    /// otherwise falls back to ~/.config/fincounsel/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fincounsel").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Default directory for session snapshots and logs
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("fincounsel"))
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     FINCOUNSEL_<SECTION>__<KEY>");

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./fincounsel.toml or ./.fincounsel.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.retrieval.k, 4);
        assert_eq!(config.breaker.threshold, 2);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("fincounsel"));
    }

    #[test]
    fn test_explicit_file_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("fincounsel.toml");
        let explicit = dir.path().join("override.toml");
        let mut file = std::fs::File::create(&project).unwrap();
        writeln!(file, "[retrieval]\nk = 7\nmin_similarity = 0.3").unwrap();
        let mut file = std::fs::File::create(&explicit).unwrap();
        writeln!(file, "[retrieval]\nk = 2").unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), Some(&project))
            .extract()
            .unwrap();
        assert_eq!(config.retrieval.k, 2);
        assert_eq!(config.retrieval.min_similarity, 0.3);
        assert_eq!(config.breaker.threshold, 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("broken.toml");
        std::fs::write(&explicit, "[retrieval]\nk = \"many\"\n").unwrap();

        let result: Result<FileConfig, _> = ConfigLoader::figment(Some(&explicit), None).extract();
        assert!(result.is_err());
    }
}
