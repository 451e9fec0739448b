use crate::config::types::Config;
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Values given on the command line, they override the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub user: Option<u64>,
    pub outdir: Option<String>,
    pub limit: Option<usize>,
    pub force: bool,
    pub ignore_errors: bool,
    pub adlinks: Vec<String>,
}

impl ConfigOverrides {
    /// Applies the overrides on top of a loaded configuration
    pub fn apply(self, config: &mut Config) {
        if let Some(user) = self.user {
            config.user = user;
        }
        if let Some(outdir) = self.outdir {
            config.outdir = outdir;
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        config.force |= self.force;
        config.ignore_errors |= self.ignore_errors;
        config.adlinks = self.adlinks;
    }
}

/// Parses a configuration file without validating it
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Parsed configuration, missing keys take their defaults
/// * `Err(ConfigError)` - The file could not be read or is not valid TOML
pub fn parse_config_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(toml::from_str(&content)?)
}

/// Loads and validates a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use adkeep::config::load_config;
///
/// let config = load_config(Path::new("adkeep.conf")).unwrap();
/// println!("Backing up ads of user {}", config.user);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let config = parse_config_file(path)?;
    validate(&config)?;
    Ok(config)
}

/// Lists the places a config file is looked for, in order
pub fn config_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/etc/adkeep.conf"),
        PathBuf::from("/usr/local/etc/adkeep.conf"),
    ];

    if let Some(home) = home {
        candidates.push(home.join(".config").join("adkeep").join("config"));
        candidates.push(home.join(".adkeep"));
    }

    candidates.push(PathBuf::from("adkeep.conf"));
    candidates
}

/// Finds the config file to use
///
/// An explicitly given file must exist. Otherwise the first existing regular
/// file among [`config_candidates`] is used, or none at all.
pub fn find_config_file(explicit: Option<&Path>) -> ConfigResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such config file"),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    let home = std::env::var_os("HOME").map(PathBuf::from);
    Ok(config_candidates(home.as_deref())
        .into_iter()
        .find(|candidate| candidate.is_file()))
}

/// Builds the effective configuration: defaults, then file, then overrides
///
/// # Returns
///
/// * `Ok((Config, Option<PathBuf>))` - Validated configuration and the file it came from
/// * `Err(ConfigError)` - Loading or validation failed
pub fn load_effective_config(
    explicit: Option<&Path>,
    overrides: ConfigOverrides,
) -> ConfigResult<(Config, Option<PathBuf>)> {
    let source = find_config_file(explicit)?;

    let mut config = match &source {
        Some(path) => {
            tracing::debug!("Loading configuration from: {}", path.display());
            parse_config_file(path)?
        }
        None => Config::default(),
    };

    overrides.apply(&mut config);
    validate(&config)?;

    Ok((config, source))
}
