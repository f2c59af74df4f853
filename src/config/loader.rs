use super::HeuristicConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<HeuristicConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: HeuristicConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML config: {}", path.as_ref().display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid heuristics in {}", path.as_ref().display()))?;

    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in heuristics.
///
/// A file that exists but does not parse or validate is still an error.
pub fn load_config_if_present<P: AsRef<Path>>(path: P) -> Result<HeuristicConfig> {
    if !path.as_ref().exists() {
        log::warn!(
            "Configuration file '{}' not found, using built-in heuristics",
            path.as_ref().display()
        );
        return Ok(HeuristicConfig::default());
    }

    let config = load_config(&path)?;
    log::info!(
        "Loaded heuristics {} from: {}",
        config.version,
        path.as_ref().display()
    );
    Ok(config)
}

pub fn write_config<P: AsRef<Path>>(path: P, config: &HeuristicConfig) -> Result<()> {
    let content = serde_yaml::to_string(config).context("Failed to serialize heuristics")?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("phishguard-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_generated_config_loads_back() {
        let path = temp_path("generated.yaml");
        let config = HeuristicConfig::default();

        write_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let path = temp_path("invalid.yaml");
        fs::write(&path, "auxiliary_weight: 3.0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert!(format!("{:#}", err).contains("auxiliary_weight"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_if_present(temp_path("does-not-exist.yaml")).unwrap();
        assert_eq!(config, HeuristicConfig::default());
    }

    #[test]
    fn test_unparseable_existing_file_is_an_error() {
        let path = temp_path("garbage.yaml");
        fs::write(&path, "trusted_domains: {not: [a list\n").unwrap();

        let err = load_config_if_present(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert!(format!("{:#}", err).contains("Failed to parse YAML config"));
    }
}
