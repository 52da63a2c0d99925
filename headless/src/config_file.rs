use bevy_log::info;
use ron::de::from_str;
use ron::ser::PrettyConfig;
use sim::SimulationConfig;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Reads a RON configuration, falling back to defaults when the file is missing.
pub fn load_config(path: &Path) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!(
            "Configuration file not found: {}. Using default simulation settings.",
            path.display()
        );
        return Ok(SimulationConfig::default());
    }

    let contents: String = fs::read_to_string(path)?;
    let config: SimulationConfig = from_str(&contents)?;

    info!("Loaded simulation configuration from {}", path.display());

    Ok(config)
}

/// Writes the default configuration to `path` as pretty RON.
pub fn write_default_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(3)
        .with_separate_tuple_members(false)
        .with_enumerate_arrays(false);

    let serialized = ron::ser::to_string_pretty(&SimulationConfig::default(), pretty_config)?;
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    info!("Default configuration written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim::SaltSource;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("shoal-{}-{}.ron", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(&scratch_path("missing")).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_written_defaults_load_back() {
        let path = scratch_path("defaults");
        write_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_fields() {
        let path = scratch_path("partial");
        fs::write(&path, "(school: (swimmer_count: 7, turn_speed: 0.5), salt: Fixed(3))").unwrap();
        let config = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.school.swimmer_count, 7);
        assert_eq!(config.school.turn_speed, 0.5);
        assert_eq!(config.salt, SaltSource::Fixed(3));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = scratch_path("malformed");
        fs::write(&path, "(school: (swimmer_count: \"many\"))").unwrap();
        let result = load_config(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
