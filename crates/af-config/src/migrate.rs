//! Configuration version migration.

use crate::ConfigError;
use crate::schema::{EngineConfig, MAX_VISUALIZATION_POINTS};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    while config.version < LATEST_VERSION {
        config = migrate_one_version(config)?;
    }
    Ok(config)
}

fn migrate_one_version(config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    match config.version {
        0 => migrate_v0_to_v1(config),
        1 => migrate_v1_to_v2(config),
        v => Err(ConfigError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    config.version = 1;
    Ok(config)
}

/// Version 1 allowed an unbounded visualization subsample.
fn migrate_v1_to_v2(mut config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    config.race.visualization_points = config
        .race
        .visualization_points
        .clamp(1, MAX_VISUALIZATION_POINTS);
    config.version = 2;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_latest_is_noop() {
        let config = EngineConfig::default();
        let migrated = migrate_to_latest(config.clone()).unwrap();
        assert_eq!(migrated, config);
    }

    #[test]
    fn v1_visualization_cap_is_clamped() {
        let mut config = EngineConfig {
            version: 1,
            ..EngineConfig::default()
        };
        config.race.visualization_points = 2_000;
        let migrated = migrate_to_latest(config).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(migrated.race.visualization_points, MAX_VISUALIZATION_POINTS);
    }

    #[test]
    fn v0_walks_every_step() {
        let config = EngineConfig {
            version: 0,
            ..EngineConfig::default()
        };
        assert_eq!(migrate_to_latest(config).unwrap().version, LATEST_VERSION);
    }
}
