use af_config::*;

#[test]
fn roundtrip_yaml_default_config() {
    let config = EngineConfig::default();
    validate_config(&config).unwrap();

    let path = std::env::temp_dir().join("af_config_roundtrip_default.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_json_custom_tiers() {
    let mut config = EngineConfig {
        name: "wind tunnel week".to_string(),
        ..EngineConfig::default()
    };
    config.tiers.standard.race_samples = 2_500;
    config.race.track_length_m = 25.0;

    let path = std::env::temp_dir().join("af_config_roundtrip_custom.json");
    save_json(&path, &config).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn sparse_yaml_takes_defaults() {
    let yaml = "version: 2\nname: minimal\n";
    let config = from_yaml_str(yaml).unwrap();
    assert_eq!(config.tiers, TierTable::default());
    assert_eq!(config.race, RaceDef::default());
}

#[test]
fn old_yaml_is_migrated_on_load() {
    let yaml = r#"
version: 1
name: legacy
race:
  track_length_m: 20.0
  launch_force_n: 4.0
  burn_time_s: 0.3
  rolling_coefficient: 0.018
  air_density_kg_m3: 1.225
  max_time_s: 5.0
  visualization_points: 1000
"#;
    let config = from_yaml_str(yaml).unwrap();
    assert_eq!(config.version, LATEST_VERSION);
    assert_eq!(config.race.visualization_points, MAX_VISUALIZATION_POINTS);
}

#[test]
fn invalid_yaml_surfaces_validation_error() {
    let yaml = "version: 2\nname: \"  \"\n";
    assert!(matches!(
        from_yaml_str(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join("af_config_does_not_exist.yaml");
    let _ = std::fs::remove_file(&path);
    assert!(matches!(load_yaml(&path), Err(ConfigError::Io(_))));
}
