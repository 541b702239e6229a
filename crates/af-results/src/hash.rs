//! Content-based hashing for result ids.

use af_config::{EngineConfig, Tier};
use sha2::{Digest, Sha256};

/// Everything that decides the content of a stored result.
#[derive(Debug, Clone, Copy)]
pub struct ResultKey<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
    pub tier: Tier,
    pub car_class: &'a str,
    pub thrust_model: &'a str,
    pub config: &'a EngineConfig,
    pub engine_version: &'a str,
}

/// SHA-256 over every field of the key, as lowercase hex.
///
/// Each field is length-prefixed so adjacent fields cannot alias. The config takes
/// part through its JSON form, so any edited count or constant yields a fresh id.
pub fn compute_result_id(key: &ResultKey<'_>) -> String {
    let config_json = serde_json::to_string(key.config).unwrap_or_default();

    let mut hasher = Sha256::new();
    for field in [
        key.bytes,
        key.filename.as_bytes(),
        key.tier.as_str().as_bytes(),
        key.car_class.as_bytes(),
        key.thrust_model.as_bytes(),
        config_json.as_bytes(),
        key.engine_version.as_bytes(),
    ] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    format!("{:x}", hasher.finalize())
}

/// Ids are 64 lowercase hex digits.
pub fn is_valid_result_id(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<'a>(bytes: &'a [u8], config: &'a EngineConfig) -> ResultKey<'a> {
        ResultKey {
            bytes,
            filename: "car.step",
            tier: Tier::Standard,
            car_class: "Professional",
            thrust_model: "CO2 8g",
            config,
            engine_version: "0.1.0",
        }
    }

    #[test]
    fn hash_stability() {
        let config = EngineConfig::default();
        let a = compute_result_id(&key(b"ISO-10303-21;", &config));
        let b = compute_result_id(&key(b"ISO-10303-21;", &config));
        assert_eq!(a, b);
        assert!(is_valid_result_id(&a));
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let config = EngineConfig::default();
        let base_key = key(b"abc", &config);
        let base = compute_result_id(&base_key);

        let variants = [
            ResultKey { bytes: b"abd", ..base_key },
            ResultKey { filename: "other.step", ..base_key },
            ResultKey { tier: Tier::Premium, ..base_key },
            ResultKey { car_class: "Development", ..base_key },
            ResultKey { thrust_model: "CO2 4g", ..base_key },
            ResultKey { engine_version: "0.2.0", ..base_key },
        ];
        for variant in variants {
            assert_ne!(base, compute_result_id(&variant), "{variant:?}");
        }
    }

    #[test]
    fn edited_config_changes_the_id() {
        let config = EngineConfig::default();
        let mut edited = config.clone();
        edited.tiers.standard.race_samples = 1_000;
        let mut track = config.clone();
        track.race.track_length_m = 10.0;

        let base = compute_result_id(&key(b"abc", &config));
        assert_ne!(base, compute_result_id(&key(b"abc", &edited)));
        assert_ne!(base, compute_result_id(&key(b"abc", &track)));
    }

    #[test]
    fn fields_do_not_alias() {
        let config = EngineConfig::default();
        let a = ResultKey {
            car_class: "ab",
            thrust_model: "c",
            ..key(b"", &config)
        };
        let b = ResultKey {
            car_class: "a",
            thrust_model: "bc",
            ..key(b"", &config)
        };
        assert_ne!(compute_result_id(&a), compute_result_id(&b));
    }

    #[test]
    fn empty_file_has_an_id() {
        let config = EngineConfig::default();
        assert!(is_valid_result_id(&compute_result_id(&key(b"", &config))));
        assert!(!is_valid_result_id("../etc"));
    }
}
