//! Configuration validation logic.

use crate::schema::{
    EngineConfig, MAX_NARRATIVE_EPOCHS, MAX_VISUALIZATION_POINTS, Tier, TierProfile,
};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

fn validate_tier(tier: Tier, profile: &TierProfile) -> Result<(), ValidationError> {
    let counts = [
        ("convergence_samples", profile.convergence_samples),
        ("flow_field_points", profile.flow_field_points),
        ("race_samples", profile.race_samples),
        ("narrative_epochs", profile.narrative_epochs),
    ];
    for (name, count) in counts {
        if count == 0 {
            return Err(invalid(
                &format!("tiers.{tier}.{name}"),
                count,
                "must be at least 1",
            ));
        }
    }
    if profile.narrative_epochs > MAX_NARRATIVE_EPOCHS {
        return Err(invalid(
            &format!("tiers.{tier}.narrative_epochs"),
            profile.narrative_epochs,
            "must be at most 32",
        ));
    }
    Ok(())
}

pub fn validate_config(config: &EngineConfig) -> Result<(), ValidationError> {
    if config.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    if config.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    for tier in Tier::ALL {
        validate_tier(tier, config.tier(tier))?;
    }
    let (s, p) = (&config.tiers.standard, &config.tiers.premium);
    if p.race_samples < s.race_samples || p.flow_field_points < s.flow_field_points {
        return Err(invalid(
            "tiers.premium",
            p.race_samples,
            "premium populations must not be smaller than standard",
        ));
    }

    let conv = &config.convergence;
    if conv.iterations_per_sample == 0 {
        return Err(invalid(
            "convergence.iterations_per_sample",
            0,
            "must be at least 1",
        ));
    }
    for tier in Tier::ALL {
        let last = (config.tier(tier).convergence_samples as u64)
            .checked_mul(u64::from(conv.iterations_per_sample));
        if last.is_none_or(|n| n > u64::from(u32::MAX)) {
            return Err(invalid(
                "convergence.iterations_per_sample",
                conv.iterations_per_sample,
                &format!("{tier} iteration count overflows"),
            ));
        }
    }
    positive("convergence.converged_threshold", conv.converged_threshold)?;
    positive("convergence.relaxed_threshold", conv.relaxed_threshold)?;
    if conv.relaxed_threshold < conv.converged_threshold || conv.relaxed_threshold >= 1.0 {
        return Err(invalid(
            "convergence.relaxed_threshold",
            conv.relaxed_threshold,
            "must lie between the converged threshold and 1",
        ));
    }

    positive("flow_field.free_stream_mps", config.flow_field.free_stream_mps)?;
    positive("flow_field.air_density_kg_m3", config.flow_field.air_density_kg_m3)?;

    let race = &config.race;
    positive("race.track_length_m", race.track_length_m)?;
    positive("race.launch_force_n", race.launch_force_n)?;
    positive("race.burn_time_s", race.burn_time_s)?;
    positive("race.rolling_coefficient", race.rolling_coefficient)?;
    positive("race.air_density_kg_m3", race.air_density_kg_m3)?;
    positive("race.max_time_s", race.max_time_s)?;
    if race.visualization_points == 0 || race.visualization_points > MAX_VISUALIZATION_POINTS {
        return Err(invalid(
            "race.visualization_points",
            race.visualization_points,
            "must be between 1 and 300",
        ));
    }

    Ok(())
}
