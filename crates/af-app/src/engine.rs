//! Result assembly: the full pipeline from geometry bytes to an [`AeroResult`].
//!
//! Stream usage per run (see `af_core::stream` for the generator itself):
//! 1. one draw per design rule, in table order
//! 2. four draws for the aerodynamic coefficients
//! 3. four forks, in [`Lane::ALL`] order, one per consumer
//!
//! The consumers run in parallel on their own child streams, so tier sizes never
//! reach the parameters or the coefficients.

use af_config::{EngineConfig, Tier};
use af_core::{DeterministicStream, Lane, StageTimings, Timer};
use af_design::{RULES, inspect, synthesize_coefficients, synthesize_parameters};
use af_geometry::{build_seed, extract_features};
use af_results::{AeroResult, ResultKey, ResultMetadata, compute_result_id, timestamp_now};
use af_sim::{
    ConvergenceOptions, FlowFieldOptions, NarrativeOptions, RaceInputs, RaceOptions,
    generate_convergence, generate_narrative, simulate_races, synthesize_flow_field,
};

use crate::error::AppResult;
use crate::progress::RunStage;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
    pub tier: Tier,
    pub car_class: &'a str,
    pub thrust_model: &'a str,
    pub engine_version: &'a str,
}

impl EngineInput<'_> {
    /// Content id of the result this input produces under `config`.
    pub fn result_id(&self, config: &EngineConfig) -> String {
        compute_result_id(&ResultKey {
            bytes: self.bytes,
            filename: self.filename,
            tier: self.tier,
            car_class: self.car_class,
            thrust_model: self.thrust_model,
            config,
            engine_version: self.engine_version,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub result: AeroResult,
    pub timings: StageTimings,
}

pub fn convergence_options(config: &EngineConfig, tier: Tier) -> ConvergenceOptions {
    ConvergenceOptions {
        samples: config.tier(tier).convergence_samples,
        iterations_per_sample: config.convergence.iterations_per_sample,
        converged_threshold: config.convergence.converged_threshold,
        relaxed_threshold: config.convergence.relaxed_threshold,
        ..ConvergenceOptions::default()
    }
}

pub fn flow_field_options(config: &EngineConfig, tier: Tier) -> FlowFieldOptions {
    FlowFieldOptions {
        points: config.tier(tier).flow_field_points,
        free_stream_mps: config.flow_field.free_stream_mps,
        air_density_kg_m3: config.flow_field.air_density_kg_m3,
    }
}

pub fn race_options(config: &EngineConfig, tier: Tier) -> RaceOptions {
    let race = &config.race;
    RaceOptions {
        samples: config.tier(tier).race_samples,
        visualization_points: race.visualization_points,
        track_length_m: race.track_length_m,
        launch_force_n: race.launch_force_n,
        burn_time_s: race.burn_time_s,
        rolling_coefficient: race.rolling_coefficient,
        air_density_kg_m3: race.air_density_kg_m3,
        max_time_s: race.max_time_s,
    }
}

pub fn narrative_options(config: &EngineConfig, tier: Tier) -> NarrativeOptions {
    NarrativeOptions {
        epochs: config.tier(tier).narrative_epochs,
    }
}

fn timed<T>(label: &'static str, f: impl FnOnce() -> T) -> (T, f64) {
    let timer = Timer::start(label);
    let out = f();
    (out, timer.stop_and_log())
}

/// Run the whole pipeline. `progress` is called once per finished stage, in pipeline
/// order; the four parallel consumers report after they have all joined.
pub fn run_engine(
    input: &EngineInput<'_>,
    config: &EngineConfig,
    progress: &mut dyn FnMut(RunStage),
) -> AppResult<EngineOutput> {
    let mut timings = StageTimings::default();
    let tier = input.tier;

    let timer = Timer::start("features");
    let features = extract_features(input.bytes);
    let seed = build_seed(&features);
    timings.finish(timer);
    progress(RunStage::ExtractingFeatures);

    tracing::info!(
        filename = input.filename,
        tier = %tier,
        seed = seed.value(),
        bytes = input.bytes.len(),
        "engine run started"
    );

    let mut stream = DeterministicStream::new(seed);

    let timer = Timer::start("parameters");
    let parameters = synthesize_parameters(&mut stream);
    let scrutineering = inspect(&parameters, &RULES);
    timings.finish(timer);
    progress(RunStage::SynthesizingParameters);

    let timer = Timer::start("coefficients");
    let coefficients = synthesize_coefficients(&parameters, &mut stream);
    timings.finish(timer);
    progress(RunStage::SynthesizingCoefficients);

    let mut conv_stream = stream.fork(Lane::Convergence);
    let flow_stream = stream.fork(Lane::FlowField);
    let mut race_stream = stream.fork(Lane::Race);
    let mut narrative_stream = stream.fork(Lane::Narrative);

    let conv_opts = convergence_options(config, tier);
    let flow_opts = flow_field_options(config, tier);
    let race_opts = race_options(config, tier);
    let narrative_opts = narrative_options(config, tier);
    let race_inputs = RaceInputs::from_design(&parameters, &coefficients);
    let baseline_cd = coefficients.cd;
    let params_ref = &parameters;

    let ((residuals, flow_field), (race, correction)) = rayon::join(
        || {
            rayon::join(
                || {
                    timed("convergence", || {
                        generate_convergence(&mut conv_stream, &conv_opts)
                    })
                },
                || {
                    timed("flow_field", || {
                        synthesize_flow_field(params_ref, flow_stream, &flow_opts)
                    })
                },
            )
        },
        || {
            rayon::join(
                || timed("race", || simulate_races(race_inputs, &mut race_stream, &race_opts)),
                || {
                    timed("narrative", || {
                        generate_narrative(baseline_cd, &mut narrative_stream, &narrative_opts)
                    })
                },
            )
        },
    );

    let (residuals, secs) = residuals;
    timings.record("convergence", secs);
    let residuals = residuals?;
    progress(RunStage::GeneratingConvergence);

    let (flow_field, secs) = flow_field;
    timings.record("flow_field", secs);
    let flow_field = flow_field?;
    progress(RunStage::SynthesizingFlowField);

    let (race, secs) = race;
    timings.record("race", secs);
    let race = race?;
    progress(RunStage::SimulatingRaces);

    let (correction, secs) = correction;
    timings.record("narrative", secs);
    let correction = correction?;
    progress(RunStage::GeneratingNarrative);

    let metadata = ResultMetadata {
        id: input.result_id(config),
        filename: input.filename.to_string(),
        timestamp: timestamp_now(),
        tier,
        car_class: input.car_class.to_string(),
        thrust_model: input.thrust_model.to_string(),
        engine_version: input.engine_version.to_string(),
        seed,
    };

    tracing::info!(
        id = %metadata.id,
        cd = coefficients.cd,
        cl = coefficients.cl,
        mean_time_s = race.statistics.time.average,
        convergence = residuals.status.label(),
        total_s = timings.total_seconds(),
        "engine run finished"
    );

    Ok(EngineOutput {
        result: AeroResult {
            metadata,
            features,
            parameters,
            coefficients,
            scrutineering,
            residuals,
            flow_field,
            race,
            correction,
        },
        timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(bytes: &[u8], tier: Tier) -> EngineInput<'_> {
        EngineInput {
            bytes,
            filename: "car.step",
            tier,
            car_class: "Development",
            thrust_model: "CO2 8g",
            engine_version: ENGINE_VERSION,
        }
    }

    #[test]
    fn stages_report_in_pipeline_order() {
        let mut stages = Vec::new();
        run_engine(
            &input(b"#1=CARTESIAN_POINT('',(1.,2.,3.));", Tier::Standard),
            &EngineConfig::default(),
            &mut |s| stages.push(s),
        )
        .unwrap();
        assert_eq!(
            stages,
            vec![
                RunStage::ExtractingFeatures,
                RunStage::SynthesizingParameters,
                RunStage::SynthesizingCoefficients,
                RunStage::GeneratingConvergence,
                RunStage::SynthesizingFlowField,
                RunStage::SimulatingRaces,
                RunStage::GeneratingNarrative,
            ]
        );
        assert!(stages.windows(2).all(|w| w[0].percent() < w[1].percent()));
    }

    #[test]
    fn timings_cover_every_stage() {
        let out = run_engine(
            &input(b"", Tier::Standard),
            &EngineConfig::default(),
            &mut |_| {},
        )
        .unwrap();
        for label in [
            "features",
            "parameters",
            "coefficients",
            "convergence",
            "flow_field",
            "race",
            "narrative",
        ] {
            assert!(out.timings.get(label).is_some(), "{label}");
        }
    }

    #[test]
    fn options_follow_the_tier() {
        let config = EngineConfig::default();
        assert_eq!(race_options(&config, Tier::Standard).samples, 5_000);
        assert_eq!(race_options(&config, Tier::Premium).samples, 100_000);
        assert_eq!(flow_field_options(&config, Tier::Premium).points, 6_000);
        assert_eq!(narrative_options(&config, Tier::Premium).epochs, 12);
        assert_eq!(convergence_options(&config, Tier::Premium).samples, 500);
        assert_eq!(af_sim::narrative::MAX_EPOCHS, af_config::MAX_NARRATIVE_EPOCHS);
    }

    #[test]
    fn invalid_options_surface_as_errors() {
        let mut config = EngineConfig::default();
        config.race.max_time_s = -1.0;
        let err = run_engine(&input(b"", Tier::Standard), &config, &mut |_| {}).unwrap_err();
        assert!(matches!(err, crate::AppError::Simulation(_)), "{err}");
    }
}
