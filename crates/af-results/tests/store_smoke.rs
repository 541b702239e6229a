use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use af_config::{EngineConfig, Tier};
use af_core::{DeterministicStream, Lane};
use af_design::{RULES, inspect, synthesize_coefficients, synthesize_parameters};
use af_geometry::{build_seed, extract_features};
use af_results::*;
use af_sim::{
    ConvergenceOptions, FlowFieldOptions, NarrativeOptions, RaceInputs, RaceOptions,
    generate_convergence, generate_narrative, simulate_races, synthesize_flow_field,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn small_result(bytes: &[u8], tier: Tier) -> AeroResult {
    let features = extract_features(bytes);
    let seed = build_seed(&features);
    let mut stream = DeterministicStream::new(seed);
    let parameters = synthesize_parameters(&mut stream);
    let coefficients = synthesize_coefficients(&parameters, &mut stream);
    let mut conv = stream.fork(Lane::Convergence);
    let flow = stream.fork(Lane::FlowField);
    let mut race = stream.fork(Lane::Race);
    let mut narrative = stream.fork(Lane::Narrative);

    AeroResult {
        metadata: ResultMetadata {
            id: compute_result_id(&ResultKey {
                bytes,
                filename: "car.step",
                tier,
                car_class: "Professional",
                thrust_model: "CO2 8g",
                config: &EngineConfig::default(),
                engine_version: "test",
            }),
            filename: "car.step".to_string(),
            timestamp: timestamp_now(),
            tier,
            car_class: "Professional".to_string(),
            thrust_model: "CO2 8g".to_string(),
            engine_version: "test".to_string(),
            seed,
        },
        scrutineering: inspect(&parameters, &RULES),
        residuals: generate_convergence(
            &mut conv,
            &ConvergenceOptions {
                samples: 20,
                ..ConvergenceOptions::default()
            },
        )
        .unwrap(),
        flow_field: synthesize_flow_field(
            &parameters,
            flow,
            &FlowFieldOptions {
                points: 50,
                ..FlowFieldOptions::default()
            },
        )
        .unwrap(),
        race: simulate_races(
            RaceInputs::from_design(&parameters, &coefficients),
            &mut race,
            &RaceOptions {
                samples: 200,
                ..RaceOptions::default()
            },
        )
        .unwrap(),
        correction: generate_narrative(
            coefficients.cd,
            &mut narrative,
            &NarrativeOptions::default(),
        )
        .unwrap(),
        features,
        parameters,
        coefficients,
    }
}

#[test]
fn save_list_load_roundtrip() {
    let dir = unique_temp_dir("af_results_store");
    let store = ResultStore::new(dir.clone()).expect("failed to create store");

    let result = small_result(b"#1=CARTESIAN_POINT('',(0.,0.,0.));", Tier::Standard);
    let manifest = ResultManifest::from_result(
        &result,
        vec![StageTimingRecord {
            stage: "parameters".to_string(),
            seconds: 0.001,
        }],
    );
    store.save_result(&manifest, &result).expect("failed to save");

    assert!(store.has_result(result.id()));
    let listed = store.list_results().expect("failed to list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], manifest);

    let loaded = store.load_result(result.id()).expect("failed to load");
    assert_eq!(loaded, result);

    store.delete_result(result.id()).expect("failed to delete");
    assert!(!store.has_result(result.id()));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn listing_skips_foreign_directories() {
    let dir = unique_temp_dir("af_results_foreign");
    let store = ResultStore::new(dir.clone()).unwrap();
    fs::create_dir_all(dir.join("not-a-result")).unwrap();
    fs::write(dir.join("stray.txt"), "x").unwrap();

    let result = small_result(b"", Tier::Premium);
    store
        .save_result(&ResultManifest::from_result(&result, Vec::new()), &result)
        .unwrap();

    let listed = store.list_results().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].tier, Tier::Premium);
    assert!(listed[0].stage_timings.is_empty());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn saving_again_supersedes() {
    let dir = unique_temp_dir("af_results_supersede");
    let store = ResultStore::new(dir.clone()).unwrap();
    let first = small_result(b"abc", Tier::Standard);
    let mut second = first.clone();
    second.metadata.timestamp = "2099-01-01T00:00:00Z".to_string();

    store
        .save_result(&ResultManifest::from_result(&first, Vec::new()), &first)
        .unwrap();
    store
        .save_result(&ResultManifest::from_result(&second, Vec::new()), &second)
        .unwrap();

    assert_eq!(store.list_results().unwrap().len(), 1);
    assert_eq!(
        store.load_manifest(first.id()).unwrap().timestamp,
        "2099-01-01T00:00:00Z"
    );
    assert!(first.same_content(&second));
    let _ = fs::remove_dir_all(dir);
}
