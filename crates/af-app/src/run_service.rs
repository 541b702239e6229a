//! Run execution and caching service.

use std::sync::Arc;
use std::time::Instant;

use af_config::{EngineConfig, Tier, validate_config};
use af_results::{AeroResult, ResultManifest, ResultStore, StageTimingRecord};

use crate::engine::{ENGINE_VERSION, EngineInput, run_engine};
use crate::error::AppResult;
use crate::ledger::ResultLedger;
use crate::progress::{RunProgressEvent, RunStage};

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
    pub tier: Tier,
    pub car_class: &'a str,
    pub thrust_model: &'a str,
    pub config: &'a EngineConfig,
    pub store: Option<&'a ResultStore>,
    pub ledger: Option<&'a ResultLedger>,
    pub options: RunOptions,
}

/// Timing summary for a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub stages: Vec<StageTimingRecord>,
    pub engine_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub result_id: String,
    pub result: Arc<AeroResult>,
    pub manifest: ResultManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Execute or load a run.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    validate_config(request.config)?;

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking result cache".to_string()),
    );

    let input = EngineInput {
        bytes: request.bytes,
        filename: request.filename,
        tier: request.tier,
        car_class: request.car_class,
        thrust_model: request.thrust_model,
        engine_version: &request.options.engine_version,
    };
    let result_id = input.result_id(request.config);

    if request.options.use_cache
        && let Some(store) = request.store
        && store.has_result(&result_id)
    {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            Some("Loading cached result".to_string()),
        );

        let load_started = Instant::now();
        let manifest = store.load_manifest(&result_id)?;
        let result = Arc::new(store.load_result(&result_id)?);
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();

        if let Some(ledger) = request.ledger
            && ledger.get(&result_id).is_none()
        {
            ledger.append(Arc::clone(&result));
        }

        timing.stages = manifest.stage_timings.clone();
        timing.total_time_s = started.elapsed().as_secs_f64();
        tracing::info!(id = %result_id, "loaded cached result");

        emit_progress(
            &mut progress_cb,
            RunStage::Completed,
            started,
            Some("Loaded cached result".to_string()),
        );

        return Ok(RunResponse {
            result_id,
            result,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    let engine_started = Instant::now();
    let output = run_engine(&input, request.config, &mut |stage| {
        emit_progress(&mut progress_cb, stage, started, None)
    })?;
    timing.engine_time_s = engine_started.elapsed().as_secs_f64();

    timing.stages = output
        .timings
        .iter()
        .map(|(stage, seconds)| StageTimingRecord {
            stage: stage.to_string(),
            seconds,
        })
        .collect();
    let manifest = ResultManifest::from_result(&output.result, timing.stages.clone());

    if let Some(store) = request.store {
        emit_progress(
            &mut progress_cb,
            RunStage::SavingResult,
            started,
            Some("Saving result".to_string()),
        );
        let save_started = Instant::now();
        store.save_result(&manifest, &output.result)?;
        timing.save_time_s = save_started.elapsed().as_secs_f64();
    }

    let result = Arc::new(output.result);
    if let Some(ledger) = request.ledger {
        ledger.append(Arc::clone(&result));
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
    );

    Ok(RunResponse {
        result_id,
        result,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}
