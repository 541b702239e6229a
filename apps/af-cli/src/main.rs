use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use af_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, SimulationService, SliceAxis,
    SubmitRequest, TaskStatus, ensure_run_with_progress, extract_series, flow_field_slice,
    parameter_table, summarize,
};
use af_config::{EngineConfig, Tier};
use af_geometry::{build_seed, extract_features_from_path};
use af_results::ResultStore;
use tracing_subscriber::EnvFilter;

const DEFAULT_STORE: &str = ".aeroforge/results";

#[derive(Parser)]
#[command(name = "af-cli")]
#[command(about = "aeroforge CLI - geometry-seeded aerodynamic simulation", long_about = None)]
struct Cli {
    /// Result store directory
    #[arg(long, global = true, default_value = DEFAULT_STORE)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract geometry features and the derived seed
    Extract {
        /// Path to the geometry file
        geometry_path: PathBuf,
    },
    /// Run a simulation
    Run {
        /// Path to the geometry file
        geometry_path: PathBuf,
        /// Tier: standard or premium
        #[arg(long, default_value = "standard")]
        tier: Tier,
        /// Car class label
        #[arg(long, default_value = "Development")]
        car_class: String,
        /// Thrust model label
        #[arg(long, default_value = "CO2 8g")]
        thrust_model: String,
        /// Engine config file (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Run on a background task and poll its status
        #[arg(long)]
        background: bool,
    },
    /// List stored results
    Results,
    /// Show details of a stored result
    Show {
        /// Result ID to display
        result_id: String,
    },
    /// Export a series from a result as CSV
    ExportSeries {
        /// Result ID
        result_id: String,
        /// Series name, or `flow_field` for a flow-field slice
        series: String,
        /// Slice axis for `flow_field` (x, y or z)
        #[arg(long, default_value = "y")]
        axis: SliceAxis,
        /// Slice plane position in mm
        #[arg(long, default_value_t = 0.0)]
        at: f64,
        /// Slice half-width in mm
        #[arg(long, default_value_t = 5.0)]
        half_width: f64,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate an engine config file
    ValidateConfig {
        /// Path to the config file (YAML or JSON)
        config_path: PathBuf,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { geometry_path } => cmd_extract(&geometry_path),
        Commands::Run {
            geometry_path,
            tier,
            car_class,
            thrust_model,
            config,
            no_cache,
            background,
        } => {
            let config = load_config(config.as_deref())?;
            let store = ResultStore::new(cli.store)?;
            let bytes = std::fs::read(&geometry_path)?;
            let filename = file_label(&geometry_path);
            let options = RunOptions {
                use_cache: !no_cache,
                ..RunOptions::default()
            };
            if background {
                let request = SubmitRequest {
                    bytes,
                    filename,
                    tier,
                    car_class,
                    thrust_model,
                };
                cmd_run_background(config, store, options, request)
            } else {
                let request = RunRequest {
                    bytes: &bytes,
                    filename: &filename,
                    tier,
                    car_class: &car_class,
                    thrust_model: &thrust_model,
                    config: &config,
                    store: Some(&store),
                    ledger: None,
                    options,
                };
                cmd_run(&request)
            }
        }
        Commands::Results => cmd_results(&cli.store),
        Commands::Show { result_id } => cmd_show(&cli.store, &result_id),
        Commands::ExportSeries {
            result_id,
            series,
            axis,
            at,
            half_width,
            output,
        } => cmd_export_series(
            &cli.store,
            &result_id,
            &series,
            (axis, at, half_width),
            output.as_deref(),
        ),
        Commands::ValidateConfig { config_path } => cmd_validate_config(&config_path),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<EngineConfig> {
    match path {
        Some(path) => Ok(af_config::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn cmd_extract(geometry_path: &Path) -> AppResult<()> {
    let features = extract_features_from_path(geometry_path)?;
    let seed = build_seed(&features);

    println!("Geometry: {}", geometry_path.display());
    println!("  Bytes: {}", features.byte_len);
    println!("  Seed:  {}", seed);
    let b = &features.bounds;
    println!(
        "  Bounds: x [{:.2}, {:.2}]  y [{:.2}, {:.2}]  z [{:.2}, {:.2}]{}",
        b.min_x,
        b.max_x,
        b.min_y,
        b.max_y,
        b.min_z,
        b.max_z,
        if features.used_fallback_bounds {
            "  (nominal envelope)"
        } else {
            ""
        }
    );
    println!("\nKeyword counts:");
    for kc in &features.keyword_counts {
        println!("  {:<24} {}", kc.keyword, kc.count);
    }
    Ok(())
}

fn cmd_run(request: &RunRequest<'_>) -> AppResult<()> {
    println!(
        "Running {} simulation for: {}",
        request.tier, request.filename
    );

    let mut last_stage = None;
    let response = ensure_run_with_progress(
        request,
        Some(&mut |event| {
            if last_stage != Some(event.stage) {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.result_id);
    } else {
        println!("✓ Simulation completed: {}", response.result_id);
    }

    print_timing_summary(&response.timing);
    print_summary(&response.result);
    Ok(())
}

fn cmd_run_background(
    config: EngineConfig,
    store: ResultStore,
    options: RunOptions,
    request: SubmitRequest,
) -> AppResult<()> {
    let service = SimulationService::new(config, Some(store)).with_options(options);
    let handle = service.submit(request)?;
    let id = handle.id;
    println!("Submitted task: {}", id);

    let started = Instant::now();
    let task = loop {
        let task = service.task(id)?;
        print!(
            "\r[{:>3}%] {:<10} {}  elapsed={:.1}s",
            task.progress_pct,
            task.status,
            task.stage,
            started.elapsed().as_secs_f64()
        );
        let _ = io::stdout().flush();
        if task.status.is_terminal() {
            break task;
        }
        thread::sleep(Duration::from_millis(50));
    };
    handle.join()?;
    clear_progress_line();

    match (task.status, task.result_id) {
        (TaskStatus::Completed, Some(result_id)) => {
            println!("✓ Task completed: {}", result_id);
            print_summary(&*service.result(&result_id)?);
            Ok(())
        }
        _ => Err(AppError::EngineFault {
            message: task.error.unwrap_or_else(|| "task failed".to_string()),
        }),
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let width = 28usize;
    let filled = (event.percent as usize * width / 100).min(width);
    let mut line = format!(
        "\r[{}{}] {:>3}%  {}  elapsed={:.2}s",
        "#".repeat(filled),
        "-".repeat(width - filled),
        event.percent,
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &af_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);

    println!("\nTiming summary:");
    for stage in &timing.stages {
        println!(
            "  {:<13} {:.3}s ({:.1}%)",
            stage.stage,
            stage.seconds,
            100.0 * stage.seconds / total
        );
    }
    if timing.save_time_s > 0.0 {
        println!("  Save:         {:.3}s", timing.save_time_s);
    }
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load:   {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:        {:.3}s", timing.total_time_s);
}

fn print_summary(result: &af_results::AeroResult) {
    let summary = summarize(result);
    println!("\nResult Summary:");
    println!("  Seed: {}  Tier: {}", summary.seed, summary.tier);
    println!(
        "  Cd = {:.4}  Cl = {:.4}  L/D = {:.3}",
        summary.cd, summary.cl, summary.lift_to_drag_ratio
    );
    println!(
        "  Race time: mean {:.4}s, best {:.4}s over {} samples",
        summary.mean_race_time_s, summary.best_race_time_s, summary.race_samples
    );
    println!("  Convergence: {}", summary.convergence.label());
    println!(
        "  Scrutineering: {} passed, {} failed",
        summary.scrutineering_passed, summary.scrutineering_failed
    );
    println!(
        "  Optimized Cd: {:.4} ({:.2}%)",
        summary.optimized_cd, result.correction.total_improvement_pct
    );
}

fn cmd_results(store_dir: &Path) -> AppResult<()> {
    let store = ResultStore::new(store_dir.to_path_buf())?;
    let manifests = store.list_results()?;

    if manifests.is_empty() {
        println!("No stored results in {}", store_dir.display());
    } else {
        println!("Stored results:");
        for m in manifests {
            println!(
                "  {} {:<8} Cd={:.4} t={:.4}s {} ({})",
                m.result_id, m.tier, m.cd, m.mean_race_time_s, m.filename, m.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show(store_dir: &Path, result_id: &str) -> AppResult<()> {
    let store = ResultStore::new(store_dir.to_path_buf())?;
    let result = store.load_result(result_id)?;

    println!("Result: {}", result_id);
    println!("  File: {}", result.metadata.filename);
    println!(
        "  Class: {}  Thrust: {}",
        result.metadata.car_class, result.metadata.thrust_model
    );
    print_summary(&result);

    println!("\nDesign parameters:");
    for row in parameter_table(&result) {
        let status = match row.passed {
            Some(true) => "ok",
            Some(false) => "FAIL",
            None => "",
        };
        println!(
            "  {:<28} {:>10.3} {:<4} {:<6} {}",
            row.name,
            row.value,
            row.unit,
            row.rule_id.as_deref().unwrap_or(""),
            status
        );
    }

    println!("\nOptimization epochs:");
    for epoch in &result.correction.epochs {
        println!("  {}", epoch.description());
    }
    println!("  {}", result.correction.suggested_formula);
    Ok(())
}

fn cmd_export_series(
    store_dir: &Path,
    result_id: &str,
    series: &str,
    slice: (SliceAxis, f64, f64),
    output: Option<&Path>,
) -> AppResult<()> {
    let store = ResultStore::new(store_dir.to_path_buf())?;
    let result = store.load_result(result_id)?;

    let (csv, rows) = if series == "flow_field" {
        let (axis, at, half_width) = slice;
        let points = flow_field_slice(&result.flow_field, axis, at, half_width)?;
        let mut csv = String::from("x_mm,y_mm,z_mm,pressure_pa,velocity_mps\n");
        for p in &points {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                p.x, p.y, p.z, p.pressure, p.velocity
            ));
        }
        (csv, points.len())
    } else {
        let data = extract_series(&result, series)?;
        let mut csv = String::from("x,y\n");
        for (x, y) in &data {
            csv.push_str(&format!("{},{}\n", x, y));
        }
        (csv, data.len())
    };

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} data points to {}", rows, path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_validate_config(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = af_config::load(config_path)?;
    println!("✓ Config '{}' is valid (version {})", config.name, config.version);
    for tier in Tier::ALL {
        let p = config.tier(tier);
        println!(
            "  {:<8} convergence={} flow_field={} race={} epochs={}",
            tier, p.convergence_samples, p.flow_field_points, p.race_samples, p.narrative_epochs
        );
    }
    Ok(())
}
