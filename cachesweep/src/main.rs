mod experiments;
mod io;
mod results;
mod trace_file;
mod traces;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cachemodel::simulator::Simulator;
use cachemodel::CacheConfig;
use clap::{Parser, Subcommand};
use log::info;

use crate::experiments::ExperimentPlan;
use crate::io::get_reader;
use crate::results::ResultWriter;
use crate::trace_file::TraceParser;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache timing sweeps"))]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true)]
    performance: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs a sweep plan, writing one CSV row per experiment
    Sweep {
        /// Where to write the results
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        /// A JSON plan to run instead of the built-in study
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Number of worker threads
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,

        /// Print the plan as JSON and exit, useful as a starting point for custom plans
        #[arg(long)]
        print_plan: bool,
    },
    /// Replays an address trace file against a single cache backed by memory
    Replay {
        config: String,
        trace: String,

        #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
        debug: bool,
    },
}

fn main() -> Result<(), String> {
    env_logger::init();
    let start = Instant::now();
    let args = Args::parse();
    match args.command {
        Command::Sweep {
            output,
            plan,
            jobs,
            print_plan,
        } => {
            let plan: ExperimentPlan = match plan {
                Some(path) => {
                    let plan_file = File::open(&path).map_err(|e| format!("Couldn't open the plan file at path {}: {e}", path.display()))?;
                    serde_json::from_reader(BufReader::new(plan_file)).map_err(|e| format!("Couldn't parse the plan file: {e}"))?
                }
                None => ExperimentPlan::builtin(),
            };
            if print_plan {
                println!("{}", serde_json::to_string_pretty(&plan).map_err(|e| format!("Couldn't serialise the plan {e}"))?);
                return Ok(());
            }
            sweep(&plan, &output, jobs)?;
        }
        Command::Replay { config, trace, debug } => replay(&config, &trace, debug, args.performance)?,
    }
    if args.performance {
        println!("Total execution time: {}s", start.elapsed().as_nanos() as f64 / 1e9);
    }
    Ok(())
}

fn sweep(plan: &ExperimentPlan, output: &Path, jobs: usize) -> Result<(), String> {
    info!("Running {} experiments on {jobs} thread(s)", plan.experiments.len());
    let rows = plan.run(jobs);
    let output_file = File::create(output).map_err(|e| format!("Couldn't create the output file at path {}: {e}", output.display()))?;
    let mut writer = ResultWriter::new(BufWriter::new(output_file)).map_err(|e| format!("Couldn't write the header: {e}"))?;
    for row in &rows {
        writer.write_row(row).map_err(|e| format!("Couldn't write a result row: {e}"))?;
    }
    writer.finish()?;
    println!("Wrote {} of {} experiments to {}", rows.len(), plan.experiments.len(), output.display());
    Ok(())
}

fn replay(config_path: &str, trace_path: &str, debug: bool, performance: bool) -> Result<(), String> {
    let config_file = File::open(config_path).map_err(|e| format!("Couldn't open the config file at path {config_path}: {e}"))?;
    let config: CacheConfig = serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    let mut simulator = Simulator::new(&config).map_err(|e| e.to_string())?;
    let trace_file = File::open(trace_path).map_err(|e| format!("Couldn't open the trace file at path {trace_path}: {e}"))?;
    let parser = TraceParser::new().map_err(|e| e.to_string())?;
    // Streamed straight from the reader, the first bad line stops the replay
    let mut failure = None;
    let addresses = parser.addresses(get_reader(trace_file)?).map_while(|address| match address {
        Ok(address) => Some(address),
        Err(e) => {
            failure = Some(e);
            None
        }
    });
    let result = simulator.simulate(addresses);
    if let Some(e) = failure {
        return Err(format!("Couldn't read the trace file: {e}"));
    }
    info!("Replayed {} addresses", result.cache.accesses);
    println!("{}", serde_json::to_string_pretty(result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    if performance {
        let simulation_time = simulator.get_execution_time();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
    }
    if debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        let cache = simulator.get_cache();
        let geometry = cache.get_geometry();
        println!(
            "Valid cache lines: {} of {}",
            cache.get_valid_line_count(),
            geometry.num_sets * geometry.associativity
        );
        println!("Effective miss penalty: {} cycles", cache.effective_miss_penalty());
    }
    Ok(())
}
