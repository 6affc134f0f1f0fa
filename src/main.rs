use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use rusty_neuronet::error::NetError;
use rusty_neuronet::simulation::{RunStatus, Simulation};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The network description, a JSON file if its extension is `json`
    input: PathBuf,
    /// Do not execute events later than this time
    #[arg(long)]
    until: Option<f64>,
    /// The logging level, on the standard error
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
    /// Save the assembled network to this JSON file before simulating it
    #[arg(long)]
    export: Option<PathBuf>,
}

fn init_logging(level: LevelFilter) -> Result<(), NetError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| NetError::IOError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| NetError::IOError(e.to_string()))?;
    Ok(())
}

fn run(args: &Args) -> Result<(), NetError> {
    let mut simulation = Simulation::from_file(&args.input, io::stdout().lock())?;
    log::info!(
        "Network loaded from {}: {} neurons, {} synapses, {} warning(s)",
        args.input.display(),
        simulation.network().num_neurons(),
        simulation.network().num_synapses(),
        simulation.diagnostics().count()
    );

    if let Some(until) = args.until {
        simulation.set_horizon(until)?;
    }

    if let Some(path) = &args.export {
        simulation.save_to(path)?;
        log::info!("Network saved to {}", path.display());
    }

    match simulation.run()? {
        RunStatus::Blocked => log::info!("Network printed, not simulated"),
        RunStatus::Ran(outcome) => log::info!("Simulation done: {:?}", outcome),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_level) {
        eprintln!("Fatal error: {}", e);
        process::exit(1);
    }
    log::debug!("{:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("Fatal error: {}", e);
        process::exit(1);
    }
}
