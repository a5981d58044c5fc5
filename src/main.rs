use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gatesim::circuits::Demo;
use gatesim::console::{run_viewer, ViewerConfig};
use gatesim::signal::{NoNoise, UniformNoise};
use gatesim::system_config::NetworkConfig;
use gatesim::testbed::{Testbed, Traces};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gatesim")]
#[command(about = "Discrete-time, voltage-level logic gate network simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a network description and check its consistency
    Check { file: PathBuf },
    /// Simulate a network description with its stimulus
    Run {
        file: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Simulate one of the built-in circuits
    Demo {
        #[arg(value_enum)]
        circuit: DemoArg,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Write a built-in circuit as a JSON network description
    Export {
        #[arg(value_enum)]
        circuit: DemoArg,
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,
    /// Seed for the noise generator
    #[arg(long)]
    seed: Option<u64>,
    /// Disable noise
    #[arg(long)]
    no_noise: bool,
    /// Write all traces as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Open the trace viewer after the run
    #[arg(long)]
    view: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DemoArg {
    And,
    Demux,
    ShiftRegister,
    Divider,
}

impl From<DemoArg> for Demo {
    fn from(arg: DemoArg) -> Self {
        match arg {
            DemoArg::And => Demo::And,
            DemoArg::Demux => Demo::Demux,
            DemoArg::ShiftRegister => Demo::ShiftRegister,
            DemoArg::Divider => Demo::Divider,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { file } => check(&file),
        Command::Run { file, run } => {
            let config = NetworkConfig::from_json_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            simulate(&config, &run)
        }
        Command::Demo { circuit, run } => {
            let demo = Demo::from(circuit);
            let network = demo.network()?;
            let config = NetworkConfig::from_network(&network).with_stimulus(demo.stimulus());
            simulate(&config, &run)
        }
        Command::Export { circuit, file } => {
            let demo = Demo::from(circuit);
            let config = NetworkConfig::from_network(&demo.network()?).with_stimulus(demo.stimulus());
            config
                .to_json_file(&file)
                .with_context(|| format!("exporting {}", demo.name()))?;
            println!("Wrote {} to {}", demo.name(), file.display());
            Ok(())
        }
    }
}

fn check(file: &Path) -> Result<()> {
    let network = NetworkConfig::from_json_file(file)
        .and_then(|config| config.build())
        .with_context(|| format!("loading {}", file.display()))?;
    println!("{}", network);

    let report = network.check_consistency();
    println!("{}", report);
    if !report.is_consistent() {
        std::process::exit(1);
    }
    Ok(())
}

fn simulate(config: &NetworkConfig, args: &RunArgs) -> Result<()> {
    let mut testbed = config.build_testbed()?;
    if args.no_noise {
        testbed.network_mut().set_noise(Box::new(NoNoise));
    } else if let Some(seed) = args.seed.or(config.seed()) {
        testbed.network_mut().set_noise(Box::new(UniformNoise::new(seed)));
    }

    let unsourced = testbed.unsourced_inputs();
    if !unsourced.is_empty() {
        bail!("no source for input(s): {}", unsourced.join(", "));
    }

    let ticks = args.ticks.unwrap_or_else(|| config.ticks());
    let traces = testbed.run(ticks)?;
    print_final_outputs(&testbed, &traces);

    if let Some(path) = &args.csv {
        traces
            .write_csv(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Traces written to {}", path.display());
    }

    if args.view {
        let viewer = ViewerConfig {
            title: config.name.clone(),
            ..ViewerConfig::default()
        };
        run_viewer(&traces, viewer).context("trace viewer failed")?;
    }
    Ok(())
}

fn print_final_outputs(testbed: &Testbed, traces: &Traces) {
    println!(
        "{}: {} ticks simulated",
        testbed.network().name(),
        traces.len()
    );
    for name in testbed.network().output_names() {
        let level = traces
            .logic_levels(&name)
            .and_then(|levels| levels.last().copied());
        match (traces.last(&name), level) {
            (Some(v), Some(level)) => println!("  {:<8} {:>7.3} V  ({})", name, v, u8::from(level)),
            _ => println!("  {:<8} (unconnected)", name),
        }
    }
}
