mod app;
mod screen;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use qualex_core::{ParticipantId, ResponseSink};
use qualex_experiment::{ExperimentConfig, ExperimentStateMachine, plan, plan_seeded};
use qualex_store::{CounterFile, CsvFileSink, JsonLinesSink};
use qualex_timing::SystemClock;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Jsonl,
}

#[derive(Parser)]
#[command(name = "qualex")]
#[command(version)]
#[command(about = "Paired-stimulus preference survey")]
struct Cli {
    /// Experiment configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the trial order for a participant
    Plan {
        #[arg(long)]
        participant: u64,

        /// Seed for the direction flips (overrides plan_seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run one participant session on this terminal
    Run {
        /// Participant counter file
        #[arg(long, default_value = "participant_counter.txt")]
        counter: PathBuf,

        /// Where completed sessions are appended
        #[arg(long, default_value = "responses.csv")]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Seed for the direction flips (overrides plan_seed)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ExperimentConfig::default(),
    };

    match cli.command {
        Commands::Plan { participant, seed } => {
            let participant = ParticipantId(participant);
            let catalog = config.catalog();
            let trial_plan = match seed.or(config.plan_seed) {
                Some(seed) => plan_seeded(participant, catalog.len(), seed)?,
                None => plan(participant, catalog.len(), &mut rand::rng())?,
            };
            println!(
                "participant {participant}: rows {} -> {}",
                trial_plan.rows.0, trial_plan.rows.1
            );
            for (slot, index) in trial_plan.indices.iter().enumerate() {
                let source = catalog.get(*index).map_or("?", |s| s.source.as_str());
                println!("{:>3} {:>3} {}", slot + 1, index, source);
            }
        }

        Commands::Run {
            counter,
            output,
            format,
            seed,
        } => {
            if seed.is_some() {
                config.plan_seed = seed;
            }
            let sink: Box<dyn ResponseSink> = match format {
                OutputFormat::Csv => Box::new(CsvFileSink::new(&output)),
                OutputFormat::Jsonl => Box::new(JsonLinesSink::new(&output)),
            };
            info!(
                counter = %counter.display(),
                output = %output.display(),
                ?format,
                "starting session"
            );
            let experiment = ExperimentStateMachine::new(
                config,
                CounterFile::new(counter),
                sink,
                SystemClock,
                rand::rng(),
            );
            let mut app = App::new(experiment);
            let stdin = io::stdin();
            let stdout = io::stdout();
            let outcome = app.run(stdin.lock(), &mut stdout.lock())?;
            info!(?outcome, "session finished");
        }
    }

    Ok(())
}
