use std::path::{Path, PathBuf};
use std::process::ExitCode;

use backprop_mlp::{Error, ExperimentConfig, Result, Shuffle, run_experiment};
use clap::Parser;
use tracing::Level;

/// Train MLPs on the two-moons problem and report their test error rates.
#[derive(Debug, Parser)]
#[command(name = "backprop-mlp", version)]
struct Cli {
    /// JSON experiment config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Network widths, e.g. `--arch 2,2,2`; repeat to train several networks.
    #[arg(long = "arch", value_parser = parse_arch)]
    architectures: Vec<Arch>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    lr: Option<f64>,

    /// Seeds data, initialization and shuffling.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    n_train: Option<usize>,

    #[arg(long)]
    n_test: Option<usize>,

    #[arg(long)]
    noise: Option<f64>,

    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn experiment_config(&self) -> Result<ExperimentConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => ExperimentConfig::default(),
        };

        if !self.architectures.is_empty() {
            cfg.architectures = self.architectures.iter().map(|a| a.0.clone()).collect();
        }
        if let Some(epochs) = self.epochs {
            cfg.fit.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            cfg.fit.batch_size = batch_size;
        }
        if let Some(lr) = self.lr {
            cfg.fit.lr = lr;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
            cfg.fit.shuffle = Shuffle::Seeded(seed);
        }
        if let Some(n_train) = self.n_train {
            cfg.n_train = n_train;
        }
        if let Some(n_test) = self.n_test {
            cfg.n_test = n_test;
        }
        if let Some(noise) = self.noise {
            cfg.noise = noise;
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone)]
struct Arch(Vec<usize>);

fn parse_arch(s: &str) -> std::result::Result<Arch, String> {
    s.split(',')
        .map(|w| {
            w.trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid width {w:?}: {e}"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Arch)
}

fn load_config(path: &Path) -> Result<ExperimentConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&s)
        .map_err(|e| Error::InvalidConfig(format!("failed to parse {}: {e}", path.display())))
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = cli.experiment_config()?;

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    for outcome in run_experiment(&cfg)? {
        println!(
            "MLP with layer_sizes {:?}: train error rate {:.4}, test error rate {:.4}",
            outcome.layer_sizes, outcome.train_error, outcome.test_error
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
