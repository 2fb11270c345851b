//! Iris command-line interface.
//!
//! Compute rainbow intensity curves from TOML job files:
//! ```sh
//! iris-cli run job.toml
//! iris-cli validate job.toml
//! iris-cli models
//! ```

mod config;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use iris_materials::water::WaterDispersion;

#[derive(Parser)]
#[command(name = "iris-cli")]
#[command(about = "Iris: rainbow scattering models and averaging pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the configured intensity curves and write them out.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides the config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration file without computing anything.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Describe the available scattering models and spectral data.
    Models,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            let job = config::load_config(&config)?;
            runner::validate_job(&job)?;
            println!("Configuration: {}", config.display());

            let curves = runner::run_job(&job)?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                for path in runner::write_csv(&curves, &out_dir)? {
                    println!("  wrote {}", path.display());
                }
            }
            if job.output.save_json {
                let path = runner::write_json(&curves, &out_dir)?;
                println!("  wrote {}", path.display());
            }
            println!("Done: {} curve(s).", curves.len());
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            runner::validate_job(&job)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Models => {
            let water = WaterDispersion::new();
            let (min, max) = water.wavelength_range();
            println!("Scattering models:");
            println!();
            println!("  geometric — Descartes ray optics; no size parameter");
            println!("  young     — ray interference, supernumerary fringes");
            println!("  airy      — stationary-phase diffraction near the rainbow angle");
            println!("  mie       — exact multipole series, optional Debye decomposition");
            println!();
            println!(
                "Water dispersion table: {:.0}-{:.0} nm (Lynch & Livingston)",
                min * 1e9,
                max * 1e9
            );
            Ok(())
        }
    }
}
