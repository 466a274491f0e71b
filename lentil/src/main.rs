use lentil::run_lentil::*;
use lentil::run_sim::*;

use clap::{Parser, Subcommand};

/// Ligand-receptor interactions between cell clusters, tested by
/// shuffling cluster labels
#[derive(Parser)]
#[command(name = "lentil", version, about, long_about)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Permutation test of receptor-ligand interactions over all
    /// ordered pairs of clusters
    Test(LentilArgs),
    /// Simulate counts, metadata and a catalog with planted interactions
    Simulate(SimArgsCli),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Test(args) => {
            run_lentil(args)?;
        }
        Commands::Simulate(args) => {
            run_sim(args)?;
        }
    }

    Ok(())
}
