use crate::common::*;
use crate::simulate::*;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct SimArgsCli {
    /// number of genes
    #[arg(short = 'g', long, default_value_t = 100)]
    genes: usize,

    /// number of cells
    #[arg(short = 'c', long, default_value_t = 300)]
    cells: usize,

    /// number of clusters
    #[arg(short = 'k', long, default_value_t = 3)]
    clusters: usize,

    /// number of planted receptor-ligand interactions
    #[arg(short = 'i', long, default_value_t = 5)]
    interactions: usize,

    /// background Poisson rate
    #[arg(short, long, default_value_t = 1.0)]
    depth: f32,

    /// rate multiplier of planted genes in their cluster
    #[arg(long, default_value_t = 5.0)]
    signal: f32,

    /// random seed
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// Output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub fn run_sim(args: &SimArgsCli) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let sim = generate_interaction_data(&SimArgs {
        genes: args.genes,
        cells: args.cells,
        clusters: args.clusters,
        interactions: args.interactions,
        depth: args.depth,
        signal: args.signal,
        rseed: args.rseed,
    })?;

    for file in sim.write(&args.out)? {
        info!("wrote {}", file);
    }
    Ok(())
}
