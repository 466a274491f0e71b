use crate::catalog::InteractionCatalog;
use crate::catalog_filter::*;
use crate::cluster_labels::*;
use crate::common::*;
use crate::expression::ExpressionMatrix;
use crate::permutation::*;
use crate::results::*;
use crate::scoring::InteractionScorer;

use clap::Parser;
use matrix_util::membership::Membership;
use rayon::ThreadPoolBuilder;

#[derive(Parser, Debug, Clone)]
pub struct LentilArgs {
    /// expression counts, genes x cells: a dense table (`.tsv`,
    /// `.csv`, optionally gzipped) whose header line lists the cells,
    /// or a MatrixMarket `.mtx[.gz]` file with `--genes` and `--cells`
    #[arg(long, short = 'c', required = true)]
    counts: Box<str>,

    /// gene names of a MatrixMarket counts file, one per line
    #[arg(long)]
    genes: Option<Box<str>>,

    /// cell names of a MatrixMarket counts file, one per line
    #[arg(long)]
    cells: Option<Box<str>>,

    /// cell metadata mapping cell names to cluster labels
    #[arg(long, short = 'm', required = true)]
    meta: Box<str>,

    /// column of cell names in the metadata (0-based)
    #[arg(long, default_value_t = 0)]
    meta_cell_column: usize,

    /// column of cluster labels in the metadata (0-based)
    #[arg(long, default_value_t = 1)]
    meta_label_column: usize,

    /// the metadata file has no header line
    #[arg(long, default_value_t = false)]
    meta_no_header: bool,

    /// receptor-ligand interaction catalog with a header line
    #[arg(long, short = 'k', required = true)]
    catalog: Box<str>,

    /// number of label permutations
    #[arg(long, short = 'n', default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// fraction of cells expressing a partner to call it active
    #[arg(long, short = 't', default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,

    /// fraction of cells both partners need in the percent-gated
    /// p-value table
    #[arg(long, default_value_t = DEFAULT_PREFILTER_THRESHOLD)]
    prefilter_threshold: f32,

    /// means with p-values above this cutoff are masked
    #[arg(long, alias = "min-significant-mean", default_value_t = 0.05)]
    pvalue_cutoff: f32,

    /// random seed
    #[arg(long, short = 's', default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// maximum number of threads
    #[arg(long, default_value_t = 16)]
    pub max_threads: usize,

    /// write plain `.tsv` instead of `.tsv.gz`
    #[arg(long, default_value_t = false)]
    no_gzip: bool,

    /// output file prefix
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

impl LentilArgs {
    pub fn permutation_args(&self) -> PermutationArgs {
        PermutationArgs {
            iterations: self.iterations,
            seed: self.seed,
            threshold: self.threshold,
            prefilter_threshold: self.prefilter_threshold,
        }
    }

    /// Reject bad parameters before reading any data
    pub fn validate(&self) -> anyhow::Result<()> {
        self.permutation_args().validate()?;
        check_fraction("p-value cutoff", self.pvalue_cutoff)?;
        if self.max_threads == 0 {
            anyhow::bail!("need at least one thread");
        }
        Ok(())
    }
}

/// Load the inputs, filter, permute and write the result tables
pub fn run_lentil(args: &LentilArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    args.validate()?;

    let max_threads = num_cpus::get().min(args.max_threads);
    ThreadPoolBuilder::new()
        .num_threads(max_threads)
        .build_global()?;
    info!("will use {} threads", rayon::current_num_threads());

    let expr = ExpressionMatrix::from_file(
        &args.counts,
        args.genes.as_deref(),
        args.cells.as_deref(),
    )?;
    if expr.is_empty() {
        anyhow::bail!("no data in {}", args.counts);
    }
    info!(
        "expression: {} genes x {} cells",
        expr.num_genes(),
        expr.num_cells()
    );

    let meta = Membership::from_file(
        &args.meta,
        args.meta_cell_column,
        args.meta_label_column,
        !args.meta_no_header,
    )?;

    let catalog = InteractionCatalog::from_file(&args.catalog)?;

    let AlignedData { expression, labels } = ClusterLabels::align(&expr, &meta)?;

    let FilteredData {
        catalog,
        expression,
        stats: _,
    } = filter_catalog(&catalog, &expression)?;

    let scorer = InteractionScorer::new(&catalog, &expression)?;

    let perm = run_permutation_test(
        &scorer,
        expression.counts(),
        &labels,
        &args.permutation_args(),
    )?;

    let tables = assemble_results(&catalog, &perm, args.pvalue_cutoff)?;

    tables.write(&args.out, !args.no_gzip)?;

    let params = serde_json::json!({
        "command": "test",
        "counts": args.counts,
        "genes": args.genes,
        "cells": args.cells,
        "meta": args.meta,
        "catalog": args.catalog,
        "iterations": args.iterations,
        "threshold": args.threshold,
        "prefilter_threshold": args.prefilter_threshold,
        "pvalue_cutoff": args.pvalue_cutoff,
        "seed": args.seed,
        "num_interactions": catalog.len(),
        "num_genes": expression.num_genes(),
        "num_cells": expression.num_cells(),
        "clusters": labels.names(),
        "cluster_sizes": labels.cluster_sizes(),
        "num_cluster_pairs": perm.pairs.len(),
    });

    let param_file = format!("{}.parameters.json", args.out);
    std::fs::write(&param_file, serde_json::to_string_pretty(&params)?)?;
    info!("wrote {}", param_file);

    info!("Done");
    Ok(())
}
