//! Cluster-label permutation test.
//!
//! 1. Score the real labels: mean scores `R` and percent activation.
//! 2. Shuffle the labels `iterations` times; after each shuffle
//!    recompute cluster means and mean scores `S`, and count
//!    `S >= R` per cell.
//! 3. p-value = count / iterations.
//!
//! One generator, seeded once, draws a seed for every iteration up
//! front, so the outcome does not depend on the number of threads.

use crate::cluster_labels::ClusterLabels;
use crate::cluster_pairs::ClusterPairs;
use crate::cluster_stat::ClusterStat;
use crate::common::*;
use crate::result_matrix::ExceedanceCounter;
use crate::scoring::{InteractionScorer, ScoreMode};

use indicatif::ParallelProgressIterator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_SEED: u64 = 123;
pub const DEFAULT_THRESHOLD: f32 = 0.1;
pub const DEFAULT_PREFILTER_THRESHOLD: f32 = 0.2;

#[derive(Clone, Debug)]
pub struct PermutationArgs {
    pub iterations: usize,
    pub seed: u64,
    /// percent-mode activation threshold
    pub threshold: f32,
    /// fraction of expressing cells both partners need before a
    /// p-value counts in the percent-gated table
    pub prefilter_threshold: f32,
}

impl Default for PermutationArgs {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            threshold: DEFAULT_THRESHOLD,
            prefilter_threshold: DEFAULT_PREFILTER_THRESHOLD,
        }
    }
}

pub(crate) fn check_fraction(name: &str, x: f32) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&x) {
        anyhow::bail!("{} should be in [0, 1], but got {}", name, x);
    }
    Ok(())
}

impl PermutationArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.iterations == 0 {
            anyhow::bail!("the number of iterations should be positive");
        }
        check_fraction("threshold", self.threshold)?;
        check_fraction("prefilter threshold", self.prefilter_threshold)?;
        Ok(())
    }
}

pub struct PermutationOut {
    pub pairs: ClusterPairs,
    /// real mean-mode scores (interaction x pair)
    pub means: Mat,
    /// real percent-mode activation at `threshold`
    pub activation: Mat,
    /// real percent-mode activation at `prefilter_threshold`
    pub prefilter_activation: Mat,
    pub pvalues: Mat,
    pub iterations: usize,
}

/// Run the permutation test over every interaction the scorer knows
/// and every ordered pair of the label clusters
///
/// * `scorer` - interactions resolved against the rows of `counts`
/// * `counts` - gene x cell expression
/// * `labels` - cluster of each column of `counts`
pub fn run_permutation_test(
    scorer: &InteractionScorer,
    counts: &Mat,
    labels: &ClusterLabels,
    args: &PermutationArgs,
) -> anyhow::Result<PermutationOut> {
    args.validate()?;

    let pairs = ClusterPairs::new(labels.names());
    let n_interactions = scorer.num_interactions();
    let n_pairs = pairs.len();

    info!(
        "{} interactions x {} cluster pairs",
        n_interactions, n_pairs
    );

    // 1. real pass
    let real_stat = ClusterStat::new(counts, labels)?;

    let means = scorer
        .score_into(&real_stat, &pairs, ScoreMode::Mean)?
        .finish()?;

    let activation = scorer
        .score_into(
            &real_stat,
            &pairs,
            ScoreMode::Percent {
                threshold: args.threshold,
            },
        )?
        .finish()?;

    let prefilter_activation =
        scorer.percent_scores(&real_stat, &pairs, args.prefilter_threshold);

    // 2. null generation
    let mut rng = StdRng::seed_from_u64(args.seed);
    let seeds: Vec<u64> = (0..args.iterations).map(|_| rng.random()).collect();

    let counter = if n_interactions == 0 || n_pairs == 0 {
        info!("nothing to permute");
        let mut counter = ExceedanceCounter::zeros(n_interactions, n_pairs);
        for _ in seeds.iter() {
            counter.add(&means, &means);
        }
        counter
    } else {
        info!("shuffling cluster labels {} times", seeds.len());
        let zeros = || ExceedanceCounter::zeros(n_interactions, n_pairs);

        seeds
            .par_iter()
            .progress_count(seeds.len() as u64)
            .try_fold(zeros, |mut counter, &seed| -> anyhow::Result<_> {
                let mut rng = StdRng::seed_from_u64(seed);
                let shuffled = labels.shuffled(&mut rng);
                let stat = ClusterStat::new(counts, &shuffled)?;
                counter.add(&means, &scorer.mean_scores(&stat, &pairs));
                Ok(counter)
            })
            .try_reduce(zeros, |a, b| Ok(a.merge(b)))?
    };

    // 3. derivation
    let pvalues = counter.pvalues()?;
    info!("done with {} permutations", counter.iterations());

    Ok(PermutationOut {
        pairs,
        means,
        activation,
        prefilter_activation,
        pvalues,
        iterations: counter.iterations(),
    })
}
