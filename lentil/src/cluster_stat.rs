use crate::cluster_labels::ClusterLabels;
use crate::common::*;

use std::sync::OnceLock;

/// Per-cluster summary of an expression matrix under one label
/// assignment. Columns are clusters, rows are genes.
///
/// Means and fractions of expressing cells are computed on first use
/// and kept for the lifetime of the stat. A cluster without cells has
/// NaN in every row.
pub struct ClusterStat<'a> {
    counts: &'a Mat,
    labels: &'a ClusterLabels,
    size_k: Vec<usize>,
    mean_dk: OnceLock<Mat>,
    percent_dk: OnceLock<Mat>,
}

impl<'a> ClusterStat<'a> {
    pub fn new(counts: &'a Mat, labels: &'a ClusterLabels) -> anyhow::Result<Self> {
        if counts.ncols() != labels.num_cells() {
            anyhow::bail!(
                "{} cells in the matrix, but {} labels",
                counts.ncols(),
                labels.num_cells()
            );
        }
        Ok(Self {
            counts,
            labels,
            size_k: labels.cluster_sizes(),
            mean_dk: OnceLock::new(),
            percent_dk: OnceLock::new(),
        })
    }

    pub fn num_genes(&self) -> usize {
        self.counts.nrows()
    }

    pub fn num_clusters(&self) -> usize {
        self.size_k.len()
    }

    pub fn cluster_sizes(&self) -> &[usize] {
        &self.size_k
    }

    /// gene x cluster mean expression
    pub fn means(&self) -> &Mat {
        self.mean_dk
            .get_or_init(|| self.collapse(|y_j, mut s_k| s_k += &y_j))
    }

    /// gene x cluster fraction of cells with expression above zero
    pub fn percents(&self) -> &Mat {
        self.percent_dk.get_or_init(|| {
            self.collapse(|y_j, mut s_k| {
                s_k.iter_mut()
                    .zip(y_j.iter())
                    .for_each(|(s, &y)| *s += if y > 0.0 { 1.0 } else { 0.0 })
            })
        })
    }

    /// Accumulate each cell column into its cluster column, then divide
    /// by cluster size
    fn collapse<F>(&self, accumulate: F) -> Mat
    where
        F: Fn(
            nalgebra::DVectorView<'_, f32>,
            nalgebra::DVectorViewMut<'_, f32>,
        ),
    {
        let mut stat_dk = Mat::zeros(self.num_genes(), self.num_clusters());

        for (j, &k) in self.labels.membership().iter().enumerate() {
            accumulate(self.counts.column(j), stat_dk.column_mut(k));
        }

        for (k, &n) in self.size_k.iter().enumerate() {
            let mut s_k = stat_dk.column_mut(k);
            if n > 0 {
                s_k /= n as f32;
            } else {
                s_k.fill(f32::NAN);
            }
        }
        stat_dk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(membership: Vec<usize>, n: usize) -> ClusterLabels {
        let names = (0..n).map(|k| format!("k{}", k).into()).collect();
        ClusterLabels::new(names, membership).unwrap()
    }

    #[test]
    fn means_and_percents() -> anyhow::Result<()> {
        // 2 genes x 5 cells
        let counts = Mat::from_row_slice(2, 5, &[1., 3., 0., 0., 4., 0., 2., 2., 0., 0.]);
        let lab = labels(vec![0, 0, 1, 1, 2], 4);
        let stat = ClusterStat::new(&counts, &lab)?;

        let mu = stat.means();
        approx::assert_abs_diff_eq!(mu[(0, 0)], 2.0);
        approx::assert_abs_diff_eq!(mu[(1, 1)], 1.0);
        approx::assert_abs_diff_eq!(mu[(0, 2)], 4.0);
        assert!(mu[(0, 3)].is_nan());

        let pct = stat.percents();
        approx::assert_abs_diff_eq!(pct[(0, 0)], 1.0);
        approx::assert_abs_diff_eq!(pct[(1, 0)], 0.5);
        approx::assert_abs_diff_eq!(pct[(0, 1)], 0.0);
        assert!(pct[(1, 3)].is_nan());

        assert_eq!(stat.cluster_sizes(), &[2, 2, 1, 0]);
        Ok(())
    }

    #[test]
    fn mismatched_labels() {
        let counts = Mat::zeros(2, 3);
        let lab = labels(vec![0, 1], 2);
        assert!(ClusterStat::new(&counts, &lab).is_err());
    }
}
