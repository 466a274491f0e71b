use crate::common::*;
use crate::expression::ExpressionMatrix;

use matrix_util::membership::Membership;
use matrix_util::utils::{count_membership, shuffle_membership};
use rand::Rng;

/// Cluster assignment of the matrix columns
///
/// `membership[j]` indexes into `names` for cell `j`. Clusters may be
/// empty when metadata names a label none of the matrix cells carry.
#[derive(Clone, Debug)]
pub struct ClusterLabels {
    names: Vec<Box<str>>,
    membership: Vec<usize>,
}

pub struct AlignedData {
    pub expression: ExpressionMatrix,
    pub labels: ClusterLabels,
}

impl ClusterLabels {
    pub fn new(names: Vec<Box<str>>, membership: Vec<usize>) -> anyhow::Result<Self> {
        if let Some(&k) = membership.iter().find(|&&k| k >= names.len()) {
            anyhow::bail!("cluster index {} out of {} clusters", k, names.len());
        }
        Ok(Self { names, membership })
    }

    /// Align cell metadata with the matrix columns. Cells without a
    /// label are dropped from the matrix. Cluster names keep the order
    /// of their first appearance in the metadata.
    pub fn align(expr: &ExpressionMatrix, meta: &Membership) -> anyhow::Result<AlignedData> {
        let names = meta.groups_in_order();
        let name_index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(k, x)| (x.as_ref(), k))
            .collect();

        let (matched, stats) = meta.match_keys(expr.cells());

        if stats.matched == 0 {
            anyhow::bail!(
                "none of the {} matrix cells appear in the cell metadata",
                expr.num_cells()
            );
        }

        if stats.unmatched > 0 {
            warn!(
                "{} of {} cells have no cluster label and are left out",
                stats.unmatched,
                stats.total()
            );
        }

        let mut cells = Vec::with_capacity(stats.matched);
        let mut membership = Vec::with_capacity(stats.matched);
        for (j, g) in matched.iter().enumerate() {
            if let Some(k) = g.as_deref().and_then(|g| name_index.get(g)) {
                cells.push(j);
                membership.push(*k);
            }
        }

        let expression = if cells.len() < expr.num_cells() {
            expr.select_cells(&cells)
        } else {
            expr.clone()
        };

        let labels = Self::new(names, membership)?;

        for (name, size) in labels.names.iter().zip(labels.cluster_sizes()) {
            if size == 0 {
                warn!("cluster {} has no cell in the expression matrix", name);
            } else {
                debug!("cluster {}: {} cells", name, size);
            }
        }
        info!(
            "{} labelled cells in {} clusters",
            labels.num_cells(),
            labels.num_clusters()
        );

        Ok(AlignedData { expression, labels })
    }

    pub fn names(&self) -> &[Box<str>] {
        &self.names
    }

    pub fn membership(&self) -> &[usize] {
        &self.membership
    }

    pub fn num_clusters(&self) -> usize {
        self.names.len()
    }

    pub fn num_cells(&self) -> usize {
        self.membership.len()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        count_membership(&self.membership, self.names.len())
    }

    /// A random permutation of the labels over the same cells
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut membership = self.membership.clone();
        shuffle_membership(&mut membership, rng);
        Self {
            names: self.names.clone(),
            membership,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn boxed(xs: &[&str]) -> Vec<Box<str>> {
        xs.iter().map(|&x| x.into()).collect()
    }

    fn meta_of(pairs: &[(&str, &str)]) -> Membership {
        Membership::from_pairs(pairs.iter().map(|&(k, v)| (k.into(), v.into())))
    }

    #[test]
    fn align_with_metadata() -> anyhow::Result<()> {
        let expr = ExpressionMatrix::new(
            boxed(&["g"]),
            boxed(&["c0", "c1", "c2", "c3"]),
            Mat::from_row_slice(1, 4, &[1., 2., 3., 4.]),
        )?;

        let meta = meta_of(&[("c3", "B"), ("c0", "A"), ("x9", "C"), ("c1", "B")]);

        let AlignedData { expression, labels } = ClusterLabels::align(&expr, &meta)?;

        assert_eq!(labels.names().to_vec(), boxed(&["B", "A", "C"]));
        assert_eq!(expression.cells().to_vec(), boxed(&["c0", "c1", "c3"]));
        assert_eq!(labels.membership().to_vec(), vec![1, 0, 0]);
        assert_eq!(labels.cluster_sizes(), vec![2, 1, 0]);
        assert_eq!(expression.counts()[(0, 2)], 4.);
        Ok(())
    }

    #[test]
    fn no_labelled_cell() -> anyhow::Result<()> {
        let expr = ExpressionMatrix::new(
            boxed(&["g"]),
            boxed(&["c0"]),
            Mat::from_row_slice(1, 1, &[1.]),
        )?;
        let meta = meta_of(&[("zz", "A")]);
        assert!(ClusterLabels::align(&expr, &meta).is_err());
        Ok(())
    }

    #[test]
    fn shuffle_is_a_permutation() -> anyhow::Result<()> {
        let labels = ClusterLabels::new(boxed(&["a", "b", "c"]), vec![0, 0, 1, 2, 2, 2, 1])?;
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let shuffled = labels.shuffled(&mut rng);
            assert_eq!(shuffled.cluster_sizes(), labels.cluster_sizes());
            assert_eq!(shuffled.num_cells(), labels.num_cells());
        }
        Ok(())
    }
}
