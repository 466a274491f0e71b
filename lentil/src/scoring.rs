//! Interaction scores per (interaction, sender -> receiver) pair.
//!
//! The receptor side (partner 1) is read in the receiving cluster and
//! the ligand side (partner 2) in the sending cluster. Missing (NaN)
//! aggregates never activate anything.

use crate::catalog::*;
use crate::cluster_pairs::ClusterPairs;
use crate::cluster_stat::ClusterStat;
use crate::common::*;
use crate::expression::ExpressionMatrix;
use crate::result_matrix::ResultMatrix;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScoreMode {
    /// min(receptor mean, ligand mean); a complex takes the minimum
    /// over its subunits
    Mean,
    /// 1 if both sides have enough subunits expressed in at least
    /// `threshold` of the cells, else 0
    Percent { threshold: f32 },
}

/// Matrix rows of a partner's genes
#[derive(Clone, Debug)]
struct PartnerRows {
    rows: Vec<usize>,
    required: usize,
}

impl PartnerRows {
    fn resolve(partner: &Partner, expr: &ExpressionMatrix) -> anyhow::Result<Self> {
        let rows = partner
            .genes
            .iter()
            .map(|g| {
                expr.gene_position(g)
                    .ok_or(anyhow::anyhow!("gene {} is not in the expression matrix", g))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if rows.is_empty() {
            anyhow::bail!("partner {} has no gene", partner.name);
        }

        Ok(Self {
            required: partner.required_subunits.clamp(1, rows.len()),
            rows,
        })
    }

    /// Minimum over subunits; NaN if any subunit is NaN
    fn min_over(&self, stat_dk: &Mat, k: usize) -> f32 {
        self.rows.iter().fold(f32::INFINITY, |acc, &g| {
            let x = stat_dk[(g, k)];
            if acc.is_nan() || x.is_nan() {
                f32::NAN
            } else {
                acc.min(x)
            }
        })
    }

    /// At least `required` subunits reach the threshold
    fn is_active(&self, pct_dk: &Mat, k: usize, threshold: f32) -> bool {
        let npass = self
            .rows
            .iter()
            .filter(|&&g| pct_dk[(g, k)] >= threshold)
            .count();
        npass >= self.required
    }
}

/// Scores every catalog entry against every cluster pair
#[derive(Clone, Debug)]
pub struct InteractionScorer {
    receptors: Vec<PartnerRows>,
    ligands: Vec<PartnerRows>,
}

impl InteractionScorer {
    /// Every gene of the catalog must be a row of `expr`
    pub fn new(catalog: &InteractionCatalog, expr: &ExpressionMatrix) -> anyhow::Result<Self> {
        let mut receptors = Vec::with_capacity(catalog.len());
        let mut ligands = Vec::with_capacity(catalog.len());
        for x in catalog.iter() {
            receptors.push(PartnerRows::resolve(&x.partner_1, expr)?);
            ligands.push(PartnerRows::resolve(&x.partner_2, expr)?);
        }
        Ok(Self {
            receptors,
            ligands,
        })
    }

    pub fn num_interactions(&self) -> usize {
        self.receptors.len()
    }

    /// interaction x cluster aggregate of each side
    fn partner_means(side: &[PartnerRows], mean_dk: &Mat) -> Mat {
        Mat::from_fn(side.len(), mean_dk.ncols(), |i, k| {
            side[i].min_over(mean_dk, k)
        })
    }

    fn partner_activation(side: &[PartnerRows], pct_dk: &Mat, threshold: f32) -> Mat {
        Mat::from_fn(side.len(), pct_dk.ncols(), |i, k| {
            if side[i].is_active(pct_dk, k, threshold) {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Combine receptor (read in the receiver) and ligand (read in the
    /// sender) aggregates into an interaction x pair matrix
    fn combine<F>(receptor_ik: &Mat, ligand_ik: &Mat, pairs: &ClusterPairs, op: F) -> Mat
    where
        F: Fn(f32, f32) -> f32,
    {
        let mut score_ip = Mat::zeros(receptor_ik.nrows(), pairs.len());
        for (p, &(sender, receiver)) in pairs.iter().enumerate() {
            let mut s_p = score_ip.column_mut(p);
            s_p.iter_mut()
                .zip(receptor_ik.column(receiver).iter())
                .zip(ligand_ik.column(sender).iter())
                .for_each(|((s, &r), &l)| *s = op(r, l));
        }
        score_ip
    }

    /// Mean-mode scores. A NaN aggregate on either side gives 0.
    pub fn mean_scores(&self, stat: &ClusterStat, pairs: &ClusterPairs) -> Mat {
        let mean_dk = stat.means();
        let receptor_ik = Self::partner_means(&self.receptors, mean_dk);
        let ligand_ik = Self::partner_means(&self.ligands, mean_dk);
        Self::combine(&receptor_ik, &ligand_ik, pairs, |r, l| {
            if r.is_nan() || l.is_nan() {
                0.0
            } else {
                r.min(l)
            }
        })
    }

    /// Percent-mode activation (0 or 1)
    pub fn percent_scores(&self, stat: &ClusterStat, pairs: &ClusterPairs, threshold: f32) -> Mat {
        let pct_dk = stat.percents();
        let receptor_ik = Self::partner_activation(&self.receptors, pct_dk, threshold);
        let ligand_ik = Self::partner_activation(&self.ligands, pct_dk, threshold);
        Self::combine(&receptor_ik, &ligand_ik, pairs, |r, l| r * l)
    }

    pub fn scores(&self, stat: &ClusterStat, pairs: &ClusterPairs, mode: ScoreMode) -> Mat {
        match mode {
            ScoreMode::Mean => self.mean_scores(stat, pairs),
            ScoreMode::Percent { threshold } => self.percent_scores(stat, pairs, threshold),
        }
    }

    /// Score one (interaction, pair) cell; indexes outside the scorer
    /// or the clusters of `stat` are an error
    pub fn score(
        &self,
        stat: &ClusterStat,
        interaction: usize,
        sender: usize,
        receiver: usize,
        mode: ScoreMode,
    ) -> anyhow::Result<f32> {
        let (rec, lig) = self
            .receptors
            .get(interaction)
            .zip(self.ligands.get(interaction))
            .ok_or(anyhow::anyhow!(
                "interaction {} is outside the {} scored",
                interaction,
                self.num_interactions()
            ))?;

        let nk = stat.num_clusters();
        if sender >= nk || receiver >= nk {
            anyhow::bail!(
                "pair ({}, {}) is outside the {} clusters",
                sender,
                receiver,
                nk
            );
        }

        let score = match mode {
            ScoreMode::Mean => {
                let mean_dk = stat.means();
                let r = rec.min_over(mean_dk, receiver);
                let l = lig.min_over(mean_dk, sender);
                if r.is_nan() || l.is_nan() {
                    0.0
                } else {
                    r.min(l)
                }
            }
            ScoreMode::Percent { threshold } => {
                let pct_dk = stat.percents();
                let active = rec.is_active(pct_dk, receiver, threshold)
                    && lig.is_active(pct_dk, sender, threshold);
                if active {
                    1.0
                } else {
                    0.0
                }
            }
        };
        Ok(score)
    }

    /// Evaluate every cell into a fresh write-once result
    pub fn score_into(
        &self,
        stat: &ClusterStat,
        pairs: &ClusterPairs,
        mode: ScoreMode,
    ) -> anyhow::Result<ResultMatrix<f32>> {
        let score_ip = self.scores(stat, pairs, mode);
        let mut result = ResultMatrix::new(self.num_interactions(), pairs.len());
        for (p, _) in pairs.iter().enumerate() {
            for i in 0..self.num_interactions() {
                result.set(i, p, score_ip[(i, p)])?;
            }
        }
        Ok(result)
    }
}
