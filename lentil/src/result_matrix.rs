//! Interaction x cluster-pair result containers

use crate::common::*;
use nalgebra::DMatrix;

/// Write-once matrix. Every cell starts as "not evaluated" (`None`),
/// which is distinct from any valid value.
#[derive(Clone, Debug)]
pub struct ResultMatrix<T>
where
    T: nalgebra::Scalar + Copy,
{
    cells: DMatrix<Option<T>>,
}

impl<T> ResultMatrix<T>
where
    T: nalgebra::Scalar + Copy,
{
    pub fn new(num_interactions: usize, num_pairs: usize) -> Self {
        Self {
            cells: DMatrix::from_element(num_interactions, num_pairs, None),
        }
    }

    pub fn nrows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn get(&self, i: usize, p: usize) -> Option<T> {
        self.cells.get((i, p)).copied().flatten()
    }

    /// Write a cell; a second write to the same cell is an error
    pub fn set(&mut self, i: usize, p: usize, value: T) -> anyhow::Result<()> {
        let (nrows, ncols) = self.cells.shape();
        let cell = self.cells.get_mut((i, p)).ok_or(anyhow::anyhow!(
            "({}, {}) is outside the {} x {} result",
            i,
            p,
            nrows,
            ncols
        ))?;

        if cell.is_some() {
            anyhow::bail!("result cell ({}, {}) was already written", i, p);
        }
        *cell = Some(value);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|x| x.is_some())
    }

    /// Unwrap into a plain matrix once every cell has a value
    pub fn finish(self) -> anyhow::Result<DMatrix<T>> {
        let (nrows, ncols) = self.cells.shape();
        let mut values = Vec::with_capacity(nrows * ncols);
        for (idx, x) in self.cells.iter().enumerate() {
            match x {
                Some(v) => values.push(*v),
                None => anyhow::bail!(
                    "result cell ({}, {}) was never evaluated",
                    idx % nrows.max(1),
                    idx / nrows.max(1)
                ),
            }
        }
        Ok(DMatrix::from_vec(nrows, ncols, values))
    }
}

/// How often a shuffled score reached the observed one, per cell
#[derive(Clone, Debug)]
pub struct ExceedanceCounter {
    count: CountMat,
    iterations: usize,
}

impl ExceedanceCounter {
    pub fn zeros(num_interactions: usize, num_pairs: usize) -> Self {
        Self {
            count: CountMat::zeros(num_interactions, num_pairs),
            iterations: 0,
        }
    }

    /// Count one iteration: +1 where `shuffled >= observed`. A NaN on
    /// either side never counts.
    pub fn add(&mut self, observed: &Mat, shuffled: &Mat) {
        debug_assert_eq!(observed.shape(), self.count.shape());
        debug_assert_eq!(shuffled.shape(), self.count.shape());

        self.count
            .iter_mut()
            .zip(observed.iter().zip(shuffled.iter()))
            .for_each(|(c, (&r, &s))| {
                if s >= r {
                    *c += 1;
                }
            });
        self.iterations += 1;
    }

    /// Sum two partial counters over disjoint sets of iterations
    pub fn merge(mut self, other: Self) -> Self {
        self.count += other.count;
        self.iterations += other.iterations;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn counts(&self) -> &CountMat {
        &self.count
    }

    /// count / iterations
    pub fn pvalues(&self) -> anyhow::Result<Mat> {
        if self.iterations == 0 {
            anyhow::bail!("no permutation was counted");
        }
        let n = self.iterations as f32;
        Ok(self.count.map(|c| c as f32 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_once() -> anyhow::Result<()> {
        let mut res = ResultMatrix::<f32>::new(2, 3);
        assert_eq!(res.get(0, 0), None);
        assert!(!res.is_complete());

        res.set(0, 0, 0.0)?;
        assert_eq!(res.get(0, 0), Some(0.0));
        assert!(res.set(0, 0, 1.0).is_err());
        assert!(res.set(2, 0, 1.0).is_err());

        let partial = res.clone();
        assert!(partial.finish().is_err());

        for i in 0..2 {
            for p in 0..3 {
                if (i, p) != (0, 0) {
                    res.set(i, p, (i * 3 + p) as f32)?;
                }
            }
        }
        let mat = res.finish()?;
        assert_eq!(mat[(1, 2)], 5.0);
        assert_eq!(mat[(0, 0)], 0.0);
        Ok(())
    }

    #[test]
    fn counter_and_pvalues() -> anyhow::Result<()> {
        let observed = Mat::from_row_slice(1, 3, &[1.0, 0.0, 2.0]);
        let mut left = ExceedanceCounter::zeros(1, 3);
        let mut right = ExceedanceCounter::zeros(1, 3);

        left.add(&observed, &Mat::from_row_slice(1, 3, &[1.0, 0.0, 1.0]));
        left.add(&observed, &Mat::from_row_slice(1, 3, &[0.5, f32::NAN, 3.0]));
        right.add(&observed, &Mat::from_row_slice(1, 3, &[2.0, 0.0, 0.0]));
        right.add(&observed, &Mat::from_row_slice(1, 3, &[0.0, 0.0, 0.0]));

        let total = left.merge(right);
        assert_eq!(total.iterations(), 4);

        let pv = total.pvalues()?;
        approx::assert_abs_diff_eq!(pv[(0, 0)], 0.5);
        approx::assert_abs_diff_eq!(pv[(0, 1)], 0.75);
        approx::assert_abs_diff_eq!(pv[(0, 2)], 0.25);
        assert!(ExceedanceCounter::zeros(1, 1).pvalues().is_err());
        Ok(())
    }
}
