use crate::catalog::*;
use crate::common::*;
use crate::permutation::PermutationOut;

use matrix_util::common_io::{mkdir, open_buf_writer};
use std::io::Write;

/// Leading columns of every output table
pub const META_COLUMNS: [&str; 11] = [
    "id_interaction",
    "receptor",
    "ligand",
    "genes_1",
    "genes_2",
    "is_complex_1",
    "is_complex_2",
    "secreted_1",
    "secreted_2",
    "source",
    "gene_interaction",
];

pub const TABLE_NAMES: [&str; 5] = [
    "pvalues",
    "means",
    "significant_means",
    "activation",
    "percent_pvalues",
];

fn interaction_metadata(x: &Interaction) -> Vec<Box<str>> {
    vec![
        x.id.clone(),
        x.partner_1.name.clone(),
        x.partner_2.name.clone(),
        x.partner_1.genes.join(";").into(),
        x.partner_2.genes.join(";").into(),
        x.partner_1.is_complex.to_string().into(),
        x.partner_2.is_complex.to_string().into(),
        x.partner_1.secreted.to_string().into(),
        x.partner_2.secreted.to_string().into(),
        x.source.clone(),
        x.gene_interaction().into(),
    ]
}

/// Means with NaN wherever the p-value exceeds `cutoff`. Masking an
/// already masked table again changes nothing.
pub fn mask_insignificant(means: &Mat, pvalues: &Mat, cutoff: f32) -> Mat {
    means.zip_map(pvalues, |m, p| if p > cutoff { f32::NAN } else { m })
}

/// p-values set to 1 wherever `gate` is 0
pub fn gate_pvalues(pvalues: &Mat, gate: &Mat) -> Mat {
    pvalues.zip_map(gate, |p, g| if g > 0.0 { p } else { 1.0 })
}

/// Interaction x cluster-pair tables sharing row metadata and column
/// names
pub struct InteractionTables {
    pub row_meta: Vec<Vec<Box<str>>>,
    pub pair_names: Vec<Box<str>>,
    pub pvalues: Mat,
    pub means: Mat,
    pub significant_means: Mat,
    pub activation: Mat,
    pub percent_pvalues: Mat,
}

impl InteractionTables {
    pub fn num_rows(&self) -> usize {
        self.row_meta.len()
    }

    pub fn table(&self, name: &str) -> Option<&Mat> {
        match name {
            "pvalues" => Some(&self.pvalues),
            "means" => Some(&self.means),
            "significant_means" => Some(&self.significant_means),
            "activation" => Some(&self.activation),
            "percent_pvalues" => Some(&self.percent_pvalues),
            _ => None,
        }
    }

    /// Write every table to `{prefix}.{table}.tsv[.gz]` and return the
    /// file names
    pub fn write(&self, prefix: &str, gzip: bool) -> anyhow::Result<Vec<String>> {
        mkdir(prefix)?;
        let ext = if gzip { "tsv.gz" } else { "tsv" };

        let mut files = Vec::with_capacity(TABLE_NAMES.len());
        for name in TABLE_NAMES {
            let file = format!("{}.{}.{}", prefix, name, ext);
            if let Some(values) = self.table(name) {
                self.write_table(values, &file)?;
                info!("wrote {}", file);
                files.push(file);
            }
        }
        Ok(files)
    }

    fn write_table(&self, values: &Mat, file: &str) -> anyhow::Result<()> {
        if values.nrows() != self.num_rows() || values.ncols() != self.pair_names.len() {
            anyhow::bail!(
                "{} x {} values for {} rows and {} columns",
                values.nrows(),
                values.ncols(),
                self.num_rows(),
                self.pair_names.len()
            );
        }

        let mut buf = open_buf_writer(file)?;

        let header: Vec<&str> = META_COLUMNS
            .iter()
            .copied()
            .chain(self.pair_names.iter().map(|x| x.as_ref()))
            .collect();
        writeln!(buf, "{}", header.join("\t"))?;

        for (meta, row) in self.row_meta.iter().zip(values.row_iter()) {
            let line: Vec<String> = meta
                .iter()
                .map(|x| x.to_string())
                .chain(row.iter().map(|x| x.to_string()))
                .collect();
            writeln!(buf, "{}", line.join("\t"))?;
        }

        buf.flush()?;
        Ok(())
    }
}

/// Join the permutation outcome with the catalog metadata
///
/// * `catalog` - the filtered catalog, in scoring order
/// * `perm` - permutation outcome over the same catalog
/// * `pvalue_cutoff` - means with larger p-values are masked
pub fn assemble_results(
    catalog: &InteractionCatalog,
    perm: &PermutationOut,
    pvalue_cutoff: f32,
) -> anyhow::Result<InteractionTables> {
    if catalog.len() != perm.means.nrows() {
        anyhow::bail!(
            "{} catalog entries but {} scored rows",
            catalog.len(),
            perm.means.nrows()
        );
    }

    let significant_means = mask_insignificant(&perm.means, &perm.pvalues, pvalue_cutoff);
    let percent_pvalues = gate_pvalues(&perm.pvalues, &perm.prefilter_activation);

    let n_significant = significant_means.iter().filter(|x| !x.is_nan()).count();
    info!(
        "{} of {} interaction/pair cells with p <= {}",
        n_significant,
        significant_means.len(),
        pvalue_cutoff
    );

    Ok(InteractionTables {
        row_meta: catalog.iter().map(interaction_metadata).collect(),
        pair_names: perm.pairs.column_names(),
        pvalues: perm.pvalues.clone(),
        means: perm.means.clone(),
        significant_means,
        activation: perm.activation.clone(),
        percent_pvalues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_twice_is_masking_once() {
        let means = Mat::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 3.0]);
        let pvalues = Mat::from_row_slice(2, 2, &[0.01, 0.5, 1.0, 0.05]);

        let once = mask_insignificant(&means, &pvalues, 0.05);
        let twice = mask_insignificant(&once, &pvalues, 0.05);

        assert_eq!(once[(0, 0)], 1.0);
        assert!(once[(0, 1)].is_nan());
        assert!(once[(1, 0)].is_nan());
        assert_eq!(once[(1, 1)], 3.0);

        for (a, b) in once.iter().zip(twice.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn write_creates_the_output_directory() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let prefix = dir.path().join("nested/deeper/run");
        let prefix = prefix.to_string_lossy();

        let tables = InteractionTables {
            row_meta: vec![],
            pair_names: vec!["A - A".into()],
            pvalues: Mat::zeros(0, 1),
            means: Mat::zeros(0, 1),
            significant_means: Mat::zeros(0, 1),
            activation: Mat::zeros(0, 1),
            percent_pvalues: Mat::zeros(0, 1),
        };

        let files = tables.write(&prefix, false)?;
        assert_eq!(files.len(), TABLE_NAMES.len());
        assert!(files.iter().all(|f| std::path::Path::new(f).is_file()));
        Ok(())
    }

    #[test]
    fn gated_pvalues() {
        let pvalues = Mat::from_row_slice(1, 3, &[0.01, 0.2, 0.03]);
        let gate = Mat::from_row_slice(1, 3, &[1.0, 0.0, 0.0]);
        let gated = gate_pvalues(&pvalues, &gate);
        assert_eq!(gated, Mat::from_row_slice(1, 3, &[0.01, 1.0, 1.0]));
    }

    #[test]
    fn metadata_columns() {
        let x = Interaction::new(
            "I",
            Partner::complex("Cplx", &["a", "b"], 2),
            Partner::single("L").with_secretion(true),
        );
        let meta = interaction_metadata(&x);
        assert_eq!(meta.len(), META_COLUMNS.len());
        assert_eq!(meta[3].as_ref(), "a;b");
        assert_eq!(meta[5].as_ref(), "true");
        assert_eq!(meta[8].as_ref(), "true");
        assert_eq!(meta[10].as_ref(), "a;b_L");
    }
}
