use crate::common::*;

use matrix_util::common_io::{extension_without_gz, read_lines_of_words_delim, Delimiter};
use matrix_util::mtx_io::read_mtx_triplets;
use matrix_util::traits::{IoOps, MatWithNames};

/// Gene expression counts: genes (rows) x cells (columns) with names
#[derive(Clone, Debug)]
pub struct ExpressionMatrix {
    genes: Vec<Box<str>>,
    cells: Vec<Box<str>>,
    counts: Mat,
    gene_position: HashMap<Box<str>, usize>,
}

impl ExpressionMatrix {
    /// Build a named matrix. Values must be finite and non-negative.
    /// A repeated gene name keeps its first row.
    pub fn new(genes: Vec<Box<str>>, cells: Vec<Box<str>>, counts: Mat) -> anyhow::Result<Self> {
        if genes.len() != counts.nrows() || cells.len() != counts.ncols() {
            return Err(anyhow::anyhow!(
                "names ({} genes, {} cells) don't match the count matrix {} x {}",
                genes.len(),
                cells.len(),
                counts.nrows(),
                counts.ncols()
            ));
        }

        if let Some(x) = counts.iter().find(|x| !x.is_finite() || **x < 0.0) {
            return Err(anyhow::anyhow!(
                "expression values must be finite and non-negative, found {}",
                x
            ));
        }

        let mut gene_position = HashMap::default();
        let mut keep = Vec::with_capacity(genes.len());
        for (i, g) in genes.iter().enumerate() {
            if gene_position.contains_key(g) {
                continue;
            }
            gene_position.insert(g.clone(), keep.len());
            keep.push(i);
        }

        if keep.len() < genes.len() {
            warn!(
                "dropped {} duplicated gene row(s); the first occurrence is kept",
                genes.len() - keep.len()
            );
            let counts = counts.select_rows(keep.iter());
            let genes = keep.iter().map(|&i| genes[i].clone()).collect();
            return Ok(Self {
                genes,
                cells,
                counts,
                gene_position,
            });
        }

        Ok(Self {
            genes,
            cells,
            counts,
            gene_position,
        })
    }

    /// Read expression data from either a dense table (`.tsv`,
    /// `.csv`, `.txt`, optionally gzipped) or a MatrixMarket file with
    /// separate gene and cell name files
    pub fn from_file(
        counts_file: &str,
        genes_file: Option<&str>,
        cells_file: Option<&str>,
    ) -> anyhow::Result<Self> {
        let ext = extension_without_gz(counts_file)?;

        match ext.as_ref() {
            "mtx" => {
                let genes_file =
                    genes_file.ok_or(anyhow::anyhow!("need a gene name file for {}", counts_file))?;
                let cells_file =
                    cells_file.ok_or(anyhow::anyhow!("need a cell name file for {}", counts_file))?;
                Self::from_mtx(counts_file, genes_file, cells_file)
            }
            "csv" => Self::from_dense(counts_file, ","),
            _ => Self::from_dense(counts_file, "\t"),
        }
    }

    fn from_dense(file: &str, delim: &str) -> anyhow::Result<Self> {
        info!("reading dense expression table {}", file);
        let MatWithNames { rows, cols, mat } = Mat::read_names_delim(file, delim)?;
        Self::new(rows, cols, mat)
    }

    fn from_mtx(mtx_file: &str, genes_file: &str, cells_file: &str) -> anyhow::Result<Self> {
        info!("reading MatrixMarket triplets {}", mtx_file);
        let (triplets, (nrow, ncol, _)) = read_mtx_triplets(mtx_file)?;

        let genes = read_first_column(genes_file)?;
        let cells = read_first_column(cells_file)?;

        if genes.len() != nrow || cells.len() != ncol {
            return Err(anyhow::anyhow!(
                "{} is {} x {}, but found {} gene names and {} cell names",
                mtx_file,
                nrow,
                ncol,
                genes.len(),
                cells.len()
            ));
        }

        let mut counts = Mat::zeros(nrow, ncol);
        for (i, j, x) in triplets {
            counts[(i as usize, j as usize)] += x;
        }

        Self::new(genes, cells, counts)
    }

    pub fn genes(&self) -> &[Box<str>] {
        &self.genes
    }

    pub fn cells(&self) -> &[Box<str>] {
        &self.cells
    }

    pub fn counts(&self) -> &Mat {
        &self.counts
    }

    pub fn num_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty() || self.cells.is_empty()
    }

    /// Row index of a gene
    pub fn gene_position(&self, gene: &str) -> Option<usize> {
        self.gene_position.get(gene).copied()
    }

    pub fn contains_gene(&self, gene: &str) -> bool {
        self.gene_position.contains_key(gene)
    }

    /// Keep the rows of `genes` (in their current matrix order)
    pub fn retain_genes(&self, genes: &HashSet<Box<str>>) -> Self {
        let rows: Vec<usize> = (0..self.num_genes())
            .filter(|&i| genes.contains(&self.genes[i]))
            .collect();
        self.select_rows(&rows)
    }

    /// Drop genes whose total expression across all cells is zero
    pub fn drop_zero_rows(&self) -> Self {
        let rows: Vec<usize> = (0..self.num_genes())
            .filter(|&i| self.counts.row(i).iter().any(|&x| x > 0.0))
            .collect();
        self.select_rows(&rows)
    }

    /// Keep the given columns (cells) in the given order
    pub fn select_cells(&self, cols: &[usize]) -> Self {
        Self {
            genes: self.genes.clone(),
            cells: cols.iter().map(|&j| self.cells[j].clone()).collect(),
            counts: self.counts.select_columns(cols.iter()),
            gene_position: self.gene_position.clone(),
        }
    }

    fn select_rows(&self, rows: &[usize]) -> Self {
        let genes: Vec<Box<str>> = rows.iter().map(|&i| self.genes[i].clone()).collect();
        let gene_position = genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i))
            .collect();
        Self {
            genes,
            cells: self.cells.clone(),
            counts: self.counts.select_rows(rows.iter()),
            gene_position,
        }
    }
}

fn read_first_column(file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let delim: Delimiter = (&['\t', ',', ' ']).into();
    Ok(read_lines_of_words_delim(file, delim, -1)?
        .lines
        .into_iter()
        .filter_map(|words| words.into_iter().next())
        .collect())
}
