//! Receptor-ligand interaction catalog.
//!
//! Each entry pairs two partners. Partner 1 is the receptor side,
//! scored in the receiving cluster; partner 2 is the ligand side,
//! scored in the sending cluster. A partner is either a single gene or
//! a complex of subunit genes.

use crate::common::*;
use matrix_util::common_io::{read_lines_of_words_delim, ReadLinesOut};
use matrix_util::membership::detect_delimiter;

/// One side of an interaction
#[derive(Clone, Debug, PartialEq)]
pub struct Partner {
    /// gene identifiers; more than one for a complex
    pub genes: Vec<Box<str>>,
    pub is_complex: bool,
    /// a complex is active when at least this many subunits are
    pub required_subunits: usize,
    /// display name
    pub name: Box<str>,
    pub gene_name: Box<str>,
    pub secreted: bool,
}

impl Partner {
    pub fn single(gene: &str) -> Self {
        Self {
            genes: vec![gene.into()],
            is_complex: false,
            required_subunits: 1,
            name: gene.into(),
            gene_name: gene.into(),
            secreted: false,
        }
    }

    pub fn complex(name: &str, genes: &[&str], required_subunits: usize) -> Self {
        Self {
            genes: genes.iter().map(|&g| g.into()).collect(),
            is_complex: true,
            required_subunits,
            name: name.into(),
            gene_name: genes.join(";").into(),
            secreted: false,
        }
    }

    pub fn with_secretion(mut self, secreted: bool) -> Self {
        self.secreted = secreted;
        self
    }

    pub fn num_subunits(&self) -> usize {
        self.genes.len()
    }

    /// Keep the subunits satisfying `present`. A single gene must be
    /// present; a complex needs at least `required_subunits` of them.
    pub fn resolve<F>(&self, present: F) -> Option<Self>
    where
        F: Fn(&str) -> bool,
    {
        let genes: Vec<Box<str>> = self
            .genes
            .iter()
            .filter(|g| present(g.as_ref()))
            .cloned()
            .collect();

        let enough = if self.is_complex {
            !genes.is_empty() && genes.len() >= self.required_subunits
        } else {
            genes.len() == self.genes.len() && !genes.is_empty()
        };

        enough.then(|| Self {
            genes,
            ..self.clone()
        })
    }
}

/// A catalog entry
#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    pub id: Box<str>,
    /// receptor side
    pub partner_1: Partner,
    /// ligand side
    pub partner_2: Partner,
    pub source: Box<str>,
}

impl Interaction {
    pub fn new(id: &str, receptor: Partner, ligand: Partner) -> Self {
        Self {
            id: id.into(),
            partner_1: receptor,
            partner_2: ligand,
            source: "".into(),
        }
    }

    /// `{gene_name_1}_{gene_name_2}`
    pub fn gene_interaction(&self) -> String {
        format!("{}_{}", self.partner_1.gene_name, self.partner_2.gene_name)
    }

    pub fn genes(&self) -> impl Iterator<Item = &Box<str>> {
        self.partner_1.genes.iter().chain(self.partner_2.genes.iter())
    }
}

#[derive(Clone, Debug, Default)]
pub struct InteractionCatalog {
    entries: Vec<Interaction>,
}

/// Column positions looked up from the header line
struct CatalogColumns {
    id: usize,
    genes: [usize; 2],
    is_complex: [Option<usize>; 2],
    required: [Option<usize>; 2],
    name: [Option<usize>; 2],
    gene_name: [Option<usize>; 2],
    secretion: [Option<usize>; 2],
    source: Option<usize>,
}

impl CatalogColumns {
    fn from_header(header: &[Box<str>]) -> anyhow::Result<Self> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let need = |name: &str| {
            find(name).ok_or(anyhow::anyhow!(
                "interaction catalog lacks the column `{}`",
                name
            ))
        };
        let both = |stem: &str| [find(&format!("{}_1", stem)), find(&format!("{}_2", stem))];

        Ok(Self {
            id: need("id_interaction")?,
            genes: [need("genes_1")?, need("genes_2")?],
            is_complex: both("is_complex"),
            required: both("required_subunits"),
            name: both("name"),
            gene_name: both("gene_name"),
            secretion: both("secretion"),
            source: find("source"),
        })
    }
}

fn parse_flag(word: &str) -> Option<bool> {
    match word.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}

fn split_genes(word: &str) -> Vec<&str> {
    word.split([';', '|'])
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .collect()
}

impl InteractionCatalog {
    pub fn new(entries: Vec<Interaction>) -> Self {
        Self { entries }
    }

    /// Read a delimited catalog with a header line. Rows with missing
    /// gene references or unparsable fields are skipped.
    pub fn from_file(file: &str) -> anyhow::Result<Self> {
        let ReadLinesOut { lines, header } =
            read_lines_of_words_delim(file, detect_delimiter(file), 0)?;

        let cols = CatalogColumns::from_header(&header)?;

        let mut entries = Vec::with_capacity(lines.len());
        let mut n_skipped = 0;

        for (i, words) in lines.iter().enumerate() {
            match Self::parse_row(words, &cols) {
                Ok(x) => entries.push(x),
                Err(e) => {
                    debug!("catalog line {}: {}", i + 2, e);
                    n_skipped += 1;
                }
            }
        }

        if n_skipped > 0 {
            warn!("skipped {} malformed catalog row(s) in {}", n_skipped, file);
        }

        info!("read {} interactions from {}", entries.len(), file);
        Ok(Self { entries })
    }

    fn parse_row(words: &[Box<str>], cols: &CatalogColumns) -> anyhow::Result<Interaction> {
        let get = |c: Option<usize>| c.and_then(|c| words.get(c)).map(|w| w.trim());

        let id = get(Some(cols.id))
            .filter(|x| !x.is_empty())
            .ok_or(anyhow::anyhow!("no interaction id"))?;

        let mut partners = Vec::with_capacity(2);

        for s in 0..2 {
            let genes = split_genes(get(Some(cols.genes[s])).unwrap_or(""));
            if genes.is_empty() {
                anyhow::bail!("no gene for partner {} of {}", s + 1, id);
            }

            let is_complex = match get(cols.is_complex[s]).filter(|w| !w.is_empty()) {
                Some(w) => parse_flag(w).ok_or(anyhow::anyhow!("bad complex flag {:?}", w))?,
                None => genes.len() > 1,
            };

            if !is_complex && genes.len() > 1 {
                anyhow::bail!("partner {} of {} lists several genes", s + 1, id);
            }

            let required_subunits = match get(cols.required[s]).filter(|w| !w.is_empty()) {
                Some(w) if is_complex => w.parse::<usize>()?,
                _ => genes.len(),
            };

            if required_subunits == 0 || required_subunits > genes.len() {
                anyhow::bail!(
                    "partner {} of {} requires {} of {} subunits",
                    s + 1,
                    id,
                    required_subunits,
                    genes.len()
                );
            }

            let joined = genes.join(";");
            let name = get(cols.name[s])
                .filter(|x| !x.is_empty())
                .unwrap_or(joined.as_str());
            let gene_name = get(cols.gene_name[s])
                .filter(|x| !x.is_empty())
                .unwrap_or(joined.as_str());
            let secreted = get(cols.secretion[s])
                .and_then(parse_flag)
                .unwrap_or(false);

            partners.push(Partner {
                genes: genes.into_iter().map(Box::from).collect(),
                is_complex,
                required_subunits,
                name: name.into(),
                gene_name: gene_name.into(),
                secreted,
            });
        }

        let partner_2 = partners.pop().ok_or(anyhow::anyhow!("no partner"))?;
        let partner_1 = partners.pop().ok_or(anyhow::anyhow!("no partner"))?;

        Ok(Interaction {
            id: id.into(),
            partner_1,
            partner_2,
            source: get(cols.source).unwrap_or("").into(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Interaction] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }

    /// All genes referenced by any entry
    pub fn genes(&self) -> HashSet<Box<str>> {
        self.entries.iter().flat_map(|x| x.genes().cloned()).collect()
    }
}

impl FromIterator<Interaction> for InteractionCatalog {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
