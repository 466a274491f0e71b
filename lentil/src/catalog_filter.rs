//! Prune the interaction catalog to what the expression data can
//! support, and prune the expression matrix to what the catalog uses.

use crate::catalog::*;
use crate::common::*;
use crate::expression::ExpressionMatrix;

/// How many entries each filtering step removed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub input: usize,
    pub missing_genes: usize,
    pub self_interactions: usize,
    pub duplicates: usize,
    pub missing_after_zero_rows: usize,
    pub zero_rows: usize,
    pub kept: usize,
}

pub struct FilteredData {
    pub catalog: InteractionCatalog,
    pub expression: ExpressionMatrix,
    pub stats: FilterStats,
}

/// Keep entries whose partners resolve against `expr`; missing
/// complex subunits beyond the required count are pruned
fn retain_resolved(catalog: &InteractionCatalog, expr: &ExpressionMatrix) -> InteractionCatalog {
    let present = |g: &str| expr.contains_gene(g);
    catalog
        .iter()
        .filter_map(|x| {
            let partner_1 = x.partner_1.resolve(present)?;
            let partner_2 = x.partner_2.resolve(present)?;
            Some(Interaction {
                partner_1,
                partner_2,
                ..x.clone()
            })
        })
        .collect()
}

fn gene_set(partner: &Partner) -> Vec<&str> {
    let mut genes: Vec<&str> = partner.genes.iter().map(|g| g.as_ref()).collect();
    genes.sort_unstable();
    genes.dedup();
    genes
}

/// Drop entries whose two partners are the same gene (or the same set
/// of subunits)
fn drop_self_interactions(catalog: &InteractionCatalog) -> InteractionCatalog {
    catalog
        .iter()
        .filter(|x| gene_set(&x.partner_1) != gene_set(&x.partner_2))
        .cloned()
        .collect()
}

/// Keep the first entry of each ordered (genes_1, genes_2) pair of
/// gene sets; subunit order does not matter
fn drop_duplicated_pairs(catalog: &InteractionCatalog) -> InteractionCatalog {
    let mut seen: HashSet<(Vec<&str>, Vec<&str>)> = HashSet::default();
    catalog
        .iter()
        .filter(|x| seen.insert((gene_set(&x.partner_1), gene_set(&x.partner_2))))
        .cloned()
        .collect()
}

/// Filter the catalog against the expression matrix and subset the
/// matrix to the genes of the surviving entries.
///
/// 1. drop entries referring to genes absent from the matrix
/// 2. drop self-interactions
/// 3. drop duplicated gene pairs (first one wins)
/// 4. keep only the matrix rows referenced by the survivors
/// 5. drop all-zero rows
/// 6. repeat step 1 on the shrunken matrix, then re-sync the rows
///
/// An empty result is not an error.
pub fn filter_catalog(
    catalog: &InteractionCatalog,
    expr: &ExpressionMatrix,
) -> anyhow::Result<FilteredData> {
    let mut stats = FilterStats {
        input: catalog.len(),
        ..Default::default()
    };

    let resolved = retain_resolved(catalog, expr);
    stats.missing_genes = catalog.len() - resolved.len();

    let distinct = drop_self_interactions(&resolved);
    stats.self_interactions = resolved.len() - distinct.len();

    let unique = drop_duplicated_pairs(&distinct);
    stats.duplicates = distinct.len() - unique.len();

    let used = expr.retain_genes(&unique.genes());
    let nonzero = used.drop_zero_rows();
    stats.zero_rows = used.num_genes() - nonzero.num_genes();

    let kept = retain_resolved(&unique, &nonzero);
    stats.missing_after_zero_rows = unique.len() - kept.len();
    stats.kept = kept.len();

    let expression = nonzero.retain_genes(&kept.genes());

    info!(
        "kept {} of {} interactions: {} missing genes, {} self, {} duplicated, {} lost with {} all-zero genes",
        stats.kept,
        stats.input,
        stats.missing_genes,
        stats.self_interactions,
        stats.duplicates,
        stats.missing_after_zero_rows,
        stats.zero_rows
    );

    if kept.is_empty() {
        warn!("no interaction survived filtering; results will be empty");
    }

    info!(
        "expression restricted to {} genes x {} cells",
        expression.num_genes(),
        expression.num_cells()
    );

    Ok(FilteredData {
        catalog: kept,
        expression,
        stats,
    })
}
