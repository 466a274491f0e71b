use crate::catalog::*;
use crate::common::*;

use indicatif::ParallelProgressIterator;
use matrix_util::common_io::{mkdir, write_lines};
use matrix_util::traits::IoOps;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson, Uniform};
use rayon::prelude::*;

pub struct SimArgs {
    pub genes: usize,
    pub cells: usize,
    pub clusters: usize,
    pub interactions: usize,
    /// background Poisson rate
    pub depth: f32,
    /// rate multiplier of planted partners
    pub signal: f32,
    pub rseed: u64,
}

/// A planted ligand (sender) -> receptor (receiver) interaction
#[derive(Clone, Debug)]
pub struct PlantedInteraction {
    pub id: Box<str>,
    pub receptor: usize,
    pub ligand: usize,
    pub sender: usize,
    pub receiver: usize,
}

pub struct SimOut {
    pub gene_names: Vec<Box<str>>,
    pub cell_names: Vec<Box<str>>,
    pub cluster_names: Vec<Box<str>>,
    pub counts: Mat,
    pub cell_cluster: Vec<usize>,
    pub catalog: InteractionCatalog,
    pub truth: Vec<PlantedInteraction>,
}

/// Simulate counts with planted cluster-to-cluster interactions
///
/// ```text
/// Y(g,j) ~ Poisson( depth * (signal if g is planted for cluster(j) else 1) )
/// ```
///
/// Cells are split over clusters round-robin. Each planted interaction
/// draws a (sender, receiver) pair; its ligand is elevated in the
/// sender and its receptor in the receiver.
pub fn generate_interaction_data(args: &SimArgs) -> anyhow::Result<SimOut> {
    let (dd, nn, kk) = (args.genes, args.cells, args.clusters);

    if kk == 0 || nn < kk {
        anyhow::bail!("need at least one cell per cluster: {} cells, {} clusters", nn, kk);
    }
    if dd < 2 * args.interactions {
        anyhow::bail!(
            "{} genes can't hold {} receptor-ligand pairs",
            dd,
            args.interactions
        );
    }
    if args.depth.is_nan() || args.depth <= 0.0 || args.signal.is_nan() || args.signal < 1.0 {
        anyhow::bail!(
            "need depth > 0 and signal >= 1, but got {} and {}",
            args.depth,
            args.signal
        );
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(args.rseed);

    let cluster_names: Vec<Box<str>> = (0..kk).map(|k| format!("type{}", k).into()).collect();
    let cell_cluster: Vec<usize> = (0..nn).map(|j| j % kk).collect();
    let cell_names: Vec<Box<str>> = (0..nn).map(|j| format!("cell{}", j).into()).collect();

    let mut gene_names: Vec<Box<str>> = Vec::with_capacity(dd);
    for i in 0..args.interactions {
        gene_names.push(format!("R{}", i).into());
        gene_names.push(format!("L{}", i).into());
    }
    for g in gene_names.len()..dd {
        gene_names.push(format!("G{}", g).into());
    }

    let runif = Uniform::new(0, kk).map_err(|e| anyhow::anyhow!("{}", e))?;
    let truth: Vec<PlantedInteraction> = (0..args.interactions)
        .map(|i| PlantedInteraction {
            id: format!("sim{}", i).into(),
            receptor: 2 * i,
            ligand: 2 * i + 1,
            sender: runif.sample(&mut rng),
            receiver: runif.sample(&mut rng),
        })
        .collect();

    // gene x cluster rate
    let mut rate_dk = Mat::from_element(dd, kk, args.depth);
    for x in truth.iter() {
        rate_dk[(x.ligand, x.sender)] = args.depth * args.signal;
        rate_dk[(x.receptor, x.receiver)] = args.depth * args.signal;
    }

    let columns = (0..nn)
        .into_par_iter()
        .progress_count(nn as u64)
        .map(|j| -> anyhow::Result<Vec<f32>> {
            let mut rng = rand::rngs::StdRng::seed_from_u64(args.rseed + j as u64);
            rate_dk
                .column(cell_cluster[j])
                .iter()
                .map(|&lambda| -> anyhow::Result<f32> {
                    let rpois = Poisson::new(lambda).map_err(|e| anyhow::anyhow!("{}", e))?;
                    Ok(rpois.sample(&mut rng))
                })
                .collect()
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let counts = Mat::from_iterator(dd, nn, columns.into_iter().flatten());

    let catalog = truth
        .iter()
        .map(|x| {
            Interaction::new(
                &x.id,
                Partner::single(&gene_names[x.receptor]),
                Partner::single(&gene_names[x.ligand]).with_secretion(true),
            )
        })
        .collect();

    info!(
        "simulated {} genes x {} cells in {} clusters with {} planted interactions",
        dd, nn, kk, args.interactions
    );

    Ok(SimOut {
        gene_names,
        cell_names,
        cluster_names,
        counts,
        cell_cluster,
        catalog,
        truth,
    })
}

impl SimOut {
    /// Write `{out}.counts.tsv.gz`, `{out}.meta.tsv`,
    /// `{out}.catalog.tsv`, `{out}.truth.tsv`
    pub fn write(&self, out: &str) -> anyhow::Result<Vec<String>> {
        mkdir(out)?;

        let counts_file = format!("{}.counts.tsv.gz", out);
        let meta_file = format!("{}.meta.tsv", out);
        let catalog_file = format!("{}.catalog.tsv", out);
        let truth_file = format!("{}.truth.tsv", out);

        self.counts.write_names_delim(
            &counts_file,
            &self.gene_names,
            &self.cell_names,
            "gene",
            "\t",
        )?;

        let meta: Vec<String> = std::iter::once("cell\tcluster".to_string())
            .chain(
                self.cell_names
                    .iter()
                    .zip(self.cell_cluster.iter())
                    .map(|(c, &k)| format!("{}\t{}", c, self.cluster_names[k])),
            )
            .collect();
        write_lines(&meta, &meta_file)?;

        let catalog_header = "id_interaction\tgenes_1\tgenes_2\tsecretion_1\tsecretion_2\tsource";
        let catalog: Vec<String> = std::iter::once(catalog_header.to_string())
            .chain(self.catalog.iter().map(|x| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\tsimulation",
                    x.id,
                    x.partner_1.genes.join(";"),
                    x.partner_2.genes.join(";"),
                    x.partner_1.secreted,
                    x.partner_2.secreted
                )
            }))
            .collect();
        write_lines(&catalog, &catalog_file)?;

        let truth_header = "id_interaction\treceptor\tligand\tsender\treceiver";
        let truth: Vec<String> = std::iter::once(truth_header.to_string())
            .chain(self.truth.iter().map(|x| {
                format!(
                    "{}\t{}\t{}\t{}\t{}",
                    x.id,
                    self.gene_names[x.receptor],
                    self.gene_names[x.ligand],
                    self.cluster_names[x.sender],
                    self.cluster_names[x.receiver]
                )
            }))
            .collect();
        write_lines(&truth, &truth_file)?;

        Ok(vec![counts_file, meta_file, catalog_file, truth_file])
    }
}
