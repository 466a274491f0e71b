use lentil::catalog::*;
use lentil::catalog_filter::*;
use lentil::cluster_labels::ClusterLabels;
use lentil::common::Mat;
use lentil::expression::ExpressionMatrix;
use lentil::permutation::*;
use lentil::scoring::InteractionScorer;

fn boxed(xs: &[&str]) -> Vec<Box<str>> {
    xs.iter().map(|&x| x.into()).collect()
}

/// Receptor `R` only in B cells, ligand `L` only in A cells
fn two_clusters(cells_per_cluster: usize) -> anyhow::Result<(ExpressionMatrix, ClusterLabels)> {
    let nn = 2 * cells_per_cluster;
    let membership: Vec<usize> = (0..nn).map(|j| j / cells_per_cluster).collect();

    let counts = Mat::from_fn(3, nn, |i, j| match (i, membership[j]) {
        (0, 1) => 1.0,
        (1, 0) => 1.0,
        (2, _) => (j % 3) as f32,
        _ => 0.0,
    });

    let expr = ExpressionMatrix::new(
        boxed(&["R", "L", "H"]),
        (0..nn).map(|j| format!("c{}", j).into()).collect(),
        counts,
    )?;
    let labels = ClusterLabels::new(boxed(&["A", "B"]), membership)?;
    Ok((expr, labels))
}

fn receptor_ligand() -> InteractionCatalog {
    InteractionCatalog::new(vec![Interaction::new(
        "R_L",
        Partner::single("R"),
        Partner::single("L"),
    )])
}

#[test]
fn directed_signal_in_four_cells() -> anyhow::Result<()> {
    let (expr, labels) = two_clusters(2)?;
    let FilteredData {
        catalog,
        expression,
        ..
    } = filter_catalog(&receptor_ligand(), &expr)?;

    let scorer = InteractionScorer::new(&catalog, &expression)?;
    let args = PermutationArgs {
        iterations: 100,
        seed: 1,
        ..Default::default()
    };
    let out = run_permutation_test(&scorer, expression.counts(), &labels, &args)?;

    let ab = out.pairs.position(0, 1).unwrap();
    let ba = out.pairs.position(1, 0).unwrap();

    assert!(out.means[(0, ab)] > 0.0);
    assert_eq!(out.means[(0, ba)], 0.0);

    // only 1 of the 6 distinct splits keeps the separation
    assert!(out.pvalues[(0, ab)] < 0.4);
    assert_eq!(out.pvalues[(0, ba)], 1.0);
    Ok(())
}

#[test]
fn directed_signal_in_larger_clusters() -> anyhow::Result<()> {
    let (expr, labels) = two_clusters(10)?;
    let catalog = receptor_ligand();
    let scorer = InteractionScorer::new(&catalog, &expr)?;
    let args = PermutationArgs {
        iterations: 200,
        ..Default::default()
    };
    let out = run_permutation_test(&scorer, expr.counts(), &labels, &args)?;

    let ab = out.pairs.position(0, 1).unwrap();
    assert!(out.pvalues[(0, ab)] < 0.05);
    for p in 0..out.pairs.len() {
        if p != ab {
            assert_eq!(out.pvalues[(0, p)], 1.0);
        }
    }
    assert_eq!(out.activation[(0, ab)], 1.0);
    Ok(())
}

#[test]
fn pvalues_are_counts_over_iterations() -> anyhow::Result<()> {
    let (expr, labels) = two_clusters(3)?;
    let catalog = InteractionCatalog::new(vec![
        Interaction::new("R_L", Partner::single("R"), Partner::single("L")),
        Interaction::new("H_L", Partner::single("H"), Partner::single("L")),
        Interaction::new("R_H", Partner::single("R"), Partner::single("H")),
    ]);
    let scorer = InteractionScorer::new(&catalog, &expr)?;
    let args = PermutationArgs {
        iterations: 37,
        seed: 5,
        ..Default::default()
    };
    let out = run_permutation_test(&scorer, expr.counts(), &labels, &args)?;

    assert_eq!(out.iterations, 37);
    assert_eq!(out.pvalues.shape(), (3, 4));
    for &p in out.pvalues.iter() {
        assert!((0.0..=1.0).contains(&p));
        let count = p * 37.0;
        approx::assert_abs_diff_eq!(count, count.round(), epsilon = 1e-3);
    }
    Ok(())
}

#[test]
fn same_seed_same_pvalues_on_any_thread_count() -> anyhow::Result<()> {
    let (expr, labels) = two_clusters(4)?;
    let catalog = InteractionCatalog::new(vec![
        Interaction::new("R_L", Partner::single("R"), Partner::single("L")),
        Interaction::new("H_L", Partner::single("H"), Partner::single("L")),
    ]);
    let scorer = InteractionScorer::new(&catalog, &expr)?;
    let args = PermutationArgs {
        iterations: 64,
        seed: 2024,
        ..Default::default()
    };

    let run_with = |threads: usize| -> anyhow::Result<Mat> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        let out = pool.install(|| run_permutation_test(&scorer, expr.counts(), &labels, &args))?;
        Ok(out.pvalues)
    };

    let one = run_with(1)?;
    let again = run_with(1)?;
    let four = run_with(4)?;

    assert_eq!(one, again);
    assert_eq!(one, four);

    let other_seed = run_permutation_test(
        &scorer,
        expr.counts(),
        &labels,
        &PermutationArgs {
            seed: 7,
            ..args.clone()
        },
    )?;
    assert_eq!(other_seed.pvalues.shape(), one.shape());
    Ok(())
}

#[test]
fn empty_cluster_gets_defined_pvalues() -> anyhow::Result<()> {
    let (expr, labels) = two_clusters(3)?;
    let labels = ClusterLabels::new(
        boxed(&["A", "B", "Empty"]),
        labels.membership().to_vec(),
    )?;
    let scorer = InteractionScorer::new(&receptor_ligand(), &expr)?;
    let args = PermutationArgs {
        iterations: 20,
        ..Default::default()
    };
    let out = run_permutation_test(&scorer, expr.counts(), &labels, &args)?;

    assert_eq!(out.pairs.len(), 9);
    for s in 0..3 {
        let p = out.pairs.position(s, 2).unwrap();
        assert_eq!(out.means[(0, p)], 0.0);
        assert_eq!(out.pvalues[(0, p)], 1.0);
    }
    assert!(out.pvalues.iter().all(|p| !p.is_nan()));
    Ok(())
}

#[test]
fn zero_iterations_fail_fast() -> anyhow::Result<()> {
    let (expr, labels) = two_clusters(2)?;
    let scorer = InteractionScorer::new(&receptor_ligand(), &expr)?;
    let args = PermutationArgs {
        iterations: 0,
        ..Default::default()
    };
    assert!(run_permutation_test(&scorer, expr.counts(), &labels, &args).is_err());
    Ok(())
}
