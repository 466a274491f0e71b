use matrix_util::common_io::{create_temp_dir_file, remove_file, write_lines};
use matrix_util::traits::{IoOps, MatWithNames};

#[test]
fn dmatrix_named_io_test() -> anyhow::Result<()> {
    let xx = nalgebra::DMatrix::<f32>::from_fn(4, 3, |i, j| (i * 3 + j) as f32 * 0.5);
    let rows: Vec<Box<str>> = (0..4).map(|i| format!("g{}", i).into_boxed_str()).collect();
    let cols: Vec<Box<str>> = (0..3).map(|j| format!("c{}", j).into_boxed_str()).collect();

    let tsv_file = create_temp_dir_file("tsv.gz")?;
    let tsv_file = tsv_file.to_str().unwrap();
    xx.write_names_delim(tsv_file, &rows, &cols, "gene", "\t")?;

    let MatWithNames {
        rows: rows2,
        cols: cols2,
        mat: yy,
    } = nalgebra::DMatrix::<f32>::read_names_delim(tsv_file, "\t")?;

    assert_eq!(rows, rows2);
    assert_eq!(cols, cols2);
    approx::assert_abs_diff_eq!(xx, yy);

    remove_file(tsv_file)?;
    Ok(())
}

#[test]
fn header_without_corner_test() -> anyhow::Result<()> {
    let csv_file = create_temp_dir_file(".csv")?;
    let csv_file = csv_file.to_str().unwrap();
    let lines = vec!["c1,c2", "g1,1,2", "g2,3,4"];
    write_lines(&lines, csv_file)?;

    let out = nalgebra::DMatrix::<f32>::read_names_delim(csv_file, ",")?;
    assert_eq!(out.cols, vec![Box::<str>::from("c1"), Box::<str>::from("c2")]);
    assert_eq!(out.rows, vec![Box::<str>::from("g1"), Box::<str>::from("g2")]);
    assert_eq!(out.mat[(1, 0)], 3.0);

    remove_file(csv_file)?;
    Ok(())
}

#[test]
fn ragged_table_is_an_error() -> anyhow::Result<()> {
    let tsv_file = create_temp_dir_file(".tsv")?;
    let tsv_file = tsv_file.to_str().unwrap();
    let lines = vec!["gene\tc1\tc2", "g1\t1\t2", "g2\t3"];
    write_lines(&lines, tsv_file)?;

    assert!(nalgebra::DMatrix::<f32>::read_names_delim(tsv_file, "\t").is_err());

    remove_file(tsv_file)?;
    Ok(())
}
