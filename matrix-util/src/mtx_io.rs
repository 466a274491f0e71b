use crate::common_io::*;
use rayon::prelude::*;

/// Shape of a MatrixMarket file: (nrow, ncol, nnz)
pub type MtxShape = (usize, usize, usize);

/// Read a MatrixMarket file and return triplets (row, col, val) with
/// 0-based indices, sorted by column then row, and the declared shape
/// * `mtx_file` - Path to the matrix market file
pub fn read_mtx_triplets(mtx_file: &str) -> anyhow::Result<(Vec<(u64, u64, f32)>, MtxShape)> {
    let ReadLinesOut { lines, header } = read_lines_of_words(mtx_file, 0)?;

    if header.len() != 3 {
        return Err(anyhow::anyhow!("Failed to parse mtx header: {}", mtx_file));
    }

    let nrow = header[0].parse::<usize>()?;
    let ncol = header[1].parse::<usize>()?;
    let nnz = header[2].parse::<usize>()?;

    fn parse_row_col_val(triplet: &Vec<Box<str>>) -> anyhow::Result<(u64, u64, f32)> {
        if triplet.len() != 3 {
            return Err(anyhow::anyhow!("expected 3 fields, found {}", triplet.len()));
        }
        let row = triplet[0].parse::<u64>()?;
        let col = triplet[1].parse::<u64>()?;
        let val = triplet[2].parse::<f32>()?;
        if row == 0 || col == 0 {
            return Err(anyhow::anyhow!("mtx indices are 1-based"));
        }
        Ok((row - 1, col - 1, val))
    }

    let mut triplets = lines
        .par_iter()
        .map(parse_row_col_val)
        .collect::<anyhow::Result<Vec<_>>>()?;

    if triplets.len() != nnz {
        log::warn!(
            "{}: header declares {} non-zero elements, found {}",
            mtx_file,
            nnz,
            triplets.len()
        );
    }

    if let Some(&(r, c, _)) = triplets
        .iter()
        .find(|&&(r, c, _)| r as usize >= nrow || c as usize >= ncol)
    {
        return Err(anyhow::anyhow!(
            "triplet ({}, {}) out of the declared shape {} x {}",
            r + 1,
            c + 1,
            nrow,
            ncol
        ));
    }

    triplets.par_sort_by_key(|&(row, col, _)| (col, row));
    Ok((triplets, (nrow, ncol, nnz)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mtx_triplets_sorted_by_column() -> anyhow::Result<()> {
        let mtx_file = create_temp_dir_file(".mtx.gz")?;
        let mtx_file = mtx_file.to_str().unwrap();

        let lines = vec![
            "%%MatrixMarket matrix coordinate real general",
            "3\t2\t3",
            "3\t2\t4",
            "1\t1\t1.5",
            "2\t2\t2",
        ];
        write_lines(&lines, mtx_file)?;

        let (read_back, shape) = read_mtx_triplets(mtx_file)?;
        assert_eq!(shape, (3, 2, 3));
        assert_eq!(read_back, vec![(0, 0, 1.5), (1, 1, 2.0), (2, 1, 4.0)]);

        remove_file(mtx_file)?;
        Ok(())
    }
}
