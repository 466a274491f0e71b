use crate::common_io::{open_buf_writer, read_lines_of_words_delim, Delimiter, ReadLinesOut};
use crate::traits::*;
pub use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use std::fmt::{Debug, Display};
use std::io::Write;
use std::str::FromStr;

impl<T> IoOps for DMatrix<T>
where
    T: nalgebra::Scalar + Send + FromStr + Display + Copy,
    <T as FromStr>::Err: Debug,
{
    type Scalar = T;
    type Mat = Self;

    fn read_names_delim(
        file: &str,
        delim: impl Into<Delimiter>,
    ) -> anyhow::Result<MatWithNames<Self::Mat>> {
        let ReadLinesOut { lines, header } = read_lines_of_words_delim(file, delim, 0)?;

        let cols: Vec<Box<str>> = match lines.first() {
            None => header.into_iter().skip(1).collect(),
            Some(first) if header.len() == first.len() => header[1..].to_vec(),
            Some(first) if header.len() + 1 == first.len() => header,
            Some(first) => {
                return Err(anyhow::anyhow!(
                    "{}: header has {} fields but rows carry {} values",
                    file,
                    header.len(),
                    first.len().saturating_sub(1)
                ));
            }
        };

        let ncols = cols.len();

        let parsed = lines
            .par_iter()
            .enumerate()
            .map(|(i, words)| -> anyhow::Result<(Box<str>, Vec<T>)> {
                if words.len() != ncols + 1 {
                    return Err(anyhow::anyhow!(
                        "{}: data line {} has {} fields, expected {}",
                        file,
                        i + 1,
                        words.len(),
                        ncols + 1
                    ));
                }
                let values = words[1..]
                    .iter()
                    .map(|x| {
                        x.trim()
                            .parse::<T>()
                            .map_err(|e| anyhow::anyhow!("{}: cannot parse {:?}: {:?}", file, x, e))
                    })
                    .collect::<anyhow::Result<Vec<T>>>()?;
                Ok((words[0].clone(), values))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let nrows = parsed.len();
        let mut rows = Vec::with_capacity(nrows);
        let mut data = Vec::with_capacity(nrows * ncols);
        for (name, values) in parsed {
            rows.push(name);
            data.extend(values);
        }

        Ok(MatWithNames {
            rows,
            cols,
            mat: DMatrix::<T>::from_row_iterator(nrows, ncols, data),
        })
    }

    fn write_names_delim(
        &self,
        file: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
        corner: &str,
        delim: &str,
    ) -> anyhow::Result<()> {
        if rows.len() != self.nrows() || cols.len() != self.ncols() {
            return Err(anyhow::anyhow!(
                "names ({} x {}) don't match the matrix ({} x {})",
                rows.len(),
                cols.len(),
                self.nrows(),
                self.ncols()
            ));
        }

        let mut buf = open_buf_writer(file)?;

        let hdr = std::iter::once(corner.to_string())
            .chain(cols.iter().map(|x| x.to_string()))
            .collect::<Vec<_>>()
            .join(delim);
        writeln!(buf, "{}", hdr)?;

        for (name, row) in rows.iter().zip(self.row_iter()) {
            let line = row
                .iter()
                .map(|x| format!("{}", *x))
                .collect::<Vec<String>>()
                .join(delim);
            writeln!(buf, "{}{}{}", name, delim, line)?;
        }

        buf.flush()?;
        Ok(())
    }
}
