use crate::common_io::Delimiter;

/// A matrix carrying its row and column names
pub struct MatWithNames<M> {
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
    pub mat: M,
}

/// Read and write named matrices from and to delimited files
pub trait IoOps {
    type Scalar;
    type Mat;

    /// Read a table whose first column holds row names and whose
    /// header line holds column names (the first header field, naming
    /// the row-name column, is dropped when the header is one field
    /// longer than the data).
    fn read_names_delim(
        file: &str,
        delim: impl Into<Delimiter>,
    ) -> anyhow::Result<MatWithNames<Self::Mat>>;

    /// Write the matrix with a header line of column names and the row
    /// name at the start of each line
    fn write_names_delim(
        &self,
        file: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
        corner: &str,
        delim: &str,
    ) -> anyhow::Result<()>;
}
