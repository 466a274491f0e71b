use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::tempdir;

/// Field separator: either a fixed string or any of a set of characters
pub enum Delimiter {
    Str(String),
    Chars(Vec<char>),
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Str(s.to_string())
    }
}

impl From<Vec<char>> for Delimiter {
    fn from(chars: Vec<char>) -> Self {
        Delimiter::Chars(chars)
    }
}

impl From<&[char]> for Delimiter {
    fn from(chars: &[char]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl<const N: usize> From<&[char; N]> for Delimiter {
    fn from(chars: &[char; N]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl Delimiter {
    fn split_words(&self, line: &str) -> Vec<Box<str>> {
        match self {
            Delimiter::Str(s) => line.split(s.as_str()).map(Box::from).collect(),
            Delimiter::Chars(chars) => line.split(chars.as_slice()).map(Box::from).collect(),
        }
    }
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

fn is_data_line(line: &str) -> bool {
    !(line.starts_with('#') || line.starts_with('%') || line.trim().is_empty())
}

///
/// Read lines and parse each of them into a vector of words or
/// types. Comment lines (`#`, `%`) and blank lines are skipped
/// before the header position is counted.
///
/// * `input_file` - file name--either gzipped or not
/// * `hdr_line` - location of a header line (-1 = no header line)
/// * `parse_header_fn` - function to parse the header line
/// * `parse_fn` - function to parse each line into the desired type
///
pub fn read_lines_of_words_generic<T>(
    input_file: &str,
    hdr_line: i64,
    parse_header_fn: impl Fn(&str) -> Vec<Box<str>> + Sync,
    parse_fn: impl Fn(&str) -> Vec<T> + Sync,
) -> anyhow::Result<ReadLinesOut<T>>
where
    T: Send,
{
    let buf_reader: Box<dyn BufRead> = open_buf_reader(input_file)?;

    let mut lines_raw: Vec<Box<str>> = vec![];
    for line in buf_reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if is_data_line(line) {
            lines_raw.push(line.into());
        }
    }

    let mut header = vec![];

    let data_lines = if hdr_line < 0 {
        &lines_raw[..]
    } else {
        let n_skip = hdr_line as usize;
        if lines_raw.len() < (n_skip + 1) {
            return Err(anyhow::anyhow!("not enough data in {}", input_file));
        }
        header.extend(parse_header_fn(&lines_raw[n_skip]));
        &lines_raw[(n_skip + 1)..]
    };

    // parsing takes more time than reading, and `collect` on an
    // indexed parallel iterator keeps the original order
    let lines: Vec<Vec<T>> = data_lines.par_iter().map(|s| parse_fn(s)).collect();

    Ok(ReadLinesOut { lines, header })
}

///
/// Read lines and split them into words by whitespace
///
/// * `input_file` - file name--either gzipped or not
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words(
    input_file: &str,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let parse_fn = |line: &str| -> Vec<Box<str>> { line.split_whitespace().map(Box::from).collect() };

    read_lines_of_words_generic(input_file, hdr_line, parse_fn, parse_fn)
}

///
/// Read lines and split them into words by the delimiter
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: impl Into<Delimiter>,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let delim = delim.into();
    let parse_fn = |line: &str| -> Vec<Box<str>> { delim.split_words(line) };
    read_lines_of_words_generic(input_file, hdr_line, parse_fn, parse_fn)
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match ext {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    if output_file.eq_ignore_ascii_case("stderr") {
        return Ok(Box::new(BufWriter::new(std::io::stderr())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    let file = File::create(output_file)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", output_file, e))?;
    match ext {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

///
/// Take the extension of a file
/// * `file` - file name
///
pub fn extension(file: &str) -> anyhow::Result<Box<str>> {
    Path::new(file)
        .extension()
        .and_then(|x| x.to_str())
        .map(Box::from)
        .ok_or(anyhow::anyhow!("failed to extract extension: {}", file))
}

///
/// Take the extension ignoring a trailing `.gz`, e.g., `tsv` for
/// `counts.tsv.gz`
/// * `file` - file name
///
pub fn extension_without_gz(file: &str) -> anyhow::Result<Box<str>> {
    let ext = extension(file)?;
    if ext.as_ref() == "gz" {
        let stem = file.trim_end_matches(".gz");
        extension(stem)
    } else {
        Ok(ext)
    }
}

///
/// Create a temporary directory and suggest a file name
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_dir = tempdir()?.keep();
    std::fs::create_dir_all(&temp_dir)?;
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(temp_dir)?
        .path()
        .to_owned();

    Ok(temp_file)
}

///
/// Remove a file if it exists
/// * `file` - file name
///
pub fn remove_file(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if path.exists() {
        if path.is_file() {
            std::fs::remove_file(path)?;
        } else {
            std::fs::remove_dir_all(path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_comments() -> anyhow::Result<()> {
        let file = create_temp_dir_file(".tsv.gz")?;
        let file = file.to_str().unwrap();
        let lines: Vec<Box<str>> = vec![
            "# comment".into(),
            "gene\tc1\tc2".into(),
            "".into(),
            "g1\t1\t0".into(),
            "g2\t0\t3".into(),
        ];
        write_lines(&lines, file)?;

        let ReadLinesOut { lines, header } = read_lines_of_words_delim(file, "\t", 0)?;
        assert_eq!(header.len(), 3);
        assert_eq!(header[1].as_ref(), "c1");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][0].as_ref(), "g2");
        assert_eq!(lines[1][2].as_ref(), "3");
        remove_file(file)?;
        Ok(())
    }

    #[test]
    fn extension_of_gzipped_table() -> anyhow::Result<()> {
        assert_eq!(extension_without_gz("a/b/counts.tsv.gz")?.as_ref(), "tsv");
        assert_eq!(extension_without_gz("counts.mtx")?.as_ref(), "mtx");
        Ok(())
    }
}
