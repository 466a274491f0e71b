//! Membership mapping utilities for grouping items by category.
//!
//! Reads membership files (TSV/CSV, optionally gzipped) mapping keys
//! such as cell barcodes onto group names such as cell types.

use crate::common_io::{read_lines_of_words_delim, ReadLinesOut};
use fnv::FnvHashMap as HashMap;
use log::{info, warn};

/// A membership mapping from keys to groups/categories.
///
/// Keeps the order in which keys and groups were first seen.
#[derive(Clone, Debug)]
pub struct Membership {
    /// key -> group
    map: HashMap<Box<str>, Box<str>>,
    /// keys in file order
    keys: Vec<Box<str>>,
}

/// Statistics about membership matching
#[derive(Debug, Default, Clone)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
}

impl MatchStats {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

impl Membership {
    /// Create membership from key-value pairs. A repeated key keeps its
    /// first group.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Box<str>, Box<str>)>) -> Self {
        let mut map = HashMap::default();
        let mut keys = Vec::new();

        for (key, value) in pairs {
            if map.contains_key(&key) {
                continue;
            }
            keys.push(key.clone());
            map.insert(key, value);
        }

        Self { map, keys }
    }

    /// Load membership from file (TSV, CSV, or gzipped variants)
    ///
    /// # Arguments
    /// * `file_path` - Path to membership file
    /// * `key_col` - Column index for keys (0-based)
    /// * `value_col` - Column index for values (0-based)
    /// * `has_header` - Skip the first line
    pub fn from_file(
        file_path: &str,
        key_col: usize,
        value_col: usize,
        has_header: bool,
    ) -> anyhow::Result<Self> {
        let delim = detect_delimiter(file_path);
        let hdr_line = if has_header { 0 } else { -1 };

        let ReadLinesOut { lines, header: _ } =
            read_lines_of_words_delim(file_path, delim, hdr_line)?;

        if lines.is_empty() {
            anyhow::bail!("Membership file is empty: {}", file_path);
        }

        let max_col = key_col.max(value_col);
        let mut pairs = Vec::with_capacity(lines.len());
        let mut n_malformed = 0;

        for line in lines {
            if line.len() <= max_col {
                n_malformed += 1;
                continue;
            }
            pairs.push((line[key_col].clone(), line[value_col].clone()));
        }

        if pairs.is_empty() {
            anyhow::bail!(
                "Membership file {} has no line with column index {}",
                file_path,
                max_col
            );
        }

        if n_malformed > 0 {
            warn!(
                "Skipped {} malformed line(s) with fewer than {} columns",
                n_malformed,
                max_col + 1
            );
        }

        let n_pairs = pairs.len();
        let ret = Self::from_pairs(pairs);

        if ret.len() < n_pairs {
            warn!(
                "{} duplicated key(s) in {}; kept the first group of each",
                n_pairs - ret.len(),
                file_path
            );
        }

        info!("Loaded {} entries from {}", ret.len(), file_path);
        Ok(ret)
    }

    /// Look up a list of query keys, keeping their order
    pub fn match_keys(&self, query_keys: &[Box<str>]) -> (Vec<Option<Box<str>>>, MatchStats) {
        let mut stats = MatchStats::default();
        let matched = query_keys
            .iter()
            .map(|k| {
                let g = self.map.get(k).cloned();
                if g.is_some() {
                    stats.matched += 1;
                } else {
                    stats.unmatched += 1;
                }
                g
            })
            .collect();
        (matched, stats)
    }

    /// Unique groups in the order of their first appearance
    pub fn groups_in_order(&self) -> Vec<Box<str>> {
        let mut seen = fnv::FnvHashSet::default();
        self.keys
            .iter()
            .filter_map(|k| self.map.get(k))
            .filter(|g| seen.insert(g.clone()))
            .cloned()
            .collect()
    }

    /// Number of entries in the membership
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if membership is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Detect delimiter from file extension
pub fn detect_delimiter(file_path: &str) -> &'static str {
    if file_path.ends_with(".csv") || file_path.ends_with(".csv.gz") {
        ","
    } else {
        "\t"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cell\tcell_type").unwrap();
        writeln!(file, "AAACCT\tgroup_B").unwrap();
        writeln!(file, "BBBCCT\tgroup_A").unwrap();
        writeln!(file, "CCCCCT\tgroup_B").unwrap();
        writeln!(file, "DDDCCT").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_exact_match() {
        let file = create_test_file();
        let membership = Membership::from_file(file.path().to_str().unwrap(), 0, 1, true).unwrap();

        assert_eq!(membership.len(), 3);
        let queries: Vec<Box<str>> = vec![
            "AAACCT".into(),
            "BBBCCT".into(),
            "cell".into(),
            "DDDCCT".into(),
        ];
        let (matched, _) = membership.match_keys(&queries);
        assert_eq!(matched[0].as_deref(), Some("group_B"));
        assert_eq!(matched[1].as_deref(), Some("group_A"));
        assert_eq!(matched[2], None);
        assert_eq!(matched[3], None);
    }

    #[test]
    fn test_match_keys() {
        let file = create_test_file();
        let membership = Membership::from_file(file.path().to_str().unwrap(), 0, 1, true).unwrap();

        let queries: Vec<Box<str>> = vec!["CCCCCT".into(), "UNKNOWN".into(), "AAACCT".into()];
        let (matched, stats) = membership.match_keys(&queries);

        assert_eq!(stats.matched, 2);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(matched[0].as_deref(), Some("group_B"));
        assert_eq!(matched[1], None);
        assert_eq!(matched[2].as_deref(), Some("group_B"));
    }

    #[test]
    fn test_group_order() {
        let file = create_test_file();
        let membership = Membership::from_file(file.path().to_str().unwrap(), 0, 1, true).unwrap();

        assert_eq!(
            membership.groups_in_order(),
            vec![Box::<str>::from("group_B"), Box::<str>::from("group_A")]
        );
    }
}
