/// Every ordered (sender, receiver) pair of clusters, self pairs
/// included. Pair `(s, r)` sits at `s * n + r`.
#[derive(Clone, Debug)]
pub struct ClusterPairs {
    names: Vec<Box<str>>,
    pairs: Vec<(usize, usize)>,
}

impl ClusterPairs {
    pub fn new(names: &[Box<str>]) -> Self {
        let n = names.len();
        let pairs = (0..n)
            .flat_map(|sender| (0..n).map(move |receiver| (sender, receiver)))
            .collect();
        Self {
            names: names.to_vec(),
            pairs,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// (sender, receiver) cluster indexes
    pub fn iter(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.pairs.iter()
    }

    pub fn get(&self, p: usize) -> Option<(usize, usize)> {
        self.pairs.get(p).copied()
    }

    pub fn position(&self, sender: usize, receiver: usize) -> Option<usize> {
        let n = self.names.len();
        (sender < n && receiver < n).then_some(sender * n + receiver)
    }

    /// `{sender} - {receiver}`
    pub fn pair_name(&self, p: usize) -> Option<String> {
        self.get(p)
            .map(|(s, r)| format!("{} - {}", self.names[s], self.names[r]))
    }

    pub fn column_names(&self) -> Vec<Box<str>> {
        (0..self.len())
            .filter_map(|p| self.pair_name(p))
            .map(|x| x.into_boxed_str())
            .collect()
    }

    pub fn cluster_names(&self) -> &[Box<str>] {
        &self.names
    }
}
