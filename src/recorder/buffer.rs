use crate::capture::Fragment;

/// Recorded fragments in delivery (playback) order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkBuffer {
    chunks: Vec<Fragment>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.chunks.push(fragment);
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Number of fragments
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total payload size in bytes
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.chunks.iter()
    }

    /// All fragments joined into one payload
    pub fn concat(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.total_bytes());
        for chunk in &self.chunks {
            payload.extend_from_slice(chunk);
        }
        payload
    }
}

impl FromIterator<Fragment> for ChunkBuffer {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self {
            chunks: iter.into_iter().collect(),
        }
    }
}
