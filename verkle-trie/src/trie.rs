use crate::committer::{shared_committer, Committer};
use crate::constant::{KEY_SIZE, STEM_SIZE};
use crate::node::InternalNode;
use banderwagon::Element;
use std::sync::Arc;

/// An in-memory 256-ary trie authenticated by vector commitments.
///
/// Inserts are cheap: commitments are recomputed lazily, on the next call to
/// [`VerkleTrie::commit`] or [`VerkleTrie::root_hash`], and only along paths
/// that changed.
pub struct VerkleTrie {
    root: InternalNode,
    committer: Arc<Committer>,
}

impl VerkleTrie {
    pub fn new() -> VerkleTrie {
        VerkleTrie::with_committer(shared_committer())
    }

    /// Builds a trie over a caller-supplied commitment key.
    pub fn with_committer(committer: Arc<Committer>) -> VerkleTrie {
        VerkleTrie {
            root: InternalNode::new(),
            committer,
        }
    }

    pub(crate) fn committer(&self) -> &Committer {
        &self.committer
    }

    pub fn insert(&mut self, key: [u8; KEY_SIZE], value: [u8; 32]) {
        let (stem, suffix) = split_key(&key);
        self.root.insert(stem, suffix, value, 0);
    }

    pub fn get(&self, key: &[u8; KEY_SIZE]) -> Option<[u8; 32]> {
        let (stem, suffix) = split_key(key);
        self.root.get(&stem, suffix, 0)
    }

    /// Recomputes every stale commitment and returns the root commitment.
    pub fn commit(&mut self) -> Element {
        self.root.commitment(&self.committer)
    }

    /// The compressed serialization of the root commitment. The identity
    /// commitment of an empty trie serializes to 32 zero bytes.
    pub fn root_hash(&mut self) -> [u8; 32] {
        self.commit().to_bytes()
    }
}

impl Default for VerkleTrie {
    fn default() -> Self {
        VerkleTrie::new()
    }
}

fn split_key(key: &[u8; KEY_SIZE]) -> ([u8; STEM_SIZE], u8) {
    let mut stem = [0u8; STEM_SIZE];
    stem.copy_from_slice(&key[..STEM_SIZE]);
    (stem, key[STEM_SIZE])
}
