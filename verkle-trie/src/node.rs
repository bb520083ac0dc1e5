//! In-memory trie nodes.
//!
//! Every node caches its commitment and invalidates the cache on any change
//! underneath it, so the cost of recomputation is paid once per commit pass
//! rather than once per insert.

use crate::committer::Committer;
use crate::constant::{NODE_WIDTH, STEM_SIZE, TWO_POW_128};
use banderwagon::{trait_defs::*, Element, Fr};

pub enum Node {
    Empty,
    Leaf(Box<LeafNode>),
    Internal(Box<InternalNode>),
}

/// A leaf holds every value that shares one 31-byte stem, indexed by the
/// final key byte.
pub struct LeafNode {
    pub stem: [u8; STEM_SIZE],
    values: Vec<Option<[u8; 32]>>,
    commitment: Option<Element>,
}

impl LeafNode {
    pub fn new(stem: [u8; STEM_SIZE]) -> LeafNode {
        LeafNode {
            stem,
            values: vec![None; NODE_WIDTH],
            commitment: None,
        }
    }

    /// Stores `value` at `suffix`, returning whether anything changed.
    pub fn set(&mut self, suffix: u8, value: [u8; 32]) -> bool {
        let slot = &mut self.values[suffix as usize];
        if *slot == Some(value) {
            return false;
        }
        *slot = Some(value);
        self.commitment = None;
        true
    }

    pub fn get(&self, suffix: u8) -> Option<[u8; 32]> {
        self.values[suffix as usize]
    }

    /// Commits the values at suffixes `[offset, offset + NODE_WIDTH / 2)`.
    ///
    /// Each 32-byte value occupies two scalar slots: the low 16 bytes plus a
    /// marker bit at 2^128, and the high 16 bytes. The marker distinguishes a
    /// stored zero from an empty slot.
    fn suffix_commitment(&self, committer: &Committer, offset: usize) -> Element {
        let mut scalars = Vec::new();
        for (i, value) in self.values[offset..offset + NODE_WIDTH / 2]
            .iter()
            .enumerate()
        {
            let Some(value) = value else { continue };
            let low = Fr::from_le_bytes_mod_order(&value[..16]) + *TWO_POW_128;
            let high = Fr::from_le_bytes_mod_order(&value[16..]);
            scalars.push((2 * i, low));
            scalars.push((2 * i + 1, high));
        }
        committer.commit_sparse(&scalars)
    }

    /// The leaf commitment, recomputing and memoizing it if stale.
    pub fn commitment(&mut self, committer: &Committer) -> Element {
        if let Some(commitment) = self.commitment {
            return commitment;
        }

        let c1 = self.suffix_commitment(committer, 0);
        let c2 = self.suffix_commitment(committer, NODE_WIDTH / 2);
        let mapped = Element::batch_map_to_scalar_field(&[c1, c2]);

        let commitment = committer.commit_sparse(&[
            (0, Fr::one()),
            (1, Fr::from_le_bytes_mod_order(&self.stem)),
            (2, mapped[0]),
            (3, mapped[1]),
        ]);
        self.commitment = Some(commitment);
        commitment
    }
}

/// An internal node routes on one stem byte and commits to the mapped
/// commitments of its non-empty children.
pub struct InternalNode {
    children: Vec<Node>,
    commitment: Option<Element>,
}

impl InternalNode {
    pub fn new() -> InternalNode {
        InternalNode {
            children: (0..NODE_WIDTH).map(|_| Node::Empty).collect(),
            commitment: None,
        }
    }

    /// Inserts `value` under `stem`/`suffix`, `depth` bytes of the stem
    /// having been consumed already. Returns whether anything changed.
    pub fn insert(
        &mut self,
        stem: [u8; STEM_SIZE],
        suffix: u8,
        value: [u8; 32],
        depth: usize,
    ) -> bool {
        let index = stem[depth] as usize;
        let changed = match &mut self.children[index] {
            child @ Node::Empty => {
                let mut leaf = LeafNode::new(stem);
                leaf.set(suffix, value);
                *child = Node::Leaf(Box::new(leaf));
                true
            }
            Node::Leaf(leaf) if leaf.stem == stem => leaf.set(suffix, value),
            child @ Node::Leaf(_) => {
                // Two stems collide on this byte: push the existing leaf one
                // level down and retry the insert from the new branch.
                let Node::Leaf(existing) = std::mem::replace(child, Node::Empty) else {
                    unreachable!()
                };
                let mut branch = InternalNode::new();
                let existing_index = existing.stem[depth + 1] as usize;
                branch.children[existing_index] = Node::Leaf(existing);
                branch.insert(stem, suffix, value, depth + 1);
                *child = Node::Internal(Box::new(branch));
                true
            }
            Node::Internal(branch) => branch.insert(stem, suffix, value, depth + 1),
        };
        if changed {
            self.commitment = None;
        }
        changed
    }

    pub fn get(&self, stem: &[u8; STEM_SIZE], suffix: u8, depth: usize) -> Option<[u8; 32]> {
        match &self.children[stem[depth] as usize] {
            Node::Empty => None,
            Node::Leaf(leaf) if leaf.stem == *stem => leaf.get(suffix),
            Node::Leaf(_) => None,
            Node::Internal(branch) => branch.get(stem, suffix, depth + 1),
        }
    }

    /// The node commitment, recomputing and memoizing it if stale.
    pub fn commitment(&mut self, committer: &Committer) -> Element {
        if let Some(commitment) = self.commitment {
            return commitment;
        }

        let mut indices = Vec::new();
        let mut points = Vec::new();
        for (index, child) in self.children.iter_mut().enumerate() {
            let point = match child {
                Node::Empty => continue,
                Node::Leaf(leaf) => leaf.commitment(committer),
                Node::Internal(branch) => branch.commitment(committer),
            };
            indices.push(index);
            points.push(point);
        }

        let mapped = Element::batch_map_to_scalar_field(&points);
        let scalars: Vec<(usize, Fr)> = indices.into_iter().zip(mapped).collect();
        let commitment = committer.commit_sparse(&scalars);
        self.commitment = Some(commitment);
        commitment
    }
}

impl Default for InternalNode {
    fn default() -> Self {
        InternalNode::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::committer::shared_committer;

    #[test]
    fn leaf_commitment_tracks_value_changes() {
        let committer = shared_committer();
        let mut leaf = LeafNode::new([7u8; STEM_SIZE]);

        assert!(leaf.set(3, [1u8; 32]));
        let before = leaf.commitment(&committer);

        // Re-setting the same value leaves the cache in place.
        assert!(!leaf.set(3, [1u8; 32]));
        assert_eq!(leaf.commitment(&committer), before);

        assert!(leaf.set(3, [2u8; 32]));
        assert_ne!(leaf.commitment(&committer), before);
    }

    #[test]
    fn stored_zero_differs_from_absent() {
        let committer = shared_committer();

        let mut with_zero = LeafNode::new([1u8; STEM_SIZE]);
        with_zero.set(0, [0u8; 32]);
        let mut empty = LeafNode::new([1u8; STEM_SIZE]);

        assert_ne!(
            with_zero.commitment(&committer),
            empty.commitment(&committer)
        );
    }

    #[test]
    fn leaf_split_preserves_both_entries() {
        let committer = shared_committer();
        let mut root = InternalNode::new();

        // Stems agree on the first two bytes, diverging at depth 2.
        let mut stem_a = [0u8; STEM_SIZE];
        let mut stem_b = [0u8; STEM_SIZE];
        stem_a[2] = 1;
        stem_b[2] = 2;

        assert!(root.insert(stem_a, 0, [10u8; 32], 0));
        assert!(root.insert(stem_b, 0, [20u8; 32], 0));

        assert_eq!(root.get(&stem_a, 0, 0), Some([10u8; 32]));
        assert_eq!(root.get(&stem_b, 0, 0), Some([20u8; 32]));

        // Commitment pass succeeds over the split structure.
        root.commitment(&committer);
    }
}
