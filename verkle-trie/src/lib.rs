//! A 256-ary key-value trie authenticated with vector commitments over the
//! banderwagon group.
//!
//! Keys are 32 bytes: the first 31 bytes (the stem) pick a path through the
//! internal nodes, the last byte (the suffix) picks a slot inside a leaf.
//! Every node carries a commitment over its children (or, for leaves, over
//! its stored values), so a single 32-byte root hash authenticates the whole
//! mapping. The [`account`] module layers the Ethereum account and contract
//! code encoding on top of the raw trie.

pub mod account;
pub mod committer;
pub mod constant;
pub mod node;
pub mod trie;

pub use account::{chunkify_code, Account};
pub use committer::{shared_committer, Committer};
pub use trie::VerkleTrie;
