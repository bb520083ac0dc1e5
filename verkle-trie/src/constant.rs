//! Constants that determine the shape of the trie and the account encoding.

use alloy_primitives::U256;
use banderwagon::{trait_defs::*, Fr};
use once_cell::sync::Lazy;

/// Branch factor of the trie nodes, and width of the committed vectors.
/// Always a power of two.
pub const NODE_WIDTH: usize = 256;
/// Number of key bytes that route through internal nodes.
pub const STEM_SIZE: usize = 31;
/// Full key size: stem plus one suffix byte.
pub const KEY_SIZE: usize = 32;

/// Marker added to the low half of a stored value so that an explicitly
/// stored zero is distinguishable from an absent value.
pub static TWO_POW_128: Lazy<Fr> = Lazy::new(|| {
    let mut bytes = [0u8; 17];
    bytes[16] = 1;
    Fr::from_le_bytes_mod_order(&bytes)
});

/// First scalar of the key-derivation commitment: `2 + 256 * 64`, where 2
/// tags the hash usage and 64 is the size of the hash input.
pub const PEDERSEN_HASH_PREFIX: u64 = 2 + (NODE_WIDTH as u64) * 64;

// Sub-indices of the account header fields within the header stem.
pub const VERSION_LEAF_KEY: u8 = 0;
pub const BALANCE_LEAF_KEY: u8 = 1;
pub const NONCE_LEAF_KEY: u8 = 2;
pub const CODE_HASH_LEAF_KEY: u8 = 3;
pub const CODE_SIZE_LEAF_KEY: u8 = 4;

/// Storage slots below `CODE_OFFSET - HEADER_STORAGE_OFFSET` live in the
/// account header stem, starting at this position.
pub const HEADER_STORAGE_OFFSET: u64 = 64;
/// Position of the first code chunk.
pub const CODE_OFFSET: u64 = 128;
/// All remaining storage starts at 256^31.
pub const MAIN_STORAGE_OFFSET: U256 = U256::from_limbs([0, 0, 0, 1 << 56]);

/// Number of code bytes packed into one stored chunk.
pub const CODE_CHUNK_SIZE: usize = 31;
/// `PUSH1` opcode; `PUSHn` is `PUSH_OFFSET + n`.
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const PUSH_OFFSET: u8 = 0x5f;
