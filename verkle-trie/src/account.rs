//! Ethereum account layout over the trie (EIP-6800).
//!
//! Account header fields, storage slots and code chunks all map to trie keys
//! derived from a commitment over the address and a 256-bit tree index. The
//! last key byte selects the slot within the addressed leaf.

use crate::constant::{
    BALANCE_LEAF_KEY, CODE_CHUNK_SIZE, CODE_HASH_LEAF_KEY, CODE_OFFSET, CODE_SIZE_LEAF_KEY,
    HEADER_STORAGE_OFFSET, KEY_SIZE, MAIN_STORAGE_OFFSET, NODE_WIDTH, NONCE_LEAF_KEY,
    PEDERSEN_HASH_PREFIX, PUSH1, PUSH32, PUSH_OFFSET, VERSION_LEAF_KEY,
};
use crate::trie::VerkleTrie;
use alloy_primitives::{Address, B256, U256, KECCAK256_EMPTY};
use banderwagon::{fr_to_le_bytes, trait_defs::*, Fr};

/// The account header fields stored in the trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: B256,
}

impl Account {
    /// An externally owned account: no code.
    pub fn eoa(nonce: u64, balance: U256) -> Account {
        Account {
            nonce,
            balance,
            code_hash: KECCAK256_EMPTY,
        }
    }
}

impl VerkleTrie {
    /// Derives the trie key for `address` at `tree_index`/`sub_index`.
    ///
    /// The 64-byte input (address left-padded to 32 bytes, then the index in
    /// little-endian) is committed in 16-byte chunks behind a fixed prefix
    /// scalar; the commitment maps to the first 31 key bytes and `sub_index`
    /// becomes the last.
    pub fn tree_key(&self, address: Address, tree_index: U256, sub_index: u8) -> [u8; KEY_SIZE] {
        let mut input = [0u8; 64];
        input[12..32].copy_from_slice(address.as_slice());
        input[32..].copy_from_slice(&tree_index.to_le_bytes::<32>());

        let scalars = [
            Fr::from(PEDERSEN_HASH_PREFIX),
            Fr::from_le_bytes_mod_order(&input[..16]),
            Fr::from_le_bytes_mod_order(&input[16..32]),
            Fr::from_le_bytes_mod_order(&input[32..48]),
            Fr::from_le_bytes_mod_order(&input[48..]),
        ];

        let point = self.committer().commit_lagrange(&scalars);
        let mut key = fr_to_le_bytes(point.map_to_scalar_field());
        key[KEY_SIZE - 1] = sub_index;
        key
    }

    /// Key of an account header field (tree index zero).
    pub fn account_header_key(&self, address: Address, sub_index: u8) -> [u8; KEY_SIZE] {
        self.tree_key(address, U256::ZERO, sub_index)
    }

    /// Writes the account header fields: version, balance, nonce, code hash.
    pub fn update_account(&mut self, address: Address, account: &Account) {
        let version = [0u8; 32];
        let balance = account.balance.to_le_bytes::<32>();
        let mut nonce = [0u8; 32];
        nonce[..8].copy_from_slice(&account.nonce.to_le_bytes());

        self.insert(self.account_header_key(address, VERSION_LEAF_KEY), version);
        self.insert(self.account_header_key(address, BALANCE_LEAF_KEY), balance);
        self.insert(self.account_header_key(address, NONCE_LEAF_KEY), nonce);
        self.insert(
            self.account_header_key(address, CODE_HASH_LEAF_KEY),
            account.code_hash.0,
        );
    }

    /// Writes the contract code size and all code chunks.
    pub fn update_contract_code(&mut self, address: Address, code: &[u8]) {
        let mut code_size = [0u8; 32];
        code_size[..8].copy_from_slice(&(code.len() as u64).to_le_bytes());
        self.insert(
            self.account_header_key(address, CODE_SIZE_LEAF_KEY),
            code_size,
        );

        for (i, chunk) in chunkify_code(code).into_iter().enumerate() {
            let position = CODE_OFFSET + i as u64;
            let tree_index = U256::from(position / NODE_WIDTH as u64);
            let sub_index = (position % NODE_WIDTH as u64) as u8;
            self.insert(self.tree_key(address, tree_index, sub_index), chunk);
        }
    }

    /// Key of a contract storage slot.
    ///
    /// The first 64 slots interleave with the account header; everything
    /// else lives beyond `MAIN_STORAGE_OFFSET`, where the addition wraps
    /// modulo 2^256 so every slot stays reachable.
    pub fn storage_slot_key(&self, address: Address, slot: U256) -> [u8; KEY_SIZE] {
        let position = if slot < U256::from(CODE_OFFSET - HEADER_STORAGE_OFFSET) {
            slot + U256::from(HEADER_STORAGE_OFFSET)
        } else {
            MAIN_STORAGE_OFFSET.wrapping_add(slot)
        };
        let tree_index = position >> 8;
        let sub_index = position.to_le_bytes::<32>()[0];
        self.tree_key(address, tree_index, sub_index)
    }

    pub fn update_storage_slot(&mut self, address: Address, slot: U256, value: [u8; 32]) {
        self.insert(self.storage_slot_key(address, slot), value);
    }
}

/// Splits contract code into 31-byte chunks, each prefixed with the number
/// of leading bytes that are `PUSH` data rather than opcodes.
///
/// `PUSHn` immediates may span a chunk boundary, so the scan carries the
/// remaining data count across chunks.
pub fn chunkify_code(code: &[u8]) -> Vec<[u8; 32]> {
    let mut chunks = Vec::with_capacity(code.len().div_ceil(CODE_CHUNK_SIZE));
    let mut pushdata_left = 0usize;

    for chunk_bytes in code.chunks(CODE_CHUNK_SIZE) {
        let mut chunk = [0u8; 32];
        chunk[0] = pushdata_left.min(CODE_CHUNK_SIZE) as u8;
        chunk[1..1 + chunk_bytes.len()].copy_from_slice(chunk_bytes);
        chunks.push(chunk);

        // Scan the opcodes in this chunk to find how much push data spills
        // into the next one.
        for &byte in chunk_bytes {
            if pushdata_left > 0 {
                pushdata_left -= 1;
            } else if (PUSH1..=PUSH32).contains(&byte) {
                pushdata_left = (byte - PUSH_OFFSET) as usize;
            }
        }
    }
    chunks
}
