//! Partial Merkle-Patricia tries rebuilt from inclusion proofs.
//!
//! A dispute only carries the trie nodes along the paths it touches. That is
//! enough to read, update and re-prove those paths and to track the root,
//! without holding the rest of the trie.

pub mod account;
mod error;
mod nibbles;
mod node;
mod trie;

pub use account::{
    account_key, decode_account, empty_account, encode_account, slot_key, TrieAccount,
};
pub use error::TrieError;
pub use trie::{empty_root, PartialTrie};
