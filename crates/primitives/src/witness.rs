//! Trie witnesses supplied to a fraud proof.
//!
//! These are produced by an external witness collector, which hands them over
//! as camelCase JSON.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;
use crate::tx::Address;

#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub nonce: u64,
    /// Big-endian 256-bit balance.
    pub balance: Buf32,
    pub storage_root: Buf32,
    pub code_hash: Buf32,
}

/// Proof of an account leaf in the global state trie.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct StateTrieWitness {
    pub root: Buf32,
    #[serde(with = "hex_nodes")]
    pub proof: Vec<Vec<u8>>,
    pub key: Address,
    pub value: AccountState,
}

/// Proof of a slot in one account's storage trie.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct StorageTrieWitness {
    pub root: Buf32,
    #[serde(with = "hex_nodes")]
    pub proof: Vec<Vec<u8>>,
    pub key: Buf32,
    pub value: Buf32,
}

/// Storage slot proof together with the proof of the account holding it.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrieWitness {
    pub state_trie_witness: StateTrieWitness,
    pub account_trie_witness: StorageTrieWitness,
}

/// A witness is a storage slot witness iff it carries a nested state trie
/// witness; untagged decoding tries that shape first.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(untagged)]
pub enum Witness {
    StorageSlot(AccountTrieWitness),
    Contract(StateTrieWitness),
}

impl Witness {
    /// Address of the contract this witness is about.
    pub fn contract(&self) -> &Address {
        match self {
            Witness::StorageSlot(w) => &w.state_trie_witness.key,
            Witness::Contract(w) => &w.key,
        }
    }
}

mod hex_nodes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(nodes: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let enc: Vec<String> = nodes.iter().map(hex::encode).collect();
        enc.serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let enc = Vec::<String>::deserialize(d)?;
        enc.iter()
            .map(|n| hex::decode(n.strip_prefix("0x").unwrap_or(n)))
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }
}
