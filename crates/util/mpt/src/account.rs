//! Leaf encodings of the state and storage tries.
//!
//! State trie leaves are keyed by the keccak hash of the account address and
//! hold the RLP account record. Storage trie leaves are keyed by the keccak
//! hash of the slot key and hold the raw 32-byte slot value.

use alloy_primitives::{keccak256, B256, U256};
use alloy_rlp::Decodable;
use alloy_rlp_derive::{RlpDecodable, RlpEncodable};
use oru_primitives::{buf::Buf32, tx::Address, witness::AccountState};

use crate::{error::TrieError, trie::empty_root};

/// Account record as stored in the state trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct TrieAccount {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: B256,
    pub code_hash: B256,
}

impl From<&AccountState> for TrieAccount {
    fn from(state: &AccountState) -> Self {
        Self {
            nonce: state.nonce,
            balance: U256::from_be_bytes(state.balance.0),
            storage_root: B256::from(state.storage_root.0),
            code_hash: B256::from(state.code_hash.0),
        }
    }
}

impl From<TrieAccount> for AccountState {
    fn from(account: TrieAccount) -> Self {
        Self {
            nonce: account.nonce,
            balance: Buf32::from(account.balance.to_be_bytes::<32>()),
            storage_root: Buf32::from(account.storage_root.0),
            code_hash: Buf32::from(account.code_hash.0),
        }
    }
}

pub fn account_key(address: &Address) -> B256 {
    keccak256(address.as_slice())
}

pub fn slot_key(key: &Buf32) -> B256 {
    keccak256(key.as_slice())
}

pub fn encode_account(state: &AccountState) -> Vec<u8> {
    alloy_rlp::encode(TrieAccount::from(state))
}

pub fn decode_account(mut raw: &[u8]) -> Result<AccountState, TrieError> {
    let account = TrieAccount::decode(&mut raw)?;
    if !raw.is_empty() {
        return Err(alloy_rlp::Error::UnexpectedLength.into());
    }
    Ok(account.into())
}

/// Account that does not exist yet: no code and no storage.
pub fn empty_account() -> AccountState {
    AccountState {
        nonce: 0,
        balance: Buf32::zero(),
        storage_root: Buf32::from(empty_root().0),
        code_hash: Buf32::from(keccak256(b"").0),
    }
}
