use std::collections::HashMap;

use alloy_primitives::B256;
use oru_mpt::{
    account_key, decode_account, empty_account, encode_account, slot_key, PartialTrie, TrieError,
};
use oru_primitives::{
    buf::Buf32,
    tx::Address,
    witness::{AccountState, AccountTrieWitness, StateTrieWitness, StorageTrieWitness, Witness},
};

use crate::{
    contracts::{UpdatedContract, UpdatedStorageSlot},
    errors::ProverError,
};

/// The parts of the pre-state covered by the published witnesses.
///
/// Proof nodes are merged into a partial state trie and one partial storage
/// trie per contract. Each applied update is written into those tries, so
/// the witness returned for it opens against the root left by the previous
/// update and the next root follows from its proof and new value.
#[derive(Clone, Debug, Default)]
pub struct WitnessCache {
    state: Option<PartialTrie>,
    storage: HashMap<Address, PartialTrie>,
}

impl WitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, witness: &Witness) {
        match witness {
            Witness::Contract(w) => self.add_state_proof(w),
            Witness::StorageSlot(w) => {
                self.add_state_proof(&w.state_trie_witness);
                let storage = &w.account_trie_witness;
                self.storage
                    .entry(w.state_trie_witness.key)
                    .or_insert_with(|| PartialTrie::new(to_b256(storage.root)))
                    .add_proof_nodes(&storage.proof);
            }
        }
    }

    fn add_state_proof(&mut self, w: &StateTrieWitness) {
        self.state
            .get_or_insert_with(|| PartialTrie::new(to_b256(w.root)))
            .add_proof_nodes(&w.proof);
    }

    /// Current state root, `None` before any witness was inserted.
    pub fn state_root(&self) -> Option<Buf32> {
        self.state.as_ref().map(|t| to_buf(t.root()))
    }

    pub fn storage_root(&self, contract: &Address) -> Option<Buf32> {
        self.storage.get(contract).map(|t| to_buf(t.root()))
    }

    /// Current account record, `Ok(None)` if the covered state proves it
    /// absent.
    pub fn account(&self, contract: &Address) -> Result<Option<AccountState>, ProverError> {
        let missing = || ProverError::MissingContractWitness(*contract);
        let state = self.state.as_ref().ok_or_else(missing)?;
        read_account(state, contract).map_err(|e| uncovered(e, missing))
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
    }

    /// Writes a slot update into the storage trie and the new storage root
    /// into the account, returning both proofs.
    pub fn apply_slot_update(
        &mut self,
        update: &UpdatedStorageSlot,
    ) -> Result<AccountTrieWitness, ProverError> {
        let missing = || ProverError::MissingSlotWitness {
            contract: update.contract,
            key: update.key,
        };
        let state = self.state.as_mut().ok_or_else(missing)?;

        let mut account = read_account(state, &update.contract)
            .map_err(|e| uncovered(e, missing))?
            .unwrap_or_else(empty_account);

        let storage = self
            .storage
            .entry(update.contract)
            .or_insert_with(|| PartialTrie::new(to_b256(account.storage_root)));
        let storage_root = to_buf(storage.root());
        let storage_proof = storage
            .update_and_prove(
                slot_key(&update.key).as_slice(),
                update.value.as_slice().to_vec(),
            )
            .map_err(|e| uncovered(e, missing))?;
        account.storage_root = to_buf(storage.root());

        let state_root = to_buf(state.root());
        let state_proof = state
            .update_and_prove(
                account_key(&update.contract).as_slice(),
                encode_account(&account),
            )
            .map_err(|e| uncovered(e, missing))?;

        Ok(AccountTrieWitness {
            state_trie_witness: StateTrieWitness {
                root: state_root,
                proof: state_proof,
                key: update.contract,
                value: account,
            },
            account_trie_witness: StorageTrieWitness {
                root: storage_root,
                proof: storage_proof,
                key: update.key,
                value: update.value,
            },
        })
    }

    /// Writes the new nonce and code hash into the account, returning the
    /// proof of the account.
    pub fn apply_contract_update(
        &mut self,
        update: &UpdatedContract,
    ) -> Result<StateTrieWitness, ProverError> {
        let missing = || ProverError::MissingContractWitness(update.contract);
        let state = self.state.as_mut().ok_or_else(missing)?;

        let mut account = read_account(state, &update.contract)
            .map_err(|e| uncovered(e, missing))?
            .unwrap_or_else(empty_account);
        account.nonce = update.nonce;
        account.code_hash = update.code_hash;

        let root = to_buf(state.root());
        let proof = state
            .update_and_prove(
                account_key(&update.contract).as_slice(),
                encode_account(&account),
            )
            .map_err(|e| uncovered(e, missing))?;

        Ok(StateTrieWitness {
            root,
            proof,
            key: update.contract,
            value: account,
        })
    }
}

fn read_account(
    state: &PartialTrie,
    contract: &Address,
) -> Result<Option<AccountState>, TrieError> {
    state
        .get(account_key(contract).as_slice())?
        .map(|raw| decode_account(&raw))
        .transpose()
}

/// Paths the witnesses never covered surface as missing witnesses.
fn uncovered(err: TrieError, missing: impl FnOnce() -> ProverError) -> ProverError {
    match err {
        TrieError::MissingNode(_) => missing(),
        err => ProverError::Trie(err),
    }
}

fn to_b256(buf: Buf32) -> B256 {
    B256::from(buf.0)
}

fn to_buf(hash: B256) -> Buf32 {
    Buf32::from(hash.0)
}
