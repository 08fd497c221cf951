//! A complete world state that hands out trie witnesses.

use std::collections::HashMap;

use oru_mpt::{account_key, empty_account, empty_root, encode_account, slot_key, PartialTrie};
use oru_primitives::{
    buf::Buf32,
    tx::Address,
    witness::{AccountState, AccountTrieWitness, StateTrieWitness, StorageTrieWitness},
};

/// State and storage tries holding every entry, so any account or slot can
/// be proven.
#[derive(Clone, Debug)]
pub struct TestState {
    state: PartialTrie,
    storage: HashMap<Address, PartialTrie>,
    accounts: HashMap<Address, AccountState>,
}

impl Default for TestState {
    fn default() -> Self {
        Self::new()
    }
}

impl TestState {
    pub fn new() -> Self {
        Self {
            state: PartialTrie::new(empty_root()),
            storage: HashMap::new(),
            accounts: HashMap::new(),
        }
    }

    pub fn set_account(&mut self, address: Address, nonce: u64, code_hash: Buf32) {
        let mut account = self.account(address);
        account.nonce = nonce;
        account.code_hash = code_hash;
        self.write_account(address, account);
    }

    pub fn set_slot(&mut self, address: Address, key: Buf32, value: Buf32) {
        let storage = self
            .storage
            .entry(address)
            .or_insert_with(|| PartialTrie::new(empty_root()));
        storage
            .insert(slot_key(&key).as_slice(), value.as_slice().to_vec())
            .expect("test: insert into full trie");
        let storage_root = Buf32::from(storage.root().0);

        let mut account = self.account(address);
        account.storage_root = storage_root;
        self.write_account(address, account);
    }

    fn write_account(&mut self, address: Address, account: AccountState) {
        self.state
            .insert(account_key(&address).as_slice(), encode_account(&account))
            .expect("test: insert into full trie");
        self.accounts.insert(address, account);
    }

    /// The account's record, an empty account if it was never set.
    pub fn account(&self, address: Address) -> AccountState {
        self.accounts
            .get(&address)
            .cloned()
            .unwrap_or_else(empty_account)
    }

    pub fn state_root(&self) -> Buf32 {
        Buf32::from(self.state.root().0)
    }

    pub fn storage_root(&self, address: Address) -> Buf32 {
        let root = self
            .storage
            .get(&address)
            .map(PartialTrie::root)
            .unwrap_or_else(empty_root);
        Buf32::from(root.0)
    }

    pub fn contract_witness(&self, address: Address) -> StateTrieWitness {
        StateTrieWitness {
            root: self.state_root(),
            proof: self
                .state
                .prove(account_key(&address).as_slice())
                .expect("test: prove from full trie"),
            key: address,
            value: self.account(address),
        }
    }

    pub fn slot_witness(&self, address: Address, key: Buf32) -> AccountTrieWitness {
        let empty = PartialTrie::new(empty_root());
        let storage = self.storage.get(&address).unwrap_or(&empty);
        let slot = slot_key(&key);

        let value = storage
            .get(slot.as_slice())
            .expect("test: read from full trie")
            .map(|raw| Buf32::try_from(raw.as_slice()).expect("test: 32-byte slot value"))
            .unwrap_or_else(Buf32::zero);

        AccountTrieWitness {
            state_trie_witness: self.contract_witness(address),
            account_trie_witness: StorageTrieWitness {
                root: self.storage_root(address),
                proof: storage
                    .prove(slot.as_slice())
                    .expect("test: prove from full trie"),
                key,
                value,
            },
        }
    }
}
