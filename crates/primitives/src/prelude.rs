pub use crate::batch::{BatchEntry, BatchKind, BatchStatus};
pub use crate::buf::{Buf20, Buf32, Buf65};
pub use crate::tx::{Address, SignedTransaction, StorageSlotUpdate, TransactionBody, TransactionResult};
pub use crate::witness::{AccountState, AccountTrieWitness, StateTrieWitness, StorageTrieWitness, Witness};
