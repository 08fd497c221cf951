//! Rollup transaction types.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::{Buf20, Buf32, Buf65};
use crate::hash;

/// Rollup account address.
pub type Address = Buf20;

/// The part of a transaction that is covered by the sender's signature.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct TransactionBody {
    pub sender: Address,
    pub nonce: u64,
    pub target: Address,
    #[serde(with = "hex::serde")]
    pub calldata: Vec<u8>,
}

impl TransactionBody {
    /// Canonical byte encoding that signatures are computed over.
    pub fn encode(&self) -> Vec<u8> {
        // Borsh encoding of owned in-memory data does not fail.
        borsh::to_vec(self).expect("tx: encode body")
    }
}

#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SignedTransaction {
    pub body: TransactionBody,
    pub signature: Buf65,
}

impl SignedTransaction {
    pub fn new(body: TransactionBody, signature: Buf65) -> Self {
        Self { body, signature }
    }

    pub fn sender(&self) -> &Address {
        &self.body.sender
    }

    /// Hash committing to both the body and the signature.
    pub fn compute_hash(&self) -> Buf32 {
        hash::compute_borsh_hash(self)
    }
}

/// A single storage slot write produced by applying a transaction.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct StorageSlotUpdate {
    pub contract: Address,
    pub key: Buf32,
    pub value: Buf32,
}

/// Output of applying one transaction to the rollup state machine.
///
/// The transaction number is assigned by the state machine, starts at 1 and
/// grows by one per applied transaction.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct TransactionResult {
    pub transaction_number: u64,
    pub signed_transaction: SignedTransaction,
    pub modified_storage: Vec<StorageSlotUpdate>,
}

impl TransactionResult {
    pub fn new(
        transaction_number: u64,
        signed_transaction: SignedTransaction,
        modified_storage: Vec<StorageSlotUpdate>,
    ) -> Self {
        Self {
            transaction_number,
            signed_transaction,
            modified_storage,
        }
    }
}
