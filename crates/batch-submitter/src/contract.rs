//! Settlement chain handle used by the submitter.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use oru_primitives::{batch::BatchEntry, buf::Buf32, errors::ContractError};

/// Receipt status of a successfully executed transaction.
pub const RECEIPT_STATUS_SUCCESS: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: Buf32,
    pub status: u64,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == RECEIPT_STATUS_SUCCESS
    }
}

/// Chain contract accepting batches of one kind.
///
/// Appends must tolerate duplicates, the submitter may resend a batch whose
/// earlier submission it never saw confirmed.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BatchContract: Send + Sync + 'static {
    /// Sends the append transaction and returns its hash.
    async fn append_batch(&self, batch: &BatchEntry) -> Result<Buf32, ContractError>;

    /// Waits until the transaction has `confirmations` confirmations.
    async fn wait_for_transaction(
        &self,
        tx_hash: Buf32,
        confirmations: u64,
    ) -> Result<TxReceipt, ContractError>;

    /// Current confirmation depth of a transaction, 0 if unknown or pending.
    async fn confirmations(&self, tx_hash: Buf32) -> Result<u64, ContractError>;
}
