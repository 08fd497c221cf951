//! Collaborators the aggregator is written against.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use oru_primitives::{
    buf::Buf65,
    errors::CryptoError,
    tx::{Address, SignedTransaction, TransactionResult},
};

/// Executes transactions and assigns their transaction numbers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateMachine: Send + Sync + 'static {
    /// Applies a transaction. Calls may complete in any order.
    async fn apply_transaction(&self, tx: SignedTransaction) -> anyhow::Result<TransactionResult>;

    /// Returns every stored result numbered `transaction_number` or above.
    async fn get_transaction_results_since(
        &self,
        transaction_number: u64,
    ) -> anyhow::Result<Vec<TransactionResult>>;
}

/// Consumes results in ascending transaction number order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlockBuilder: Send + Sync + 'static {
    async fn add_transaction_result(&self, result: TransactionResult) -> anyhow::Result<()>;
}

/// Recovers the address that signed a message.
#[cfg_attr(test, automock)]
pub trait SignatureVerifier: Send + Sync + 'static {
    fn verify_message(&self, message: &[u8], signature: &Buf65) -> Result<Address, CryptoError>;
}
