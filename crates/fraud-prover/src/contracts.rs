//! Handles to the on-chain dispute contracts.
//!
//! Each method maps to one contract call or one view. Calls that change
//! chain state only return once the transaction is confirmed.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use oru_primitives::{
    buf::Buf32,
    errors::ContractError,
    tx::{Address, SignedTransaction},
    witness::{AccountTrieWitness, StateTrieWitness},
};

use crate::context::DisputeContext;

/// Next storage slot the state manager wants a new root for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdatedStorageSlot {
    pub contract: Address,
    pub key: Buf32,
    pub value: Buf32,
}

/// Next contract account the state manager wants a new root for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdatedContract {
    pub contract: Address,
    pub nonce: u64,
    pub code_hash: Buf32,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FraudVerifier: Send + Sync + 'static {
    /// Transitioner registered for a transition, the zero address if none.
    async fn state_transitioners(&self, transition_index: u64) -> Result<Address, ContractError>;

    async fn init_new_state_transitioner(&self, ctx: &DisputeContext) -> Result<(), ContractError>;

    async fn prove_contract_inclusion(
        &self,
        transition_index: u64,
        witness: &StateTrieWitness,
    ) -> Result<(), ContractError>;

    async fn prove_storage_slot_inclusion(
        &self,
        transition_index: u64,
        witness: &AccountTrieWitness,
    ) -> Result<(), ContractError>;

    /// Settles the dispute. Reverts if the transition was not fraudulent.
    async fn verify_fraud(&self, ctx: &DisputeContext) -> Result<(), ContractError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateTransitioner: Send + Sync + 'static {
    async fn state_manager(&self) -> Result<Address, ContractError>;

    async fn apply_transaction(&self, tx: &SignedTransaction) -> Result<(), ContractError>;

    async fn prove_updated_contract(&self, witness: &StateTrieWitness) -> Result<(), ContractError>;

    async fn prove_updated_storage_slot(
        &self,
        witness: &AccountTrieWitness,
    ) -> Result<(), ContractError>;

    async fn complete_transition(&self) -> Result<(), ContractError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateManager: Send + Sync + 'static {
    async fn updated_contracts_counter(&self) -> Result<u64, ContractError>;

    async fn updated_storage_slot_counter(&self) -> Result<u64, ContractError>;

    async fn peek_updated_contract(&self) -> Result<UpdatedContract, ContractError>;

    async fn peek_updated_storage_slot(&self) -> Result<UpdatedStorageSlot, ContractError>;
}

/// Binds contract addresses to handles.
#[cfg_attr(test, automock)]
pub trait ContractResolver: Send + Sync + 'static {
    fn state_transitioner(&self, address: Address) -> Arc<dyn StateTransitioner>;

    fn state_manager(&self, address: Address) -> Arc<dyn StateManager>;
}
