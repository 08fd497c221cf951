use std::sync::Arc;

use oru_primitives::{tx::Address, witness::Witness};
use tracing::*;

use crate::{
    cache::WitnessCache,
    context::DisputeContext,
    contracts::{ContractResolver, FraudVerifier, StateManager, StateTransitioner},
    errors::{at, ProvePhase, ProverError},
};

/// Summary of a completed dispute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOutcome {
    pub state_transitioner: Address,
    pub state_manager: Address,
    /// Whether this run opened the transitioner or reused an existing one.
    pub created_transitioner: bool,
    pub witnesses_published: usize,
    pub storage_slot_updates: u64,
    pub contract_updates: u64,
}

/// Runs the dispute pipeline: setup, witness publication, execution, root
/// convergence, completion and verdict.
///
/// Any failed call aborts the run. Setup reuses the transitioner an earlier
/// run opened, so a failed dispute is retried by calling [`Self::prove`]
/// again.
pub struct FraudProver {
    verifier: Arc<dyn FraudVerifier>,
    resolver: Arc<dyn ContractResolver>,
}

impl FraudProver {
    pub fn new(verifier: Arc<dyn FraudVerifier>, resolver: Arc<dyn ContractResolver>) -> Self {
        Self { verifier, resolver }
    }

    pub async fn prove(
        &self,
        ctx: &DisputeContext,
        witnesses: &[Witness],
    ) -> Result<ProofOutcome, ProverError> {
        let idx = ctx.transition_index;
        info!(%idx, witnesses = witnesses.len(), "starting fraud proof");

        let (transitioner_addr, created) = self.setup_transitioner(ctx).await?;
        let transitioner = self.resolver.state_transitioner(transitioner_addr);
        let manager_addr = transitioner
            .state_manager()
            .await
            .map_err(at(ProvePhase::Setup))?;
        let manager = self.resolver.state_manager(manager_addr);
        debug!(%idx, transitioner = %transitioner_addr, manager = %manager_addr, %created, "resolved dispute contracts");

        let mut cache = WitnessCache::new();
        self.publish_witnesses(idx, witnesses, &mut cache).await?;

        transitioner
            .apply_transaction(&ctx.transaction)
            .await
            .map_err(at(ProvePhase::Execution))?;
        debug!(%idx, "applied disputed transaction");

        let storage_slot_updates =
            drain_storage_slots(transitioner.as_ref(), manager.as_ref(), &mut cache).await?;
        let contract_updates =
            drain_contracts(transitioner.as_ref(), manager.as_ref(), &mut cache).await?;
        debug!(%idx, %storage_slot_updates, %contract_updates, "roots converged");

        transitioner
            .complete_transition()
            .await
            .map_err(at(ProvePhase::Completion))?;
        self.verifier
            .verify_fraud(ctx)
            .await
            .map_err(at(ProvePhase::Completion))?;
        info!(%idx, "fraud proven");

        Ok(ProofOutcome {
            state_transitioner: transitioner_addr,
            state_manager: manager_addr,
            created_transitioner: created,
            witnesses_published: witnesses.len(),
            storage_slot_updates,
            contract_updates,
        })
    }

    /// Returns the transitioner for the disputed transition, opening one if
    /// none is registered yet.
    async fn setup_transitioner(&self, ctx: &DisputeContext) -> Result<(Address, bool), ProverError> {
        let idx = ctx.transition_index;

        let existing = self
            .verifier
            .state_transitioners(idx)
            .await
            .map_err(at(ProvePhase::Setup))?;
        if !existing.is_zero() {
            debug!(%idx, transitioner = %existing, "reusing state transitioner");
            return Ok((existing, false));
        }

        self.verifier
            .init_new_state_transitioner(ctx)
            .await
            .map_err(at(ProvePhase::Setup))?;
        let created = self
            .verifier
            .state_transitioners(idx)
            .await
            .map_err(at(ProvePhase::Setup))?;
        if created.is_zero() {
            return Err(ProverError::TransitionerMissing(idx));
        }

        Ok((created, true))
    }

    async fn publish_witnesses(
        &self,
        idx: u64,
        witnesses: &[Witness],
        cache: &mut WitnessCache,
    ) -> Result<(), ProverError> {
        for witness in witnesses {
            let res = match witness {
                Witness::StorageSlot(w) => self.verifier.prove_storage_slot_inclusion(idx, w).await,
                Witness::Contract(w) => self.verifier.prove_contract_inclusion(idx, w).await,
            };
            res.map_err(at(ProvePhase::WitnessPublication))?;

            trace!(%idx, contract = %witness.contract(), "published witness");
            cache.insert(witness);
        }
        Ok(())
    }
}

async fn drain_storage_slots(
    transitioner: &dyn StateTransitioner,
    manager: &dyn StateManager,
    cache: &mut WitnessCache,
) -> Result<u64, ProverError> {
    let phase = ProvePhase::RootConvergence;
    let mut remaining = manager.updated_storage_slot_counter().await.map_err(at(phase))?;
    let mut applied = 0;

    while remaining > 0 {
        let update = manager.peek_updated_storage_slot().await.map_err(at(phase))?;
        let witness = cache.apply_slot_update(&update)?;
        transitioner
            .prove_updated_storage_slot(&witness)
            .await
            .map_err(at(phase))?;
        applied += 1;

        let next = manager.updated_storage_slot_counter().await.map_err(at(phase))?;
        if next >= remaining {
            return Err(ProverError::StalledCounter {
                counter: "updatedStorageSlotCounter",
                remaining: next,
            });
        }
        remaining = next;
    }

    Ok(applied)
}

async fn drain_contracts(
    transitioner: &dyn StateTransitioner,
    manager: &dyn StateManager,
    cache: &mut WitnessCache,
) -> Result<u64, ProverError> {
    let phase = ProvePhase::RootConvergence;
    let mut remaining = manager.updated_contracts_counter().await.map_err(at(phase))?;
    let mut applied = 0;

    while remaining > 0 {
        let update = manager.peek_updated_contract().await.map_err(at(phase))?;
        let witness = cache.apply_contract_update(&update)?;
        transitioner
            .prove_updated_contract(&witness)
            .await
            .map_err(at(phase))?;
        applied += 1;

        let next = manager.updated_contracts_counter().await.map_err(at(phase))?;
        if next >= remaining {
            return Err(ProverError::StalledCounter {
                counter: "updatedContractsCounter",
                remaining: next,
            });
        }
        remaining = next;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use oru_merkle::InclusionProof;
    use oru_primitives::{buf::Buf32, errors::ContractError};
    use oru_test_utils::tx::TestAccount;

    use super::*;
    use crate::contracts::{
        MockContractResolver, MockFraudVerifier, MockStateManager, MockStateTransitioner,
    };

    fn ctx(idx: u64) -> DisputeContext {
        DisputeContext {
            transition_index: idx,
            pre_state_root: Buf32::from([1; 32]),
            pre_state_proof: InclusionProof::new(0, vec![]),
            post_state_root: Buf32::from([2; 32]),
            post_state_proof: InclusionProof::new(1, vec![]),
            transaction: TestAccount::random().sign(0, Address::zero(), vec![]),
            transaction_proof: InclusionProof::new(0, vec![]),
        }
    }

    fn idle_manager() -> MockStateManager {
        let mut manager = MockStateManager::new();
        manager
            .expect_updated_storage_slot_counter()
            .returning(|| Ok(0));
        manager.expect_updated_contracts_counter().returning(|| Ok(0));
        manager
    }

    fn resolver(transitioner: MockStateTransitioner, manager: MockStateManager) -> MockContractResolver {
        let transitioner: Arc<dyn StateTransitioner> = Arc::new(transitioner);
        let manager: Arc<dyn StateManager> = Arc::new(manager);
        let mut resolver = MockContractResolver::new();
        resolver
            .expect_state_transitioner()
            .returning(move |_| transitioner.clone());
        resolver
            .expect_state_manager()
            .returning(move |_| manager.clone());
        resolver
    }

    fn happy_transitioner() -> MockStateTransitioner {
        let mut t = MockStateTransitioner::new();
        t.expect_state_manager()
            .returning(|| Ok(Address::from([0x5; 20])));
        t.expect_apply_transaction().times(1).returning(|_| Ok(()));
        t.expect_complete_transition().times(1).returning(|| Ok(()));
        t
    }

    #[tokio::test]
    async fn test_creates_transitioner_when_absent() {
        let mut verifier = MockFraudVerifier::new();
        let mut seq = mockall::Sequence::new();
        verifier
            .expect_state_transitioners()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Address::zero()));
        verifier
            .expect_init_new_state_transitioner()
            .withf(|c| c.transition_index == 4)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        verifier
            .expect_state_transitioners()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Address::from([0x7; 20])));
        verifier.expect_verify_fraud().times(1).returning(|_| Ok(()));

        let prover = FraudProver::new(
            Arc::new(verifier),
            Arc::new(resolver(happy_transitioner(), idle_manager())),
        );
        let outcome = prover.prove(&ctx(4), &[]).await.unwrap();
        assert!(outcome.created_transitioner);
        assert_eq!(outcome.state_transitioner, Address::from([0x7; 20]));
        assert_eq!(outcome.state_manager, Address::from([0x5; 20]));
    }

    #[tokio::test]
    async fn test_init_without_registration() {
        let mut verifier = MockFraudVerifier::new();
        verifier
            .expect_state_transitioners()
            .returning(|_| Ok(Address::zero()));
        verifier
            .expect_init_new_state_transitioner()
            .returning(|_| Ok(()));

        let prover = FraudProver::new(Arc::new(verifier), Arc::new(MockContractResolver::new()));
        let err = prover.prove(&ctx(9), &[]).await.unwrap_err();
        assert!(matches!(err, ProverError::TransitionerMissing(9)));
        assert_eq!(err.phase(), ProvePhase::Setup);
    }

    #[tokio::test]
    async fn test_verdict_revert_aborts() {
        let mut verifier = MockFraudVerifier::new();
        verifier
            .expect_state_transitioners()
            .returning(|_| Ok(Address::from([0x7; 20])));
        verifier.expect_init_new_state_transitioner().never();
        verifier
            .expect_verify_fraud()
            .returning(|_| Err(ContractError::Reverted("roots match".into())));

        let prover = FraudProver::new(
            Arc::new(verifier),
            Arc::new(resolver(happy_transitioner(), idle_manager())),
        );
        let err = prover.prove(&ctx(1), &[]).await.unwrap_err();
        assert_eq!(err.phase(), ProvePhase::Completion);
    }

    #[tokio::test]
    async fn test_missing_slot_witness() {
        let mut verifier = MockFraudVerifier::new();
        verifier
            .expect_state_transitioners()
            .returning(|_| Ok(Address::from([0x7; 20])));

        let mut manager = MockStateManager::new();
        manager
            .expect_updated_storage_slot_counter()
            .returning(|| Ok(1));
        manager.expect_peek_updated_storage_slot().returning(|| {
            Ok(crate::contracts::UpdatedStorageSlot {
                contract: Address::from([3; 20]),
                key: Buf32::from([4; 32]),
                value: Buf32::zero(),
            })
        });

        let mut transitioner = MockStateTransitioner::new();
        transitioner
            .expect_state_manager()
            .returning(|| Ok(Address::from([0x5; 20])));
        transitioner.expect_apply_transaction().returning(|_| Ok(()));
        transitioner.expect_prove_updated_storage_slot().never();
        transitioner.expect_complete_transition().never();

        let prover = FraudProver::new(Arc::new(verifier), Arc::new(resolver(transitioner, manager)));
        let err = prover.prove(&ctx(1), &[]).await.unwrap_err();
        assert!(matches!(err, ProverError::MissingSlotWitness { .. }));
    }
}
