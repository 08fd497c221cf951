//! Keys and signed transactions for tests.

use oru_primitives::{
    crypto::{address_from_pubkey, sign_transaction},
    prelude::*,
};
use rand::thread_rng;
use secp256k1::{PublicKey, SecretKey, SECP256K1};

/// A throwaway account able to sign transactions.
#[derive(Clone, Debug)]
pub struct TestAccount {
    sk: SecretKey,
    address: Address,
}

impl TestAccount {
    pub fn random() -> Self {
        let sk = SecretKey::new(&mut thread_rng());
        let pk = PublicKey::from_secret_key(SECP256K1, &sk);
        Self {
            sk,
            address: address_from_pubkey(&pk),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.sk
    }

    /// Signs a call to `target` with the given nonce and calldata.
    pub fn sign(&self, nonce: u64, target: Address, calldata: Vec<u8>) -> SignedTransaction {
        let body = TransactionBody {
            sender: self.address,
            nonce,
            target,
            calldata,
        };
        sign_transaction(body, &self.sk)
    }

    /// Builds a transaction claiming to come from this account but signed by
    /// someone else.
    pub fn forge(&self, nonce: u64) -> SignedTransaction {
        let other = TestAccount::random();
        let body = TransactionBody {
            sender: self.address,
            nonce,
            target: Address::zero(),
            calldata: Vec::new(),
        };
        sign_transaction(body, &other.sk)
    }
}

/// Wraps a signed transaction in a result numbered `transaction_number`.
pub fn make_result(transaction_number: u64, tx: SignedTransaction) -> TransactionResult {
    TransactionResult::new(transaction_number, tx, Vec::new())
}
