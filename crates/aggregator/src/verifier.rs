use std::sync::Arc;

use oru_primitives::{buf::Buf65, crypto, errors::CryptoError, tx::Address};

use crate::traits::SignatureVerifier;

/// Recoverable secp256k1 signatures.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn verify_message(&self, message: &[u8], signature: &Buf65) -> Result<Address, CryptoError> {
        crypto::recover_signer(message, signature)
    }
}

pub fn default_signature_verifier() -> Arc<dyn SignatureVerifier> {
    Arc::new(Secp256k1Verifier)
}
