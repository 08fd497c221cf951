//! Recoverable secp256k1 signatures over transaction bodies.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};

use crate::buf::{Buf20, Buf65};
use crate::errors::CryptoError;
use crate::hash;
use crate::tx::{Address, SignedTransaction, TransactionBody};

/// Derives the account address for a public key: the trailing 20 bytes of the
/// hash of the uncompressed key without its prefix byte.
pub fn address_from_pubkey(pk: &PublicKey) -> Address {
    let ser = pk.serialize_uncompressed();
    let digest = hash::raw(&ser[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest.as_slice()[12..]);
    Buf20::from(addr)
}

/// Signs an arbitrary message, the message is hashed first.
pub fn sign_message(message: &[u8], sk: &SecretKey) -> Buf65 {
    let msg = Message::from_digest(hash::raw(message).into_inner());
    let (recid, compact) = SECP256K1
        .sign_ecdsa_recoverable(&msg, sk)
        .serialize_compact();

    let mut sig = [0u8; 65];
    sig[..64].copy_from_slice(&compact);
    sig[64] = recid.to_i32() as u8;
    Buf65::from(sig)
}

/// Recovers the address that produced `signature` over `message`.
pub fn recover_signer(message: &[u8], signature: &Buf65) -> Result<Address, CryptoError> {
    let raw = signature.as_slice();
    let recid = RecoveryId::from_i32(raw[64] as i32)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let sig = RecoverableSignature::from_compact(&raw[..64], recid)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    let msg = Message::from_digest(hash::raw(message).into_inner());
    let pk = SECP256K1
        .recover_ecdsa(&msg, &sig)
        .map_err(|e| CryptoError::Recovery(e.to_string()))?;
    Ok(address_from_pubkey(&pk))
}

/// Signs a transaction body over its canonical encoding.
pub fn sign_transaction(body: TransactionBody, sk: &SecretKey) -> SignedTransaction {
    let signature = sign_message(&body.encode(), sk);
    SignedTransaction::new(body, signature)
}
