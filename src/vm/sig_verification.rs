// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use ed25519_dalek::{Signature as Ed25519Signature, Verifier, VerifyingKey as Ed25519VerifyingKey};

pub type SigVerificationPubKey = [u8; 32];
pub type SigVerificationMessage = [u8; 32];

pub fn verify_single_ed25519(
    pub_key: &SigVerificationPubKey,
    sig: &[u8],
    message: &SigVerificationMessage,
) -> Result<(), SigVerificationErr> {
    let pub_key =
        Ed25519VerifyingKey::from_bytes(pub_key).map_err(|_| SigVerificationErr::InvalidPublicKey)?;
    let sig = Ed25519Signature::from_slice(sig).map_err(|_| SigVerificationErr::InvalidSignature)?;
    pub_key
        .verify(message, &sig)
        .map_err(|_| SigVerificationErr::InvalidSignature)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigVerificationErr {
    InvalidSignature,
    InvalidPublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey as Ed25519SigningKey};

    #[test]
    fn verify_ed25519_single() {
        let batch = (0..50_u8)
            .map(|i| {
                let message = [i; 32];
                let signing_key = Ed25519SigningKey::from_bytes(&[i.wrapping_add(1); 32]);
                let pkey = signing_key.verifying_key().to_bytes();
                let signature = signing_key.sign(&message).to_bytes();
                (message, pkey, signature)
            })
            .collect::<Vec<_>>();

        for (message, pkey, signature) in batch {
            assert!(verify_single_ed25519(&pkey, &signature, &message).is_ok());
            assert_eq!(
                verify_single_ed25519(&pkey, &signature, &[0xff; 32]),
                Err(SigVerificationErr::InvalidSignature)
            );
            assert_eq!(
                verify_single_ed25519(&pkey, &signature[..63], &message),
                Err(SigVerificationErr::InvalidSignature)
            );
        }
    }
}
