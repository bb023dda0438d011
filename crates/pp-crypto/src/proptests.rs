#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

    use crate::agreement::{derive_shared_secret_key, SharedSecretKey};
    use crate::cipher::{decrypt_text, encrypt_text, NONCE_LEN};
    use crate::envelope::{
        is_encrypted_body, pack_encrypted_payload, unpack_encrypted_payload, EncryptedEnvelope,
        ENVELOPE_VERSION, WIRE_PREFIX,
    };
    use crate::identity::IdentityKeypair;

    proptest! {
        // Diffie-Hellman symmetry: both directions derive the same key
        #[test]
        fn test_shared_key_symmetry(
            a_seed in any::<[u8; 32]>(),
            b_seed in any::<[u8; 32]>()
        ) {
            let a = IdentityKeypair::from_secret_bytes(a_seed);
            let b = IdentityKeypair::from_secret_bytes(b_seed);

            let ab = derive_shared_secret_key(a.secret(), &b.public_key());
            let ba = derive_shared_secret_key(b.secret(), &a.public_key());

            prop_assert!(ab == ba);
        }

        // Round-trip: decrypt(encrypt(s, k), k) == s for arbitrary text and keys
        #[test]
        fn test_encrypt_decrypt_round_trip(
            key_bytes in any::<[u8; 32]>(),
            message in ".*"
        ) {
            let key = SharedSecretKey::from_bytes(key_bytes);

            let sealed = encrypt_text(&message, &key).unwrap();
            let plaintext = decrypt_text(&sealed.nonce, &sealed.cipher, &key).unwrap();

            prop_assert_eq!(plaintext, message);
        }

        // Flipping any single bit of the nonce or ciphertext must fail
        // decryption; it must never produce wrong plaintext
        #[test]
        fn test_single_bit_tamper_detected(
            key_bytes in any::<[u8; 32]>(),
            message in ".*",
            bit_seed in any::<u32>()
        ) {
            let key = SharedSecretKey::from_bytes(key_bytes);
            let sealed = encrypt_text(&message, &key).unwrap();

            let mut nonce = B64.decode(&sealed.nonce).unwrap();
            let mut ct = B64.decode(&sealed.cipher).unwrap();

            let total_bits = (nonce.len() + ct.len()) * 8;
            let bit = bit_seed as usize % total_bits;
            if bit < NONCE_LEN * 8 {
                nonce[bit / 8] ^= 1 << (bit % 8);
            } else {
                let bit = bit - NONCE_LEN * 8;
                ct[bit / 8] ^= 1 << (bit % 8);
            }

            let result = decrypt_text(&B64.encode(nonce), &B64.encode(ct), &key);
            prop_assert!(result.is_err());
        }

        // Bodies not starting with the reserved prefix are never recognized
        #[test]
        fn test_arbitrary_text_is_not_encrypted_body(body in ".*") {
            prop_assume!(!body.starts_with(WIRE_PREFIX));

            prop_assert!(!is_encrypted_body(&body));
            prop_assert_eq!(unpack_encrypted_payload(&body), None);
        }

        // Every packed envelope is recognized and survives unpacking intact
        #[test]
        fn test_packed_payload_is_recognized(
            nonce in any::<[u8; 24]>(),
            ct in any::<Vec<u8>>()
        ) {
            let envelope = EncryptedEnvelope {
                v: ENVELOPE_VERSION,
                nonce: B64.encode(nonce),
                cipher: B64.encode(&ct),
            };
            let packed = pack_encrypted_payload(&envelope);

            prop_assert!(is_encrypted_body(&packed));
            let unpacked = unpack_encrypted_payload(&packed).unwrap();
            prop_assert_eq!(unpacked, envelope);
        }

        // Envelopes with any version other than 1 are rejected before decryption
        #[test]
        fn test_unknown_version_rejected(
            v in any::<u32>(),
            nonce in any::<[u8; 24]>(),
            ct in any::<Vec<u8>>()
        ) {
            prop_assume!(v != ENVELOPE_VERSION);

            let envelope = EncryptedEnvelope {
                v,
                nonce: B64.encode(nonce),
                cipher: B64.encode(&ct),
            };
            let packed = pack_encrypted_payload(&envelope);

            prop_assert_eq!(unpack_encrypted_payload(&packed), None);
        }

        // Key material types zeroize on drop and generation never repeats
        #[test]
        fn test_key_types_zeroize_on_drop(iterations in 1..50usize) {
            use zeroize::ZeroizeOnDrop;

            fn assert_zeroize_on_drop<T: ZeroizeOnDrop>() {}
            assert_zeroize_on_drop::<IdentityKeypair>();
            assert_zeroize_on_drop::<SharedSecretKey>();

            let mut publics: Vec<String> = Vec::new();
            for _ in 0..iterations {
                let keypair = IdentityKeypair::generate();
                let public = keypair.public_key_b64();
                prop_assert!(!publics.contains(&public), "generated keys must be unique");
                publics.push(public);
            }
        }
    }

    // 10,000 encryptions under one key must draw 10,000 distinct nonces
    #[test]
    fn test_nonce_uniqueness_10k() {
        use std::collections::HashSet;

        let key = SharedSecretKey::from_bytes([7u8; 32]);
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let sealed = encrypt_text("nonce check", &key).expect("encrypt");
            assert!(seen.insert(sealed.nonce), "nonce repeated under the same key");
        }
    }
}
