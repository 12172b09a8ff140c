//! End-to-end Tests
//!
//! Full pipeline coverage: compile, setup, witness, prove, encode, verify.
//! Keys are generated once per circuit kind and shared between tests.

mod end_to_end {
    use std::sync::OnceLock;

    use ark_ff::Zero;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::circuit::{define, CircuitKind};
    use crate::codec::{decode, encode};
    use crate::commitment::{digest_to_field, DocumentCommitment};
    use crate::degree::{DegreePrivate, DegreePublic};
    use crate::error::{CodecError, VerifyError, WitnessError};
    use crate::identity::{IdentityPrivate, IdentityPublic, REGION_CONSTANT};
    use crate::prover::{prove, Proof};
    use crate::setup::{setup_with_rng, KeyPair};
    use crate::verifier::{verify, verify_encoded};
    use crate::witness::{Assignments, PublicInputs, Witness, WitnessBuilder};
    use crate::Fr;

    fn keys(kind: CircuitKind) -> &'static KeyPair {
        static IDENTITY: OnceLock<KeyPair> = OnceLock::new();
        static DEGREE: OnceLock<KeyPair> = OnceLock::new();

        let (cell, seed) = match kind {
            CircuitKind::Identity => (&IDENTITY, 0x1d),
            CircuitKind::Degree => (&DEGREE, 0xde),
        };
        cell.get_or_init(|| {
            let system = define(kind).unwrap();
            setup_with_rng(&system, &mut StdRng::seed_from_u64(seed)).unwrap()
        })
    }

    fn identity_witness(region_code: u64) -> Result<Witness, WitnessError> {
        let private = IdentityPrivate {
            identity_digest: DocumentCommitment::from_document(b"passport #X1234567").to_field(),
            secret: Fr::from(0x5eedu64),
            biometric_digest: digest_to_field(b"fingerprint template"),
        };
        let public = IdentityPublic {
            authority_digest: digest_to_field(b"Ministry of Interior"),
            issue_date: 19_358,
            region_code,
        };
        WitnessBuilder::for_kind(CircuitKind::Identity)?
            .build(&private.assignments(), &public.assignments())
    }

    fn degree_witness(issue_date: u64, valid_until: u64) -> Result<Witness, WitnessError> {
        let private = DegreePrivate {
            degree_digest: DocumentCommitment::from_document(b"B.Sc. Computer Science").to_field(),
            student_id: Fr::from(20_210_042u64),
            issue_date,
        };
        let public = DegreePublic {
            institution_digest: digest_to_field(b"University of Example"),
            valid_until,
        };
        WitnessBuilder::for_kind(CircuitKind::Degree)?
            .build(&private.assignments(), &public.assignments())
    }

    fn valid_witness(kind: CircuitKind) -> Witness {
        match kind {
            CircuitKind::Identity => identity_witness(REGION_CONSTANT).unwrap(),
            CircuitKind::Degree => degree_witness(18_900, 22_000).unwrap(),
        }
    }

    fn proof_for(kind: CircuitKind, seed: u64) -> (Witness, Proof) {
        let witness = valid_witness(kind);
        let proof = prove(
            &keys(kind).proving_key,
            &witness,
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap();
        (witness, proof)
    }

    // =============================================================
    // Completeness
    // =============================================================

    mod completeness {
        use super::*;

        #[test]
        fn test_every_kind_proves_and_verifies() {
            for kind in CircuitKind::ALL {
                let (witness, proof) = proof_for(kind, 1);
                let verdict = verify(&keys(kind).verifying_key, &witness.public_inputs(), &proof);
                assert_eq!(verdict, Ok(true), "{} proof should verify", kind);
            }
        }

        #[test]
        fn test_encoded_proof_verifies() {
            for kind in CircuitKind::ALL {
                let (witness, proof) = proof_for(kind, 2);
                let bytes = encode(&proof).unwrap();
                assert_eq!(bytes.len(), 131);
                assert!(verify_encoded(&keys(kind).verifying_key, &witness.public_inputs(), &bytes)
                    .unwrap());
            }
        }

        #[test]
        fn test_degree_boundary_dates_prove() {
            let kind = CircuitKind::Degree;
            for (issue_date, valid_until) in [(0, 0), (20_000, 20_000), (0, u64::MAX)] {
                let witness = degree_witness(issue_date, valid_until).unwrap();
                let proof = prove(
                    &keys(kind).proving_key,
                    &witness,
                    &mut StdRng::seed_from_u64(issue_date),
                )
                .unwrap();
                assert!(verify(&keys(kind).verifying_key, &witness.public_inputs(), &proof).unwrap());
            }
        }

        #[test]
        fn test_independent_proofs_both_verify() {
            for kind in CircuitKind::ALL {
                let (witness, first) = proof_for(kind, 10);
                let (_, second) = proof_for(kind, 11);

                // Groth16 proofs are re-randomized per call
                assert_ne!(encode(&first).unwrap(), encode(&second).unwrap());

                let vk = &keys(kind).verifying_key;
                assert!(verify(vk, &witness.public_inputs(), &first).unwrap());
                assert!(verify(vk, &witness.public_inputs(), &second).unwrap());
            }
        }

        #[test]
        fn test_same_seed_same_proof() {
            let (_, first) = proof_for(CircuitKind::Identity, 99);
            let (_, second) = proof_for(CircuitKind::Identity, 99);
            assert_eq!(first, second);
        }

        #[test]
        fn test_verifier_only_needs_hex_inputs() {
            let kind = CircuitKind::Degree;
            let (witness, proof) = proof_for(kind, 3);

            // What a remote verifier receives
            let hex_inputs = witness.public_inputs().to_hex();
            let bytes = encode(&proof).unwrap();
            let vk_bytes = encode(&keys(kind).verifying_key).unwrap();

            let inputs = PublicInputs::from_hex(kind, &hex_inputs).unwrap();
            let vk = decode(&vk_bytes).unwrap();
            assert!(verify_encoded(&vk, &inputs, &bytes).unwrap());
        }
    }

    // =============================================================
    // Soundness
    // =============================================================

    mod soundness {
        use super::*;

        #[test]
        fn test_every_single_byte_flip_is_rejected() {
            for kind in CircuitKind::ALL {
                let (witness, proof) = proof_for(kind, 4);
                let inputs = witness.public_inputs();
                let vk = &keys(kind).verifying_key;
                let bytes = encode(&proof).unwrap();

                for index in 0..bytes.len() {
                    let mut tampered = bytes.clone();
                    tampered[index] ^= 0xff;

                    match verify_encoded(vk, &inputs, &tampered) {
                        Ok(verdict) => assert!(!verdict, "{}: flip at byte {} verified", kind, index),
                        Err(VerifyError::BadProofEncoding(_)) => {}
                        Err(other) => panic!("{}: flip at byte {}: {:?}", kind, index, other),
                    }
                }
            }
        }

        #[test]
        fn test_header_flips_are_encoding_errors() {
            let (witness, proof) = proof_for(CircuitKind::Identity, 5);
            let vk = &keys(CircuitKind::Identity).verifying_key;
            let mut bytes = encode(&proof).unwrap();
            bytes[0] ^= 0xff;

            assert_eq!(
                verify_encoded(vk, &witness.public_inputs(), &bytes),
                Err(VerifyError::BadProofEncoding(CodecError::VersionMismatch(0xfe)))
            );
        }

        #[test]
        fn test_different_public_inputs_fail() {
            for kind in CircuitKind::ALL {
                let (witness, proof) = proof_for(kind, 6);
                let vk = &keys(kind).verifying_key;
                let original = witness.public_inputs();

                for position in 0..original.values().len() {
                    let mut values = original.values().to_vec();
                    values[position] += Fr::from(1u64);
                    let altered = PublicInputs::new(kind, values);
                    assert_eq!(
                        verify(vk, &altered, &proof),
                        Ok(false),
                        "{}: altered input #{} verified",
                        kind,
                        position
                    );
                }
            }
        }

        #[test]
        fn test_later_expiry_does_not_transfer() {
            // A proof for valid_until = 22000 says nothing about 30000
            let kind = CircuitKind::Degree;
            let (witness, proof) = proof_for(kind, 7);
            let mut values = witness.public_inputs().values().to_vec();
            values[1] = Fr::from(30_000u64);

            let inputs = PublicInputs::new(kind, values);
            assert!(!verify(&keys(kind).verifying_key, &inputs, &proof).unwrap());
        }

        #[test]
        fn test_proof_under_other_kind_key() {
            let (witness, proof) = proof_for(CircuitKind::Identity, 8);
            let result = verify(
                &keys(CircuitKind::Degree).verifying_key,
                &witness.public_inputs(),
                &proof,
            );
            assert!(matches!(result, Err(VerifyError::KeyMismatch { .. })));
        }

        #[test]
        fn test_zero_public_inputs_fail() {
            let kind = CircuitKind::Identity;
            let (_, proof) = proof_for(kind, 9);
            let zeros = PublicInputs::new(kind, vec![Fr::zero(); 3]);
            assert_eq!(verify(&keys(kind).verifying_key, &zeros, &proof), Ok(false));
        }
    }

    // =============================================================
    // Witness Rejection
    // =============================================================

    mod witness_rejection {
        use super::*;

        #[test]
        fn test_degree_rejects_expired() {
            assert!(degree_witness(22_000, 22_000).is_ok());
            assert!(degree_witness(21_999, 22_000).is_ok());

            let err = degree_witness(22_001, 22_000).unwrap_err();
            assert!(matches!(err, WitnessError::ConstraintViolated { .. }));
        }

        #[test]
        fn test_identity_rejects_other_region() {
            assert!(identity_witness(REGION_CONSTANT).is_ok());

            for region_code in [0, 1, REGION_CONSTANT - 1, REGION_CONSTANT + 1, u64::MAX] {
                let err = identity_witness(region_code).unwrap_err();
                match err {
                    WitnessError::ConstraintViolated { label, .. } => {
                        assert!(label.contains("region_code"), "label was {}", label)
                    }
                    other => panic!("unexpected error {:?}", other),
                }
            }
        }
    }
}
