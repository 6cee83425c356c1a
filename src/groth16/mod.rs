use crate::witness::Witness;
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

mod prover;
mod setup;
mod verifier;

pub use prover::{prove, prove_with_rng};
pub use setup::setup;
pub use verifier::verify;

/// How setup derives its secrets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupMode {
    /// Real toxic waste, sound keys.
    #[default]
    Trusted,
    /// No secret randomness at all: every query holds the same random point.
    ///
    /// The keys have exactly the shape of trusted keys, so proving cost can be measured
    /// without paying for a real setup, but no proof made with them will verify.
    /// **Never** use this to produce keys for anything but benchmarks.
    InsecureDummy,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub mode: SetupMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// Blind the proof with fresh `r, s`. Disabling it makes proofs deterministic and leaks
    /// information about the witness.
    pub zero_knowledge: bool,
    /// Run on a dedicated pool of this many threads instead of the global rayon pool.
    pub num_threads: Option<usize>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            zero_knowledge: true,
            num_threads: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvingKey<E: Pairing> {
    pub(crate) domain_size: usize,
    pub(crate) num_wires: usize,
    pub(crate) num_public: usize,

    pub(crate) alpha_g1: E::G1Affine,
    pub(crate) beta_g1: E::G1Affine,
    pub(crate) delta_g1: E::G1Affine,
    /// `a_j(τ)·G1` for every wire not flagged in `infinity_a`
    pub(crate) a_query: Vec<E::G1Affine>,
    /// `b_j(τ)·G1` for every wire not flagged in `infinity_b`
    pub(crate) b_g1_query: Vec<E::G1Affine>,
    /// `τ^i·Z(τ)/δ·G1` for `i < domain_size - 1`
    pub(crate) h_query: Vec<E::G1Affine>,
    /// `(β·a_j(τ) + α·b_j(τ) + c_j(τ))/δ·G1` for every private wire
    pub(crate) l_query: Vec<E::G1Affine>,

    pub(crate) beta_g2: E::G2Affine,
    pub(crate) delta_g2: E::G2Affine,
    /// `b_j(τ)·G2` for every wire not flagged in `infinity_b`
    pub(crate) b_g2_query: Vec<E::G2Affine>,

    /// Wires whose A polynomial vanishes at τ, dropped from `a_query`.
    pub(crate) infinity_a: Vec<bool>,
    /// Wires whose B polynomial vanishes at τ, dropped from both B queries.
    pub(crate) infinity_b: Vec<bool>,
}

impl<E: Pairing> ProvingKey<E> {
    pub fn domain_size(&self) -> usize {
        self.domain_size
    }

    /// Length of the full witness this key proves for.
    pub fn num_wires(&self) -> usize {
        self.num_wires
    }

    pub fn num_public(&self) -> usize {
        self.num_public
    }

    /// Number of G1 points stored in the key.
    pub fn num_g1(&self) -> usize {
        3 + self.a_query.len() + self.b_g1_query.len() + self.h_query.len() + self.l_query.len()
    }

    /// Number of G2 points stored in the key.
    pub fn num_g2(&self) -> usize {
        2 + self.b_g2_query.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey<E: Pairing> {
    pub(crate) alpha_g1: E::G1Affine,
    pub(crate) beta_g2: E::G2Affine,
    pub(crate) gamma_g2: E::G2Affine,
    pub(crate) delta_g2: E::G2Affine,
    /// Public input encoding, one point per public wire (constant one first).
    pub(crate) k: Vec<E::G1Affine>,
    /// `e(α, β)`, derived from `alpha_g1` and `beta_g2` and never serialized.
    pub(crate) alpha_beta: PairingOutput<E>,
}

impl<E: Pairing> VerifyingKey<E> {
    /// Length of the public witness this key verifies against.
    pub fn num_public(&self) -> usize {
        self.k.len()
    }
}

/// A Groth16 proof: three group elements whatever the circuit size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof<E: Pairing> {
    pub a: E::G1Affine,
    pub b: E::G2Affine,
    pub c: E::G1Affine,
}

impl<E: Pairing> Proof<E> {
    pub fn verify(
        &self,
        verifying_key: &VerifyingKey<E>,
        public_witness: &Witness<E::ScalarField>,
    ) -> crate::error::Result<bool> {
        verify(self, verifying_key, public_witness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::test_circuits::*;
    use crate::circuits::{ConstraintSystem, R1CS};
    use crate::error::{Groth16Error, Result};
    use crate::helpers::init_logging;
    use ark_ff::Field as _;
    use ark_mnt6_753::MNT6_753;
    use log::debug;
    use rand::Rng;
    use rootcause::Report;

    type Field = ark_mnt6_753::Fr;

    fn square_chain_keys(
        rounds: usize,
    ) -> Result<(R1CS<Field>, ProvingKey<MNT6_753>, VerifyingKey<MNT6_753>)> {
        let r1cs = square_chain(rounds);
        let (pk, vk) = setup(&r1cs, &SetupConfig::default(), &mut rand::rng())?;
        Ok((r1cs, pk, vk))
    }

    #[test]
    fn groth16() -> std::result::Result<(), Report<Groth16Error>> {
        init_logging();
        let r1cs: R1CS<Field> = product_of_four();
        let (pk, vk) = setup::<MNT6_753, _, _>(&r1cs, &SetupConfig::default(), &mut rand::rng())?;
        debug!("Trusted Setup complete");

        let mut rng = rand::rng();
        let mut next = || Field::from(rng.random_range(0..1000u64));
        let w = product_of_four_witness(next(), next(), next(), next());
        assert!(r1cs.is_satisfied(&w)?);

        let proof = prove(&r1cs, &pk, &w, &ProverConfig::default())?;
        debug!("Proof generated");
        assert!(proof.verify(&vk, &w.public_part(vk.num_public())?)?);
        Ok(())
    }

    #[test]
    fn squaring_three_times() -> Result<()> {
        init_logging();
        let (r1cs, pk, vk) = square_chain_keys(3)?;

        let good = square_chain_witness(3, Field::from(2u64), Field::from(256u64));
        let proof = prove(&r1cs, &pk, &good, &ProverConfig::default())?;
        let public = Witness::from_public_assignment(&[Field::from(256u64)]);
        assert!(verify(&proof, &vk, &public)?);

        let wrong_claim = Witness::from_public_assignment(&[Field::from(255u64)]);
        assert!(!verify(&proof, &vk, &wrong_claim)?);

        // Proving the false claim goes through but the proof is rejected.
        let bad = square_chain_witness(3, Field::from(2u64), Field::from(255u64));
        let bad_proof = prove(&r1cs, &pk, &bad, &ProverConfig::default())?;
        assert!(!verify(&bad_proof, &vk, &wrong_claim)?);
        Ok(())
    }

    #[test]
    fn flipping_any_public_value_rejects() -> Result<()> {
        let (r1cs, pk, vk) = square_chain_keys(3)?;
        let w = square_chain_witness(3, Field::from(3u64), Field::from(6561u64));
        let proof = prove(&r1cs, &pk, &w, &ProverConfig::default())?;
        let public = w.public_part(vk.num_public())?;
        assert!(verify(&proof, &vk, &public)?);

        for i in 0..public.len() {
            let mut values = public.values().to_vec();
            values[i] += Field::from(1u64);
            assert!(!verify(&proof, &vk, &Witness::new(values))?, "wire {i}");
        }
        Ok(())
    }

    #[test]
    fn proofs_are_blinded() -> Result<()> {
        let (r1cs, pk, vk) = square_chain_keys(3)?;
        let w = square_chain_witness(3, Field::from(2u64), Field::from(256u64));
        let public = w.public_part(vk.num_public())?;

        let first = prove(&r1cs, &pk, &w, &ProverConfig::default())?;
        let second = prove(&r1cs, &pk, &w, &ProverConfig::default())?;
        assert_ne!(first, second);
        assert!(verify(&first, &vk, &public)?);
        assert!(verify(&second, &vk, &public)?);
        Ok(())
    }

    #[test]
    fn proofs_without_blinding_are_deterministic() -> Result<()> {
        let (r1cs, pk, vk) = square_chain_keys(3)?;
        let w = square_chain_witness(3, Field::from(2u64), Field::from(256u64));
        let config = ProverConfig {
            zero_knowledge: false,
            num_threads: Some(2),
        };

        let first = prove(&r1cs, &pk, &w, &config)?;
        let second = prove(&r1cs, &pk, &w, &config)?;
        assert_eq!(first, second);
        assert!(verify(&first, &vk, &w.public_part(vk.num_public())?)?);
        Ok(())
    }

    #[test]
    fn concurrent_provers_share_a_key() -> Result<()> {
        let (r1cs, pk, vk) = square_chain_keys(3)?;
        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = (2..5u64)
                .map(|x| {
                    let (r1cs, pk, vk) = (&r1cs, &pk, &vk);
                    scope.spawn(move || -> Result<bool> {
                        let x = Field::from(x);
                        let y = x.square().square().square();
                        let w = square_chain_witness(3, x, y);
                        let proof = prove(r1cs, pk, &w, &ProverConfig::default())?;
                        verify(&proof, vk, &w.public_part(vk.num_public())?)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("prover thread panicked"))
                .collect::<Vec<_>>()
        });
        for result in results {
            assert!(result?);
        }
        Ok(())
    }

    #[test]
    fn witness_sizes_are_checked() -> Result<()> {
        let (r1cs, pk, vk) = square_chain_keys(3)?;
        let w = square_chain_witness(3, Field::from(2u64), Field::from(256u64));

        let short = Witness::new(w.values()[..4].to_vec());
        let err = prove(&r1cs, &pk, &short, &ProverConfig::default()).unwrap_err();
        assert_eq!(
            err.current_context(),
            &Groth16Error::InputSizeMismatch {
                expected: 6,
                actual: 4
            }
        );

        let proof = prove(&r1cs, &pk, &w, &ProverConfig::default())?;
        let err = verify(&proof, &vk, &w).unwrap_err();
        assert_eq!(
            err.current_context(),
            &Groth16Error::InputSizeMismatch {
                expected: 2,
                actual: 6
            }
        );
        Ok(())
    }

    #[test]
    fn prover_rejects_a_different_circuit() -> Result<()> {
        let (_, pk, _) = square_chain_keys(3)?;
        let other: R1CS<Field> = product_of_four();
        let w = product_of_four_witness(
            Field::from(1u64),
            Field::from(2u64),
            Field::from(3u64),
            Field::from(4u64),
        );
        let err = prove(&other, &pk, &w, &ProverConfig::default()).unwrap_err();
        assert!(matches!(
            err.current_context(),
            Groth16Error::InputSizeMismatch { .. } | Groth16Error::MalformedConstraintSystem
        ));
        Ok(())
    }

    #[test]
    fn key_shapes() -> Result<()> {
        let (r1cs, pk, vk) = square_chain_keys(3)?;
        assert_eq!(pk.num_wires(), r1cs.num_wires());
        assert_eq!(pk.num_public(), 2);
        assert_eq!(pk.domain_size(), 8);
        assert_eq!(vk.num_public(), 2);

        // Y and X_3 never appear on the right of a multiplication.
        assert_eq!(pk.infinity_b, vec![false, true, false, false, false, true]);
        assert!(pk.infinity_a.iter().all(|at_infinity| !at_infinity));
        assert_eq!(pk.num_g1(), 3 + 6 + 4 + 7 + 4);
        assert_eq!(pk.num_g2(), 2 + 4);
        Ok(())
    }

    #[test]
    fn dummy_keys_have_trusted_shape_but_do_not_verify() -> Result<()> {
        let (r1cs, trusted_pk, trusted_vk) = square_chain_keys(3)?;
        let config = SetupConfig {
            mode: SetupMode::InsecureDummy,
        };
        let (pk, vk) = setup::<MNT6_753, _, _>(&r1cs, &config, &mut rand::rng())?;
        assert_eq!(pk.num_g1(), trusted_pk.num_g1());
        assert_eq!(pk.num_g2(), trusted_pk.num_g2());
        assert_eq!(pk.infinity_a, trusted_pk.infinity_a);
        assert_eq!(pk.infinity_b, trusted_pk.infinity_b);
        assert_eq!(vk.num_public(), trusted_vk.num_public());

        let w = square_chain_witness(3, Field::from(2u64), Field::from(256u64));
        let proof = prove(&r1cs, &pk, &w, &ProverConfig::default())?;
        assert!(!verify(&proof, &vk, &w.public_part(vk.num_public())?)?);
        Ok(())
    }

    #[test]
    fn setup_rejects_malformed_systems() {
        let one = Field::from(1u64);
        let r1cs = R1CS::new(
            vec![vec![(one, 0)], vec![(one, 1)]],
            vec![vec![(one, 1)]],
            vec![vec![(one, 1)], vec![(one, 1)]],
            2,
            1,
        );
        for mode in [SetupMode::Trusted, SetupMode::InsecureDummy] {
            let err = setup::<MNT6_753, _, _>(&r1cs, &SetupConfig { mode }, &mut rand::rng())
                .unwrap_err();
            assert_eq!(
                err.current_context(),
                &Groth16Error::MalformedConstraintSystem
            );
        }
    }

    #[test]
    fn proof_has_a_canonical_encoding() -> Result<()> {
        let (r1cs, pk, _) = square_chain_keys(2)?;
        let w = square_chain_witness(2, Field::from(3u64), Field::from(81u64));
        let proof = prove(&r1cs, &pk, &w, &ProverConfig::default())?;

        let mut bytes = Vec::new();
        proof
            .serialize_compressed(&mut bytes)
            .expect("writing to a vec");
        assert_eq!(
            bytes.len(),
            2 * proof.a.compressed_size() + proof.b.compressed_size()
        );
        let read = Proof::<MNT6_753>::deserialize_compressed(bytes.as_slice())
            .expect("valid encoding");
        assert_eq!(read, proof);
        Ok(())
    }

    #[test]
    fn config_from_json() {
        let config: ProverConfig = serde_json::from_str(r#"{"num_threads": 4}"#).unwrap();
        assert_eq!(
            config,
            ProverConfig {
                zero_knowledge: true,
                num_threads: Some(4)
            }
        );
        let config: SetupConfig = serde_json::from_str(r#"{"mode": "InsecureDummy"}"#).unwrap();
        assert_eq!(config.mode, SetupMode::InsecureDummy);
    }
}
