//! The backend instantiated over MNT6-753.
//!
//! ```no_run
//! use groth16_backend::mnt6_753::*;
//! use groth16_backend::{ConstraintSystem, ProverConfig, SetupConfig, prove, setup, verify};
//!
//! # fn main() -> groth16_backend::Result<()> {
//! let one = Fr::from(1u64);
//! // x * x = y, wires [1, y, x]
//! let r1cs = R1CS::new(vec![vec![(one, 2)]], vec![vec![(one, 2)]], vec![vec![(one, 1)]], 3, 2);
//! let (pk, vk) = setup::<MNT6_753, _, _>(&r1cs, &SetupConfig::default(), &mut rand::rng())?;
//!
//! let witness = Witness::from_full_assignment(&[Fr::from(9u64)], &[Fr::from(3u64)]);
//! let proof: Proof = prove(&r1cs, &pk, &witness, &ProverConfig::default())?;
//! assert!(verify(&proof, &vk, &witness.public_part(r1cs.num_public())?)?);
//! # Ok(())
//! # }
//! ```
pub use ark_mnt6_753::{Fr, MNT6_753};

pub type ProvingKey = crate::groth16::ProvingKey<MNT6_753>;
pub type VerifyingKey = crate::groth16::VerifyingKey<MNT6_753>;
pub type Proof = crate::groth16::Proof<MNT6_753>;
pub type Witness = crate::witness::Witness<Fr>;
pub type R1CS = crate::circuits::R1CS<Fr>;
