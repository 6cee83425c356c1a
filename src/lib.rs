//! # WARNING
//! This library has not been audited for security! Don't use it in production without one.
//!
//!# Groth16 backend
//!
//!This crate is the proving backend of a zk-SNARK toolchain: given a compiled Rank 1 Constraint System it generates
//!proving and verifying keys, produces Groth16 proofs for witnesses and verifies them, and reads and writes all three
//!artifacts in a compact binary format.
//!
//!The implementation is type generic over any curve that implements `ark_ec::pairing::Pairing`; `mnt6_753` provides
//!the ready made instantiation over MNT6-753, which is also what the tests run on.
//!
//!Errors are handled using the `rootcause` crate, every failure carries a `Groth16Error` kind plus attached debug
//!information (think the expected and actual lengths of a witness). A proof that fails verification is not an error,
//!`verify` returns `Ok(false)`.
//!
//!The general flow is:
//!
//!- Build an `R1CS` (or implement `ConstraintSystem` for your own compiled form)
//!- Generate keys with `setup`, or benchmark-only keys with `SetupMode::InsecureDummy`
//!- Generate a proof using `prove(&r1cs, &proving_key, &witness, &config)`
//!- Verify the proof against the public witness with `verify` or `proof.verify()`
//!- Persist keys and proofs through `KeyEncoding`
//!
//!Logging goes through the `log` facade: timings at `info`, progress at `debug`, insecure setups at `warn`.
//!

/// Types for Rank 1 Constraint Systems.
pub mod circuits;
/// Error kinds shared by every operation.
pub mod error;
/// Setup, proving and verification.
pub mod groth16;
mod helpers;
pub mod mnt6_753;
mod qap;
pub mod serialization;
/// Wire assignments.
pub mod witness;

pub use circuits::{ConstraintSystem, LinearCombination, R1CS};
pub use error::{Groth16Error, Result};
pub use groth16::{
    Proof, ProverConfig, ProvingKey, SetupConfig, SetupMode, VerifyingKey, prove, prove_with_rng,
    setup, verify,
};
pub use helpers::{rand_nonzero_scalar, rand_scalar};
pub use serialization::KeyEncoding;
pub use witness::Witness;
