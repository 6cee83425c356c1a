use crate::error::{Groth16Error, Result};
use crate::witness::Witness;
use ark_ff::Field;
use itertools::izip;
use rootcause::report;

/// Sparse linear combination of wires: `(coefficient, wire index)` pairs.
pub type LinearCombination<F> = Vec<(F, usize)>;

/// Read-only view of a compiled rank 1 constraint system.
///
/// Wires are ordered constant-one, public, then secret/internal. `num_public` counts the
/// constant-one wire together with the public wires.
pub trait ConstraintSystem<F: Field>: Sync {
    fn num_wires(&self) -> usize;
    fn num_public(&self) -> usize;
    fn num_constraints(&self) -> usize;
    /// Left operands, one linear combination per constraint.
    fn a(&self) -> &[LinearCombination<F>];
    /// Right operands, one linear combination per constraint.
    fn b(&self) -> &[LinearCombination<F>];
    /// Outputs, one linear combination per constraint.
    fn c(&self) -> &[LinearCombination<F>];

    fn num_private(&self) -> usize {
        self.num_wires().saturating_sub(self.num_public())
    }

    /// Check that the matrices agree with each other and with the declared wire counts.
    fn validate(&self) -> Result<()> {
        let rows = [self.a().len(), self.b().len(), self.c().len()];
        if rows.iter().any(|&n| n != self.num_constraints()) {
            return Err(report!(Groth16Error::MalformedConstraintSystem)
                .attach(format!("Matrix rows (A, B, C): {:?}", rows))
                .attach(format!("Declared constraints: {}", self.num_constraints())));
        }
        if self.num_public() == 0 || self.num_public() > self.num_wires() {
            return Err(report!(Groth16Error::MalformedConstraintSystem)
                .attach(format!("Public wires: {}", self.num_public()))
                .attach(format!("Total wires: {}", self.num_wires())));
        }
        for (row, (a, b, c)) in izip!(self.a(), self.b(), self.c()).enumerate() {
            if let Some((_, wire)) = a
                .iter()
                .chain(b.iter())
                .chain(c.iter())
                .find(|(_, wire)| *wire >= self.num_wires())
            {
                return Err(report!(Groth16Error::MalformedConstraintSystem)
                    .attach(format!("Constraint {} references wire {}", row, wire))
                    .attach(format!("Total wires: {}", self.num_wires())));
            }
        }
        Ok(())
    }
}

/// Evaluate a linear combination against wire values.
pub(crate) fn evaluate_lc<F: Field>(lc: &LinearCombination<F>, wires: &[F]) -> F {
    lc.iter()
        .map(|(coefficient, wire)| *coefficient * wires[*wire])
        .sum()
}

/// Rank 1 constraint system stored row-wise as sparse linear combinations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R1CS<F: Field> {
    a: Vec<LinearCombination<F>>,
    b: Vec<LinearCombination<F>>,
    c: Vec<LinearCombination<F>>,
    num_wires: usize,
    num_public: usize,
}

impl<F: Field> R1CS<F> {
    /// Builds the system without checking it; setup rejects inconsistent matrices.
    pub fn new(
        a: Vec<LinearCombination<F>>,
        b: Vec<LinearCombination<F>>,
        c: Vec<LinearCombination<F>>,
        num_wires: usize,
        num_public: usize,
    ) -> Self {
        R1CS {
            a,
            b,
            c,
            num_wires,
            num_public,
        }
    }

    /// Whether `(A·w) ∘ (B·w) = (C·w)` holds for every constraint.
    ///
    /// A debugging aid for callers; the prover never checks satisfaction itself.
    pub fn is_satisfied(&self, witness: &Witness<F>) -> Result<bool> {
        if witness.len() != self.num_wires {
            return Err(report!(Groth16Error::InputSizeMismatch {
                expected: self.num_wires,
                actual: witness.len(),
            })
            .attach("Checking constraint satisfaction"));
        }
        self.validate()?;
        let w = witness.values();
        Ok(izip!(&self.a, &self.b, &self.c)
            .all(|(a, b, c)| evaluate_lc(a, w) * evaluate_lc(b, w) == evaluate_lc(c, w)))
    }
}

impl<F: Field> ConstraintSystem<F> for R1CS<F> {
    fn num_wires(&self) -> usize {
        self.num_wires
    }

    fn num_public(&self) -> usize {
        self.num_public
    }

    fn num_constraints(&self) -> usize {
        self.a.len()
    }

    fn a(&self) -> &[LinearCombination<F>] {
        &self.a
    }

    fn b(&self) -> &[LinearCombination<F>] {
        &self.b
    }

    fn c(&self) -> &[LinearCombination<F>] {
        &self.c
    }
}
