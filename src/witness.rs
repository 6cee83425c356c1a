use crate::error::{Groth16Error, Result};
use ark_ff::{Field, PrimeField};
use rootcause::prelude::ResultExt;
use rootcause::report;

/// Ordered wire assignment: constant one, public wires, then secret/internal wires.
///
/// A public witness stops after the public wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness<F> {
    values: Vec<F>,
}

impl<F: Field> Witness<F> {
    /// Wrap values that already start with the constant-one wire.
    pub fn new(values: Vec<F>) -> Self {
        Witness { values }
    }

    pub fn from_full_assignment(public: &[F], private: &[F]) -> Self {
        let mut values = Vec::with_capacity(1 + public.len() + private.len());
        values.push(F::ONE);
        values.extend_from_slice(public);
        values.extend_from_slice(private);
        Witness { values }
    }

    pub fn from_public_assignment(public: &[F]) -> Self {
        Self::from_full_assignment(public, &[])
    }

    /// The public witness (constant one plus public wires) contained in a full witness.
    pub fn public_part(&self, num_public: usize) -> Result<Self> {
        if num_public > self.values.len() {
            return Err(report!(Groth16Error::InputSizeMismatch {
                expected: num_public,
                actual: self.values.len(),
            })
            .attach("Extracting public witness"));
        }
        Ok(Witness {
            values: self.values[..num_public].to_vec(),
        })
    }

    pub fn values(&self) -> &[F] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<F: PrimeField> Witness<F> {
    /// JSON array of decimal strings, constant one included.
    pub fn to_json(&self) -> Result<String> {
        let values: Vec<String> = self
            .values
            .iter()
            .map(|value| value.into_bigint().to_string())
            .collect();
        serde_json::to_string(&values).context(Groth16Error::SerializationFormat)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let values: Vec<String> =
            serde_json::from_str(json).context(Groth16Error::SerializationFormat)?;
        let values = values
            .iter()
            .map(|value| {
                F::from_str(value).map_err(|_| {
                    report!(Groth16Error::SerializationFormat)
                        .attach(format!("Not a field element: {:?}", value))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Witness { values })
    }
}

impl<F> AsRef<[F]> for Witness<F> {
    fn as_ref(&self) -> &[F] {
        &self.values
    }
}
