//! Binary encoding of proving keys, verifying keys and proofs.
//!
//! Every object starts with two header bytes: an object tag (1 proving key, 2 verifying key,
//! 3 proof) and the point encoding (0 raw, 1 compressed). Counts are little-endian `u64`s and
//! point vectors carry their length, which must agree with the counts in the header.
//!
//! Decoding never trusts a count for allocation, so a short or hostile stream fails with
//! [`Groth16Error::SerializationFormat`] instead of exhausting memory.
use crate::error::{Groth16Error, Result};
use crate::groth16::{Proof, ProvingKey, VerifyingKey};
use ark_ec::pairing::Pairing;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, Valid, Validate};
use log::debug;
use rayon::prelude::*;
use rootcause::prelude::ResultExt;
use rootcause::report;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const PROVING_KEY_TAG: u8 = 1;
const VERIFYING_KEY_TAG: u8 = 2;
const PROOF_TAG: u8 = 3;

const RAW: u8 = 0;
const COMPRESSED: u8 = 1;

/// Upper bound on elements reserved up front from a count read off the stream.
const MAX_PREALLOCATION: usize = 1 << 16;

mod sealed {
    use super::*;

    pub trait Codec: Sized {
        const TAG: u8;

        fn encode<W: Write>(&self, writer: &mut W, compress: Compress) -> Result<()>;

        fn decode<R: Read>(reader: &mut R, compress: Compress, validate: Validate)
        -> Result<Self>;
    }
}

use sealed::Codec;

/// Stream encoding shared by [`ProvingKey`], [`VerifyingKey`] and [`Proof`].
pub trait KeyEncoding: Codec {
    /// Write with compressed points. Returns the number of bytes written.
    fn write_to<W: Write>(&self, writer: W) -> Result<u64> {
        write_object(self, writer, Compress::Yes)
    }

    /// Write with uncompressed points: larger, but much faster to read back.
    fn write_raw_to<W: Write>(&self, writer: W) -> Result<u64> {
        write_object(self, writer, Compress::No)
    }

    /// Read either encoding, checking every point is on the curve and in the prime order
    /// subgroup.
    fn read_from<R: Read>(reader: R) -> Result<Self> {
        read_object(reader, Validate::Yes)
    }

    /// Read either encoding without any point checks.
    ///
    /// Only for bytes this process wrote itself or otherwise fully trusts: an invalid point
    /// slips through silently and breaks soundness of everything built on it.
    fn unsafe_read_from<R: Read>(reader: R) -> Result<Self> {
        read_object(reader, Validate::No)
    }

    /// Compressed write to a new file at `path`.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let file = File::create(path)
            .context(Groth16Error::SerializationFormat)
            .attach(format!("Creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let written = self.write_to(&mut writer)?;
        writer
            .flush()
            .context(Groth16Error::SerializationFormat)
            .attach(format!("Flushing {}", path.display()))?;
        Ok(written)
    }

    /// Safe read from the file at `path`.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .context(Groth16Error::SerializationFormat)
            .attach(format!("Opening {}", path.display()))?;
        Self::read_from(BufReader::new(file))
    }
}

impl<T: Codec> KeyEncoding for T {}

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn write_object<T: Codec, W: Write>(value: &T, writer: W, compress: Compress) -> Result<u64> {
    let mut writer = CountingWriter {
        inner: writer,
        written: 0,
    };
    let encoding = match compress {
        Compress::Yes => COMPRESSED,
        Compress::No => RAW,
    };
    writer
        .write_all(&[T::TAG, encoding])
        .context(Groth16Error::SerializationFormat)
        .attach("Writing header")?;
    value.encode(&mut writer, compress)?;
    debug!("Wrote object {} in {} bytes", T::TAG, writer.written);
    Ok(writer.written)
}

fn read_object<T: Codec, R: Read>(mut reader: R, validate: Validate) -> Result<T> {
    let mut header = [0u8; 2];
    reader
        .read_exact(&mut header)
        .context(Groth16Error::SerializationFormat)
        .attach("Reading header")?;
    if header[0] != T::TAG {
        return Err(report!(Groth16Error::SerializationFormat)
            .attach(format!("Object tag {}, expected {}", header[0], T::TAG)));
    }
    let compress = match header[1] {
        COMPRESSED => Compress::Yes,
        RAW => Compress::No,
        other => {
            return Err(report!(Groth16Error::SerializationFormat)
                .attach(format!("Unknown point encoding {}", other)));
        }
    };
    T::decode(&mut reader, compress, validate)
}

fn write_value<T, W>(value: &T, writer: &mut W, compress: Compress) -> Result<()>
where
    T: CanonicalSerialize + ?Sized,
    W: Write,
{
    value
        .serialize_with_mode(writer, compress)
        .context(Groth16Error::SerializationFormat)
}

fn write_count<W: Write>(count: usize, writer: &mut W) -> Result<()> {
    write_value(&(count as u64), writer, Compress::No)
}

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let count = u64::deserialize_with_mode(reader, Compress::No, Validate::No)
        .context(Groth16Error::SerializationFormat)
        .attach(format!("Reading {}", what))?;
    usize::try_from(count).map_err(|_| {
        report!(Groth16Error::SerializationFormat)
            .attach(format!("{} does not fit in memory: {}", what, count))
    })
}

fn read_point<A, R>(reader: &mut R, compress: Compress, validate: Validate, what: &str) -> Result<A>
where
    A: CanonicalDeserialize,
    R: Read,
{
    A::deserialize_with_mode(reader, compress, validate)
        .context(Groth16Error::SerializationFormat)
        .attach(format!("Reading {}", what))
}

/// A length-prefixed point vector that must hold exactly `expected` points.
///
/// Points are checked after the whole vector is read, in parallel.
fn read_points<A, R>(
    reader: &mut R,
    expected: usize,
    compress: Compress,
    validate: Validate,
    what: &str,
) -> Result<Vec<A>>
where
    A: CanonicalDeserialize + Sync,
    R: Read,
{
    let len = read_count(reader, what)?;
    if len != expected {
        return Err(report!(Groth16Error::SerializationFormat)
            .attach(format!("{} has {} points, expected {}", what, len, expected)));
    }
    let mut points = Vec::with_capacity(len.min(MAX_PREALLOCATION));
    for _ in 0..len {
        points.push(read_point(reader, compress, Validate::No, what)?);
    }
    if let Validate::Yes = validate {
        points
            .par_iter()
            .try_for_each(Valid::check)
            .context(Groth16Error::SerializationFormat)
            .attach(format!("Invalid point in {}", what))?;
    }
    Ok(points)
}

/// One bit per wire, least significant bit first.
fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
        bytes[i / 8] |= 1 << (i % 8);
    }
    bytes
}

fn read_bits<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<bool>> {
    let num_bytes = len.div_ceil(8);
    let mut bytes = Vec::new();
    reader
        .by_ref()
        .take(num_bytes as u64)
        .read_to_end(&mut bytes)
        .context(Groth16Error::SerializationFormat)
        .attach(format!("Reading {}", what))?;
    if bytes.len() != num_bytes {
        return Err(report!(Groth16Error::SerializationFormat)
            .attach(format!("{} truncated at {} of {} bytes", what, bytes.len(), num_bytes)));
    }
    if len % 8 != 0 && bytes[num_bytes - 1] >> (len % 8) != 0 {
        return Err(report!(Groth16Error::SerializationFormat)
            .attach(format!("{} has bits set past wire {}", what, len)));
    }
    Ok((0..len).map(|i| (bytes[i / 8] >> (i % 8)) & 1 == 1).collect())
}

fn format_check(holds: bool, message: impl FnOnce() -> String) -> Result<()> {
    if holds {
        Ok(())
    } else {
        Err(report!(Groth16Error::SerializationFormat).attach(message()))
    }
}

impl<E: Pairing> Codec for ProvingKey<E> {
    const TAG: u8 = PROVING_KEY_TAG;

    fn encode<W: Write>(&self, writer: &mut W, compress: Compress) -> Result<()> {
        let count = |flags: &[bool]| flags.iter().filter(|at_infinity| **at_infinity).count();
        write_count(self.domain_size, writer)?;
        write_count(self.num_wires, writer)?;
        write_count(self.num_public, writer)?;
        write_count(count(&self.infinity_a), writer)?;
        write_count(count(&self.infinity_b), writer)?;
        writer
            .write_all(&pack_bits(&self.infinity_a))
            .context(Groth16Error::SerializationFormat)?;
        writer
            .write_all(&pack_bits(&self.infinity_b))
            .context(Groth16Error::SerializationFormat)?;

        write_value(&self.alpha_g1, writer, compress)?;
        write_value(&self.beta_g1, writer, compress)?;
        write_value(&self.delta_g1, writer, compress)?;
        write_value(&self.a_query, writer, compress)?;
        write_value(&self.b_g1_query, writer, compress)?;
        write_value(&self.h_query, writer, compress)?;
        write_value(&self.l_query, writer, compress)?;
        write_value(&self.beta_g2, writer, compress)?;
        write_value(&self.delta_g2, writer, compress)?;
        write_value(&self.b_g2_query, writer, compress)
    }

    fn decode<R: Read>(reader: &mut R, compress: Compress, validate: Validate) -> Result<Self> {
        let domain_size = read_count(reader, "domain size")?;
        let num_wires = read_count(reader, "wire count")?;
        let num_public = read_count(reader, "public wire count")?;
        let num_infinity_a = read_count(reader, "A infinity count")?;
        let num_infinity_b = read_count(reader, "B infinity count")?;

        format_check(domain_size.is_power_of_two(), || {
            format!("Domain size {} is not a power of two", domain_size)
        })?;
        format_check(1 <= num_public && num_public <= num_wires, || {
            format!("{} public wires out of {}", num_public, num_wires)
        })?;
        format_check(domain_size >= num_public, || {
            format!("Domain of size {} for {} public wires", domain_size, num_public)
        })?;
        format_check(
            num_infinity_a <= num_wires && num_infinity_b <= num_wires,
            || {
                format!(
                    "Infinity counts ({}, {}) exceed {} wires",
                    num_infinity_a, num_infinity_b, num_wires
                )
            },
        )?;

        let infinity_a = read_bits(reader, num_wires, "A infinity bitmap")?;
        let infinity_b = read_bits(reader, num_wires, "B infinity bitmap")?;
        let popcount = |bits: &[bool]| bits.iter().filter(|bit| **bit).count();
        format_check(
            popcount(&infinity_a) == num_infinity_a && popcount(&infinity_b) == num_infinity_b,
            || "Infinity bitmaps disagree with their counts".to_string(),
        )?;
        format_check(!infinity_a[..num_public].contains(&true), || {
            "A public wire is flagged at infinity in A".to_string()
        })?;

        let alpha_g1 = read_point(reader, compress, validate, "alpha in G1")?;
        let beta_g1 = read_point(reader, compress, validate, "beta in G1")?;
        let delta_g1 = read_point(reader, compress, validate, "delta in G1")?;
        let a_query = read_points(reader, num_wires - num_infinity_a, compress, validate, "A query")?;
        let b_g1_query = read_points(
            reader,
            num_wires - num_infinity_b,
            compress,
            validate,
            "B query in G1",
        )?;
        let h_query = read_points(reader, domain_size - 1, compress, validate, "H query")?;
        let l_query = read_points(reader, num_wires - num_public, compress, validate, "L query")?;
        let beta_g2 = read_point(reader, compress, validate, "beta in G2")?;
        let delta_g2 = read_point(reader, compress, validate, "delta in G2")?;
        let b_g2_query = read_points(
            reader,
            num_wires - num_infinity_b,
            compress,
            validate,
            "B query in G2",
        )?;

        Ok(ProvingKey {
            domain_size,
            num_wires,
            num_public,
            alpha_g1,
            beta_g1,
            delta_g1,
            a_query,
            b_g1_query,
            h_query,
            l_query,
            beta_g2,
            delta_g2,
            b_g2_query,
            infinity_a,
            infinity_b,
        })
    }
}

impl<E: Pairing> Codec for VerifyingKey<E> {
    const TAG: u8 = VERIFYING_KEY_TAG;

    fn encode<W: Write>(&self, writer: &mut W, compress: Compress) -> Result<()> {
        write_count(self.k.len(), writer)?;
        write_value(&self.alpha_g1, writer, compress)?;
        write_value(&self.beta_g2, writer, compress)?;
        write_value(&self.gamma_g2, writer, compress)?;
        write_value(&self.delta_g2, writer, compress)?;
        write_value(&self.k, writer, compress)
    }

    fn decode<R: Read>(reader: &mut R, compress: Compress, validate: Validate) -> Result<Self> {
        let num_public = read_count(reader, "public wire count")?;
        format_check(num_public >= 1, || "No public wires".to_string())?;

        let alpha_g1 = read_point(reader, compress, validate, "alpha in G1")?;
        let beta_g2 = read_point(reader, compress, validate, "beta in G2")?;
        let gamma_g2 = read_point(reader, compress, validate, "gamma in G2")?;
        let delta_g2 = read_point(reader, compress, validate, "delta in G2")?;
        let k = read_points(reader, num_public, compress, validate, "K")?;

        Ok(VerifyingKey {
            alpha_g1,
            beta_g2,
            gamma_g2,
            delta_g2,
            k,
            alpha_beta: E::pairing(alpha_g1, beta_g2),
        })
    }
}

impl<E: Pairing> Codec for Proof<E> {
    const TAG: u8 = PROOF_TAG;

    fn encode<W: Write>(&self, writer: &mut W, compress: Compress) -> Result<()> {
        write_value(self, writer, compress)
    }

    fn decode<R: Read>(reader: &mut R, compress: Compress, validate: Validate) -> Result<Self> {
        read_point(reader, compress, validate, "proof")
    }
}
