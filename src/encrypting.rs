//! SM2 encryption (GB/T 32918.4 § 6).
//!
//! ## Algorithm
//!
//! ```text
//! A1: generate a random number k in [1, n-1] via a random number generator
//! A2: compute the elliptic curve point C1 = [k]G = (x1, y1)
//! A3: compute the elliptic curve point S = [h]PB  (h = 1 for this curve)
//! A4: compute the elliptic curve point [k]PB = (x2, y2)
//! A5: compute t = KDF(x2 ‖ y2, klen), return to A1 if t is all zero
//! A6: compute C2 = M ⊕ t
//! A7: compute C3 = Hash(x2 ‖ M ‖ y2)
//! ```

use alloc::{borrow::Cow, vec, vec::Vec};

use der::{Encode, asn1::UintRef};
use elliptic_curve::{
    Curve,
    bigint::{Random, Zero},
    ops::MulByGenerator,
    scalar::FromUintUnchecked,
    sec1::ToEncodedPoint,
};
use rand_core::TryCryptoRng;
use sm2::{AffinePoint, NonZeroScalar, ProjectivePoint, PublicKey, Scalar, SecretKey, Sm2, U256};
use sm3::{
    Sm3,
    digest::{FixedOutputReset, Output, OutputSizeUser, Update, consts::U32},
};
use zeroize::Zeroizing;

use crate::{
    Cipher, Error, MAX_PLAINTEXT_SIZE, PointSize, Result,
    kdf::{c3_tag, kdf_xor},
};

/// Total attempts [`EcEncrypt::encrypt_fixlen`] spends searching for an
/// ephemeral point of the requested encoded size.
const MAX_TRIES: usize = 200;

/// Encrypt messages to an SM2 key.
pub trait EcEncrypt {
    /// Encrypt `msg` under this key with a fresh ephemeral scalar.
    ///
    /// Accepts between [`MIN_PLAINTEXT_SIZE`](crate::MIN_PLAINTEXT_SIZE) and
    /// [`MAX_PLAINTEXT_SIZE`](crate::MAX_PLAINTEXT_SIZE) bytes of plaintext.
    fn encrypt<R: TryCryptoRng>(&self, rng: &mut R, msg: &[u8]) -> Result<Cipher<'static>>;

    /// Encrypt `msg`, redrawing the ephemeral scalar until the DER encoding
    /// of the `C1` coordinates is exactly `size.der_len()` bytes.
    ///
    /// Spends at most 200 attempts before reporting
    /// [`Error::RetryExhausted`]; with [`PointSize::Typical`] about every
    /// second attempt matches and even [`PointSize::Compact`] fails all 200
    /// with probability below 10⁻²⁴, so the bound only trips on a broken
    /// RNG.
    fn encrypt_fixlen<R: TryCryptoRng>(
        &self,
        rng: &mut R,
        msg: &[u8],
        size: PointSize,
    ) -> Result<Cipher<'static>>;

    /// Encrypt and DER-encode in one step.
    fn encrypt_der<R: TryCryptoRng>(&self, rng: &mut R, msg: &[u8]) -> Result<Vec<u8>> {
        Ok(self.encrypt(rng, msg)?.to_der()?)
    }

    /// Encrypt with a pinned coordinate encoding and DER-encode in one step.
    ///
    /// For a fixed plaintext length the output length is deterministic,
    /// which lets callers reserve exact-size ciphertext buffers.
    fn encrypt_der_fixlen<R: TryCryptoRng>(
        &self,
        rng: &mut R,
        msg: &[u8],
        size: PointSize,
    ) -> Result<Vec<u8>> {
        Ok(self.encrypt_fixlen(rng, msg, size)?.to_der()?)
    }
}

impl EcEncrypt for PublicKey {
    fn encrypt<R: TryCryptoRng>(&self, rng: &mut R, msg: &[u8]) -> Result<Cipher<'static>> {
        do_encrypt::<Sm3, R>(self, rng, msg, None)
    }

    fn encrypt_fixlen<R: TryCryptoRng>(
        &self,
        rng: &mut R,
        msg: &[u8],
        size: PointSize,
    ) -> Result<Cipher<'static>> {
        do_encrypt::<Sm3, R>(self, rng, msg, Some(size))
    }
}

impl EcEncrypt for SecretKey {
    fn encrypt<R: TryCryptoRng>(&self, rng: &mut R, msg: &[u8]) -> Result<Cipher<'static>> {
        self.public_key().encrypt(rng, msg)
    }

    fn encrypt_fixlen<R: TryCryptoRng>(
        &self,
        rng: &mut R,
        msg: &[u8],
        size: PointSize,
    ) -> Result<Cipher<'static>> {
        self.public_key().encrypt_fixlen(rng, msg, size)
    }
}

fn do_encrypt<D, R>(
    public_key: &PublicKey,
    rng: &mut R,
    msg: &[u8],
    fixed: Option<PointSize>,
) -> Result<Cipher<'static>>
where
    D: Default + Update + FixedOutputReset + OutputSizeUser<OutputSize = U32>,
    R: TryCryptoRng,
{
    if msg.is_empty() || msg.len() > MAX_PLAINTEXT_SIZE {
        return Err(Error::InvalidLength);
    }

    let pb = public_key.as_affine();
    let mut digest = D::default();
    let mut c2 = vec![0u8; msg.len()];
    let mut tries = 0;

    loop {
        // A1: generate a random number k in [1, n-1]
        let k = Zeroizing::new(generate_k(rng)?);
        let k: &Scalar = (*k).as_ref();

        // A2: C1 = [k]G = (x1, y1)
        let c1 = ProjectivePoint::mul_by_generator(k).to_affine();

        // Only the size search consumes attempts; the all-zero keystream
        // retry below is unbounded (and never taken in practice).
        if let Some(size) = fixed {
            if point_der_len(&c1)? != size.der_len() {
                tries += 1;
                if tries == MAX_TRIES {
                    return Err(Error::RetryExhausted);
                }
                continue;
            }
        }

        match encrypt_once(&mut digest, pb, k, msg, &mut c2)? {
            Some(c3) => return Ok(Cipher::new(c1, Cow::Owned(c2), c3)),
            // A5: t was all zero, draw a fresh k
            None => continue,
        }
    }
}

/// Steps A4..A7 for a fixed ephemeral scalar.
///
/// Writes `M ⊕ t` into `c2_out` and returns the tag, or `None` when the
/// derived keystream was all zero and the caller must redraw `k`.
fn encrypt_once<D>(
    digest: &mut D,
    pb: &AffinePoint,
    k: &Scalar,
    msg: &[u8],
    c2_out: &mut [u8],
) -> Result<Option<Output<D>>>
where
    D: Default + Update + FixedOutputReset + OutputSizeUser<OutputSize = U32>,
{
    // A4: [k]PB = (x2, y2)
    let mut x2y2 = Zeroizing::new([0u8; 64]);
    point_bytes(&(*pb * k).to_affine(), &mut x2y2)?;

    // A5/A6: t = KDF(x2 ‖ y2, klen); C2 = M ⊕ t
    kdf_xor(digest, &x2y2, msg, c2_out);

    // an all-zero t leaves the message unchanged
    if c2_out.iter().zip(msg).all(|(c, m)| c == m) {
        return Ok(None);
    }

    // A7: C3 = Hash(x2 ‖ M ‖ y2)
    Ok(Some(c3_tag(digest, &x2y2, msg)))
}

/// Generate the ephemeral scalar `k ∈ [1, n-1]` by rejection sampling.
fn generate_k<R: TryCryptoRng>(rng: &mut R) -> Result<NonZeroScalar> {
    loop {
        let u = U256::try_random(rng).map_err(|_| Error::RandomGeneration)?;
        if bool::from(u.is_zero()) || u >= Sm2::ORDER {
            continue;
        }
        if let Some(k) = Option::from(NonZeroScalar::new(Scalar::from_uint_unchecked(u))) {
            return Ok(k);
        }
    }
}

/// Serialize the affine coordinates as the 64-byte `x ‖ y` concatenation.
pub(crate) fn point_bytes(point: &AffinePoint, out: &mut [u8; 64]) -> Result<()> {
    let encoded = point.to_encoded_point(false);
    let x = encoded.x().ok_or(Error::Malformed)?;
    let y = encoded.y().ok_or(Error::Malformed)?;
    out[..32].copy_from_slice(x);
    out[32..].copy_from_slice(y);
    Ok(())
}

/// DER-encoded length of the `(INTEGER x, INTEGER y)` pair, headers
/// included.
fn point_der_len(point: &AffinePoint) -> Result<usize> {
    let encoded = point.to_encoded_point(false);
    let x = UintRef::new(encoded.x().ok_or(Error::Malformed)?)?;
    let y = UintRef::new(encoded.y().ok_or(Error::Malformed)?)?;
    let len = (x.encoded_len()? + y.encoded_len()?)?;
    Ok(usize::try_from(len)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EcDecrypt, kdf::test_digest::ZeroDigest};
    use hex_literal::hex;

    /// GB/T 32918.5-2017 A.2: encryption of `"encryption standard"` on the
    /// recommended curve with a fixed ephemeral scalar.
    const D_B: [u8; 32] = hex!("3945208F7B2144B13F36E38AC6D39F95889393692860B51A42FB81EF4DF7C5B8");
    const K: [u8; 32] = hex!("59276E27D506861A16680F3AD9C02DCCEF3CC1FA3CDBE4CE6D54B80DEAC1BC21");
    const X1: [u8; 32] = hex!("04EBFC718E8D1798620432268E77FEB6415E2EDE0E073C0F4F640ECD2E149A73");
    const Y1: [u8; 32] = hex!("E858F9D81E5430A57B36DAAB8F950A3C64E6EE6A63094D99283AFF767E124DF0");
    const C3: [u8; 32] = hex!("59983C18F809E262923C53AEC295D30383B54E39D609D160AFCB1908D0BD8766");
    const C2: [u8; 19] = hex!("21886CA989CA9C7D58087307CA93092D651EFA");
    const MSG: &[u8] = b"encryption standard";

    #[test]
    fn standard_example() {
        let secret_key = SecretKey::from_slice(&D_B).unwrap();
        let public_key = secret_key.public_key();

        let k = Scalar::from_uint_unchecked(U256::from_be_slice(&K));
        let c1 = ProjectivePoint::mul_by_generator(&k).to_affine();
        let encoded = c1.to_encoded_point(false);
        assert_eq!(encoded.x().unwrap().as_slice(), &X1);
        assert_eq!(encoded.y().unwrap().as_slice(), &Y1);

        let mut digest = Sm3::default();
        let mut c2 = [0u8; 19];
        let c3 = encrypt_once(&mut digest, public_key.as_affine(), &k, MSG, &mut c2)
            .unwrap()
            .expect("keystream is not all zero");
        assert_eq!(c2, C2);
        assert_eq!(c3.as_slice(), &C3);

        let cipher = Cipher::new(c1, Cow::Owned(c2.to_vec()), c3);
        assert_eq!(secret_key.decrypt(&cipher).unwrap(), MSG);
    }

    #[test]
    fn zero_keystream_requests_retry() {
        let secret_key = SecretKey::from_slice(&D_B).unwrap();
        let public_key = secret_key.public_key();
        let k = Scalar::from_uint_unchecked(U256::from_be_slice(&K));

        let mut digest = ZeroDigest;
        let mut c2 = [0u8; 19];
        let outcome = encrypt_once(&mut digest, public_key.as_affine(), &k, MSG, &mut c2).unwrap();
        assert!(outcome.is_none());
    }
}
