//! SM2 decryption (GB/T 32918.4 § 7).
//!
//! ## Algorithm
//!
//! ```text
//! B1: take C1 from C and verify it satisfies the curve equation
//! B2: compute the elliptic curve point S = [h]C1  (h = 1 for this curve)
//! B3: compute [dB]C1 = (x2, y2)
//! B4: compute t = KDF(x2 ‖ y2, klen), fail if t is all zero
//! B5: take C2 from C and compute M' = C2 ⊕ t
//! B6: compute u = Hash(x2 ‖ M' ‖ y2), fail if u ≠ C3
//! ```
//!
//! The two failure cases share one error value and one constant-time
//! comparison pass, so a caller cannot tell them apart.

use alloc::{vec, vec::Vec};

use der::Decode;
use elliptic_curve::subtle::ConstantTimeEq;
use sm2::{Scalar, SecretKey};
use sm3::{
    Sm3,
    digest::{FixedOutputReset, OutputSizeUser, Update, consts::U32},
};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    Cipher, Error, MAX_PLAINTEXT_SIZE, Result,
    encrypting::point_bytes,
    kdf::{c3_tag, kdf_xor},
};

/// Decrypt messages with an SM2 secret key.
pub trait EcDecrypt {
    /// Decrypt `cipher`, returning the plaintext.
    fn decrypt(&self, cipher: &Cipher<'_>) -> Result<Vec<u8>> {
        let mut out = vec![0u8; cipher.c2().len()];
        self.decrypt_into(cipher, &mut out)?;
        Ok(out)
    }

    /// Decrypt `cipher` into `out`, returning the number of plaintext bytes
    /// written.
    ///
    /// `out` must hold at least `cipher.c2().len()` bytes; it is wiped
    /// before returning an error.
    fn decrypt_into(&self, cipher: &Cipher<'_>, out: &mut [u8]) -> Result<usize>;

    /// Parse a DER-encoded ciphertext and decrypt it.
    ///
    /// The entire input slice must be consumed by the ciphertext structure.
    fn decrypt_der(&self, der: &[u8]) -> Result<Vec<u8>> {
        let cipher = Cipher::from_der(der)?;
        self.decrypt(&cipher)
    }

    /// Parse a DER-encoded ciphertext and decrypt it into `out`.
    fn decrypt_der_into(&self, der: &[u8], out: &mut [u8]) -> Result<usize> {
        let cipher = Cipher::from_der(der)?;
        self.decrypt_into(&cipher, out)
    }
}

impl EcDecrypt for SecretKey {
    fn decrypt_into(&self, cipher: &Cipher<'_>, out: &mut [u8]) -> Result<usize> {
        let d = Zeroizing::new(self.to_nonzero_scalar());
        do_decrypt::<Sm3>((*d).as_ref(), cipher, out)
    }
}

fn do_decrypt<D>(d: &Scalar, cipher: &Cipher<'_>, out: &mut [u8]) -> Result<usize>
where
    D: Default + Update + FixedOutputReset + OutputSizeUser<OutputSize = U32>,
{
    let c2 = cipher.c2();
    if c2.is_empty() || c2.len() > MAX_PLAINTEXT_SIZE {
        return Err(Error::InvalidLength);
    }
    if out.len() < c2.len() {
        return Err(Error::InvalidLength);
    }
    let out = &mut out[..c2.len()];

    // B1 holds by construction: a `Cipher` only carries on-curve points.
    // B3: [dB]C1 = (x2, y2)
    let mut x2y2 = Zeroizing::new([0u8; 64]);
    point_bytes(&(*cipher.c1() * d).to_affine(), &mut x2y2)?;

    // B4/B5: t = KDF(x2 ‖ y2, klen); M' = C2 ⊕ t
    let mut digest = D::default();
    kdf_xor(&mut digest, &x2y2, c2, out);

    // an all-zero t leaves the body unchanged
    let zero_keystream = out.ct_eq(c2);

    // B6: u = Hash(x2 ‖ M' ‖ y2)
    let u = c3_tag(&mut digest, &x2y2, out);
    let tag_mismatch = !u.as_slice().ct_eq(cipher.c3().as_slice());

    if bool::from(zero_keystream | tag_mismatch) {
        out.zeroize();
        return Err(Error::DecryptionFailed);
    }

    Ok(c2.len())
}
