//! SM2 ciphertext structure and its ASN.1 DER form.
//!
//! GM/T 0009 serializes an SM2 ciphertext as
//!
//! ```text
//! SM2Cipher ::= SEQUENCE {
//!     XCoordinate  INTEGER,      -- x1
//!     YCoordinate  INTEGER,      -- y1
//!     Hash         OCTET STRING SIZE(32),
//!     CipherText   OCTET STRING
//! }
//! ```
//!
//! with ordinary DER INTEGER rules: leading zeroes stripped, a `0x00` sign
//! byte prepended when the leading payload bit is set. The sign byte is why
//! the encoded coordinate pair can be 68, 69 or 70 bytes long; see
//! [`PointSize`].

use alloc::borrow::Cow;

use der::{
    Decode, DecodeValue, Encode, EncodeValue, Header, Length, Reader, Sequence, Tag, Writer,
    asn1::{OctetStringRef, UintRef},
};
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use sm2::{AffinePoint, EncodedPoint, FieldBytes};

use crate::{Hash, MAX_PLAINTEXT_SIZE};

/// Serialized length of a coordinate, in bytes.
const COORDINATE_SIZE: usize = 32;

/// The three possible DER-encoded lengths of the ciphertext's
/// `(INTEGER x, INTEGER y)` coordinate pair.
///
/// A coordinate whose leading bit is set picks up a sign byte, so the pair
/// encodes to 68, 69 or 70 bytes depending on whether zero, one or both
/// coordinates need one.
/// [`encrypt_fixlen`](crate::EcEncrypt::encrypt_fixlen) pins this length so
/// callers can reserve fixed-size ciphertext buffers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointSize {
    /// Neither coordinate carries a sign byte (68 bytes).
    Compact,
    /// Exactly one coordinate carries a sign byte (69 bytes).
    Typical,
    /// Both coordinates carry a sign byte (70 bytes).
    Max,
}

impl PointSize {
    /// DER-encoded length of the coordinate pair, headers included.
    pub const fn der_len(self) -> usize {
        match self {
            PointSize::Compact => 68,
            PointSize::Typical => 69,
            PointSize::Max => 70,
        }
    }
}

/// An SM2 ciphertext: the ephemeral point `C1 = (x1, y1)`, the encrypted
/// body `C2` and the SM3 integrity tag `C3`.
///
/// The coordinates always name a point on the curve: the only ways to obtain
/// a `Cipher` are encryption and DER decoding, and the decoder verifies the
/// curve equation before returning. The body is the same length as the
/// plaintext it encrypts.
///
/// Decoding borrows the body from the input; [`Cipher::into_owned`] detaches
/// it.
#[derive(Clone, Debug, PartialEq)]
pub struct Cipher<'a> {
    /// Ephemeral point `C1 = [k]G`.
    c1: AffinePoint,
    /// Encrypted body `C2 = M ⊕ t`.
    c2: Cow<'a, [u8]>,
    /// Integrity tag `C3 = SM3(x2 ‖ M ‖ y2)`.
    c3: Hash,
}

impl<'a> Cipher<'a> {
    pub(crate) fn new(c1: AffinePoint, c2: Cow<'a, [u8]>, c3: Hash) -> Self {
        Self { c1, c2, c3 }
    }

    /// Ephemeral point `C1`.
    pub fn c1(&self) -> &AffinePoint {
        &self.c1
    }

    /// Encrypted body `C2`, the same length as the plaintext.
    pub fn c2(&self) -> &[u8] {
        &self.c2
    }

    /// Integrity tag `C3`.
    pub fn c3(&self) -> &Hash {
        &self.c3
    }

    /// Convert into a ciphertext owning its body.
    pub fn into_owned(self) -> Cipher<'static> {
        Cipher {
            c1: self.c1,
            c2: Cow::Owned(self.c2.into_owned()),
            c3: self.c3,
        }
    }
}

impl EncodeValue for Cipher<'_> {
    fn value_len(&self) -> der::Result<Length> {
        let point = self.c1.to_encoded_point(false);
        let x = point.x().ok_or_else(invalid_point)?;
        let y = point.y().ok_or_else(invalid_point)?;

        let len = (UintRef::new(x)?.encoded_len()? + UintRef::new(y)?.encoded_len()?)?;
        let len = (len + OctetStringRef::new(&self.c3)?.encoded_len()?)?;
        len + OctetStringRef::new(&self.c2)?.encoded_len()?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        let point = self.c1.to_encoded_point(false);
        let x = point.x().ok_or_else(invalid_point)?;
        let y = point.y().ok_or_else(invalid_point)?;

        UintRef::new(x)?.encode(writer)?;
        UintRef::new(y)?.encode(writer)?;
        OctetStringRef::new(&self.c3)?.encode(writer)?;
        OctetStringRef::new(&self.c2)?.encode(writer)
    }
}

impl<'a> DecodeValue<'a> for Cipher<'a> {
    type Error = der::Error;

    fn decode_value<R: Reader<'a>>(reader: &mut R, _header: Header) -> der::Result<Self> {
        let x = UintRef::decode(reader)?;
        let y = UintRef::decode(reader)?;
        let c3 = OctetStringRef::decode(reader)?;
        let c2 = OctetStringRef::decode(reader)?;

        let c1 = decode_point(x.as_bytes(), y.as_bytes())
            .ok_or_else(|| reader.error(Tag::Integer.value_error()))?;

        let c3 = Hash::try_from(c3.as_bytes())
            .map_err(|_| reader.error(Tag::OctetString.length_error()))?;

        if c2.as_bytes().len() > MAX_PLAINTEXT_SIZE {
            return Err(reader.error(Tag::OctetString.length_error()));
        }

        Ok(Self {
            c1,
            c2: Cow::Borrowed(c2.as_bytes()),
            c3,
        })
    }
}

impl<'a> Sequence<'a> for Cipher<'a> {}

/// Rebuild the ephemeral point from big-endian coordinate bytes of at most
/// 32 bytes each, left-zero-padded into the field width.
///
/// Returns `None` for oversize coordinates and for coordinate pairs which do
/// not satisfy the curve equation.
fn decode_point(x: &[u8], y: &[u8]) -> Option<AffinePoint> {
    if x.len() > COORDINATE_SIZE || y.len() > COORDINATE_SIZE {
        return None;
    }

    let mut x_bytes = FieldBytes::default();
    let mut y_bytes = FieldBytes::default();
    x_bytes[COORDINATE_SIZE - x.len()..].copy_from_slice(x);
    y_bytes[COORDINATE_SIZE - y.len()..].copy_from_slice(y);

    let point = EncodedPoint::from_affine_coordinates(&x_bytes, &y_bytes, false);
    Option::from(AffinePoint::from_encoded_point(&point))
}

fn invalid_point() -> der::Error {
    Tag::Integer.value_error().into()
}
