#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
    clippy::implicit_saturating_sub,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! SM2 public key encryption as defined in GM/T 0003 (GB/T 32918.4), with
//! the ASN.1 DER ciphertext format from GM/T 0009.
//!
//! Curve arithmetic comes from the [`sm2`] crate; this crate contributes the
//! encryption scheme itself: the one-shot encrypt/decrypt pair, an encrypt
//! variant which pins the DER-serialized length of the ephemeral point, a
//! buffered streaming facade, and the canonical `SEQUENCE { INTEGER x,
//! INTEGER y, OCTET STRING hash, OCTET STRING cipher }` encoding.
//!
//! ## Usage
//!
//! ```
//! use rand_core::OsRng;
//! use sm2::SecretKey;
//! use sm2_pke::{EcDecrypt, EcEncrypt};
//!
//! // Encrypting
//! let secret_key = SecretKey::try_from_rng(&mut OsRng).unwrap(); // serialize with `::to_bytes()`
//! let public_key = secret_key.public_key();
//! let ciphertext = public_key.encrypt_der(&mut OsRng, b"plaintext").unwrap();
//!
//! // Decrypting
//! let plaintext = secret_key.decrypt_der(&ciphertext).unwrap();
//! assert_eq!(plaintext, b"plaintext");
//! ```

extern crate alloc;

mod cipher;
mod decrypting;
mod encrypting;
mod error;
mod kdf;
mod stream;

pub use crate::{
    cipher::{Cipher, PointSize},
    decrypting::EcDecrypt,
    encrypting::EcEncrypt,
    error::{Error, Result},
    stream::{DecryptContext, EncryptContext},
};

pub use der;
pub use sm2::{
    self, AffinePoint, NonZeroScalar, ProjectivePoint, PublicKey, Scalar, SecretKey, Sm2,
};

/// SM3 hash output.
type Hash = sm3::digest::Output<sm3::Sm3>;

/// Smallest plaintext the scheme accepts.
pub const MIN_PLAINTEXT_SIZE: usize = 1;

/// Largest plaintext (and therefore ciphertext body) the scheme accepts.
pub const MAX_PLAINTEXT_SIZE: usize = 255;

/// Largest possible DER-encoded ciphertext: a maximal body behind two
/// sign-byte INTEGERs, the 32-byte tag and the SEQUENCE header.
pub const MAX_CIPHERTEXT_SIZE: usize = 366;
