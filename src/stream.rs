//! Buffered encryption and decryption contexts.
//!
//! The one-shot routines need the whole message at once; these contexts
//! accumulate chunks up to the scheme's size bounds and run the one-shot
//! call at the end. `finish` consumes the context, so feeding more data
//! after finalization is a compile error rather than a runtime one, and the
//! accumulated plaintext is wiped when the context goes away.

use alloc::vec::Vec;

use rand_core::TryCryptoRng;
use sm2::{PublicKey, SecretKey};
use zeroize::Zeroize;

use crate::{EcDecrypt, EcEncrypt, Error, MAX_CIPHERTEXT_SIZE, MAX_PLAINTEXT_SIZE, Result};

/// Accumulates plaintext chunks for a single SM2 encryption.
pub struct EncryptContext {
    key: PublicKey,
    buf: [u8; MAX_PLAINTEXT_SIZE],
    len: usize,
}

impl EncryptContext {
    /// Create a context encrypting to `key`.
    pub fn new(key: &PublicKey) -> Self {
        Self {
            key: key.clone(),
            buf: [0u8; MAX_PLAINTEXT_SIZE],
            len: 0,
        }
    }

    /// Upper bound of the DER ciphertext [`finish`](Self::finish) can emit.
    pub const fn max_output_len() -> usize {
        MAX_CIPHERTEXT_SIZE
    }

    /// Append a chunk of plaintext.
    ///
    /// Fails without modifying the context when the accumulated total would
    /// exceed [`MAX_PLAINTEXT_SIZE`].
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let end = self.len.checked_add(data.len()).ok_or(Error::InvalidLength)?;
        if end > MAX_PLAINTEXT_SIZE {
            return Err(Error::InvalidLength);
        }
        self.buf[self.len..end].copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    /// Consume the context and encrypt everything accumulated plus `last`,
    /// returning the DER-encoded ciphertext.
    pub fn finish<R: TryCryptoRng>(mut self, rng: &mut R, last: &[u8]) -> Result<Vec<u8>> {
        // nothing buffered: skip the copy and encrypt the chunk directly
        if self.len == 0 {
            return self.key.encrypt_der(rng, last);
        }
        self.update(last)?;
        self.key.encrypt_der(rng, &self.buf[..self.len])
    }
}

impl Drop for EncryptContext {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Accumulates DER ciphertext chunks for a single SM2 decryption.
pub struct DecryptContext {
    key: SecretKey,
    buf: [u8; MAX_CIPHERTEXT_SIZE],
    len: usize,
}

impl DecryptContext {
    /// Create a context decrypting with `key`.
    pub fn new(key: &SecretKey) -> Self {
        Self {
            key: key.clone(),
            buf: [0u8; MAX_CIPHERTEXT_SIZE],
            len: 0,
        }
    }

    /// Upper bound of the plaintext [`finish`](Self::finish) can emit.
    pub const fn max_output_len() -> usize {
        MAX_PLAINTEXT_SIZE
    }

    /// Append a chunk of DER ciphertext.
    ///
    /// Fails without modifying the context when the accumulated total would
    /// exceed [`MAX_CIPHERTEXT_SIZE`].
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let end = self.len.checked_add(data.len()).ok_or(Error::InvalidLength)?;
        if end > MAX_CIPHERTEXT_SIZE {
            return Err(Error::InvalidLength);
        }
        self.buf[self.len..end].copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    /// Consume the context and decrypt everything accumulated plus `last`,
    /// returning the plaintext.
    pub fn finish(mut self, last: &[u8]) -> Result<Vec<u8>> {
        // nothing buffered: skip the copy and decrypt the chunk directly
        if self.len == 0 {
            return self.key.decrypt_der(last);
        }
        self.update(last)?;
        self.key.decrypt_der(&self.buf[..self.len])
    }
}

impl Drop for DecryptContext {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}
