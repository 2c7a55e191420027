//! The SM2 key derivation function (GB/T 32918.4 § 5.4.3): a counter-mode
//! expansion of the hash applied directly as a keystream, plus the `C3`
//! integrity tag over the shared secret coordinates.

use core::cmp::min;

use sm3::digest::{FixedOutputReset, Output, OutputSizeUser, Reset, Update};
use zeroize::Zeroize;

/// Derive an `out.len()`-byte keystream from `x2y2` and XOR it into
/// `input`, writing the result to `out`.
///
/// Folds steps A5/A6 (B4/B5) of the standard together: the keystream only
/// ever exists one digest block at a time, so an all-zero keystream shows up
/// as `out == input` at the caller.
pub(crate) fn kdf_xor<D>(digest: &mut D, x2y2: &[u8; 64], input: &[u8], out: &mut [u8])
where
    D: Update + FixedOutputReset,
{
    debug_assert_eq!(input.len(), out.len());

    let mut ct: u32 = 1;
    let mut offset = 0;
    let digest_size = D::output_size();
    let mut block = Output::<D>::default();

    Reset::reset(digest);
    while offset < input.len() {
        Update::update(digest, x2y2);
        Update::update(digest, &ct.to_be_bytes());
        digest.finalize_into_reset(&mut block);

        let xor_len = min(digest_size, input.len() - offset);
        for i in 0..xor_len {
            out[offset + i] = input[offset + i] ^ block[i];
        }
        offset += xor_len;
        ct += 1;
    }

    block.as_mut_slice().zeroize();
}

/// Integrity tag `Hash(x2 ‖ data ‖ y2)`.
///
/// The message goes between the two coordinate halves, not after them; other
/// implementations reject the ciphertext otherwise.
pub(crate) fn c3_tag<D>(digest: &mut D, x2y2: &[u8; 64], data: &[u8]) -> Output<D>
where
    D: Update + FixedOutputReset,
{
    let mut tag = Output::<D>::default();
    Update::update(digest, &x2y2[..32]);
    Update::update(digest, data);
    Update::update(digest, &x2y2[32..]);
    digest.finalize_into_reset(&mut tag);
    tag
}

#[cfg(test)]
pub(crate) mod test_digest {
    //! A digest whose output is always zero, for driving the all-zero
    //! keystream paths that SM3 cannot reach.

    use sm3::digest::{
        FixedOutput, FixedOutputReset, Output, OutputSizeUser, Reset, Update, consts::U32,
    };

    #[derive(Clone, Default)]
    pub(crate) struct ZeroDigest;

    impl Update for ZeroDigest {
        fn update(&mut self, _data: &[u8]) {}
    }

    impl OutputSizeUser for ZeroDigest {
        type OutputSize = U32;
    }

    impl FixedOutput for ZeroDigest {
        fn finalize_into(self, out: &mut Output<Self>) {
            out.fill(0);
        }
    }

    impl Reset for ZeroDigest {
        fn reset(&mut self) {}
    }

    impl FixedOutputReset for ZeroDigest {
        fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
            out.fill(0);
        }
    }
}
