//! Buffered streaming context tests.

use proptest::prelude::*;
use rand::rngs::SysRng as OsRng;
use sm2::SecretKey;
use sm2_pke::{
    DecryptContext, EcDecrypt, EcEncrypt, EncryptContext, MAX_CIPHERTEXT_SIZE, MAX_PLAINTEXT_SIZE,
};

fn keypair() -> (SecretKey, sm2::PublicKey) {
    let sk = SecretKey::try_from_rng(&mut OsRng).unwrap();
    let pk = sk.public_key();
    (sk, pk)
}

#[test]
fn chunked_encrypt_round_trips() {
    let (sk, pk) = keypair();

    let mut ctx = EncryptContext::new(&pk);
    ctx.update(b"encryption ").unwrap();
    ctx.update(b"stand").unwrap();
    let der = ctx.finish(&mut OsRng, b"ard").unwrap();

    assert_eq!(sk.decrypt_der(&der).unwrap(), b"encryption standard");
}

#[test]
fn chunked_decrypt_round_trips() {
    let (sk, pk) = keypair();
    let der = pk.encrypt_der(&mut OsRng, b"encryption standard").unwrap();

    let mut ctx = DecryptContext::new(&sk);
    let (head, tail) = der.split_at(der.len() / 2);
    ctx.update(head).unwrap();
    assert_eq!(ctx.finish(tail).unwrap(), b"encryption standard");
}

#[test]
fn final_chunk_alone_is_enough() {
    let (sk, pk) = keypair();

    let ctx = EncryptContext::new(&pk);
    let der = ctx.finish(&mut OsRng, b"one shot").unwrap();
    assert_eq!(sk.decrypt_der(&der).unwrap(), b"one shot");
}

#[test]
fn empty_total_is_an_error() {
    let (sk, pk) = keypair();

    let ctx = EncryptContext::new(&pk);
    assert!(ctx.finish(&mut OsRng, b"").is_err());

    let ctx = DecryptContext::new(&sk);
    assert!(ctx.finish(b"").is_err());
}

#[test]
fn accumulator_overflow_is_an_error() {
    let (sk, pk) = keypair();

    let mut ctx = EncryptContext::new(&pk);
    ctx.update(&[0x42; MAX_PLAINTEXT_SIZE]).unwrap();
    assert!(ctx.update(&[0x42]).is_err());
    assert!(ctx.finish(&mut OsRng, &[0x42]).is_err());

    // a failed update leaves the accumulated bytes intact
    let mut ctx = EncryptContext::new(&pk);
    ctx.update(&[0x42; MAX_PLAINTEXT_SIZE]).unwrap();
    assert!(ctx.update(&[0x42]).is_err());
    let der = ctx.finish(&mut OsRng, b"").unwrap();
    assert_eq!(sk.decrypt_der(&der).unwrap(), vec![0x42; MAX_PLAINTEXT_SIZE]);
}

#[test]
fn output_length_bounds() {
    assert_eq!(EncryptContext::max_output_len(), MAX_CIPHERTEXT_SIZE);
    assert_eq!(DecryptContext::max_output_len(), MAX_PLAINTEXT_SIZE);

    let (_, pk) = keypair();
    let mut ctx = EncryptContext::new(&pk);
    ctx.update(&[0x42; MAX_PLAINTEXT_SIZE]).unwrap();
    let der = ctx.finish(&mut OsRng, b"").unwrap();
    assert!(der.len() <= EncryptContext::max_output_len());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_chunking_decrypts_to_the_message(
        msg in proptest::collection::vec(any::<u8>(), 3..100),
        first in any::<prop::sample::Index>(),
        second in any::<prop::sample::Index>(),
    ) {
        let (sk, pk) = keypair();

        let mut cuts = [1 + first.index(msg.len() - 2), 1 + second.index(msg.len() - 2)];
        cuts.sort_unstable();
        let (a, b) = (cuts[0], cuts[1]);

        let mut ctx = EncryptContext::new(&pk);
        ctx.update(&msg[..a]).unwrap();
        ctx.update(&msg[a..b]).unwrap();
        let der = ctx.finish(&mut OsRng, &msg[b..]).unwrap();

        // chunked input, one-shot decrypt
        prop_assert_eq!(sk.decrypt_der(&der).unwrap(), msg);
    }
}
