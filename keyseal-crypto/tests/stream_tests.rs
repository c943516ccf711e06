//! Streaming authenticated encryption: chunking independence, tamper
//! detection and the io/async adapters.

use std::io::Cursor;

use keyseal_crypto::stream::{StreamDecryptor, StreamEncryptor, TAG_SIZE};
use keyseal_crypto::symmetric::{CounterMode, IV_SIZE};
use keyseal_crypto::{
    CryptoConfig, CryptoError, MnemonicCodec, OsRandom, StreamCipherAuthenticator, StreamTag,
    SymmetricKey, TagMode, derive_key_with_config, generate_iv, keyed_hash,
};
use pretty_assertions::assert_eq;

fn fresh_key_iv() -> (SymmetricKey, [u8; IV_SIZE]) {
    (
        SymmetricKey::generate(&OsRandom).unwrap(),
        generate_iv(&OsRandom).unwrap(),
    )
}

fn derived() -> StreamCipherAuthenticator {
    StreamCipherAuthenticator::new(CryptoConfig::default().with_tag_mode(TagMode::DerivedKey))
}

// ── Round trips ──

#[test]
fn chunked_roundtrip_preserves_boundaries() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();
    let chunks: [&[u8]; 4] = [b"first ", b"", b"second chunk", b"!"];

    let (ciphertext, tag) = cipher.encrypt(chunks.iter(), &key, &iv, b"header");
    assert_eq!(
        ciphertext.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![6, 0, 12, 1]
    );

    let plaintext = cipher.decrypt(&ciphertext, &key, &iv, b"header", &tag).unwrap();
    assert_eq!(plaintext, chunks);
}

#[test]
fn empty_stream_has_a_tag() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();

    let (ciphertext, tag) = cipher.encrypt(Vec::<Vec<u8>>::new(), &key, &iv, b"ad");
    assert!(ciphertext.is_empty());
    assert_eq!(tag.as_bytes(), &keyed_hash(b"ad", &iv));

    let plaintext = cipher
        .decrypt(&Vec::<Vec<u8>>::new(), &key, &iv, b"ad", &tag)
        .unwrap();
    assert!(plaintext.is_empty());
}

#[test]
fn all_key_sizes_roundtrip() {
    let cipher = StreamCipherAuthenticator::default();
    for len in [16, 24, 32] {
        let key = SymmetricKey::from_bytes(&vec![0x5C; len]).unwrap();
        let iv = [0x01; IV_SIZE];
        let (ciphertext, tag) = cipher.encrypt([b"payload".as_slice()], &key, &iv, b"");
        let plaintext = cipher.decrypt(&ciphertext, &key, &iv, b"", &tag).unwrap();
        assert_eq!(plaintext, vec![b"payload".to_vec()]);
    }
}

// ── Tag construction ──

#[test]
fn associated_data_keyed_tag_is_hmac_of_iv_and_ciphertext() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();

    let (ciphertext, tag) = cipher.encrypt([b"abc".as_slice(), b"defg"], &key, &iv, b"aad");
    let mut mac_input = iv.to_vec();
    mac_input.extend(ciphertext.concat());
    assert_eq!(tag.as_bytes(), &keyed_hash(b"aad", &mac_input));
}

#[test]
fn derived_key_tag_differs_from_ad_keyed_tag() {
    let (key, iv) = fresh_key_iv();
    let (ciphertext, tag) = derived().encrypt([b"abc".as_slice()], &key, &iv, b"aad");

    let mut mac_input = iv.to_vec();
    mac_input.extend(ciphertext.concat());
    assert_ne!(tag.as_bytes(), &keyed_hash(b"aad", &mac_input));
}

#[test]
fn derived_key_mode_rejects_wrong_stream_key() {
    let cipher = derived();
    let (key, iv) = fresh_key_iv();
    let (other, _) = fresh_key_iv();

    let (ciphertext, tag) = cipher.encrypt([b"secret".as_slice()], &key, &iv, b"ad");
    let err = cipher.decrypt(&ciphertext, &other, &iv, b"ad", &tag).unwrap_err();
    assert!(matches!(err, CryptoError::Integrity));
}

#[test]
fn both_modes_reject_wrong_associated_data() {
    for cipher in [StreamCipherAuthenticator::default(), derived()] {
        let (key, iv) = fresh_key_iv();
        let (ciphertext, tag) = cipher.encrypt([b"secret".as_slice()], &key, &iv, b"ad-1");
        let err = cipher.decrypt(&ciphertext, &key, &iv, b"ad-2", &tag).unwrap_err();
        assert!(matches!(err, CryptoError::Integrity));
    }
}

#[test]
fn wrong_iv_is_rejected() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();
    let mut other_iv = iv;
    other_iv[15] ^= 1;

    let (ciphertext, tag) = cipher.encrypt([b"secret".as_slice()], &key, &iv, b"ad");
    assert!(cipher.decrypt(&ciphertext, &key, &other_iv, b"ad", &tag).is_err());
}

// ── Tampering ──

#[test]
fn flipped_ciphertext_byte_releases_nothing() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();
    let (mut ciphertext, tag) = cipher.encrypt([b"one".as_slice(), b"two"], &key, &iv, b"ad");
    ciphertext[1][2] ^= 0x04;

    let result = cipher.decrypt(&ciphertext, &key, &iv, b"ad", &tag);
    assert!(matches!(result, Err(CryptoError::Integrity)));
}

#[test]
fn flipped_tag_byte_is_rejected() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();
    let (ciphertext, tag) = cipher.encrypt([b"data".as_slice()], &key, &iv, b"ad");

    for i in [0, TAG_SIZE / 2, TAG_SIZE - 1] {
        let mut bytes = *tag.as_bytes();
        bytes[i] ^= 0x01;
        let forged = StreamTag::from_bytes(&bytes).unwrap();
        assert!(matches!(
            cipher.decrypt(&ciphertext, &key, &iv, b"ad", &forged),
            Err(CryptoError::Integrity)
        ));
    }
}

#[test]
fn truncated_and_extended_streams_are_rejected() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();
    let (ciphertext, tag) = cipher.encrypt([b"abcdef".as_slice()], &key, &iv, b"");

    let truncated = vec![ciphertext[0][..5].to_vec()];
    assert!(cipher.decrypt(&truncated, &key, &iv, b"", &tag).is_err());

    let mut extended = ciphertext.clone();
    extended.push(vec![0]);
    assert!(cipher.decrypt(&extended, &key, &iv, b"", &tag).is_err());
}

#[test]
fn reordered_chunks_are_rejected() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();
    let (mut ciphertext, tag) = cipher.encrypt([b"aaaa".as_slice(), b"bbbb"], &key, &iv, b"");
    ciphertext.swap(0, 1);
    assert!(cipher.decrypt(&ciphertext, &key, &iv, b"", &tag).is_err());
}

// ── Session API ──

#[test]
fn session_types_match_batch_api() {
    let (key, iv) = fresh_key_iv();
    let mut encryptor = StreamEncryptor::new(&key, &iv, b"ad", TagMode::AssociatedDataKey);
    let mut a = b"hello ".to_vec();
    encryptor.update_in_place(&mut a);
    let b = encryptor.update(b"world");
    assert_eq!(encryptor.bytes_processed(), 11);
    let tag = encryptor.finalize();

    let (batch, batch_tag) =
        StreamCipherAuthenticator::default().encrypt([b"hello world".as_slice()], &key, &iv, b"ad");
    assert_eq!([a.clone(), b.clone()].concat(), batch[0]);
    assert_eq!(tag, batch_tag);

    let mut decryptor = StreamDecryptor::new(&key, &iv, b"ad", TagMode::AssociatedDataKey);
    decryptor.authenticate(&batch[0]);
    let mut verified = decryptor.verify(&tag).unwrap();
    assert_eq!(verified.decrypt(&a).unwrap(), b"hello ");
    assert_eq!(verified.decrypt(&b).unwrap(), b"world");
    verified.finish().unwrap();
}

#[test]
fn ciphertext_matches_raw_counter_mode() {
    let (key, iv) = fresh_key_iv();
    let (ciphertext, _) =
        StreamCipherAuthenticator::default().encrypt([b"plain".as_slice()], &key, &iv, b"");

    let mut expected = b"plain".to_vec();
    CounterMode::new(&key, &iv).apply(&mut expected);
    assert_eq!(ciphertext[0], expected);
}

#[test]
fn mnemonic_derived_key_drives_stream() {
    let config = CryptoConfig::default();
    let codec = MnemonicCodec::english();
    let phrase = codec.generate(16, &OsRandom).unwrap();
    let iv = generate_iv(&OsRandom).unwrap();

    let key = derive_key_with_config(&config, phrase.data(), b"backup")
        .unwrap()
        .to_symmetric_key();
    let cipher = StreamCipherAuthenticator::new(config.clone());
    let (ciphertext, tag) = cipher.encrypt([b"archive".as_slice()], &key, &iv, b"");

    // Re-derive from the spoken words alone.
    let restored = codec.to_entropy(phrase.words()).unwrap();
    let key = derive_key_with_config(&config, restored.data(), b"backup")
        .unwrap()
        .to_symmetric_key();
    let plaintext = cipher.decrypt(&ciphertext, &key, &iv, b"", &tag).unwrap();
    assert_eq!(plaintext.concat(), b"archive");
}

// ── io adapters ──

#[test]
fn io_adapters_roundtrip() {
    let cipher = StreamCipherAuthenticator::new(CryptoConfig {
        stream_chunk_size: 1000,
        ..CryptoConfig::default()
    });
    let (key, iv) = fresh_key_iv();
    let plaintext: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();

    let mut ciphertext = Vec::new();
    let tag = cipher
        .encrypt_stream(&mut plaintext.as_slice(), &mut ciphertext, &key, &iv, b"file")
        .unwrap();
    assert_eq!(ciphertext.len(), plaintext.len());

    // Chunking on the way in must not matter on the way out.
    let (batch, batch_tag) = cipher.encrypt(plaintext.chunks(333), &key, &iv, b"file");
    assert_eq!(batch.concat(), ciphertext);
    assert_eq!(batch_tag, tag);

    let mut recovered = Vec::new();
    let written = cipher
        .decrypt_stream(&mut Cursor::new(&ciphertext), &mut recovered, &key, &iv, b"file", &tag)
        .unwrap();
    assert_eq!(written, plaintext.len() as u64);
    assert_eq!(recovered, plaintext);
}

#[test]
fn io_decrypt_writes_nothing_on_mismatch() {
    let cipher = StreamCipherAuthenticator::default();
    let (key, iv) = fresh_key_iv();

    let mut ciphertext = Vec::new();
    let tag = cipher
        .encrypt_stream(&mut vec![7u8; 4096].as_slice(), &mut ciphertext, &key, &iv, b"")
        .unwrap();
    ciphertext[4000] ^= 0xFF;

    let mut out = Vec::new();
    let err = cipher
        .decrypt_stream(&mut Cursor::new(&ciphertext), &mut out, &key, &iv, b"", &tag)
        .unwrap_err();
    assert!(matches!(err, CryptoError::Integrity));
    assert!(out.is_empty());
}

// ── async pipeline ──

#[cfg(feature = "async")]
mod pipelined {
    use super::*;
    use keyseal_crypto::stream::pipeline::encrypt_pipelined;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn pipelined_matches_sequential() {
        let (key, iv) = fresh_key_iv();
        let chunks: Vec<Vec<u8>> = (0..50u8).map(|i| vec![i; usize::from(i) * 7]).collect();

        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let feed = chunks.clone();
        tokio::spawn(async move {
            for chunk in feed {
                in_tx.send(chunk).await.unwrap();
            }
        });
        let collector = tokio::spawn(async move {
            let mut out = Vec::new();
            while let Some(chunk) = out_rx.recv().await {
                out.push(chunk);
            }
            out
        });

        let tag = encrypt_pipelined(in_rx, out_tx, &key, &iv, b"ad", TagMode::DerivedKey)
            .await
            .unwrap();
        let ciphertext = collector.await.unwrap();

        let (expected, expected_tag) = derived().encrypt(&chunks, &key, &iv, b"ad");
        assert_eq!(ciphertext, expected);
        assert_eq!(tag, expected_tag);
    }

    #[tokio::test]
    async fn closed_output_is_an_encryption_error() {
        let (key, iv) = fresh_key_iv();
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, out_rx) = mpsc::channel::<Vec<u8>>(1);
        drop(out_rx);
        in_tx.send(b"chunk".to_vec()).await.unwrap();
        drop(in_tx);

        let err = encrypt_pipelined(in_rx, out_tx, &key, &iv, b"", TagMode::AssociatedDataKey)
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::Encryption(_)));
    }
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn split(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
        let mut points: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();
        points.windows(2).map(|w| data[w[0]..w[1]].to_vec()).collect()
    }

    proptest! {
        #[test]
        fn chunking_never_changes_ciphertext_or_tag(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            cuts_a in proptest::collection::vec(any::<usize>(), 0..8),
            cuts_b in proptest::collection::vec(any::<usize>(), 0..8),
            ad in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let cipher = StreamCipherAuthenticator::default();
            let key = SymmetricKey::from_bytes(&[9u8; 32]).unwrap();
            let iv = [3u8; IV_SIZE];

            let (ct_a, tag_a) = cipher.encrypt(split(&data, &cuts_a), &key, &iv, &ad);
            let (ct_b, tag_b) = cipher.encrypt(split(&data, &cuts_b), &key, &iv, &ad);
            prop_assert_eq!(ct_a.concat(), ct_b.concat());
            prop_assert_eq!(tag_a, tag_b);

            // Decrypt with a third chunking of the ciphertext.
            let rechunked = split(&ct_a.concat(), &cuts_b);
            let plaintext = cipher.decrypt(&rechunked, &key, &iv, &ad, &tag_a).unwrap();
            prop_assert_eq!(plaintext.concat(), data);
        }

        #[test]
        fn any_bit_flip_is_detected(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            position in any::<usize>(),
            bit in 0u8..8,
        ) {
            let cipher = derived();
            let key = SymmetricKey::from_bytes(&[1u8; 16]).unwrap();
            let iv = [2u8; IV_SIZE];

            let (ciphertext, tag) = cipher.encrypt([data.as_slice()], &key, &iv, b"ad");
            let mut tampered = ciphertext[0].clone();
            let position = position % tampered.len();
            tampered[position] ^= 1 << bit;

            prop_assert!(matches!(
                cipher.decrypt(&[tampered], &key, &iv, b"ad", &tag),
                Err(CryptoError::Integrity)
            ));
        }
    }
}
