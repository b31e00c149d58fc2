//! Integration Tests
//!
//! Exercises the public engine API: key lifecycle, block and stream
//! round-trips for every block size, size arithmetic, and the error paths.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use mumblepad::{BlockSize, EngineConfig, MumEngine, MumError, PaddingMode, KEY_SIZE};
use rand::Rng;

fn random_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill(&mut key[..]);
    key
}

fn engine(block_size: BlockSize) -> MumEngine {
    let mut engine = MumEngine::new(EngineConfig::new(block_size));
    engine.init_key(&random_key()).unwrap();
    engine
}

// =============================================================================
// LIFECYCLE
// =============================================================================

#[test]
fn operations_require_key_initialization() {
    let mut engine = MumEngine::new(EngineConfig::new(BlockSize::B128));

    assert_eq!(
        engine.encrypt(b"data", 0),
        Err(MumError::KeyNotInitialized)
    );
    assert_eq!(
        engine.decrypt(&[0u8; 128]),
        Err(MumError::KeyNotInitialized)
    );
    assert_eq!(
        engine.encrypt_block(b"data", 0),
        Err(MumError::KeyNotInitialized)
    );
    assert_eq!(
        engine.decrypt_block(&[0u8; 128]),
        Err(MumError::KeyNotInitialized)
    );
    assert_eq!(engine.subkey(0).err(), Some(MumError::KeyNotInitialized));
}

#[test]
fn subkey_access() {
    let engine = engine(BlockSize::B128);
    assert_eq!(engine.subkey(0).unwrap().len(), KEY_SIZE);
    assert_eq!(engine.subkey(559).unwrap().len(), KEY_SIZE);
    assert_eq!(engine.subkey(560).err(), Some(MumError::SubkeyIndexOutOfRange));
}

#[test]
fn rekey_changes_ciphertext() {
    let mut engine = MumEngine::new(EngineConfig::new(BlockSize::B256));
    let plaintext = vec![7u8; 240];

    engine.init_key(&[0x01; KEY_SIZE]).unwrap();
    let first = engine.encrypt(&plaintext, 0).unwrap();

    engine.init_key(&[0x02; KEY_SIZE]).unwrap();
    let second = engine.encrypt(&plaintext, 0).unwrap();

    assert_ne!(first, second, "a new key must produce new ciphertext");
    assert_eq!(engine.decrypt(&second).unwrap(), plaintext);
}

#[test]
fn load_key_from_buffer_requires_full_key() {
    let mut engine = MumEngine::new(EngineConfig::new(BlockSize::B128));
    assert_eq!(
        engine.load_key_from_buffer(&[0u8; KEY_SIZE - 1]),
        Err(MumError::LengthTooSmall)
    );
    assert_eq!(engine.load_key_from_buffer(&[0u8; KEY_SIZE]), Ok(()));
}

#[test]
fn load_key_from_file() {
    let path = std::env::temp_dir().join("mumblepad-test-key.bin");
    let key = random_key();
    std::fs::write(&path, key).unwrap();

    let mut from_file = MumEngine::new(EngineConfig::new(BlockSize::B256));
    from_file.load_key(&path).unwrap();
    let mut from_bytes = MumEngine::new(EngineConfig::new(BlockSize::B256));
    from_bytes.init_key(&key).unwrap();

    let plaintext = b"same key, same bytes";
    assert_eq!(
        from_file.encrypt(plaintext, 3).unwrap(),
        from_bytes.encrypt(plaintext, 3).unwrap()
    );
    std::fs::remove_file(&path).unwrap();

    let mut missing = MumEngine::new(EngineConfig::new(BlockSize::B256));
    assert_eq!(
        missing.load_key(&path),
        Err(MumError::KeyFileRead),
        "missing key file must be reported"
    );
}

// =============================================================================
// BLOCK ROUND-TRIPS
// =============================================================================

#[test]
fn block_round_trip_every_size() {
    for block_size in BlockSize::ALL {
        let mut engine = engine(block_size);
        let capacity = block_size.payload_size();

        for len in [0usize, 1, capacity / 2, capacity] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let block = engine.encrypt_block(&plaintext, 0x0bad).unwrap();
            assert_eq!(block.len(), block_size.bytes());

            let (payload, seqnum) = engine.decrypt_block(&block).unwrap();
            assert_eq!(payload, plaintext, "{block_size:?} len {len}");
            assert_eq!(seqnum, 0x0bad);
        }
    }
}

#[test]
fn empty_block_with_zero_key() {
    let mut engine = MumEngine::new(EngineConfig::new(BlockSize::B128));
    engine.init_key(&[0u8; KEY_SIZE]).unwrap();

    let block = engine.encrypt_block(b"", 0).unwrap();
    assert_eq!(block.len(), 128);

    let (payload, seqnum) = engine.decrypt_block(&block).unwrap();
    assert!(payload.is_empty());
    assert_eq!(seqnum, 0);
}

#[test]
fn oversized_block_rejected() {
    let mut engine = engine(BlockSize::B128);
    let too_big = vec![0u8; 113];
    assert_eq!(
        engine.encrypt_block(&too_big, 0),
        Err(MumError::InvalidEncryptSize)
    );
}

#[test]
fn wrong_sized_block_rejected_on_decrypt() {
    let mut engine = engine(BlockSize::B256);
    assert_eq!(
        engine.decrypt_block(&[0u8; 128]),
        Err(MumError::InvalidDecryptSize)
    );
}

// =============================================================================
// STREAM ROUND-TRIPS
// =============================================================================

#[test]
fn stream_round_trip_odd_length() {
    // 28657 bytes over 240-byte payloads: 120 blocks, last one short.
    let mut engine = engine(BlockSize::B256);
    let mut plaintext = vec![0u8; 28657];
    rand::thread_rng().fill(&mut plaintext[..]);

    let ciphertext = engine.encrypt(&plaintext, 0).unwrap();
    assert_eq!(ciphertext.len(), 28657usize.div_ceil(240) * 256);
    assert_eq!(ciphertext.len(), engine.encrypted_size(plaintext.len()));

    assert_eq!(engine.decrypt(&ciphertext).unwrap(), plaintext);
}

#[test]
fn stream_round_trip_every_size() {
    for block_size in BlockSize::ALL {
        let mut engine = engine(block_size);
        let payload = block_size.payload_size();

        for len in [1usize, payload, payload + 1, payload * 3 + payload / 2] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 13 % 256) as u8).collect();
            let ciphertext = engine.encrypt(&plaintext, 100).unwrap();
            assert_eq!(ciphertext.len(), engine.encrypted_size(len));
            assert_eq!(
                engine.decrypt(&ciphertext).unwrap(),
                plaintext,
                "{block_size:?} stream len {len}"
            );
        }
    }
}

#[test]
fn empty_stream_is_empty() {
    let mut engine = engine(BlockSize::B128);
    let ciphertext = engine.encrypt(b"", 0).unwrap();
    assert!(ciphertext.is_empty());
    assert!(engine.decrypt(b"").unwrap().is_empty());
}

#[test]
fn padding_off_round_trip() {
    let mut config = EngineConfig::new(BlockSize::B1024);
    config.padding = PaddingMode::Off;
    let mut engine = MumEngine::new(config);
    engine.init_key(&random_key()).unwrap();

    assert_eq!(engine.plaintext_block_size(), 1024);

    let plaintext: Vec<u8> = (0..8192u32).map(|i| (i % 256) as u8).collect();
    let ciphertext = engine.encrypt(&plaintext, 0).unwrap();
    assert_eq!(ciphertext.len(), 8192, "raw mode keeps the byte count");
    assert_ne!(ciphertext, plaintext);

    assert_eq!(engine.decrypt(&ciphertext).unwrap(), plaintext);
}

#[test]
fn decrypt_requires_whole_blocks() {
    let mut engine = engine(BlockSize::B512);
    assert_eq!(
        engine.decrypt(&[0u8; 511]),
        Err(MumError::InvalidDecryptSize)
    );
    assert_eq!(
        engine.decrypt(&[0u8; 513]),
        Err(MumError::InvalidDecryptSize)
    );
}

#[test]
fn sequence_numbers_increment_and_wrap() {
    let mut engine = engine(BlockSize::B128);
    let plaintext = vec![0xaau8; 112 * 3];

    let ciphertext = engine.encrypt(&plaintext, 0xfffe).unwrap();
    let expected = [0xfffeu16, 0xffff, 0x0000];
    for (i, block) in ciphertext.chunks_exact(128).enumerate() {
        let (_, seqnum) = engine.decrypt_block(block).unwrap();
        assert_eq!(seqnum, expected[i], "block {i}");
    }
}

// =============================================================================
// SIZES
// =============================================================================

#[test]
fn size_queries_match_configuration() {
    let engine = engine(BlockSize::B4096);
    assert_eq!(engine.plaintext_block_size(), 4000);
    assert_eq!(engine.encrypted_block_size(), 4096);
    assert_eq!(engine.encrypted_size(0), 0);
    assert_eq!(engine.encrypted_size(1), 4096);
    assert_eq!(engine.encrypted_size(4000), 4096);
    assert_eq!(engine.encrypted_size(4001), 8192);
}
