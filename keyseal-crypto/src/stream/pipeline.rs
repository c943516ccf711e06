//! Pipelined stream encryption on tokio.
//!
//! The encrypting task runs the keystream and forwards each ciphertext chunk
//! to a dedicated hashing task over a bounded channel. The hashing task is the
//! only owner of the MAC state, so the tag never needs a lock.

use hmac::Mac;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{StreamTag, start_mac};
use crate::config::TagMode;
use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::{CounterMode, IV_SIZE, SymmetricKey};

/// Chunks buffered between the encrypting task and the hashing task.
const HASH_QUEUE_DEPTH: usize = 16;

/// Encrypts every chunk received on `input`, sends the ciphertext to
/// `output`, and returns the stream tag once `input` is closed.
///
/// Produces the same ciphertext and tag as
/// [`StreamEncryptor`](super::StreamEncryptor) over the same chunks. Fails
/// with `Encryption` if `output` is dropped before the input is drained.
pub async fn encrypt_pipelined(
    mut input: mpsc::Receiver<Vec<u8>>,
    output: mpsc::Sender<Vec<u8>>,
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
    associated_data: &[u8],
    mode: TagMode,
) -> CryptoResult<StreamTag> {
    let mut ctr = CounterMode::new(key, iv);
    let mut mac = start_mac(key, iv, associated_data, mode);

    let (hash_tx, mut hash_rx) = mpsc::channel::<Vec<u8>>(HASH_QUEUE_DEPTH);
    let hasher = tokio::spawn(async move {
        let mut bytes = 0u64;
        while let Some(chunk) = hash_rx.recv().await {
            mac.update(&chunk);
            bytes += chunk.len() as u64;
        }
        (StreamTag(mac.finalize().into_bytes().into()), bytes)
    });

    while let Some(mut chunk) = input.recv().await {
        ctr.apply(&mut chunk);
        if hash_tx.send(chunk.clone()).await.is_err() {
            return Err(CryptoError::Encryption("hashing task stopped".to_string()));
        }
        if output.send(chunk).await.is_err() {
            warn!("ciphertext receiver dropped mid-stream");
            return Err(CryptoError::Encryption(
                "ciphertext receiver closed".to_string(),
            ));
        }
    }
    drop(hash_tx);

    let (tag, bytes) = hasher
        .await
        .map_err(|e| CryptoError::Encryption(format!("hashing task failed: {e}")))?;
    debug!("pipelined encryption of {bytes} bytes complete");
    Ok(tag)
}
