//! `std::io` adapters for the stream cipher.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use tracing::debug;

use super::{StreamCipherAuthenticator, StreamTag};
use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::{IV_SIZE, SymmetricKey};

/// Reads until `buf` is full or the reader is exhausted.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl StreamCipherAuthenticator {
    fn chunk_buffer(&self) -> CryptoResult<Vec<u8>> {
        match self.config().stream_chunk_size {
            0 => Err(CryptoError::Config("stream_chunk_size must be non-zero".to_string())),
            size => Ok(vec![0u8; size]),
        }
    }

    /// Encrypts everything `reader` yields into `writer` in one pass.
    ///
    /// Returns the stream tag once the reader is exhausted.
    pub fn encrypt_stream<R: Read, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
    ) -> CryptoResult<StreamTag> {
        let mut buf = self.chunk_buffer()?;
        let mut encryptor = self.encryptor(key, iv, associated_data);
        loop {
            let n = read_chunk(reader, &mut buf)?;
            if n == 0 {
                break;
            }
            encryptor.update_in_place(&mut buf[..n]);
            writer.write_all(&buf[..n])?;
        }
        writer.flush()?;
        Ok(encryptor.finalize())
    }

    /// Verifies then decrypts everything `reader` yields from its current
    /// position.
    ///
    /// The reader is consumed twice: once to authenticate, then rewound to
    /// where it started and read again to decrypt. The second pass reads
    /// exactly as many bytes as the first one authenticated, so bytes
    /// appended in between are ignored. The source must otherwise stay
    /// unchanged; a shrunk source fails with [`CryptoError::Integrity`] after
    /// a prefix was written. Nothing is written to `writer` unless the tag
    /// matches. Returns the number of plaintext bytes written.
    pub fn decrypt_stream<R: Read + Seek, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
        expected: &StreamTag,
    ) -> CryptoResult<u64> {
        let mut buf = self.chunk_buffer()?;
        let start = reader.stream_position()?;

        let mut decryptor = self.decryptor(key, iv, associated_data);
        loop {
            let n = read_chunk(reader, &mut buf)?;
            if n == 0 {
                break;
            }
            decryptor.authenticate(&buf[..n]);
        }
        let mut verified = decryptor.verify(expected)?;

        reader.seek(SeekFrom::Start(start))?;
        let mut authenticated = reader.by_ref().take(verified.authenticated_len());
        let mut written = 0u64;
        loop {
            let n = read_chunk(&mut authenticated, &mut buf)?;
            if n == 0 {
                break;
            }
            verified.decrypt_in_place(&mut buf[..n])?;
            writer.write_all(&buf[..n])?;
            written += n as u64;
        }
        verified.finish()?;
        writer.flush()?;

        debug!("decrypted {written} bytes from seekable stream");
        Ok(written)
    }
}
