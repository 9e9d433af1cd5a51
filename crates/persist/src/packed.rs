use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stagehand_scene::{LEVEL_FORMAT_VERSION, Level, LevelDocument};

use crate::error::LevelFileError;
use crate::files::check_format;

/// File extension of packed levels.
pub const PACK_EXTENSION: &str = "pack";

const MAGIC: &[u8; 4] = b"SHLV";
const DIGEST_LEN: usize = 64;
const HEADER_LEN: usize = MAGIC.len() + 4 + DIGEST_LEN;

/// Write `level` as a packed archive. Returns the payload digest.
pub fn write_packed(level: &Level, path: impl AsRef<Path>) -> Result<String, LevelFileError> {
    if level.is_runtime_clone() {
        return Err(LevelFileError::RuntimeClone(level.name().to_string()));
    }
    let doc = level.to_document()?;
    let compressed = zstd_compress(&cbor_serialize(&doc)?)?;
    let digest = sha256_hex(&compressed);

    let mut bytes = Vec::with_capacity(HEADER_LEN + compressed.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&LEVEL_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(digest.as_bytes());
    bytes.extend_from_slice(&compressed);
    std::fs::write(path.as_ref(), &bytes)?;

    tracing::info!(
        level = level.name(),
        path = %path.as_ref().display(),
        bytes = bytes.len(),
        "level packed"
    );
    Ok(digest)
}

/// Read a packed archive, verifying its digest before decoding.
pub fn read_packed(path: impl AsRef<Path>) -> Result<Level, LevelFileError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(LevelFileError::BadMagic);
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..MAGIC.len() + 4]);
    let file_version = u32::from_le_bytes(version);
    if file_version > LEVEL_FORMAT_VERSION {
        return Err(LevelFileError::FormatMismatch {
            file_version,
            expected_version: LEVEL_FORMAT_VERSION,
        });
    }

    let expected = String::from_utf8_lossy(&bytes[MAGIC.len() + 4..HEADER_LEN]).into_owned();
    let payload = &bytes[HEADER_LEN..];
    let actual = sha256_hex(payload);
    if actual != expected {
        return Err(LevelFileError::IntegrityMismatch { expected, actual });
    }

    let doc: LevelDocument = cbor_deserialize(&zstd_decompress(payload)?)?;
    check_format(&doc)?;
    Ok(Level::from_document(&doc, Some(path.to_path_buf()))?)
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, LevelFileError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| LevelFileError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, LevelFileError> {
    ciborium::from_reader(data).map_err(|e| LevelFileError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, LevelFileError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, LevelFileError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
