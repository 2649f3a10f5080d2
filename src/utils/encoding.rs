//! Blob decoding with encoding detection.
//!
//! Remote blobs arrive as raw bytes. This module turns them into text:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Binary detection, so images and archives are never fed to a prompt

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use thiserror::Error;

const DEFAULT_SAMPLE_SIZE: usize = 8192;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("binary content")]
    Binary,
}

/// Detect the encoding of a byte buffer.
///
/// Strategy:
/// 1. Check for BOM markers first (most reliable)
/// 2. Try strict UTF-8 decoding (fast path for most modern files)
/// 3. Fall back to chardetng for non-UTF-8 content
///
/// Returns the encoding together with the length of the BOM to skip.
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if bytes.starts_with(&[0xef, 0xbb, 0xbf]) {
        return (UTF_8, 3);
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return (UTF_16LE, 2);
    }
    if bytes.starts_with(&[0xfe, 0xff]) {
        return (UTF_16BE, 2);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0);
    }

    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    (detector.guess(None, true), 0)
}

/// Detect if a buffer is binary (not text).
///
/// Uses two heuristics on the leading sample:
/// 1. Null byte check (strong binary indicator)
/// 2. Ratio of printable bytes (< 70% = likely binary)
///
/// UTF-16 content carries NUL bytes, so a UTF-16 BOM short-circuits to text.
pub fn is_binary(bytes: &[u8]) -> bool {
    if bytes.starts_with(&[0xff, 0xfe]) || bytes.starts_with(&[0xfe, 0xff]) {
        return false;
    }
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    let printable = sample
        .iter()
        .filter(|&&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..0x7f).contains(&b) || b >= 0x80)
        .count();
    (printable as f64 / sample.len() as f64) < 0.70
}

/// Decode a blob into text.
///
/// Invalid sequences in the detected encoding are replaced rather than
/// rejected; only binary content is refused.
pub fn decode_text(bytes: &[u8]) -> Result<String, DecodeError> {
    if is_binary(bytes) {
        return Err(DecodeError::Binary);
    }
    let (encoding, bom) = detect_encoding(bytes);
    let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom..]);
    Ok(decoded.into_owned())
}
