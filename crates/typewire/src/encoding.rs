// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte framing: magic header, optional transport encoding, data section.
//!
//! ```text
//! plain:       "tywire" 0x01 | 0x00 | envelope
//! compressed:  "tywire" 0x01 | 0x01 <algo> | compress(0x00 | envelope)
//! ```
//!
//! - **Deflate** (`algo = 0x00`, always available via flate2)
//! - **LZ4** (`algo = 0x01`, feature `lz4`, size-prepended block)

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Fixed ASCII identifier.
pub const MAGIC: &[u8; 6] = b"tywire";
pub const VERSION: u8 = 0x01;
/// Magic plus version byte.
pub const HEADER_LEN: usize = 7;

const SECTION_DATA: u8 = 0x00;
const SECTION_ENCODING: u8 = 0x01;
const ALGO_DEFLATE: u8 = 0x00;
const ALGO_LZ4: u8 = 0x01;

/// Transport encoding of the envelope bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    None,
    Deflate,
    /// Requires the `lz4` feature.
    Lz4,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Lz4 => "lz4",
        }
    }

    /// Whether this build can produce and read the encoding.
    pub fn is_supported(self) -> bool {
        match self {
            Self::None | Self::Deflate => true,
            Self::Lz4 => cfg!(feature = "lz4"),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "identity" => Ok(Self::None),
            "deflate" => Ok(Self::Deflate),
            "lz4" => Ok(Self::Lz4),
            other => Err(format!("unknown encoding '{}'", other)),
        }
    }
}

/// Frame encoded envelope bytes.
pub fn frame(envelope: &[u8], encoding: Encoding) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + 2 + envelope.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    match encoding {
        Encoding::None => {
            out.push(SECTION_DATA);
            out.extend_from_slice(envelope);
        }
        Encoding::Deflate => {
            out.push(SECTION_ENCODING);
            out.push(ALGO_DEFLATE);
            out.extend_from_slice(&deflate(envelope)?);
        }
        Encoding::Lz4 => {
            out.push(SECTION_ENCODING);
            out.push(ALGO_LZ4);
            out.extend_from_slice(&lz4_compress(envelope)?);
        }
    }
    Ok(out)
}

/// Strip the header and any transport encoding; returns the envelope bytes.
pub fn unframe(bytes: &[u8]) -> Result<(Encoding, Vec<u8>)> {
    if bytes.len() < HEADER_LEN + 1 {
        return Err(Error::malformed(format!("{} bytes is too short for a header", bytes.len())));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::malformed("bad magic"));
    }
    if bytes[MAGIC.len()] != VERSION {
        return Err(Error::malformed(format!(
            "unsupported version 0x{:02x}",
            bytes[MAGIC.len()]
        )));
    }

    let body = &bytes[HEADER_LEN + 1..];
    match bytes[HEADER_LEN] {
        SECTION_DATA => Ok((Encoding::None, body.to_vec())),
        SECTION_ENCODING => {
            let (&algo, compressed) = body
                .split_first()
                .ok_or_else(|| Error::malformed("encoding section without algorithm"))?;
            let (encoding, inner) = match algo {
                ALGO_DEFLATE => (Encoding::Deflate, inflate(compressed)?),
                ALGO_LZ4 => (Encoding::Lz4, lz4_decompress(compressed)?),
                other => return Err(Error::malformed(format!("unknown encoding 0x{:02x}", other))),
            };
            match inner.split_first() {
                Some((&SECTION_DATA, envelope)) => Ok((encoding, envelope.to_vec())),
                _ => Err(Error::malformed("encoded stream does not start with a data section")),
            }
        }
        other => Err(Error::malformed(format!("unknown section 0x{:02x}", other))),
    }
}

fn deflate(envelope: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&[SECTION_DATA])
        .and_then(|_| encoder.write_all(envelope))
        .map_err(|e| Error::not_serializable("envelope", format!("deflate failed: {}", e)))?;
    let out = encoder
        .finish()
        .map_err(|e| Error::not_serializable("envelope", format!("deflate failed: {}", e)))?;
    log::debug!("[encoding] deflate {} -> {} bytes", envelope.len() + 1, out.len());
    Ok(out)
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    let mut decoder = DeflateDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::malformed(format!("inflate failed: {}", e)))?;
    Ok(out)
}

#[cfg(feature = "lz4")]
fn lz4_compress(envelope: &[u8]) -> Result<Vec<u8>> {
    let mut input = Vec::with_capacity(envelope.len() + 1);
    input.push(SECTION_DATA);
    input.extend_from_slice(envelope);
    Ok(lz4_flex::compress_prepend_size(&input))
}

#[cfg(not(feature = "lz4"))]
fn lz4_compress(_envelope: &[u8]) -> Result<Vec<u8>> {
    Err(Error::not_serializable("envelope", "lz4 support not compiled in"))
}

#[cfg(feature = "lz4")]
fn lz4_decompress(compressed: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(compressed)
        .map_err(|e| Error::malformed(format!("lz4 decompress failed: {}", e)))
}

#[cfg(not(feature = "lz4"))]
fn lz4_decompress(_compressed: &[u8]) -> Result<Vec<u8>> {
    Err(Error::malformed("lz4 support not compiled in"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_frame_layout() {
        let framed = frame(&[0x45], Encoding::None).expect("frame");
        assert_eq!(framed, b"tywire\x01\x00\x45".to_vec());
        assert_eq!(unframe(&framed).expect("unframe"), (Encoding::None, vec![0x45]));
    }

    #[test]
    fn test_deflate_frame_roundtrip() {
        let envelope = vec![0xa1, 0x03, b'a', b'b', b'c'].repeat(50);
        let framed = frame(&envelope, Encoding::Deflate).expect("frame");
        assert_eq!(&framed[..9], b"tywire\x01\x01\x00");
        assert!(framed.len() < envelope.len());
        let (encoding, body) = unframe(&framed).expect("unframe");
        assert_eq!(encoding, Encoding::Deflate);
        assert_eq!(body, envelope);
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(unframe(b"tyw"), Err(Error::MalformedEnvelope { .. })));
        assert!(matches!(unframe(b"nowire\x01\x00\x40"), Err(Error::MalformedEnvelope { .. })));
        assert!(matches!(unframe(b"tywire\x02\x00\x40"), Err(Error::MalformedEnvelope { .. })));
        assert!(matches!(unframe(b"tywire\x01\x07\x40"), Err(Error::MalformedEnvelope { .. })));
        assert!(matches!(unframe(b"tywire\x01\x01\x09"), Err(Error::MalformedEnvelope { .. })));
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("Deflate".parse::<Encoding>(), Ok(Encoding::Deflate));
        assert_eq!(" none ".parse::<Encoding>(), Ok(Encoding::None));
        assert!("zstd".parse::<Encoding>().is_err());
    }
}
