//! Byte normalizer
//!
//! Locates the `%PDF` header inside a possibly prefixed or corrupted buffer
//! and returns the buffer starting at that header. Servers and mail gateways
//! sometimes prepend junk (a BOM, HTTP fragments, MIME leftovers) to a
//! document; everything before the header is dropped.

use std::fmt;

use tracing::debug;

use crate::error::{PageCraftError, Result};

/// UTF-8 byte-order marker
pub const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// The header signature every normalized buffer starts with
pub const SIGNATURE: &[u8; 4] = b"%PDF";

/// Inputs shorter than this are rejected as empty
pub const MIN_INPUT_LEN: usize = 5;

/// Highest offset at which the header scan still accepts a signature
pub const SCAN_LIMIT: usize = 65536;

/// Number of leading bytes captured for diagnostics
pub const PREVIEW_LEN: usize = 64;

/// A normalized document buffer, guaranteed to start with `%PDF`.
///
/// Deliberately not `Clone`: handing the same bytes to two consumers
/// requires an explicit [`PdfBytes::fork`].
#[derive(Debug, PartialEq, Eq)]
pub struct PdfBytes {
    bytes: Vec<u8>,
    header_offset: usize,
}

impl PdfBytes {
    /// Offset of the header in the original input
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Make an independent, non-aliased copy for a second consumer.
    pub fn fork(&self) -> PdfBytes {
        PdfBytes {
            bytes: self.bytes.clone(),
            header_offset: self.header_offset,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for PdfBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// First bytes of a rejected input, for operator-facing logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticPreview {
    /// Space separated hex pairs
    pub hex: String,
    /// One character per byte, non-printable bytes rendered as `.`
    pub ascii: String,
    len: usize,
}

impl DiagnosticPreview {
    pub fn capture(bytes: &[u8]) -> Self {
        let head = &bytes[..bytes.len().min(PREVIEW_LEN)];
        let hex = head
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii = head
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        Self {
            hex,
            ascii,
            len: head.len(),
        }
    }

    /// Number of input bytes captured
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for DiagnosticPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] \"{}\"", self.hex, self.ascii)
    }
}

/// Normalize raw input bytes into a buffer starting at the `%PDF` header.
///
/// Fails with `EmptyInput` under [`MIN_INPUT_LEN`] bytes and with
/// `HeaderNotFound` when no signature starts at or before [`SCAN_LIMIT`].
pub fn normalize(bytes: &[u8]) -> Result<PdfBytes> {
    if bytes.len() < MIN_INPUT_LEN {
        return Err(PageCraftError::EmptyInput { len: bytes.len() });
    }

    let start = if bytes.starts_with(&BOM) { BOM.len() } else { 0 };
    if bytes[start..].starts_with(SIGNATURE) {
        return Ok(slice_from(bytes, start));
    }

    match find_signature(bytes) {
        Some(offset) => {
            debug!(offset, "PDF header found after leading junk");
            Ok(slice_from(bytes, offset))
        }
        None => {
            let preview = DiagnosticPreview::capture(bytes);
            debug!(%preview, "no PDF header within scan limit");
            Err(PageCraftError::HeaderNotFound { preview })
        }
    }
}

/// First offset `<= SCAN_LIMIT` where the full signature starts.
fn find_signature(bytes: &[u8]) -> Option<usize> {
    let last_start = bytes.len().checked_sub(SIGNATURE.len())?.min(SCAN_LIMIT);
    (0..=last_start).find(|&i| &bytes[i..i + SIGNATURE.len()] == SIGNATURE)
}

fn slice_from(bytes: &[u8], offset: usize) -> PdfBytes {
    PdfBytes {
        bytes: bytes[offset..].to_vec(),
        header_offset: offset,
    }
}
