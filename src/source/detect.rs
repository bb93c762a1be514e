//! PDF header detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Number of leading bytes inspected for the header.
const HEADER_LEN: u64 = 16;

/// Version declared in a PDF header (`%PDF-1.7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Check that `data` starts with a PDF header and return its version.
///
/// Only major versions 1 and 2 are accepted.
pub fn detect_bytes(data: &[u8]) -> Result<PdfVersion> {
    let rest = data.strip_prefix(PDF_MAGIC).ok_or(Error::UnknownFormat)?;

    let version = match rest {
        [major, b'.', minor, ..] if major.is_ascii_digit() && minor.is_ascii_digit() => PdfVersion {
            major: major - b'0',
            minor: minor - b'0',
        },
        _ => return Err(Error::UnknownFormat),
    };

    if !(1..=2).contains(&version.major) {
        return Err(Error::UnsupportedVersion(version.to_string()));
    }
    Ok(version)
}

/// Read the first bytes of a file and check its PDF header.
pub fn detect_path<P: AsRef<Path>>(path: P) -> Result<PdfVersion> {
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
    detect_bytes(&header)
}

/// Whether the file at `path` has a supported PDF header.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_path(path).is_ok()
}
