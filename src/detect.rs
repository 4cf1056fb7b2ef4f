//! PDF header sniffing, done before handing a file to the PDF loader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // "1.7"

/// Read the first bytes of `path` and return the declared PDF version.
///
/// Protocol archives routinely contain HTML error pages saved with a `.pdf`
/// extension; those are rejected here with [`Error::UnknownFormat`] instead of
/// surfacing as an obscure parser failure.
pub fn sniff_pdf_version<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut header = [0u8; 16];
    let mut file = File::open(path)?;
    let read = file.read(&mut header)?;
    pdf_version(&header[..read])
}

/// Extract the version from a PDF header (`%PDF-x.y`).
pub fn pdf_version(data: &[u8]) -> Result<String> {
    let Some(rest) = data.strip_prefix(PDF_MAGIC) else {
        return Err(Error::UnknownFormat);
    };
    if rest.len() < VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    let version = String::from_utf8_lossy(&rest[..VERSION_LEN]).to_string();
    let bytes = version.as_bytes();
    if !(bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()) {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(version)
}
