//! PEM armor extraction
//!
//! Both envelopes and trusted certificates arrive PEM-armored. Only the first
//! block is used; the label is not checked. Anything before the first
//! `-----BEGIN` line is skipped, including bytes that are not UTF-8.

use tracing::debug;
use x509_parser::pem::parse_x509_pem;

const BEGIN_MARKER: &[u8] = b"-----BEGIN";

/// Extract the DER bytes of the first PEM block in `data`
///
/// Returns `None` when no complete block (matching `BEGIN`/`END` lines with a
/// base64 body) is present.
pub fn first_block(data: &[u8]) -> Option<Vec<u8>> {
    let start = data
        .windows(BEGIN_MARKER.len())
        .position(|window| window == BEGIN_MARKER)?;

    match parse_x509_pem(&data[start..]) {
        Ok((_, pem)) => {
            debug!(label = %pem.label, len = pem.contents.len(), "Decoded PEM block");
            Some(pem.contents)
        }
        Err(e) => {
            debug!(error = ?e, "No PEM block found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_block_decodes_body() {
        let data = b"-----BEGIN PKCS7-----\naGVsbG8=\n-----END PKCS7-----\n";
        assert_eq!(first_block(data), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_leading_junk_skipped() {
        let mut data = vec![0xff, 0xfe, 0x00, b'\n'];
        data.extend_from_slice(b"preamble\n-----BEGIN PKCS7-----\naGVsbG8=\n-----END PKCS7-----\n");
        assert_eq!(first_block(&data), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_no_markers() {
        assert_eq!(first_block(b"not-a-pem-block"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(first_block(b""), None);
    }

    #[test]
    fn test_missing_end_marker() {
        assert_eq!(first_block(b"-----BEGIN PKCS7-----\naGVsbG8=\n"), None);
    }
}
