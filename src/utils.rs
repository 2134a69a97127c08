use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Turn raw bytes into something comparable: the text itself if it is
/// valid UTF-8, the digest of the bytes otherwise.
pub fn text_or_digest(data: Vec<u8>) -> String {
    match String::from_utf8(data) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            debug!("Content is not valid UTF-8, using its SHA-256 digest");
            sha256_hex(&bytes)
        }
    }
}

pub fn read_file_string(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut buffer = String::new();
    file.read_to_string(&mut buffer)?;
    Ok(buffer)
}

pub fn read_file_content(path: &Path) -> Result<String, std::io::Error> {
    let data = std::fs::read(path)?;
    Ok(text_or_digest(data))
}

pub fn read_stream_content<R: Read>(mut reader: R) -> Result<String, std::io::Error> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(text_or_digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn digest_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn text_is_kept_verbatim() {
        let text = "line one\nline two\r\n\tü\n";
        assert_eq!(text_or_digest(text.as_bytes().to_vec()), text);
    }

    #[test]
    fn invalid_utf8_becomes_digest() {
        let bytes = vec![0xff, 0xfe, 0x00, 0x80];
        let content = text_or_digest(bytes.clone());
        assert_eq!(content, sha256_hex(&bytes));
        assert_eq!(content.len(), 64);
        assert!(content.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn stream_content_falls_back_to_digest() {
        let content = read_stream_content(Cursor::new(vec![0xc3, 0x28])).unwrap();
        assert_eq!(content, sha256_hex(&[0xc3, 0x28]));
        let content = read_stream_content(Cursor::new(b"hello".to_vec())).unwrap();
        assert_eq!(content, "hello");
    }
}
