//! Gzip helpers for request and response bodies

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Gzip a byte slice, returning the compressed bytes
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Un-gzip a byte slice, returning the decompressed bytes
pub fn un_gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(data).read_to_end(&mut decoded)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    // gzip inflates small inputs, so compression tests want a big one
    fn compressible_input() -> Vec<u8> {
        "Hello I am a string that is probably compressible"
            .repeat(10 * 1024)
            .into_bytes()
    }

    #[test]
    fn gzip_shrinks_compressible_data() {
        let input = compressible_input();
        let output = gzip(&input).unwrap();
        assert!(output.len() < input.len());
    }

    #[test]
    fn round_trip_preserves_bytes() {
        let input = compressible_input();
        assert_eq!(un_gzip(&gzip(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn round_trip_empty_input() {
        assert_eq!(un_gzip(&gzip(b"").unwrap()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn round_trip_binary_input() {
        let input: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(un_gzip(&gzip(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn un_gzip_rejects_garbage() {
        assert!(un_gzip(b"definitely not gzip").is_err());
    }
}
