//! Decompression of dataset objects.

use crate::error::AnalyticsError;
use crate::models;

use axum::body::Bytes;
use flate2::read::GzDecoder;
use std::io::Read;
use zune_inflate::{DeflateDecoder, DeflateOptions};

/// Decompresses a dataset object and returns the uncompressed data.
///
/// # Arguments
///
/// * `compression`: Compression algorithm
/// * `data`: Compressed data [Bytes](axum::body::Bytes)
pub fn decompress(compression: models::Compression, data: &Bytes) -> Result<Bytes, AnalyticsError> {
    match compression {
        models::Compression::Gzip => decompress_gzip(data),
        models::Compression::Zlib => decompress_zlib(data),
    }
}

fn decompress_gzip(data: &Bytes) -> Result<Bytes, AnalyticsError> {
    let mut decoder = GzDecoder::<&[u8]>::new(data);
    // CSV compresses well; start with room for a few times the compressed size.
    let mut buf = Vec::with_capacity(data.len().saturating_mul(4));
    decoder.read_to_end(&mut buf)?;
    Ok(buf.into())
}

fn decompress_zlib(data: &Bytes) -> Result<Bytes, AnalyticsError> {
    let options = DeflateOptions::default().set_size_hint(data.len());
    let mut decoder = DeflateDecoder::new_with_options(data, options);
    let data = decoder.decode_zlib()?;
    Ok(data.into())
}
