#[cfg(not(any(feature = "miniz", feature = "libdeflate")))]
compile_error!("either the `miniz` or `libdeflate` feature must be enabled");

#[derive(thiserror::Error, Debug)]
pub(crate) enum InflationError {
    #[error("bad zlib data: {msg}")]
    BadData { msg: String },

    #[error("inflated {written} bytes but the chunk declared {expected}")]
    SizeMismatch { written: usize, expected: usize },
}

/// Inflate one zlib stream. The expected size comes from the chunk header and
/// is used to size the output buffer up front.
#[cfg(feature = "libdeflate")]
pub(crate) fn inflate_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>, InflationError> {
    let mut out = vec![0u8; expected];
    let mut decompressor = libdeflater::Decompressor::new();
    let written = decompressor
        .zlib_decompress(data, &mut out)
        .map_err(|e| InflationError::BadData { msg: e.to_string() })?;

    if written != expected {
        return Err(InflationError::SizeMismatch { written, expected });
    }

    Ok(out)
}

#[cfg(all(feature = "miniz", not(feature = "libdeflate")))]
pub(crate) fn inflate_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>, InflationError> {
    let out = miniz_oxide::inflate::decompress_to_vec_zlib(data).map_err(|e| {
        InflationError::BadData {
            msg: format!("{:?}", e.status),
        }
    })?;

    // Older writers left the uncompressed size blank
    if expected != 0 && out.len() != expected {
        return Err(InflationError::SizeMismatch {
            written: out.len(),
            expected,
        });
    }

    Ok(out)
}
