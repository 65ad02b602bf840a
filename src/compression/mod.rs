use crate::store::CompressionType;
use crate::util::Status;

/// Whether the embedded store can encode data with `compression`.
pub fn is_supported(compression: CompressionType) -> bool {
    matches!(
        compression,
        CompressionType::None | CompressionType::Snappy | CompressionType::Lz4
    )
}

/// Compress data using the specified compression type
pub fn compress(compression: CompressionType, data: &[u8]) -> Result<Vec<u8>, Status> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Snappy => compress_snappy(data),
        CompressionType::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionType::Gz | CompressionType::Lzo => Err(unsupported(compression)),
    }
}

/// Decompress data using the specified compression type
pub fn decompress(compression: CompressionType, data: &[u8]) -> Result<Vec<u8>, Status> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Snappy => decompress_snappy(data),
        CompressionType::Lz4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| Status::corruption(format!("LZ4 decompression failed: {e:?}"))),
        CompressionType::Gz | CompressionType::Lzo => Err(unsupported(compression)),
    }
}

fn unsupported(compression: CompressionType) -> Status {
    Status::not_supported(format!("compression codec {compression:?} is not available"))
}

fn compress_snappy(data: &[u8]) -> Result<Vec<u8>, Status> {
    let mut encoder = snap::raw::Encoder::new();
    encoder
        .compress_vec(data)
        .map_err(|e| Status::io_error(format!("Snappy compression failed: {e}")))
}

fn decompress_snappy(data: &[u8]) -> Result<Vec<u8>, Status> {
    let mut decoder = snap::raw::Decoder::new();
    decoder
        .decompress_vec(data)
        .map_err(|e| Status::corruption(format!("Snappy decompression failed: {e}")))
}
