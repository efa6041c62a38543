//! Error types for vdfs_comp
//! vdfs_comp 错误类型定义

use thiserror::Error;

/// Error category, every variant is fatal to the whole decode
/// 错误类别，任何错误都会终止整个解码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Trailer, extent table or image structure short, malformed or failing a marker check
  /// 尾部、区段表或镜像结构过短、格式错误或标记校验失败
  Format,
  /// Trailer magic names an algorithm this decoder does not implement
  /// 尾部魔数表示不支持的算法
  Unsupported,
  Decompress,
  /// Strict mode only
  /// 仅严格模式
  Verify,
  Io,
  Pack,
}

#[derive(Error, Debug)]
pub enum Error {
  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("source too small: {size} bytes, trailer needs 40")]
  TooSmall { size: u64 },

  #[error("unsupported magic {magic:?} ({algo})")]
  UnsupportedMagic { magic: String, algo: &'static str },

  #[error("extent table out of range: {extents_num} extents before trailer at {foot_offset}")]
  ExtentTableOutOfRange { extents_num: u16, foot_offset: u64 },

  #[error("invalid extent magic {magic:?} at index {idx}, offset {offset}")]
  InvalidExtentMagic { idx: usize, offset: u64, magic: [u8; 2] },

  #[error("extent {idx} out of range: start {start}, len {len}, file size {file_size}")]
  ExtentOutOfRange {
    idx: usize,
    start: u64,
    len: u32,
    file_size: u64,
  },

  #[error("extent {idx} truncated: start {start}, len {len}")]
  ExtentTruncated { idx: usize, start: u64, len: u32 },

  #[error("decompress extent {idx}: {source}")]
  Decompress { idx: usize, source: std::io::Error },

  #[error("unpacked size mismatch: expected {expected}, got {actual}")]
  SizeMismatch { expected: u64, actual: u64 },

  #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
  ChecksumMismatch { expected: u32, actual: u32 },

  #[error("too many extents: {0} (max 65535)")]
  TooManyExtents(usize),

  #[error("image too small: {size} bytes, volume head needs 4096")]
  ImageTooSmall { size: u64 },

  #[error("invalid volume signature {found:?} at {offset:#x}")]
  InvalidSignature { offset: u64, found: String },

  #[error("invalid log block size {0}")]
  InvalidBlockSize(u8),

  #[error("block {block} out of range for block size {block_size}")]
  BlockOutOfRange { block: u64, block_size: u64 },

  #[error("invalid base table magic {magic:?} at {offset}")]
  InvalidBaseTable { offset: u64, magic: String },

  #[error("invalid catalog key at {offset}: record len {record_len}, name len {name_len}")]
  InvalidCatalogKey {
    offset: u64,
    record_len: u16,
    name_len: u8,
  },

  #[error("image truncated: {len} bytes at {offset}")]
  ImageTruncated { offset: u64, len: u64 },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Io(_) => ErrorKind::Io,
      Self::TooSmall { .. }
      | Self::ExtentTableOutOfRange { .. }
      | Self::InvalidExtentMagic { .. }
      | Self::ExtentOutOfRange { .. }
      | Self::ExtentTruncated { .. }
      | Self::ImageTooSmall { .. }
      | Self::InvalidSignature { .. }
      | Self::InvalidBlockSize(_)
      | Self::BlockOutOfRange { .. }
      | Self::InvalidBaseTable { .. }
      | Self::InvalidCatalogKey { .. }
      | Self::ImageTruncated { .. } => ErrorKind::Format,
      Self::UnsupportedMagic { .. } => ErrorKind::Unsupported,
      Self::Decompress { .. } => ErrorKind::Decompress,
      Self::SizeMismatch { .. } | Self::ChecksumMismatch { .. } => ErrorKind::Verify,
      Self::TooManyExtents(_) => ErrorKind::Pack,
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
