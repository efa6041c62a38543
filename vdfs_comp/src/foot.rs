//! Compressed file descriptor (40-byte trailer)
//! 压缩文件描述符（40 字节尾部）

use std::fmt;

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{U16, U32, U64},
};

use crate::consts::LAYOUT_VERSION;

/// AES nonce size
/// AES 随机数长度
pub const AES_NONCE_SIZE: usize = 8;

/// Compression algorithm named by the trailer magic
/// 尾部魔数所表示的压缩算法
///
/// Magic is `C` followed by a three-letter code
/// 魔数为 `C` 加三个字母的算法代码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algo {
  /// `CZip`
  Zlib,
  /// `CGzp`
  Gzip,
  /// `CLzo`
  Lzo,
  /// `CZst`
  Zstd,
}

impl Algo {
  pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
    if magic[0] != b'C' {
      return None;
    }
    match &magic[1..] {
      b"Zip" => Some(Self::Zlib),
      b"Gzp" => Some(Self::Gzip),
      b"Lzo" => Some(Self::Lzo),
      b"Zst" => Some(Self::Zstd),
      _ => None,
    }
  }

  pub const fn magic(self) -> [u8; 4] {
    match self {
      Self::Zlib => *b"CZip",
      Self::Gzip => *b"CGzp",
      Self::Lzo => *b"CLzo",
      Self::Zstd => *b"CZst",
    }
  }

  pub const fn name(self) -> &'static str {
    match self {
      Self::Zlib => "zlib",
      Self::Gzip => "gzip",
      Self::Lzo => "lzo",
      Self::Zstd => "zstd",
    }
  }

  /// Only zlib extents can be decoded
  /// 仅支持解码 zlib 区段
  pub const fn is_supported(self) -> bool {
    matches!(self, Self::Zlib)
  }
}

impl fmt::Display for Algo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Compressed file descriptor, stored at `file_size - 40`
/// 压缩文件描述符，存放于 `file_size - 40`
///
/// `crc` and `unpacked_size` are informational unless strict verification is enabled
/// 除非启用严格校验，`crc` 与 `unpacked_size` 仅供参考
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct CompFileDescr {
  pub reserved: [u8; 7],
  pub sign_type: u8,
  pub magic: [u8; 4],
  pub extents_num: U16,
  pub layout_version: U16,
  pub unpacked_size: U64,
  pub crc: U32,
  pub log_chunk_size: U32,
  pub aes_nonce: [u8; AES_NONCE_SIZE],
}

impl CompFileDescr {
  pub const SIZE: usize = size_of::<Self>();

  pub fn new(algo: Algo, extents_num: u16, unpacked_size: u64, crc: u32, log_chunk_size: u32) -> Self {
    Self {
      reserved: [0; 7],
      sign_type: 0,
      magic: algo.magic(),
      extents_num: extents_num.into(),
      layout_version: LAYOUT_VERSION.into(),
      unpacked_size: unpacked_size.into(),
      crc: crc.into(),
      log_chunk_size: log_chunk_size.into(),
      aes_nonce: [0; AES_NONCE_SIZE],
    }
  }

  #[inline]
  pub fn magic(&self) -> [u8; 4] {
    self.magic
  }

  #[inline]
  pub fn algo(&self) -> Option<Algo> {
    Algo::from_magic(self.magic)
  }

  #[inline]
  pub fn sign_type(&self) -> u8 {
    self.sign_type
  }

  #[inline]
  pub fn extents_num(&self) -> u16 {
    self.extents_num.get()
  }

  #[inline]
  pub fn layout_version(&self) -> u16 {
    self.layout_version.get()
  }

  #[inline]
  pub fn unpacked_size(&self) -> u64 {
    self.unpacked_size.get()
  }

  #[inline]
  pub fn crc(&self) -> u32 {
    self.crc.get()
  }

  #[inline]
  pub fn log_chunk_size(&self) -> u32 {
    self.log_chunk_size.get()
  }

  /// `1 << log_chunk_size`, `None` if the shift overflows u64
  /// `1 << log_chunk_size`，移位溢出 u64 时返回 `None`
  #[inline]
  pub fn chunk_size(&self) -> Option<u64> {
    1u64.checked_shl(self.log_chunk_size())
  }

  /// Read but unused, no decryption is performed
  /// 读取但不使用，不做解密
  #[inline]
  pub fn aes_nonce(&self) -> [u8; AES_NONCE_SIZE] {
    self.aes_nonce
  }

  /// Printable magic tag
  /// 可打印的魔数
  pub fn magic_str(&self) -> String {
    String::from_utf8_lossy(&self.magic).into_owned()
  }
}
