//! Extent record and per-extent decode strategy
//! 区段记录与区段解码策略

use std::io;

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{U16, U32, U64},
};

use crate::{codec, consts::EXTENT_MAGIC};

/// How the stored bytes of an extent become output
/// 区段存储字节如何转为输出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Kind {
  /// flags == 0
  Zlib = 0,
  /// flags != 0, stored as is
  /// flags != 0，原样存储
  Raw = 1,
}

impl Kind {
  #[inline]
  pub const fn from_flags(flags: u16) -> Self {
    if flags == 0 { Self::Zlib } else { Self::Raw }
  }

  #[inline]
  pub const fn flags(self) -> u16 {
    self as u16
  }

  /// Decode stored bytes into output bytes
  /// 将存储字节解码为输出字节
  pub fn decode(self, stored: Vec<u8>) -> io::Result<Vec<u8>> {
    match self {
      Self::Zlib => codec::dec(&stored),
      Self::Raw => Ok(stored),
    }
  }
}

/// Extent record, 16 bytes
/// 区段记录，16 字节
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Extent {
  pub magic: [u8; 2],
  pub flags: U16,
  pub len_bytes: U32,
  /// Absolute offset of the stored bytes in the source
  /// 存储字节在源文件中的绝对偏移
  pub start: U64,
}

impl Extent {
  pub const SIZE: usize = size_of::<Self>();

  pub fn new(kind: Kind, len_bytes: u32, start: u64) -> Self {
    Self {
      magic: EXTENT_MAGIC,
      flags: kind.flags().into(),
      len_bytes: len_bytes.into(),
      start: start.into(),
    }
  }

  #[inline]
  pub fn magic(&self) -> [u8; 2] {
    self.magic
  }

  #[inline]
  pub fn is_valid(&self) -> bool {
    self.magic() == EXTENT_MAGIC
  }

  #[inline]
  pub fn flags(&self) -> u16 {
    self.flags.get()
  }

  #[inline]
  pub fn kind(&self) -> Kind {
    Kind::from_flags(self.flags())
  }

  #[inline]
  pub fn len_bytes(&self) -> u32 {
    self.len_bytes.get()
  }

  #[inline]
  pub fn start(&self) -> u64 {
    self.start.get()
  }

  /// End offset, `None` on overflow
  /// 结束偏移，溢出时为 `None`
  #[inline]
  pub fn end(&self) -> Option<u64> {
    self.start().checked_add(self.len_bytes() as u64)
  }
}
