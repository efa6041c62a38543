//! Catalog tree records
//! 目录树记录

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{U16, U32, U64},
};

/// Record type of a catalog key
/// 目录键的记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
  Dummy,
  Folder,
  File,
  Hlink,
  Ilink,
  UnpackInode,
  Unknown(u8),
}

impl RecordType {
  pub fn from_u8(v: u8) -> Self {
    match v {
      0x00 => Self::Dummy,
      0x01 => Self::Folder,
      0x02 => Self::File,
      0x03 => Self::Hlink,
      0x05 => Self::Ilink,
      0x10 => Self::UnpackInode,
      v => Self::Unknown(v),
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Dummy => "dummy",
      Self::Folder => "folder",
      Self::File => "file",
      Self::Hlink => "hlink",
      Self::Ilink => "ilink",
      Self::UnpackInode => "unpack inode",
      Self::Unknown(_) => "unknown",
    }
  }

  /// Folder and file records carry a [`FolderRecord`] value
  /// 文件夹与文件记录带有 [`FolderRecord`] 值
  #[inline]
  pub fn has_value(self) -> bool {
    matches!(self, Self::Folder | Self::File)
  }
}

/// Fixed head of a catalog key, the name follows it
/// 目录键的定长头，其后为名称
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct CatKeyHead {
  pub magic: [u8; 4],
  /// Length of the key including the name
  /// 含名称的键长度
  pub key_len: U16,
  /// Length of the whole record
  /// 整条记录长度
  pub record_len: U16,
  pub parent_id: U64,
  pub object_id: U64,
  pub record_type: u8,
  pub name_len: u8,
}

impl CatKeyHead {
  pub const SIZE: usize = size_of::<Self>();

  #[inline]
  pub fn record_type(&self) -> RecordType {
    RecordType::from_u8(self.record_type)
  }

  #[inline]
  pub fn parent_id(&self) -> u64 {
    self.parent_id.get()
  }

  #[inline]
  pub fn object_id(&self) -> u64 {
    self.object_id.get()
  }
}

/// Seconds split into low and high words
/// 秒数分为低位与高位
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Timespec {
  pub seconds: U32,
  pub seconds_high: U32,
  pub nanoseconds: U32,
}

impl Timespec {
  #[inline]
  pub fn secs(&self) -> u64 {
    ((self.seconds_high.get() as u64) << 32) | self.seconds.get() as u64
  }
}

/// Common value of folder and file records
/// 文件夹与文件记录的公共值
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct FolderRecord {
  pub flags: U32,
  pub generation: U32,
  pub total_items_count: U64,
  pub links_count: U64,
  pub next_orphan_id: U64,
  pub file_mode: U16,
  pub pad: U16,
  pub user_id: U32,
  pub group_id: U32,
  pub creation_time: Timespec,
  pub modification_time: Timespec,
  pub access_time: Timespec,
}

impl FolderRecord {
  pub const SIZE: usize = size_of::<Self>();
}

/// One parsed catalog record
/// 一条已解析的目录记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatRecord {
  /// Absolute offset in the image
  /// 在镜像中的绝对偏移
  pub offset: u64,
  pub head: CatKeyHead,
  pub name: Box<[u8]>,
  /// Read at `key_len` when the record is long enough
  /// 记录足够长时在 `key_len` 处读取
  pub value: Option<FolderRecord>,
}

impl CatRecord {
  /// Parse a record from `body`, the bytes after the key head
  /// 从 `body`（键头之后的字节）解析记录
  pub(crate) fn parse(offset: u64, head: CatKeyHead, body: &[u8]) -> Self {
    let name = body[..head.name_len as usize].into();
    let value = if head.record_type().has_value() {
      (head.key_len.get() as usize)
        .checked_sub(CatKeyHead::SIZE)
        .and_then(|at| body.get(at..))
        .and_then(|rest| FolderRecord::read_from_prefix(rest).ok())
        .map(|(value, _)| value)
    } else {
      None
    };
    Self {
      offset,
      head,
      name,
      value,
    }
  }

  #[inline]
  pub fn record_type(&self) -> RecordType {
    self.head.record_type()
  }

  pub fn name_str(&self) -> String {
    String::from_utf8_lossy(&self.name).into_owned()
  }
}
