//! Volume head: volume begins block, superblocks, extended superblock, base table
//! 卷头：卷起始块、超级块、扩展超级块、基础表

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{U32, U64},
};

use super::cstr;

/// Volume begins block at 0x0
/// 位于 0x0 的卷起始块
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct VolumeBegins {
  /// `VDFS`
  pub signature: [u8; 4],
  /// `2006`, `2007`
  pub layout_version: [u8; 4],
  /// Command line used to create the image
  /// 创建镜像所用的命令行
  pub command_line: [u8; 456],
  pub creation_time: [u8; 16],
  pub creator_username: [u8; 16],
  pub reserved: [u8; 12],
  pub checksum: U32,
}

impl VolumeBegins {
  pub const SIZE: usize = size_of::<Self>();

  pub fn layout_version_str(&self) -> String {
    cstr(&self.layout_version)
  }

  pub fn command_line_str(&self) -> String {
    cstr(&self.command_line)
  }

  pub fn creator_username_str(&self) -> String {
    cstr(&self.creator_username)
  }
}

/// Superblock, one copy at 0x200 and another at 0x400
/// 超级块，0x200 与 0x400 各一份
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SuperBlock {
  pub signature: [u8; 4],
  pub layout_version: [u8; 4],
  pub maximum_blocks_count: U64,
  pub creation_timestamp: [u8; 12],
  pub volume_uuid: [u8; 16],
  pub volume_name: [u8; 16],
  pub mkfs_version: [u8; 64],
  pub unused: [u8; 40],
  /// log2 of block size in bytes
  /// 块大小的 log2
  pub log_block_size: u8,
  pub log_super_page_size: u8,
  pub log_erase_block_size: u8,
  pub case_insensitive: u8,
  pub read_only: u8,
  pub image_crc32_present: u8,
  pub force_full_decomp_decrypt: u8,
  pub hash_type: u8,
  pub encryption_flags: u8,
  pub sign_type: u8,
  pub reserved: [u8; 54],
  pub exsb_checksum: U32,
  pub basetable_checksum: U32,
  pub meta_hashtable_checksum: U32,
  pub image_inode_count: U64,
  pub pad: U32,
  /// RSA encrypted hash of the superblock
  /// 超级块的 RSA 加密哈希
  pub sb_hash: [u8; 256],
  pub checksum: U32,
}

impl SuperBlock {
  pub const SIZE: usize = size_of::<Self>();

  /// `1 << log_block_size`, `None` above 2^30
  /// `1 << log_block_size`，超过 2^30 时为 `None`
  pub fn block_size(&self) -> Option<u64> {
    (self.log_block_size <= super::MAX_LOG_BLOCK_SIZE).then(|| 1u64 << self.log_block_size)
  }

  pub fn volume_name_str(&self) -> String {
    cstr(&self.volume_name)
  }

  #[inline]
  pub fn maximum_blocks_count(&self) -> u64 {
    self.maximum_blocks_count.get()
  }

  #[inline]
  pub fn image_inode_count(&self) -> u64 {
    self.image_inode_count.get()
  }
}

/// Extended superblock at 0x600, fills the rest of the first 4KB
/// 位于 0x600 的扩展超级块，占满前 4KB 的剩余部分
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct ExtendedSuperBlock {
  pub files_count: U64,
  pub folders_count: U64,
  pub volume_start_block: U64,
  pub volume_length_blocks: U64,
  pub mount_count: U32,
  pub sync_count: U32,
  pub unmount_count: U32,
  pub generation: U32,
  pub debug_area_start_block: U64,
  pub debug_area_length_blocks: U64,
  /// Total block count of the btree extents
  /// btree 区段总块数
  pub meta_tbc: U32,
  pub pad: U32,
  pub tables_start_block: U64,
  pub tables_length_blocks: U64,
  pub btrees_start_block: U64,
  pub btrees_length_blocks: U64,
  /// Room for 96 btree extents, images only use the first area above
  /// 可容纳 96 个 btree 区段，镜像只使用上面的第一个
  pub btree_extents: [u8; 1520],
  pub extension: [u8; 16],
  pub volume_blocks_count: U64,
  pub crc: u8,
  pub volume_uuid: [u8; 16],
  pub reserved: [u8; 7],
  pub kbytes_written: U64,
  pub meta_hashtable_start_block: U64,
  pub meta_hashtable_length_blocks: U64,
  pub reserved2: [u8; 860],
  pub checksum: U32,
}

impl ExtendedSuperBlock {
  pub const SIZE: usize = size_of::<Self>();
}

/// Base table (snapshot descriptor) at `tables_start_block`
/// 位于 `tables_start_block` 的基础表（快照描述符）
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BaseTable {
  /// `CoWB`
  pub magic: [u8; 4],
  pub sync_count: U32,
  pub mount_count: U64,
  pub checksum_offset: U64,
  pub last_page_index: [U64; 5],
  pub translation_table_offsets: [U64; 5],
}

impl BaseTable {
  pub const SIZE: usize = size_of::<Self>();
}
