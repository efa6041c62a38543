//! On-disk constants of the compressed file container
//! 压缩文件容器的磁盘常量

use crate::{
  extent::Extent,
  foot::CompFileDescr,
  image::{
    BaseTable, CatKeyHead, ExtendedSuperBlock, FolderRecord, GenNodeDescr, HEAD_SIZE,
    RawBtreeHead, SuperBlock, VolumeBegins,
  },
};

/// Trailer size, located at `file_size - FOOT_SIZE`
/// 尾部大小，位于 `file_size - FOOT_SIZE`
pub const FOOT_SIZE: usize = CompFileDescr::SIZE;

/// Extent record size
/// 区段记录大小
pub const EXTENT_SIZE: usize = Extent::SIZE;

pub const EXTENT_MAGIC: [u8; 2] = *b"XT";

/// Trailer magic of zlib containers
/// zlib 容器的尾部魔数
pub const ZLIB_MAGIC: [u8; 4] = *b"CZip";

/// Layout revision written by the packer (read back, never validated)
/// 打包器写入的布局版本（读取但不校验）
pub const LAYOUT_VERSION: u16 = 1;

const _: () = assert!(FOOT_SIZE == 40);
const _: () = assert!(EXTENT_SIZE == 16);

const _: () = assert!(VolumeBegins::SIZE == 512);
const _: () = assert!(SuperBlock::SIZE == 512);
const _: () = assert!(ExtendedSuperBlock::SIZE == 2560);
const _: () = assert!((0x600 + ExtendedSuperBlock::SIZE) as u64 == HEAD_SIZE);
const _: () = assert!(BaseTable::SIZE == 104);
const _: () = assert!(RawBtreeHead::SIZE == 20);
const _: () = assert!(GenNodeDescr::SIZE == 32);
const _: () = assert!(CatKeyHead::SIZE == 26);
const _: () = assert!(FolderRecord::SIZE == 80);
