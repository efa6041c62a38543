//! VDFS4 image inspector: volume head, base table, btree area, catalog records
//! VDFS4 镜像检查：卷头、基础表、btree 区、目录记录

mod btree;
mod catalog;
mod super_block;

use std::io::{self, Read, Seek, SeekFrom};

use zerocopy::FromBytes;

pub use btree::{
  BtreeBlock, BtreeType, END_MAGIC, FSMB_MAGIC, GenNodeDescr, HEAD_MAGIC, INOB_MAGIC, NODE_BLOCKS,
  NODE_MAGIC, RawBtreeHead, WalkEnd,
};
pub use catalog::{CatKeyHead, CatRecord, FolderRecord, RecordType, Timespec};
pub use super_block::{BaseTable, ExtendedSuperBlock, SuperBlock, VolumeBegins};

use crate::{Error, Result};

pub const VOLUME_MAGIC: [u8; 4] = *b"VDFS";
pub const BASE_TABLE_MAGIC: [u8; 4] = *b"CoWB";

pub const VOLUME_BEGINS_OFFSET: u64 = 0x0;
pub const SUPER_BLOCK_OFFSET: u64 = 0x200;
pub const SUPER_BLOCK_COPY_OFFSET: u64 = 0x400;
pub const EXT_SUPER_BLOCK_OFFSET: u64 = 0x600;

/// Volume head size, the four head structures fill it
/// 卷头大小，由四个头结构填满
pub const HEAD_SIZE: u64 = 0x1000;

/// 1GB blocks
/// 1GB 块
pub const MAX_LOG_BLOCK_SIZE: u8 = 30;

/// Parsed image
/// 已解析的镜像
#[derive(Debug, Clone)]
pub struct Image {
  pub volume_begins: VolumeBegins,
  pub super_block: SuperBlock,
  pub super_block_copy: SuperBlock,
  pub ext_super_block: ExtendedSuperBlock,
  pub base_table: BaseTable,
  pub blocks: Vec<BtreeBlock>,
  pub end: WalkEnd,
  file_size: u64,
  block_size: u64,
}

impl Image {
  #[inline]
  pub fn file_size(&self) -> u64 {
    self.file_size
  }

  #[inline]
  pub fn block_size(&self) -> u64 {
    self.block_size
  }

  #[inline]
  pub fn superblocks_match(&self) -> bool {
    self.super_block == self.super_block_copy
  }

  /// Block number to byte offset, saturating
  /// 块号转字节偏移（饱和）
  #[inline]
  pub fn offset_of(&self, block: u64) -> u64 {
    block.saturating_mul(self.block_size)
  }

  /// Records of every catalog node, in walk order
  /// 按遍历顺序产出所有目录节点的记录
  pub fn catalog(&self) -> impl Iterator<Item = &CatRecord> {
    self
      .blocks
      .iter()
      .filter_map(|b| match b {
        BtreeBlock::Node {
          tree: Some(BtreeType::Catalog),
          records,
          ..
        } => Some(records.iter()),
        _ => None,
      })
      .flatten()
  }

  /// `(folders, files)` seen in the catalog
  /// 目录中的 `(文件夹数, 文件数)`
  pub fn catalog_counts(&self) -> (u64, u64) {
    self
      .catalog()
      .fold((0, 0), |(folders, files), r| match r.record_type() {
        RecordType::Folder => (folders + 1, files),
        RecordType::File => (folders, files + 1),
        _ => (folders, files),
      })
  }
}

/// Read and walk a VDFS4 image
/// 读取并遍历 VDFS4 镜像
pub fn inspect<R: Read + Seek>(mut src: R) -> Result<Image> {
  let file_size = src.seek(SeekFrom::End(0))?;
  if file_size < HEAD_SIZE {
    return Err(Error::ImageTooSmall { size: file_size });
  }

  let volume_begins: VolumeBegins = read_struct_at(&mut src, VOLUME_BEGINS_OFFSET)?;
  check_signature(&volume_begins.signature, VOLUME_BEGINS_OFFSET)?;

  let super_block: SuperBlock = read_struct_at(&mut src, SUPER_BLOCK_OFFSET)?;
  check_signature(&super_block.signature, SUPER_BLOCK_OFFSET)?;
  let super_block_copy: SuperBlock = read_struct_at(&mut src, SUPER_BLOCK_COPY_OFFSET)?;
  let ext_super_block: ExtendedSuperBlock = read_struct_at(&mut src, EXT_SUPER_BLOCK_OFFSET)?;

  let Some(block_size) = super_block.block_size() else {
    return Err(Error::InvalidBlockSize(super_block.log_block_size));
  };

  let same = super_block == super_block_copy;
  log::info!(
    "vdfs4 image - layout {}, block size {block_size}, superblocks {}",
    volume_begins.layout_version_str(),
    if same { "match" } else { "differ" }
  );
  if !same {
    log::warn!("superblock copy at {SUPER_BLOCK_COPY_OFFSET:#x} differs");
  }

  let cursor = BlockCursor {
    base: 0,
    block_size,
  };
  let tables_offset = cursor.offset(ext_super_block.tables_start_block.get())?;
  let base_table: BaseTable = read_struct_at(&mut src, tables_offset)?;
  if base_table.magic != BASE_TABLE_MAGIC {
    return Err(Error::InvalidBaseTable {
      offset: tables_offset,
      magic: base_table.magic.escape_ascii().to_string(),
    });
  }

  let cursor = BlockCursor {
    base: cursor.offset(ext_super_block.btrees_start_block.get())?,
    block_size,
  };
  let (blocks, end) = btree::walk(
    &mut src,
    &cursor,
    ext_super_block.btrees_length_blocks.get(),
  )?;

  Ok(Image {
    volume_begins,
    super_block,
    super_block_copy,
    ext_super_block,
    base_table,
    blocks,
    end,
    file_size,
    block_size,
  })
}

fn check_signature(signature: &[u8; 4], offset: u64) -> Result<()> {
  if *signature != VOLUME_MAGIC {
    return Err(Error::InvalidSignature {
      offset,
      found: signature.escape_ascii().to_string(),
    });
  }
  Ok(())
}

/// Block numbers relative to `base`
/// 相对 `base` 的块号
pub(crate) struct BlockCursor {
  pub base: u64,
  pub block_size: u64,
}

impl BlockCursor {
  pub fn offset(&self, block: u64) -> Result<u64> {
    block
      .checked_mul(self.block_size)
      .and_then(|n| n.checked_add(self.base))
      .ok_or(Error::BlockOutOfRange {
        block,
        block_size: self.block_size,
      })
  }
}

/// Read into `buf`, a short image is a format error
/// 读入 `buf`，镜像过短视为格式错误
pub(crate) fn read_at<R: Read + Seek>(src: &mut R, offset: u64, buf: &mut [u8]) -> Result<()> {
  let len = buf.len();
  crate::read::read_exact_at(src, offset, buf).map_err(|e| truncated(e, offset, len))
}

pub(crate) fn read_struct_at<T: FromBytes, R: Read + Seek>(src: &mut R, offset: u64) -> Result<T> {
  crate::read::read_struct_at(src, offset).map_err(|e| truncated(e, offset, size_of::<T>()))
}

fn truncated(e: io::Error, offset: u64, len: usize) -> Error {
  match e.kind() {
    io::ErrorKind::UnexpectedEof => Error::ImageTruncated {
      offset,
      len: len as u64,
    },
    _ => Error::Io(e),
  }
}

/// NUL-terminated on-disk string
/// 以 NUL 结尾的磁盘字符串
pub(crate) fn cstr(bytes: &[u8]) -> String {
  let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
  String::from_utf8_lossy(&bytes[..end]).into_owned()
}
