//! Btree area walk
//! btree 区遍历

use std::io::{Read, Seek};

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{U16, U32},
};

use super::{
  BlockCursor,
  catalog::{CatKeyHead, CatRecord},
  read_at, read_struct_at,
};
use crate::{Error, Result};

pub const FSMB_MAGIC: [u8; 4] = *b"fsmb";
pub const INOB_MAGIC: [u8; 4] = *b"inob";
pub const HEAD_MAGIC: [u8; 4] = *b"eHND";
pub const NODE_MAGIC: [u8; 4] = *b"Nd\0\0";
/// Marks the end of written btree blocks
/// 标记已写 btree 块的结尾
pub const END_MAGIC: [u8; 4] = [0xED, 0xAC, 0xEF, 0x0D];

/// Blocks taken by a btree head or node
/// btree 头或节点占用的块数
pub const NODE_BLOCKS: u64 = 4;

/// Btree header
/// btree 头
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RawBtreeHead {
  pub magic: [u8; 4],
  pub version1: U32,
  pub version2: U32,
  pub root_bnode_id: U32,
  pub btree_height: U16,
  pub padding: U16,
}

impl RawBtreeHead {
  pub const SIZE: usize = size_of::<Self>();
}

/// Btree node descriptor, records follow it
/// btree 节点描述符，其后为记录
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct GenNodeDescr {
  pub magic: [u8; 4],
  pub version1: U32,
  pub version2: U32,
  pub free_space: U16,
  pub recs_count: U16,
  pub node_id: U32,
  pub prev_node_id: U32,
  pub next_node_id: U32,
  pub node_type: U32,
}

impl GenNodeDescr {
  pub const SIZE: usize = size_of::<Self>();
}

/// Btrees appear in this order in the btree area
/// btree 在 btree 区中按此顺序出现
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtreeType {
  Catalog,
  Extents,
  Xattrs,
  Unknown(usize),
}

impl BtreeType {
  pub fn from_index(n: usize) -> Self {
    match n {
      0 => Self::Catalog,
      1 => Self::Extents,
      2 => Self::Xattrs,
      n => Self::Unknown(n),
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Catalog => "catalog",
      Self::Extents => "extents",
      Self::Xattrs => "xattrs",
      Self::Unknown(_) => "unknown",
    }
  }
}

/// One recognised block of the btree area
/// btree 区中一个可识别的块
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BtreeBlock {
  FreeSpaceBitmap {
    block: u64,
    offset: u64,
  },
  InodeBitmap {
    block: u64,
    offset: u64,
  },
  Head {
    block: u64,
    offset: u64,
    tree: BtreeType,
    head: RawBtreeHead,
  },
  /// `tree` is the tree of the last head seen, `None` before any head
  /// `tree` 为最近一个头所属的树，尚无头时为 `None`
  Node {
    block: u64,
    offset: u64,
    tree: Option<BtreeType>,
    descr: GenNodeDescr,
    records: Vec<CatRecord>,
  },
}

impl BtreeBlock {
  pub fn block(&self) -> u64 {
    match self {
      Self::FreeSpaceBitmap { block, .. }
      | Self::InodeBitmap { block, .. }
      | Self::Head { block, .. }
      | Self::Node { block, .. } => *block,
    }
  }
}

/// How the walk stopped
/// 遍历停止方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
  /// Reached `btrees_length_blocks`
  /// 到达 `btrees_length_blocks`
  Length { block: u64 },
  /// End marker before the area length
  /// 在区域长度之前遇到结束标记
  Marker { block: u64, offset: u64 },
}

/// Walk the btree area block by block
/// 逐块遍历 btree 区
pub(crate) fn walk<R: Read + Seek>(
  src: &mut R,
  cursor: &BlockCursor,
  len_blocks: u64,
) -> Result<(Vec<BtreeBlock>, WalkEnd)> {
  let mut blocks = Vec::new();
  let mut trees = 0usize;
  let mut block = 0u64;

  while block < len_blocks {
    let offset = cursor.offset(block)?;
    let mut magic = [0u8; 4];
    read_at(src, offset, &mut magic)?;

    let step = match magic {
      FSMB_MAGIC => {
        log::debug!("btrees block {block}, offset {offset}: free space bitmap");
        blocks.push(BtreeBlock::FreeSpaceBitmap { block, offset });
        1
      }
      INOB_MAGIC => {
        log::debug!("btrees block {block}, offset {offset}: inode bitmap");
        blocks.push(BtreeBlock::InodeBitmap { block, offset });
        1
      }
      HEAD_MAGIC => {
        let head: RawBtreeHead = read_struct_at(src, offset)?;
        let tree = BtreeType::from_index(trees);
        trees += 1;
        log::debug!(
          "btrees block {block}, offset {offset}: {} btree head, root {}",
          tree.name(),
          head.root_bnode_id.get()
        );
        blocks.push(BtreeBlock::Head {
          block,
          offset,
          tree,
          head,
        });
        NODE_BLOCKS
      }
      NODE_MAGIC => {
        let descr: GenNodeDescr = read_struct_at(src, offset)?;
        let tree = trees.checked_sub(1).map(BtreeType::from_index);
        let records = if tree == Some(BtreeType::Catalog) {
          let node_end = offset.saturating_add(cursor.block_size.saturating_mul(NODE_BLOCKS));
          read_records(src, offset, node_end, descr.recs_count.get())?
        } else {
          Vec::new()
        };
        log::debug!(
          "btrees block {block}, offset {offset}: node {}, {} records",
          descr.node_id.get(),
          descr.recs_count.get()
        );
        blocks.push(BtreeBlock::Node {
          block,
          offset,
          tree,
          descr,
          records,
        });
        NODE_BLOCKS
      }
      END_MAGIC => {
        log::debug!("btrees block {block}, offset {offset}: end marker");
        return Ok((blocks, WalkEnd::Marker { block, offset }));
      }
      _ => 1,
    };
    block = block.saturating_add(step);
  }

  Ok((blocks, WalkEnd::Length { block }))
}

/// Records are packed back to back after the node descriptor
/// 记录紧接节点描述符依次排列
fn read_records<R: Read + Seek>(
  src: &mut R,
  node_offset: u64,
  node_end: u64,
  recs_count: u16,
) -> Result<Vec<CatRecord>> {
  let mut records = Vec::with_capacity(recs_count as usize);
  let mut offset = node_offset + GenNodeDescr::SIZE as u64;
  for _ in 0..recs_count {
    let head: CatKeyHead = read_struct_at(src, offset)?;
    let record_len = head.record_len.get();
    let min_len = CatKeyHead::SIZE + head.name_len as usize;
    let end = offset + record_len as u64;
    if (record_len as usize) < min_len || end > node_end {
      return Err(Error::InvalidCatalogKey {
        offset,
        record_len,
        name_len: head.name_len,
      });
    }
    let mut body = vec![0u8; record_len as usize - CatKeyHead::SIZE];
    read_at(src, offset + CatKeyHead::SIZE as u64, &mut body)?;
    records.push(CatRecord::parse(offset, head, &body));
    offset = end;
  }
  Ok(records)
}
