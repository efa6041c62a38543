//! Container packer: payload region, extent table, trailer
//! 容器打包器：载荷区、区段表、尾部

use std::io::Write;

use zerocopy::IntoBytes;

use crate::{
  Conf, Config, Error, Result, codec,
  extent::{Extent, Kind},
  foot::{Algo, CompFileDescr},
};

/// Pack `payload` into a zlib container written to `sink`
/// 将 `payload` 打包为 zlib 容器写入 `sink`
///
/// Extent starts are counted from the first byte written, `sink` must be empty
/// 区段起始偏移从首个写入字节算起，`sink` 须为空
///
/// Chunks that do not shrink are stored raw
/// 压缩后不变小的块原样存储
pub fn pack<W: Write>(payload: &[u8], sink: &mut W, conf_li: &[Conf]) -> Result<CompFileDescr> {
  pack_at(payload, sink, 0, conf_li)
}

/// Like [`pack`], for a `sink` already holding `base` bytes of the final file
/// 同 [`pack`]，用于已含最终文件前 `base` 字节的 `sink`
pub fn pack_at<W: Write>(
  payload: &[u8],
  sink: &mut W,
  base: u64,
  conf_li: &[Conf],
) -> Result<CompFileDescr> {
  let config = Config::from(conf_li);
  let chunk_size = config.chunk_size();
  let chunk_count = payload.len().div_ceil(chunk_size);
  let Ok(extents_num) = u16::try_from(chunk_count) else {
    return Err(Error::TooManyExtents(chunk_count));
  };

  let mut extents = Vec::with_capacity(chunk_count);
  let mut pos = base;
  for chunk in payload.chunks(chunk_size) {
    let compressed = codec::enc(chunk, config.level)?;
    let (kind, stored) = if compressed.len() < chunk.len() {
      (Kind::Zlib, compressed.as_slice())
    } else {
      (Kind::Raw, chunk)
    };
    sink.write_all(stored)?;
    // chunk_size is at most 16MB
    // chunk_size 最大 16MB
    extents.push(Extent::new(kind, stored.len() as u32, pos));
    pos += stored.len() as u64;
  }

  for extent in &extents {
    sink.write_all(extent.as_bytes())?;
  }

  let mut foot = CompFileDescr::new(
    Algo::Zlib,
    extents_num,
    payload.len() as u64,
    crc32fast::hash(payload),
    config.log_chunk_size,
  );
  foot.layout_version = config.layout_version.into();
  sink.write_all(foot.as_bytes())?;
  sink.flush()?;

  log::debug!(
    "packed {} bytes into {extents_num} extents, {} stored at {base}",
    payload.len(),
    pos - base
  );
  Ok(foot)
}
