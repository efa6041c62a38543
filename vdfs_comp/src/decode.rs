//! Container decoder: trailer, extent table, then extents in table order
//! 容器解码器：尾部、区段表，然后按表顺序解码区段

use std::io::{self, Read, Seek, SeekFrom, Write};

use crc32fast::Hasher;
use zerocopy::FromBytes;

use crate::{
  Conf, Config, Error, Result,
  consts::{EXTENT_SIZE, FOOT_SIZE},
  extent::Extent,
  foot::{Algo, CompFileDescr},
  read::{read_exact_at, read_struct_at},
};

/// Parsed container over a seekable source
/// 基于可寻址源的已解析容器
///
/// Construction validates the trailer and the whole extent table before any payload byte is read
/// 构造时先校验尾部与整个区段表，之后才读取载荷
pub struct Decoder<R> {
  src: R,
  file_size: u64,
  foot: CompFileDescr,
  extents: Vec<Extent>,
  config: Config,
}

impl<R: Read + Seek> Decoder<R> {
  pub fn new(mut src: R, conf_li: &[Conf]) -> Result<Self> {
    let config = Config::from(conf_li);
    let file_size = src.seek(SeekFrom::End(0))?;

    if file_size < FOOT_SIZE as u64 {
      return Err(Error::TooSmall { size: file_size });
    }

    // Read foot
    // 读取尾部
    let foot_offset = file_size - FOOT_SIZE as u64;
    let foot: CompFileDescr = read_struct_at(&mut src, foot_offset)?;

    log::info!(
      "comp file descr - magic {}, extents {}, unpacked size {}, chunk size {:?}, layout version {}",
      foot.magic_str(),
      foot.extents_num(),
      foot.unpacked_size(),
      foot.chunk_size(),
      foot.layout_version(),
    );

    match foot.algo() {
      Some(algo) if algo.is_supported() => {}
      algo => {
        return Err(Error::UnsupportedMagic {
          magic: foot.magic_str(),
          algo: algo.map_or("unknown", Algo::name),
        });
      }
    }

    // Extent table ends where the foot begins
    // 区段表紧邻尾部之前
    let extents_num = foot.extents_num();
    let table_len = extents_num as u64 * EXTENT_SIZE as u64;
    let Some(table_offset) = foot_offset.checked_sub(table_len) else {
      return Err(Error::ExtentTableOutOfRange {
        extents_num,
        foot_offset,
      });
    };

    let mut table = vec![0u8; table_len as usize];
    read_exact_at(&mut src, table_offset, &mut table)?;
    // Length is a multiple of EXTENT_SIZE and Extent is unaligned
    // 长度为 EXTENT_SIZE 的整数倍，且 Extent 无对齐要求
    let Ok(records) = <[Extent]>::ref_from_bytes(&table) else {
      unreachable!("extent table length is a multiple of EXTENT_SIZE");
    };

    let mut extents = Vec::with_capacity(records.len());
    for (idx, extent) in records.iter().enumerate() {
      if !extent.is_valid() {
        return Err(Error::InvalidExtentMagic {
          idx,
          offset: table_offset + (idx * EXTENT_SIZE) as u64,
          magic: extent.magic(),
        });
      }
      extents.push(*extent);
    }

    Ok(Self {
      src,
      file_size,
      foot,
      extents,
      config,
    })
  }

  /// Read and decode one extent
  /// 读取并解码单个区段
  ///
  /// # Panics
  ///
  /// If `idx >= self.extents().len()`
  /// 当 `idx >= self.extents().len()` 时
  pub fn read_extent(&mut self, idx: usize) -> Result<Vec<u8>> {
    let extent = self.extents[idx];
    let start = extent.start();
    let len = extent.len_bytes();

    log::debug!(
      "XT {} - start {start}, len {len}, flags {}",
      idx + 1,
      extent.flags()
    );

    if extent.end().is_none_or(|end| end > self.file_size) {
      return Err(Error::ExtentOutOfRange {
        idx,
        start,
        len,
        file_size: self.file_size,
      });
    }

    let mut stored = vec![0u8; len as usize];
    read_exact_at(&mut self.src, start, &mut stored).map_err(|e| match e.kind() {
      io::ErrorKind::UnexpectedEof => Error::ExtentTruncated { idx, start, len },
      _ => Error::Io(e),
    })?;

    extent
      .kind()
      .decode(stored)
      .map_err(|source| Error::Decompress { idx, source })
  }

  /// Decoded extents in table order, stops after the first error
  /// 按表顺序产出解码后的区段，首个错误后停止
  pub fn chunks(&mut self) -> Chunks<'_, R> {
    let hasher = self.config.verify_crc.then(Hasher::new);
    Chunks {
      decoder: self,
      idx: 0,
      total: 0,
      hasher,
      done: false,
    }
  }

  /// Write every decoded extent to `sink`, returns bytes written
  /// 将所有解码区段写入 `sink`，返回写入字节数
  ///
  /// A failing extent writes nothing, earlier extents stay in the sink
  /// 失败的区段不会写入任何字节，之前的区段保留在 sink 中
  pub fn decode_to<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
    let mut written = 0u64;
    for chunk in self.chunks() {
      let chunk = chunk?;
      sink.write_all(&chunk)?;
      written += chunk.len() as u64;
    }
    sink.flush()?;
    Ok(written)
  }
}

impl<R> Decoder<R> {
  #[inline]
  pub fn foot(&self) -> &CompFileDescr {
    &self.foot
  }

  #[inline]
  pub fn extents(&self) -> &[Extent] {
    &self.extents
  }

  #[inline]
  pub fn file_size(&self) -> u64 {
    self.file_size
  }

  /// Informational, extents are read whole
  /// 仅供参考，区段整体读取
  #[inline]
  pub fn chunk_size(&self) -> Option<u64> {
    self.foot.chunk_size()
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn into_inner(self) -> R {
    self.src
  }
}

/// Iterator over decoded extents
/// 解码区段迭代器
pub struct Chunks<'a, R> {
  decoder: &'a mut Decoder<R>,
  idx: usize,
  total: u64,
  hasher: Option<Hasher>,
  done: bool,
}

impl<R: Read + Seek> Chunks<'_, R> {
  fn step(&mut self) -> Option<Result<Vec<u8>>> {
    if self.idx == self.decoder.extents.len() {
      return self.finish().err().map(Err);
    }
    let idx = self.idx;
    self.idx += 1;
    let out = match self.decoder.read_extent(idx) {
      Ok(out) => out,
      Err(e) => return Some(Err(e)),
    };
    Some(self.account(&out).map(|_| out))
  }

  fn account(&mut self, out: &[u8]) -> Result<()> {
    self.total += out.len() as u64;
    let expected = self.decoder.foot.unpacked_size();
    // Fail before emitting the extent that overflows
    // 在输出溢出的区段之前失败
    if self.decoder.config.verify_size && self.total > expected {
      return Err(Error::SizeMismatch {
        expected,
        actual: self.total,
      });
    }
    if let Some(hasher) = &mut self.hasher {
      hasher.update(out);
    }
    Ok(())
  }

  fn finish(&mut self) -> Result<()> {
    let foot = &self.decoder.foot;
    if self.decoder.config.verify_size && self.total != foot.unpacked_size() {
      return Err(Error::SizeMismatch {
        expected: foot.unpacked_size(),
        actual: self.total,
      });
    }
    if let Some(hasher) = self.hasher.take() {
      let actual = hasher.finalize();
      if actual != foot.crc() {
        return Err(Error::ChecksumMismatch {
          expected: foot.crc(),
          actual,
        });
      }
    }
    Ok(())
  }
}

impl<R: Read + Seek> Iterator for Chunks<'_, R> {
  type Item = Result<Vec<u8>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    let item = self.step();
    if !matches!(item, Some(Ok(_))) {
      self.done = true;
    }
    item
  }
}

/// Decode a whole container into memory
/// 将整个容器解码到内存
pub fn decode<R: Read + Seek>(src: R) -> Result<Vec<u8>> {
  let mut out = Vec::new();
  Decoder::new(src, &[])?.decode_to(&mut out)?;
  Ok(out)
}

/// Decode a whole container into `sink`
/// 将整个容器解码到 `sink`
pub fn decode_to<R: Read + Seek, W: Write>(src: R, sink: &mut W) -> Result<u64> {
  Decoder::new(src, &[])?.decode_to(sink)
}
