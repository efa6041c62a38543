//! zlib codec for compressed extents
//! 压缩区段的 zlib 编解码

use std::io::{self, Write};

use flate2::{Compression, Decompress, FlushDecompress, Status, write::ZlibEncoder};

/// Minimum growth of the output buffer
/// 输出缓冲最小增长量
const MIN_GROW: usize = 4096;

/// 解压 Decompress
///
/// A stream that ends before its end marker is an error, bytes after the marker are ignored
/// 结束标记前截断的流视为错误，结束标记后的字节被忽略
pub fn dec(src: &[u8]) -> io::Result<Vec<u8>> {
  let mut inflate = Decompress::new(true);
  let mut out = Vec::with_capacity(src.len().saturating_mul(2).max(MIN_GROW));
  loop {
    if out.len() == out.capacity() {
      out.reserve(out.capacity().max(MIN_GROW));
    }
    let total_in = inflate.total_in();
    let total_out = inflate.total_out();
    let status = inflate
      .decompress_vec(&src[total_in as usize..], &mut out, FlushDecompress::None)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if status == Status::StreamEnd {
      return Ok(out);
    }
    // No progress with room left in the output: input ran out
    // 输出仍有空间却无进展：输入耗尽
    if inflate.total_in() == total_in
      && inflate.total_out() == total_out
      && out.len() < out.capacity()
    {
      return Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "truncated zlib stream",
      ));
    }
  }
}

/// 压缩 Compress
pub fn enc(src: &[u8], level: u32) -> io::Result<Vec<u8>> {
  let mut encoder = ZlibEncoder::new(Vec::with_capacity(src.len() / 2), Compression::new(level));
  encoder.write_all(src)?;
  encoder.finish()
}
