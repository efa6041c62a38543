//! Positional reads over a seekable source
//! 基于可寻址源的定位读取

use std::io::{self, Read, Seek, SeekFrom};

use zerocopy::FromBytes;

#[inline]
pub(crate) fn read_exact_at<R: Read + Seek>(src: &mut R, offset: u64, buf: &mut [u8]) -> io::Result<()> {
  src.seek(SeekFrom::Start(offset))?;
  src.read_exact(buf)
}

/// Read a fixed-layout struct at `offset`
/// 在 `offset` 读取定长结构
pub(crate) fn read_struct_at<T: FromBytes, R: Read + Seek>(src: &mut R, offset: u64) -> io::Result<T> {
  let mut buf = vec![0u8; size_of::<T>()];
  read_exact_at(src, offset, &mut buf)?;
  let Ok(value) = T::read_from_bytes(&buf) else {
    unreachable!("buffer is exactly size_of::<T>()");
  };
  Ok(value)
}
