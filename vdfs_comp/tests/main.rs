use std::io::{Cursor, Seek, SeekFrom, Write};

use aok::{OK, Void};
use log::info;
use vdfs_comp::{
  Algo, CompFileDescr, Conf, Decoder, EXTENT_MAGIC, EXTENT_SIZE, Error, ErrorKind, Extent,
  FOOT_SIZE, Kind, LAYOUT_VERSION, decode, decode_to, dec, enc, pack, pack_at,
};
use zerocopy::IntoBytes;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

/// Build container, stored extents placed in `phys` order, table in logical order
/// 构建容器，存储区段按 `phys` 顺序放置，区段表按逻辑顺序
fn build(parts: &[(u16, Vec<u8>)], phys: &[usize], unpacked_size: u64, crc: u32) -> Vec<u8> {
  let mut buf = Vec::new();
  let mut starts = vec![0u64; parts.len()];
  // Leading garbage so no extent starts at 0
  // 前置填充，使区段不从 0 开始
  buf.extend_from_slice(b"pad!");
  for &i in phys {
    starts[i] = buf.len() as u64;
    buf.extend_from_slice(&parts[i].1);
  }
  for (i, (flags, stored)) in parts.iter().enumerate() {
    let extent = Extent {
      magic: EXTENT_MAGIC,
      flags: (*flags).into(),
      len_bytes: (stored.len() as u32).into(),
      start: starts[i].into(),
    };
    buf.extend_from_slice(extent.as_bytes());
  }
  let foot = CompFileDescr::new(Algo::Zlib, parts.len() as u16, unpacked_size, crc, 12);
  buf.extend_from_slice(foot.as_bytes());
  buf
}

fn build_in_order(parts: &[(u16, Vec<u8>)]) -> Vec<u8> {
  let phys: Vec<usize> = (0..parts.len()).collect();
  build(parts, &phys, 0, 0)
}

fn zlib(data: &[u8]) -> Vec<u8> {
  enc(data, 6).expect("zlib encode")
}

fn random_bytes(len: usize) -> Vec<u8> {
  (0..len).map(|_| fastrand::u8(..)).collect()
}

fn table_offset(container: &[u8], extents_num: usize) -> usize {
  container.len() - FOOT_SIZE - extents_num * EXTENT_SIZE
}

#[test]
fn test_layout_size() {
  assert_eq!(size_of::<CompFileDescr>(), 40);
  assert_eq!(size_of::<Extent>(), 16);
}

#[test]
fn test_hello_world() -> Void {
  let parts = [(0, zlib(b"hello")), (1, b"world!".to_vec())];
  let container = build_in_order(&parts);

  let mut decoder = Decoder::new(Cursor::new(&container), &[])?;
  assert_eq!(decoder.extents().len(), 2);
  assert_eq!(decoder.extents()[0].kind(), Kind::Zlib);
  assert_eq!(decoder.extents()[1].kind(), Kind::Raw);
  assert_eq!(decoder.extents()[1].len_bytes(), 6);

  let mut out = Vec::new();
  let n = decoder.decode_to(&mut out)?;
  assert_eq!(out, b"helloworld!");
  assert_eq!(n, 11);
  OK
}

#[test]
fn test_foot_fields() -> Void {
  let mut container = build_in_order(&[(1, b"abc".to_vec())]);
  let foot_at = container.len() - FOOT_SIZE;
  // sign_type and nonce are carried but unused
  // sign_type 和 nonce 仅读取不使用
  container[foot_at + 7] = 3;
  container[foot_at + 32..].copy_from_slice(b"noncenon");

  let decoder = Decoder::new(Cursor::new(&container), &[])?;
  let foot = decoder.foot();
  assert_eq!(foot.magic(), *b"CZip");
  assert_eq!(foot.algo(), Some(Algo::Zlib));
  assert_eq!(foot.extents_num(), 1);
  assert_eq!(foot.layout_version(), LAYOUT_VERSION);
  assert_eq!(foot.log_chunk_size(), 12);
  assert_eq!(decoder.chunk_size(), Some(4096));
  assert_eq!(foot.sign_type(), 3);
  assert_eq!(foot.aes_nonce(), *b"noncenon");
  assert_eq!(decoder.file_size(), container.len() as u64);
  OK
}

#[test]
fn test_chunk_size_overflow() {
  let foot = CompFileDescr::new(Algo::Zlib, 0, 0, 0, 64);
  assert_eq!(foot.chunk_size(), None);
  let foot = CompFileDescr::new(Algo::Zlib, 0, 0, 0, 63);
  assert_eq!(foot.chunk_size(), Some(1 << 63));
}

#[test]
fn test_any_nonzero_flags_is_raw() -> Void {
  let parts = [(7, b"seven".to_vec()), (0x8000, b"-high".to_vec())];
  assert_eq!(decode(Cursor::new(build_in_order(&parts)))?, b"seven-high");
  OK
}

#[test]
fn test_physical_order_ignored() -> Void {
  let pieces: Vec<Vec<u8>> = (0..8u8).map(|i| vec![b'a' + i; 100 + i as usize]).collect();
  let expected: Vec<u8> = pieces.concat();
  let parts: Vec<(u16, Vec<u8>)> = pieces
    .iter()
    .enumerate()
    .map(|(i, p)| if i % 2 == 0 { (0, zlib(p)) } else { (1, p.clone()) })
    .collect();

  let orders: [Vec<usize>; 3] = [
    (0..8).collect(),
    (0..8).rev().collect(),
    vec![3, 7, 0, 5, 1, 6, 2, 4],
  ];
  for phys in orders {
    let container = build(&parts, &phys, 0, 0);
    assert_eq!(decode(Cursor::new(container))?, expected, "order {phys:?}");
  }

  let mut phys: Vec<usize> = (0..8).collect();
  fastrand::shuffle(&mut phys);
  let container = build(&parts, &phys, 0, 0);
  assert_eq!(decode(Cursor::new(container))?, expected);
  OK
}

#[test]
fn test_unsupported_magic() {
  for (magic, algo) in [
    (*b"CZst", "zstd"),
    (*b"CGzp", "gzip"),
    (*b"CLzo", "lzo"),
    (*b"ABCD", "unknown"),
    (*b"czip", "unknown"),
  ] {
    let mut container = build_in_order(&[(1, b"data".to_vec())]);
    let foot_at = container.len() - FOOT_SIZE;
    container[foot_at + 8..foot_at + 12].copy_from_slice(&magic);

    let mut sink = Vec::new();
    let err = decode_to(Cursor::new(container), &mut sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(matches!(err, Error::UnsupportedMagic { algo: a, .. } if a == algo));
    assert!(sink.is_empty());
  }
}

#[test]
fn test_invalid_extent_magic() {
  let parts = [
    (1, b"one".to_vec()),
    (1, b"two".to_vec()),
    (1, b"three".to_vec()),
  ];
  let mut container = build_in_order(&parts);
  let at = table_offset(&container, 3) + EXTENT_SIZE;
  container[at..at + 2].copy_from_slice(b"XX");

  let mut sink = Vec::new();
  let err = decode_to(Cursor::new(container), &mut sink).unwrap_err();
  info!("{err}");
  assert_eq!(err.kind(), ErrorKind::Format);
  assert!(matches!(err, Error::InvalidExtentMagic { idx: 1, magic, .. } if magic == *b"XX"));
  // Whole table is validated before any output
  // 输出前校验整个区段表
  assert!(sink.is_empty());
}

#[test]
fn test_too_small() {
  for len in [0usize, 1, 39] {
    let err = decode(Cursor::new(vec![0u8; len])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(err, Error::TooSmall { size } if size == len as u64));
  }
}

#[test]
fn test_extent_table_out_of_range() {
  let foot = CompFileDescr::new(Algo::Zlib, 3, 0, 0, 12);
  let mut container = b"tiny".to_vec();
  container.extend_from_slice(foot.as_bytes());

  let err = decode(Cursor::new(container)).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Format);
  assert!(matches!(
    err,
    Error::ExtentTableOutOfRange {
      extents_num: 3,
      foot_offset: 4
    }
  ));
}

#[test]
fn test_zero_extents() -> Void {
  let foot = CompFileDescr::new(Algo::Zlib, 0, 0, 0, 12);
  let out = decode(Cursor::new(foot.as_bytes().to_vec()))?;
  assert!(out.is_empty());
  OK
}

#[test]
fn test_corrupt_stream() {
  let parts = [
    (1, b"abc".to_vec()),
    (0, b"definitely not a zlib stream".to_vec()),
    (1, b"zzz".to_vec()),
  ];
  let mut sink = Vec::new();
  let err = decode_to(Cursor::new(build_in_order(&parts)), &mut sink).unwrap_err();
  info!("{err}");
  assert_eq!(err.kind(), ErrorKind::Decompress);
  assert!(matches!(err, Error::Decompress { idx: 1, .. }));
  // Nothing from the failing extent or after it
  // 失败区段及其后的区段均无输出
  assert_eq!(sink, b"abc");
}

#[test]
fn test_truncated_stream() {
  let data = random_bytes(2000).repeat(4);
  let mut stored = zlib(&data);
  stored.truncate(stored.len() - 10);

  let mut sink = Vec::new();
  let err = decode_to(Cursor::new(build_in_order(&[(0, stored)])), &mut sink).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Decompress);
  assert!(sink.is_empty());
}

#[test]
fn test_bad_adler32() {
  let mut stored = zlib(b"checksum covered payload");
  let last = stored.len() - 1;
  stored[last] ^= 0xff;

  let err = decode(Cursor::new(build_in_order(&[(0, stored)]))).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Decompress);
}

#[test]
fn test_extent_out_of_range() {
  let mut container = build_in_order(&[(1, b"ok".to_vec()), (1, b"fine".to_vec())]);
  let at = table_offset(&container, 2) + EXTENT_SIZE;
  let bad = Extent {
    magic: EXTENT_MAGIC,
    flags: 1u16.into(),
    len_bytes: 100u32.into(),
    start: (container.len() as u64 - 10).into(),
  };
  container[at..at + EXTENT_SIZE].copy_from_slice(bad.as_bytes());

  let mut sink = Vec::new();
  let err = decode_to(Cursor::new(container), &mut sink).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Format);
  assert!(matches!(err, Error::ExtentOutOfRange { idx: 1, len: 100, .. }));
  assert_eq!(sink, b"ok");
}

#[test]
fn test_start_overflow() {
  let mut container = build_in_order(&[(1, b"x".to_vec())]);
  let at = table_offset(&container, 1);
  let bad = Extent::new(Kind::Raw, 2, u64::MAX);
  container[at..at + EXTENT_SIZE].copy_from_slice(bad.as_bytes());

  let err = decode(Cursor::new(container)).unwrap_err();
  assert!(matches!(err, Error::ExtentOutOfRange { .. }));
}

#[test]
fn test_unverified_by_default() -> Void {
  let container = build(&[(1, b"payload".to_vec())], &[0], 12345, 0xdead_beef);
  let decoder = Decoder::new(Cursor::new(&container), &[])?;
  assert!(!decoder.config().strict());
  assert_eq!(decode(Cursor::new(container))?, b"payload");
  OK
}

#[test]
fn test_config_strict() {
  assert!(!vdfs_comp::Config::default().strict());
  assert!(vdfs_comp::Config::from(&[Conf::VerifySize(true)][..]).strict());
  assert!(vdfs_comp::Config::from(&[Conf::VerifyCrc(true)][..]).strict());
  assert!(!vdfs_comp::Config::from(&[Conf::VerifyCrc(true), Conf::VerifyCrc(false)][..]).strict());
}

#[test]
fn test_strict_verification() -> Void {
  let payload = b"strict payload".to_vec();
  let crc = crc32fast::hash(&payload);
  let len = payload.len() as u64;
  let strict = [Conf::VerifySize(true), Conf::VerifyCrc(true)];

  let good = build(&[(0, zlib(&payload))], &[0], len, crc);
  let mut out = Vec::new();
  let mut decoder = Decoder::new(Cursor::new(good), &strict)?;
  assert!(decoder.config().strict());
  decoder.decode_to(&mut out)?;
  assert_eq!(out, payload);

  let bad_crc = build(&[(0, zlib(&payload))], &[0], len, crc ^ 1);
  let err = Decoder::new(Cursor::new(bad_crc), &strict)?
    .decode_to(&mut Vec::new())
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Verify);
  assert!(matches!(err, Error::ChecksumMismatch { .. }));

  let short = build(&[(0, zlib(&payload))], &[0], len + 1, crc);
  let err = Decoder::new(Cursor::new(short), &[Conf::VerifySize(true)])?
    .decode_to(&mut Vec::new())
    .unwrap_err();
  assert!(matches!(err, Error::SizeMismatch { expected, actual } if expected == len + 1 && actual == len));
  OK
}

#[test]
fn test_size_overflow_stops_before_extent() -> Void {
  let parts = [(1, b"1234".to_vec()), (1, b"5678".to_vec())];
  let container = build(&parts, &[0, 1], 6, 0);

  let mut sink = Vec::new();
  let err = Decoder::new(Cursor::new(container), &[Conf::VerifySize(true)])?
    .decode_to(&mut sink)
    .unwrap_err();
  assert!(matches!(err, Error::SizeMismatch { expected: 6, actual: 8 }));
  assert_eq!(sink, b"1234");
  OK
}

#[test]
fn test_chunks_fused_after_error() -> Void {
  let parts = [
    (1, b"first".to_vec()),
    (0, b"broken".to_vec()),
    (1, b"never".to_vec()),
  ];
  let container = build_in_order(&parts);
  let mut decoder = Decoder::new(Cursor::new(container), &[])?;
  let mut chunks = decoder.chunks();
  assert_eq!(chunks.next().transpose()?, Some(b"first".to_vec()));
  assert!(matches!(chunks.next(), Some(Err(Error::Decompress { idx: 1, .. }))));
  assert!(chunks.next().is_none());
  assert!(chunks.next().is_none());
  OK
}

#[test]
fn test_read_extent_random_access() -> Void {
  let parts = [(1, b"aa".to_vec()), (0, zlib(b"bbbb")), (1, b"c".to_vec())];
  let mut decoder = Decoder::new(Cursor::new(build_in_order(&parts)), &[])?;
  assert_eq!(decoder.read_extent(2)?, b"c");
  assert_eq!(decoder.read_extent(0)?, b"aa");
  assert_eq!(decoder.read_extent(1)?, b"bbbb");
  OK
}

#[test]
fn test_pack_roundtrip() -> Void {
  let compressible: Vec<u8> = (0..50_000u32).map(|i| (i % 97) as u8).collect();
  let mut mixed = random_bytes(3000);
  mixed.extend_from_slice(&[0u8; 5000]);
  mixed.extend_from_slice(&random_bytes(1234));

  for payload in [compressible, mixed, random_bytes(777), b"x".to_vec()] {
    for log_chunk_size in [9, 12, 17] {
      let mut container = Vec::new();
      let foot = pack(&payload, &mut container, &[Conf::LogChunkSize(log_chunk_size)])?;
      assert_eq!(foot.unpacked_size(), payload.len() as u64);
      assert_eq!(foot.crc(), crc32fast::hash(&payload));
      assert_eq!(foot.log_chunk_size(), log_chunk_size);

      let strict = [Conf::VerifySize(true), Conf::VerifyCrc(true)];
      let mut decoder = Decoder::new(Cursor::new(&container), &strict)?;
      let chunk_size = 1usize << log_chunk_size;
      assert_eq!(
        decoder.extents().len(),
        payload.len().div_ceil(chunk_size)
      );
      let mut out = Vec::new();
      decoder.decode_to(&mut out)?;
      assert_eq!(out, payload);
    }
  }
  OK
}

#[test]
fn test_pack_raw_fallback() -> Void {
  let mut payload = random_bytes(512);
  payload.extend_from_slice(&[7u8; 512]);

  let mut container = Vec::new();
  pack(&payload, &mut container, &[Conf::LogChunkSize(9)])?;
  let decoder = Decoder::new(Cursor::new(&container), &[])?;
  let kinds: Vec<Kind> = decoder.extents().iter().map(Extent::kind).collect();
  assert_eq!(kinds, [Kind::Raw, Kind::Zlib]);
  assert_eq!(decoder.extents()[0].len_bytes(), 512);
  OK
}

#[test]
fn test_pack_empty() -> Void {
  let mut container = Vec::new();
  let foot = pack(b"", &mut container, &[])?;
  assert_eq!(container.len(), FOOT_SIZE);
  assert_eq!(foot.extents_num(), 0);
  assert!(decode(Cursor::new(container))?.is_empty());
  OK
}

#[test]
fn test_pack_at_offset() -> Void {
  let payload: Vec<u8> = (0..5000u32).map(|i| (i % 13) as u8).collect();
  let header = b"image header before the container";

  let mut file = header.to_vec();
  pack_at(&payload, &mut file, header.len() as u64, &[Conf::LogChunkSize(10)])?;
  let mut decoder = Decoder::new(Cursor::new(&file), &[Conf::VerifyCrc(true)])?;
  assert_eq!(decoder.extents()[0].start(), header.len() as u64);
  let mut out = Vec::new();
  decoder.decode_to(&mut out)?;
  assert_eq!(out, payload);

  // Offsets from `pack` only hold for an empty sink
  // `pack` 的偏移仅对空 sink 成立
  let mut file = header.to_vec();
  pack(&payload, &mut file, &[Conf::LogChunkSize(10)])?;
  assert!(decode(Cursor::new(&file)).is_err());
  OK
}

#[test]
fn test_table_read_whole() -> Void {
  let parts: Vec<(u16, Vec<u8>)> = (0..300u32).map(|i| (1, i.to_le_bytes().to_vec())).collect();
  let container = build_in_order(&parts);
  let mut decoder = Decoder::new(Cursor::new(&container), &[])?;
  assert_eq!(decoder.extents().len(), 300);
  assert_eq!(decoder.foot().extents_num(), 300);
  assert_eq!(decoder.read_extent(299)?, 299u32.to_le_bytes());

  // Foot alone, nothing before it
  // 仅有尾部
  let container = build_in_order(&[]);
  assert_eq!(container.len(), 4 + FOOT_SIZE);
  assert!(Decoder::new(Cursor::new(&container[4..]), &[])?.extents().is_empty());
  OK
}

#[test]
fn test_pack_too_many_extents() {
  let payload = vec![0u8; (u16::MAX as usize + 1) * 512];
  let err = pack(&payload, &mut std::io::sink(), &[Conf::LogChunkSize(9)]).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Pack);
  assert!(matches!(err, Error::TooManyExtents(65536)));
}

#[test]
fn test_conf_out_of_range_ignored() -> Void {
  let payload = vec![1u8; 10_000];
  let mut container = Vec::new();
  let foot = pack(
    &payload,
    &mut container,
    &[Conf::LogChunkSize(40), Conf::Level(99), Conf::LayoutVersion(7)],
  )?;
  assert_eq!(foot.log_chunk_size(), vdfs_comp::default::LOG_CHUNK_SIZE);
  assert_eq!(foot.layout_version(), 7);
  assert_eq!(decode(Cursor::new(container))?, payload);
  OK
}

#[test]
fn test_file_source() -> Void {
  let payload: Vec<u8> = (0..300_000u32).map(|i| (i / 7) as u8).collect();
  let mut file = tempfile::tempfile()?;
  pack(&payload, &mut file, &[Conf::LogChunkSize(14)])?;
  file.flush()?;
  file.seek(SeekFrom::Start(0))?;

  let mut decoder = Decoder::new(file, &[Conf::VerifyCrc(true)])?;
  info!(
    "file size {}, extents {}",
    decoder.file_size(),
    decoder.extents().len()
  );
  let mut out = Vec::new();
  decoder.decode_to(&mut out)?;
  assert_eq!(out, payload);
  OK
}

#[test]
fn test_codec() -> Void {
  let data = b"hello world hello world hello world";
  let compressed = zlib(data);
  assert!(compressed.len() < data.len());
  assert_eq!(dec(&compressed)?, data);

  // Trailing bytes after the stream end are ignored
  // 流结束后的多余字节被忽略
  let mut padded = compressed.clone();
  padded.extend_from_slice(b"trailing");
  assert_eq!(dec(&padded)?, data);

  assert!(dec(b"").is_err());
  assert!(dec(&compressed[..compressed.len() / 2]).is_err());

  let big = random_bytes(100_000);
  assert_eq!(dec(&zlib(&big))?, big);
  assert_eq!(dec(&zlib(b""))?, b"");
  OK
}
