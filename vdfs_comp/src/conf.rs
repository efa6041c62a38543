//! Decoder and packer configuration
//! 解码器与打包器配置

/// Configuration options
/// 配置选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conf {
  /// Check output length against `unpacked_size`
  /// 校验输出长度与 `unpacked_size` 一致
  VerifySize(bool),

  /// Check CRC-32 of output against trailer `crc`
  /// 校验输出的 CRC-32 与尾部 `crc` 一致
  VerifyCrc(bool),

  /// Packer chunk size exponent
  /// 打包块大小指数
  LogChunkSize(u32),

  /// Packer zlib level (0-9)
  /// 打包 zlib 等级 (0-9)
  Level(u32),

  /// Layout version written by the packer
  /// 打包器写入的布局版本
  LayoutVersion(u16),
}

/// Internal configuration struct
/// 内部配置结构体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub verify_size: bool,
  pub verify_crc: bool,
  pub log_chunk_size: u32,
  pub level: u32,
  pub layout_version: u16,
}

impl Config {
  /// Any strict verification enabled
  /// 是否启用任一严格校验
  #[inline]
  pub fn strict(&self) -> bool {
    self.verify_size || self.verify_crc
  }

  #[inline]
  pub fn chunk_size(&self) -> usize {
    1 << self.log_chunk_size
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      verify_size: false,
      verify_crc: false,
      log_chunk_size: default::LOG_CHUNK_SIZE,
      level: default::LEVEL,
      layout_version: crate::LAYOUT_VERSION,
    }
  }
}

impl From<&[Conf]> for Config {
  fn from(conf_li: &[Conf]) -> Self {
    let mut config = Self::default();
    for &conf in conf_li {
      match conf {
        Conf::VerifySize(v) => config.verify_size = v,
        Conf::VerifyCrc(v) => config.verify_crc = v,
        Conf::LogChunkSize(v) => {
          if default::LOG_CHUNK_SIZE_RANGE.contains(&v) {
            config.log_chunk_size = v;
          } else {
            log::warn!("LogChunkSize {v} out of bounds {:?}", default::LOG_CHUNK_SIZE_RANGE);
          }
        }
        Conf::Level(v) => {
          if v <= default::MAX_LEVEL {
            config.level = v;
          } else {
            log::warn!("Level {v} out of bounds (0-{})", default::MAX_LEVEL);
          }
        }
        Conf::LayoutVersion(v) => config.layout_version = v,
      }
    }
    config
  }
}

/// Default values
/// 默认值
pub mod default {
  use std::ops::RangeInclusive;

  /// 128KB chunks
  /// 128KB 块
  pub const LOG_CHUNK_SIZE: u32 = 17;

  /// 512B to 16MB
  pub const LOG_CHUNK_SIZE_RANGE: RangeInclusive<u32> = 9..=24;

  pub const LEVEL: u32 = 6;
  pub const MAX_LEVEL: u32 = 9;
}
