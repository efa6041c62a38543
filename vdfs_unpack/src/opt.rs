use std::path::PathBuf;

use clap::Parser;
use vdfs_comp::Conf;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "extract the payload of a VDFS4 compressed file")]
pub struct Opt {
  /// Path to the compressed file.
  pub input: PathBuf,
  /// Output file, appended to unless --truncate is given.
  #[arg(long, short, default_value = "decompressed.bin")]
  pub output: PathBuf,
  /// Replace the output file instead of appending.
  #[arg(long)]
  pub truncate: bool,
  /// Check unpacked size and CRC-32 recorded in the trailer.
  #[arg(long)]
  pub strict: bool,
  /// Print the trailer and every extent record.
  #[arg(long, short)]
  pub verbose: bool,
}

impl Opt {
  pub fn conf(&self) -> Vec<Conf> {
    if self.strict {
      vec![Conf::VerifySize(true), Conf::VerifyCrc(true)]
    } else {
      vec![]
    }
  }
}
