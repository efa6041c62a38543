use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "print the layout of a VDFS4 image")]
pub struct Opt {
  /// Path to the image.
  pub input: PathBuf,
  /// Also dump every on-disk structure.
  #[arg(long, short)]
  pub verbose: bool,
}
