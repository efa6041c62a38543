use anyhow::Result;
use clap::Parser;

use crate::opt::Opt;

mod info;
mod opt;

fn main() -> Result<()> {
  log_init::init();
  let opt = Opt::parse();
  info::info(&opt)
}
