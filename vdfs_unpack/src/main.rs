use anyhow::Result;
use clap::Parser;

use crate::opt::Opt;

mod opt;
mod unpack;

fn main() -> Result<()> {
  log_init::init();
  let opt = Opt::parse();
  unpack::unpack(&opt)
}
