use std::{
  fs::{File, OpenOptions},
  io::BufWriter,
};

use anyhow::{Context, Result};
use vdfs_comp::Decoder;

use crate::opt::Opt;

pub fn unpack(opt: &Opt) -> Result<()> {
  let input = File::open(&opt.input)
    .with_context(|| format!("failed to open {}", opt.input.display()))?;
  let mut decoder = Decoder::new(input, &opt.conf())
    .with_context(|| format!("invalid compressed file {}", opt.input.display()))?;

  if opt.verbose {
    print_layout(&decoder);
  }
  if decoder.config().strict() {
    log::info!("verifying unpacked size and CRC-32 of {}", opt.input.display());
  }

  // output is only touched once the trailer and extent table are valid
  let file = OpenOptions::new()
    .create(true)
    .write(true)
    .append(!opt.truncate)
    .truncate(opt.truncate)
    .open(&opt.output)
    .with_context(|| format!("failed to open {}", opt.output.display()))?;
  let mut sink = BufWriter::new(file);

  let written = decoder
    .decode_to(&mut sink)
    .with_context(|| format!("failed to decode {}", opt.input.display()))?;
  log::info!(
    "{} -> {}: {written} bytes",
    opt.input.display(),
    opt.output.display()
  );
  Ok(())
}

fn print_layout<R>(decoder: &Decoder<R>) {
  let foot = decoder.foot();
  println!(
    "comp file descr - Magic: {}, Extents num: {}, Unpacked size: {}, Chunk size: {}, Layout version: {}",
    foot.magic_str(),
    foot.extents_num(),
    foot.unpacked_size(),
    decoder
      .chunk_size()
      .map_or_else(|| format!("2^{}", foot.log_chunk_size()), |n| n.to_string()),
    foot.layout_version(),
  );
  for (i, extent) in decoder.extents().iter().enumerate() {
    println!(
      "XT {} - Start: {}, Length: {}, Flags: {} ({:?})",
      i + 1,
      extent.start(),
      extent.len_bytes(),
      extent.flags(),
      extent.kind(),
    );
  }
}
