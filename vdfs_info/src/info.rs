use std::{fs::File, io::BufReader};

use anyhow::{Context, Result};
use vdfs_comp::{
  Image,
  image::{BtreeBlock, WalkEnd},
  inspect,
};

use crate::opt::Opt;

pub fn info(opt: &Opt) -> Result<()> {
  let file = File::open(&opt.input)
    .with_context(|| format!("failed to open {}", opt.input.display()))?;
  let image = inspect(BufReader::new(file))
    .with_context(|| format!("invalid VDFS4 image {}", opt.input.display()))?;

  println!("Input file: {}", opt.input.display());
  print_head(&image, opt.verbose);
  println!();
  print_btrees(&image, opt.verbose);

  let (folders, files) = image.catalog_counts();
  println!("\nCatalog: {folders} folders, {files} files");
  Ok(())
}

fn print_head(image: &Image, verbose: bool) {
  let vb = &image.volume_begins;
  let sb = &image.super_block;
  let exsb = &image.ext_super_block;
  if verbose {
    println!("{vb:?}\n{sb:?}\n{:?}\n{exsb:?}", image.super_block_copy);
  }

  println!("VB: Layout version: {}", vb.layout_version_str());
  println!("VB: Created by: {}", vb.creator_username_str());
  println!("VB: Command line: {}", vb.command_line_str());

  if image.superblocks_match() {
    println!("\nTwo superblocks the same!");
  } else {
    println!("\nTwo superblocks differ!");
  }
  println!("SB: Volume name: {}", sb.volume_name_str());
  println!("SB: Log block size: {}", sb.log_block_size);
  println!("SB: Block size: {}", image.block_size());
  println!("SB: Max block count: {}", sb.maximum_blocks_count());
  println!("SB: Image inode count: {}", sb.image_inode_count());

  println!("\nEXSB: Files count: {}", exsb.files_count.get());
  println!("EXSB: Folders count: {}", exsb.folders_count.get());
  println!("EXSB: Volume start block: {}", exsb.volume_start_block.get());
  println!("EXSB: Volume length blocks: {}", exsb.volume_length_blocks.get());

  let areas = [
    (
      "DEBUG AREA",
      exsb.debug_area_start_block.get(),
      exsb.debug_area_length_blocks.get(),
    ),
    (
      "TABLES",
      exsb.tables_start_block.get(),
      exsb.tables_length_blocks.get(),
    ),
    (
      "BTREES",
      exsb.btrees_start_block.get(),
      exsb.btrees_length_blocks.get(),
    ),
  ];
  for (name, start, len) in areas {
    println!(
      "\nEXSB: {name} - Start: {start} ({})",
      image.offset_of(start)
    );
    println!("EXSB: {name} - Length: {len} ({})", image.offset_of(len));
  }

  if verbose {
    println!("{:?}", image.base_table);
  }
}

fn print_btrees(image: &Image, verbose: bool) {
  for block in &image.blocks {
    match block {
      BtreeBlock::FreeSpaceBitmap { block, offset } => {
        println!("BTREES BLOCK {block}, Offset: {offset} - Free space bitmap (fsmb)");
      }
      BtreeBlock::InodeBitmap { block, offset } => {
        println!("BTREES BLOCK {block}, Offset: {offset} - Inode bitmap (inob)");
      }
      BtreeBlock::Head { tree, head, .. } => {
        if verbose {
          println!("{head:?}");
        }
        println!(
          "\nBtree {} - Root bnode id: {}, Btree height: {}",
          tree.name(),
          head.root_bnode_id.get(),
          head.btree_height.get()
        );
      }
      BtreeBlock::Node { descr, records, .. } => {
        if verbose {
          println!("{descr:?}");
        }
        println!(
          "- Bnode {} - Type: {}, Record count: {}",
          descr.node_id.get(),
          descr.node_type.get(),
          descr.recs_count.get()
        );
        for (i, record) in records.iter().enumerate() {
          if verbose {
            println!("{record:?}");
          }
          println!(
            "-- KEY {i} - Object ID: {}, Parent ID: {}, Type: {}({}), Name: {}",
            record.head.object_id(),
            record.head.parent_id(),
            record.head.record_type,
            record.record_type().name(),
            record.name_str()
          );
        }
      }
    }
  }

  match image.end {
    WalkEnd::Length { block } => println!("\nReach end of btrees (block {block})"),
    WalkEnd::Marker { block, offset } => {
      println!("\nBTREES BLOCK {block}, Offset: {offset} - End of btrees blocks")
    }
  }
}
