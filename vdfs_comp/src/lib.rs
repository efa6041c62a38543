#![cfg_attr(docsrs, feature(doc_cfg))]

mod codec;
mod conf;
mod consts;
mod decode;
mod error;
mod extent;
mod foot;
pub mod image;
mod pack;
mod read;

pub use codec::{dec, enc};
pub use conf::{Conf, Config, default};
pub use consts::{EXTENT_MAGIC, EXTENT_SIZE, FOOT_SIZE, LAYOUT_VERSION, ZLIB_MAGIC};
pub use decode::{Chunks, Decoder, decode, decode_to};
pub use error::{Error, ErrorKind, Result};
pub use extent::{Extent, Kind};
pub use foot::{Algo, CompFileDescr};
pub use image::{Image, inspect};
pub use pack::{pack, pack_at};
