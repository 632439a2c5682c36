pub mod block;
pub mod catalog;
pub mod container;

pub use block::{encode_block, IconBlock};
pub use catalog::{icns_catalog, resolve_iconset, IconSpec, IconTag, Resolution, ResolvedEntry};
pub use container::{
    encode_container, pack_iconset, parse_container, read_container, write_container, PackError,
    PackReport, ParseError,
};
