// src/process/mod.rs
pub mod continuation;
pub mod date_parser;
pub mod header;
pub mod normalize;
pub mod raw_table;
pub mod table;
pub mod typing;
pub mod utils;

pub use header::{locate_header, HeaderSearch};
pub use raw_table::RawTable;
pub use table::Table;
