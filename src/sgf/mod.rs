//! SGF (Smart Game Format) game-record support
//!
//! The ingestion pipeline talks to parsers through the
//! [`RecordParser`](crate::extract::RecordParser) and
//! [`GameTreeInfo`](crate::extract::GameTreeInfo) traits. This module is the
//! built-in implementation for SGF collections: it reads root-node metadata
//! (`PB`, `PW`, `DT`, `RE`) and ignores move content.

pub mod date;
pub mod parser;

pub use date::{DateError, FuzzyDate};
pub use parser::{parse_collection, SgfError, SgfGameTree, SgfParser};
