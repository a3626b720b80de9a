//! # Rowcheck Engine
//!
//! A small dataframe engine over the local filesystem. It persists row
//! streams as partitioned, delimited datasets and reads them back either one
//! file at a time or as a whole directory, optionally through a block read
//! cache controlled by the session flag [`IO_CACHE_ENABLED`].
//!
//! The harness drives it exclusively through the [`Engine`] and
//! [`FileSystem`] traits.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod conf;
pub mod error;
pub mod format;
pub mod frame;
pub mod fs;
pub mod local;
pub mod traits;
pub mod types;

pub use cache::{BlockCache, BlockKey, CacheStats};
pub use conf::{SessionConf, IO_CACHE_ENABLED};
pub use error::{EngineError, EngineResult};
pub use format::{ReadOptions, WriteOptions};
pub use frame::{CountSink, FilterEqSink, Frame, GroupCount, GroupCountSink, Schema};
pub use fs::LocalFileSystem;
pub use local::{LocalEngine, LocalEngineOptions, SUCCESS_MARKER};
pub use traits::{Engine, FileSystem, RowSink};
pub use types::{FileInfo, PartSummary, ScanSummary, WriteSummary};
