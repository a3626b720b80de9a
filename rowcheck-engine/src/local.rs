//! Local filesystem engine.
//!
//! Writes partitioned delimited datasets with a staging-and-rename commit and
//! a `_SUCCESS` marker, and reads files or whole directories back in fixed
//! size blocks, optionally through the [`BlockCache`].

use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    cache::{BlockCache, BlockKey, CacheStats},
    conf::{SessionConf, IO_CACHE_ENABLED},
    error::{EngineError, EngineResult},
    format::{encode_row, split_fields, LineSplitter, ReadOptions, WriteOptions},
    frame::Schema,
    traits::{Engine, RowSink},
    types::{PartSummary, ScanSummary, WriteSummary},
};

/// Name of the completion marker written after a successful commit.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

const TEMPORARY_DIR: &str = "_temporary";

/// Tuning for [`LocalEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEngineOptions {
    /// Read block size in bytes
    pub block_size: u64,
    /// Read cache capacity in bytes
    pub cache_capacity_bytes: u64,
}

impl Default for LocalEngineOptions {
    fn default() -> Self {
        Self { block_size: 4 * 1024 * 1024, cache_capacity_bytes: 1024 * 1024 * 1024 }
    }
}

/// Engine over the local filesystem
#[derive(Debug)]
pub struct LocalEngine {
    conf: SessionConf,
    options: LocalEngineOptions,
    cache: BlockCache,
}

impl LocalEngine {
    /// Engine reading its flags from `conf`
    pub fn new(conf: SessionConf, options: LocalEngineOptions) -> Self {
        let options = LocalEngineOptions { block_size: options.block_size.max(1), ..options };
        Self { conf, cache: BlockCache::new(options.cache_capacity_bytes), options }
    }

    /// Engine with an empty session and default tuning
    pub fn with_defaults() -> Self {
        Self::new(SessionConf::new(), LocalEngineOptions::default())
    }

    fn cache_enabled(&self) -> bool {
        self.conf.get_bool(IO_CACHE_ENABLED, false)
    }

    /// Data files behind `path`: the file itself, or the directory's regular
    /// files not starting with `_` or `.`, in name order.
    async fn data_files(&self, path: &Path) -> EngineResult<Vec<PathBuf>> {
        let metadata = fs::metadata(path).await.map_err(|e| EngineError::io("stat", path, e))?;
        if metadata.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut entries =
            fs::read_dir(path).await.map_err(|e| EngineError::io("list", path, e))?;
        let mut files = Vec::new();
        while let Some(entry) =
            entries.next_entry().await.map_err(|e| EngineError::io("list", path, e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('_') || name.starts_with('.') {
                continue;
            }

            let file_type =
                entry.file_type().await.map_err(|e| EngineError::io("stat", entry.path(), e))?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    async fn write_parts(
        &self,
        staging: &Path,
        job_id: Uuid,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<Vec<PartSummary>> {
        let header_line = if options.header {
            let mut line = String::new();
            encode_row(header, options.separator, &mut line)
                .map_err(|reason| EngineError::Unsupported { reason: format!("header {reason}") })?;
            Some(line)
        } else {
            None
        };

        let mut parts = Vec::new();
        let mut buffer = String::new();
        let mut current = PartWriter::create(staging, 0, job_id, header_line.as_deref()).await?;

        for row in rows {
            if current.rows >= options.rows_per_file {
                let next =
                    PartWriter::create(staging, parts.len() + 1, job_id, header_line.as_deref())
                        .await?;
                parts.push(std::mem::replace(&mut current, next).finish().await?);
            }

            buffer.clear();
            encode_row(&row, options.separator, &mut buffer).map_err(|reason| {
                EngineError::Unsupported { reason: format!("row {}: {reason}", current.rows + 1) }
            })?;
            current.write_line(&buffer).await?;
        }

        parts.push(current.finish().await?);
        Ok(parts)
    }

    /// Stage, write and commit one job. On any failure the destination is
    /// removed so no partial dataset is left behind.
    async fn run_job(
        &self,
        path: &Path,
        job_id: Uuid,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<Vec<PartSummary>> {
        let result = self.stage_and_commit(path, job_id, header, rows, options).await;
        if result.is_err() {
            match fs::remove_dir_all(path).await {
                Ok(()) => debug!(path = %path.display(), "Removed incomplete write"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove incomplete write")
                },
            }
        }
        result
    }

    async fn stage_and_commit(
        &self,
        path: &Path,
        job_id: Uuid,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<Vec<PartSummary>> {
        let staging = path.join(TEMPORARY_DIR).join(job_id.to_string());
        fs::create_dir_all(&staging).await.map_err(|e| EngineError::io("mkdir", &staging, e))?;

        let parts = self.write_parts(&staging, job_id, header, rows, options).await?;
        self.commit(&staging, path, &parts).await?;
        Ok(parts)
    }

    async fn commit(&self, staging: &Path, dest: &Path, parts: &[PartSummary]) -> EngineResult<()> {
        for part in parts {
            let from = staging.join(&part.name);
            let to = dest.join(&part.name);
            fs::rename(&from, &to).await.map_err(|e| EngineError::io("rename", &from, e))?;
        }

        let temporary = dest.join(TEMPORARY_DIR);
        fs::remove_dir_all(&temporary)
            .await
            .map_err(|e| EngineError::io("remove", &temporary, e))?;

        let marker = dest.join(SUCCESS_MARKER);
        let file = File::create(&marker).await.map_err(|e| EngineError::io("create", &marker, e))?;
        file.sync_all().await.map_err(|e| EngineError::io("sync", &marker, e))?;
        Ok(())
    }

    async fn scan_file(
        &self,
        path: &Path,
        options: &ReadOptions,
        use_cache: bool,
        schema: &mut Option<Schema>,
        sink: &mut dyn RowSink,
        summary: &mut ScanSummary,
    ) -> EngineResult<()> {
        let metadata = fs::metadata(path).await.map_err(|e| EngineError::io("stat", path, e))?;
        let file_len = metadata.len();
        let modified = metadata.modified().ok();
        let block_size = self.options.block_size;

        let mut handle = File::open(path).await.map_err(|e| EngineError::io("open", path, e))?;
        let mut splitter = LineSplitter::new();
        let mut state = FileScan {
            path,
            separator: options.separator,
            expect_header: options.header,
            schema,
            sink,
            rows: 0,
        };

        let block_count = file_len.div_ceil(block_size);
        for index in 0..block_count {
            let offset = index * block_size;
            let len = block_size.min(file_len - offset);
            let key = BlockKey { path: path.to_path_buf(), file_len, modified, index };

            let cached = if use_cache { self.cache.get(&key) } else { None };
            let block = match cached {
                Some(block) => block,
                None => {
                    let block = read_block(&mut handle, path, offset, len).await?;
                    if use_cache {
                        self.cache.insert(key, block.clone());
                    }
                    block
                },
            };

            summary.bytes_read += block.len() as u64;
            splitter.push(&block, |line_no, line| state.on_line(line_no, line))?;
        }
        splitter.finish(|line_no, line| state.on_line(line_no, line))?;

        debug!(path = %path.display(), rows = state.rows, cached = use_cache, "Scanned file");
        summary.files_read += 1;
        summary.rows_read += state.rows;
        Ok(())
    }
}

#[async_trait]
impl Engine for LocalEngine {
    fn conf(&self) -> &SessionConf {
        &self.conf
    }

    async fn write_delimited(
        &self,
        path: &Path,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<WriteSummary> {
        if options.rows_per_file == 0 {
            return Err(EngineError::Unsupported { reason: "rows_per_file must be > 0".into() });
        }
        if matches!(options.separator, '"' | '\n' | '\r') {
            return Err(EngineError::Unsupported {
                reason: format!("separator {:?}", options.separator),
            });
        }
        if fs::try_exists(path).await.map_err(|e| EngineError::io("stat", path, e))? {
            return Err(EngineError::AlreadyExists { path: path.to_path_buf() });
        }

        let parts = self.run_job(path, Uuid::new_v4(), header, rows, options).await?;

        let rows_written = parts.iter().map(|p| p.rows).sum();
        info!(
            path = %path.display(),
            rows = rows_written,
            parts = parts.len(),
            "Committed delimited dataset"
        );
        Ok(WriteSummary { rows_written, parts })
    }

    async fn scan(
        &self,
        path: &Path,
        options: &ReadOptions,
        sink: &mut dyn RowSink,
    ) -> EngineResult<ScanSummary> {
        let files = self.data_files(path).await?;
        let use_cache = self.cache_enabled();
        let mut schema = None;
        let mut summary = ScanSummary::default();

        for file in &files {
            self.scan_file(file, options, use_cache, &mut schema, sink, &mut summary).await?;
        }

        debug!(
            path = %path.display(),
            files = summary.files_read,
            rows = summary.rows_read,
            cached = use_cache,
            "Scan complete"
        );
        Ok(summary)
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache.stats())
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Per-file line handling during a scan
struct FileScan<'a> {
    path: &'a Path,
    separator: char,
    expect_header: bool,
    schema: &'a mut Option<Schema>,
    sink: &'a mut dyn RowSink,
    rows: u64,
}

impl FileScan<'_> {
    fn on_line(&mut self, line_no: u64, raw: &[u8]) -> EngineResult<()> {
        let line = std::str::from_utf8(raw).map_err(|e| EngineError::Malformed {
            path: self.path.to_path_buf(),
            line: line_no,
            reason: e.to_string(),
        })?;
        if line.is_empty() {
            return Ok(());
        }

        let fields = split_fields(line, self.separator);
        if self.expect_header {
            self.expect_header = false;
            if self.schema.is_none() {
                let schema = Schema::new(fields.iter().map(|f| f.to_string()).collect());
                self.sink.on_schema(&schema)?;
                *self.schema = Some(schema);
            }
            return Ok(());
        }

        if self.schema.is_none() {
            let schema = Schema::positional(fields.len());
            self.sink.on_schema(&schema)?;
            *self.schema = Some(schema);
        }

        self.sink.accept(&fields)?;
        self.rows += 1;
        Ok(())
    }
}

/// One part file being written inside the staging directory
struct PartWriter {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    rows: u64,
    bytes: u64,
}

impl PartWriter {
    async fn create(
        dir: &Path,
        index: usize,
        job_id: Uuid,
        header: Option<&str>,
    ) -> EngineResult<Self> {
        let name = format!("part-{index:05}-{job_id}-c000.csv");
        let path = dir.join(&name);
        let file = File::create(&path).await.map_err(|e| EngineError::io("create", &path, e))?;

        let mut part = Self { name, path, writer: BufWriter::new(file), rows: 0, bytes: 0 };
        if let Some(header) = header {
            part.write_raw(header).await?;
        }
        Ok(part)
    }

    async fn write_raw(&mut self, line: &str) -> EngineResult<()> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| EngineError::io("write", &self.path, e))?;
        self.bytes += line.len() as u64;
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> EngineResult<()> {
        self.write_raw(line).await?;
        self.rows += 1;
        Ok(())
    }

    async fn finish(mut self) -> EngineResult<PartSummary> {
        self.writer.flush().await.map_err(|e| EngineError::io("flush", &self.path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .await
            .map_err(|e| EngineError::io("sync", &self.path, e))?;
        Ok(PartSummary { name: self.name, rows: self.rows, bytes: self.bytes })
    }
}

async fn read_block(file: &mut File, path: &Path, offset: u64, len: u64) -> EngineResult<Bytes> {
    file.seek(SeekFrom::Start(offset)).await.map_err(|e| EngineError::io("seek", path, e))?;

    let len = usize::try_from(len).map_err(|_| EngineError::Unsupported {
        reason: format!("block of {len} bytes exceeds addressable memory"),
    })?;
    let mut buffer = vec![0u8; len];
    file.read_exact(&mut buffer).await.map_err(|e| EngineError::io("read", path, e))?;
    Ok(Bytes::from(buffer))
}
