//! Order log partitioning
//!
//! Splits the order log into row-aligned chunk files inside a temporary
//! directory. Every chunk starts with a copy of the header so it can be
//! aggregated on its own. The directory lives as long as the returned
//! [`ChunkSet`] and is removed when it is closed or dropped.

use crate::config::ColumnNames;
use crate::error::{ReportError, ReportResult};
use crate::row::OrderColumns;
use csv::{ByteRecord, ReaderBuilder, Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Bytes added to the even share of the file so boundary rows don't spill into an extra chunk
pub const SPLIT_SLACK_BYTES: u64 = 1024;

const TEMP_DIR_PREFIX: &str = "deptstat-chunks-";

/// Body size at which a chunk is closed: `ceil(total / n)` plus slack
pub fn chunk_target_size(total_size: u64, chunks: NonZeroUsize) -> u64 {
    total_size.div_ceil(chunks.get() as u64) + SPLIT_SLACK_BYTES
}

/// One chunk file produced by the partitioner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub path: PathBuf,
    /// Data rows in the chunk, header excluded
    pub rows: u64,
    /// Bytes of the source file covered by the chunk's data rows
    pub source_bytes: u64,
}

/// Chunk files plus the temporary directory that owns them
#[derive(Debug)]
pub struct ChunkSet {
    dir: TempDir,
    chunks: Vec<Chunk>,
}

impl ChunkSet {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the chunk directory, reporting any failure
    ///
    /// Dropping the set also removes the directory but ignores errors.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

struct ChunkWriter {
    index: usize,
    path: PathBuf,
    writer: Writer<BufWriter<File>>,
    start: u64,
    rows: u64,
}

impl ChunkWriter {
    fn create(dir: &Path, index: usize, header: &ByteRecord, start: u64) -> ReportResult<Self> {
        let path = dir.join(format!("chunk_{index:04}.csv"));
        let file = File::create(&path).map_err(|e| ReportError::ChunkWrite {
            path: path.clone(),
            source: e,
        })?;
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_writer(BufWriter::new(file));
        writer
            .write_byte_record(header)
            .map_err(|e| chunk_write_error(&path, e))?;
        Ok(Self {
            index,
            path,
            writer,
            start,
            rows: 0,
        })
    }

    fn write(&mut self, record: &ByteRecord) -> ReportResult<()> {
        self.rows += 1;
        self.writer
            .write_byte_record(record)
            .map_err(|e| chunk_write_error(&self.path, e))
    }

    fn finish(mut self, end: u64) -> ReportResult<Chunk> {
        self.writer
            .flush()
            .map_err(|e| ReportError::ChunkWrite {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(Chunk {
            index: self.index,
            path: self.path,
            rows: self.rows,
            source_bytes: end - self.start,
        })
    }
}

fn chunk_write_error(path: &Path, error: csv::Error) -> ReportError {
    ReportError::ChunkWrite {
        path: path.to_path_buf(),
        source: error.into(),
    }
}

/// Split the order log at `path` into at most `chunks` row-aligned chunk files
///
/// Rows are appended to the current chunk until its data reaches the target
/// size, so a chunk always ends on a record boundary and every data row lands
/// in exactly one chunk. Small inputs produce fewer chunks; a log with no data
/// rows produces none. The header is checked for the configured columns
/// before any chunk is written. On error the partially written directory is
/// removed.
pub fn split_order_file(
    path: &Path,
    columns: &ColumnNames,
    chunks: NonZeroUsize,
    temp_root: Option<&Path>,
) -> ReportResult<ChunkSet> {
    let file = File::open(path).map_err(|e| ReportError::input_open(path, e))?;
    let total_size = file
        .metadata()
        .map_err(|e| ReportError::input_open(path, e))?
        .len();
    let target = chunk_target_size(total_size, chunks);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));
    let header = reader
        .byte_headers()
        .map_err(|e| ReportError::csv(path, e))?
        .clone();

    // An empty file has no header and no rows, which aggregates to nothing
    if !header.is_empty() {
        OrderColumns::resolve(&header, columns, path)?;
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_DIR_PREFIX);
    let dir = match temp_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(|e| ReportError::ChunkWrite {
        path: temp_root.map_or_else(std::env::temp_dir, Path::to_path_buf),
        source: e,
    })?;

    let mut finished = Vec::new();
    let mut current: Option<ChunkWriter> = None;
    let mut record = ByteRecord::new();
    loop {
        let start = reader.position().byte();
        if !reader
            .read_byte_record(&mut record)
            .map_err(|e| ReportError::csv(path, e))?
        {
            break;
        }
        let mut writer = match current.take() {
            Some(writer) => writer,
            None => ChunkWriter::create(dir.path(), finished.len(), &header, start)?,
        };
        writer.write(&record)?;

        let end = reader.position().byte();
        if end - writer.start >= target {
            finished.push(writer.finish(end)?);
        } else {
            current = Some(writer);
        }
    }
    if let Some(writer) = current.take() {
        finished.push(writer.finish(reader.position().byte())?);
    }

    info!(
        "Split {} ({} bytes) into {} chunks (target {} bytes per chunk)",
        path.display(),
        total_size,
        finished.len(),
        target
    );
    for chunk in &finished {
        debug!(
            "Chunk {} at {}: {} rows, {} bytes",
            chunk.index,
            chunk.path.display(),
            chunk.rows,
            chunk.source_bytes
        );
    }

    Ok(ChunkSet {
        dir,
        chunks: finished,
    })
}
