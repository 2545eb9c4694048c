//! Disk-backed node storage with buffered writes.
//!
//! Nodes are serialized with bincode into variable-length records appended
//! past a fixed-size header page. A directory mapping node identifiers to
//! record locations is written out at every flush, together with the header
//! pointing at it. Writes are staged in a bounded [`WriteBuffer`]; the
//! oldest buffered node is written through when the buffer fills, and
//! `flush` is the only durability checkpoint.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::grid_constants::{DEFAULT_BUFFER_NODES, HEADER_SIZE, MAGIC, VERSION};
use super::grid_node::Node;
use super::grid_types::{decode, encode, GridError, GridResult, NodeId};
use super::storage::{Storage, StorageProperties};
use super::write_buffer::WriteBuffer;

/// Location of a node record in the index file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecordLocation {
    pub offset: u64,
    pub len: u64,
}

/// Header stored in the first page of the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskHeader {
    pub magic: u32,
    pub version: u32,
    pub directory_offset: u64,
    pub directory_len: u64,
    pub record_count: u64,
}

impl DiskHeader {
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            directory_offset: 0,
            directory_len: 0,
            record_count: 0,
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.magic != MAGIC {
            return Err(GridError::InvalidConfiguration(
                "invalid index file (bad magic)".into(),
            ));
        }
        if self.version != VERSION {
            return Err(GridError::InvalidConfiguration(format!(
                "unsupported index file version {}",
                self.version
            )));
        }
        Ok(())
    }
}

impl Default for DiskHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw file layer: one fixed-size header page plus appended records.
struct DiskFile {
    file: RwLock<File>,
    path: PathBuf,
}

impl DiskFile {
    fn create(path: &Path) -> GridResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: RwLock::new(file),
            path: path.to_path_buf(),
        })
    }

    fn open(path: &Path) -> GridResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file: RwLock::new(file),
            path: path.to_path_buf(),
        })
    }

    fn read_header(&self) -> GridResult<DiskHeader> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;
        let mut buffer = vec![0u8; HEADER_SIZE];
        file.read_exact(&mut buffer)?;
        decode(&buffer)
    }

    fn write_header(&self, header: &DiskHeader) -> GridResult<()> {
        let bytes = encode(header)?;
        let mut padded = bytes;
        padded.resize(HEADER_SIZE, 0);

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&padded)?;
        Ok(())
    }

    /// Appends raw bytes at the end of the file, returning their offset.
    fn append(&self, bytes: &[u8]) -> GridResult<u64> {
        let mut file = self.file.write();
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(bytes)?;
        Ok(offset)
    }

    fn read_at(&self, location: RecordLocation) -> GridResult<Vec<u8>> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(location.offset))?;
        let mut buffer = vec![0u8; location.len as usize];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn truncate(&self) -> GridResult<()> {
        let file = self.file.write();
        file.set_len(0)?;
        Ok(())
    }

    fn sync(&self) -> GridResult<()> {
        self.file.write().sync_all()?;
        Ok(())
    }
}

/// Counters for the disk backend
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStorageStats {
    pub buffered_nodes: u64,
    pub buffer_hits: u64,
    pub buffer_misses: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
}

/// File-backed node storage batching I/O through a write buffer.
pub struct BufferedDiskStorage {
    file: DiskFile,
    buffer: WriteBuffer,
    directory: HashMap<NodeId, RecordLocation>,
    header: DiskHeader,
    buffer_hits: u64,
    buffer_misses: u64,
    disk_reads: u64,
    disk_writes: u64,
}

impl BufferedDiskStorage {
    /// Creates a fresh index file, truncating anything already at `path`.
    pub fn create(path: impl AsRef<Path>) -> GridResult<Self> {
        Self::create_with_buffer(path, DEFAULT_BUFFER_NODES)
    }

    /// Create with a custom write buffer capacity (number of nodes)
    pub fn create_with_buffer(path: impl AsRef<Path>, buffer_nodes: usize) -> GridResult<Self> {
        let file = DiskFile::create(path.as_ref())?;
        let header = DiskHeader::new();
        file.write_header(&header)?;
        file.sync()?;
        debug!("created index file at {:?}", path.as_ref());

        Ok(Self {
            file,
            buffer: WriteBuffer::new(buffer_nodes),
            directory: HashMap::new(),
            header,
            buffer_hits: 0,
            buffer_misses: 0,
            disk_reads: 0,
            disk_writes: 0,
        })
    }

    /// Reopens an existing index file, reading only its header and
    /// directory. Node records stay on disk until retrieved.
    pub fn open(path: impl AsRef<Path>) -> GridResult<Self> {
        Self::open_with_buffer(path, DEFAULT_BUFFER_NODES)
    }

    /// Open with a custom write buffer capacity
    pub fn open_with_buffer(path: impl AsRef<Path>, buffer_nodes: usize) -> GridResult<Self> {
        let file = DiskFile::open(path.as_ref())?;
        let header = file.read_header()?;
        header.validate()?;

        let directory = if header.directory_len > 0 {
            let bytes = file.read_at(RecordLocation {
                offset: header.directory_offset,
                len: header.directory_len,
            })?;
            let entries: Vec<(NodeId, RecordLocation)> = decode(&bytes)?;
            entries.into_iter().collect()
        } else {
            HashMap::new()
        };
        debug!(
            "opened index file at {:?}: {} records",
            path.as_ref(),
            directory.len()
        );

        Ok(Self {
            file,
            buffer: WriteBuffer::new(buffer_nodes),
            directory,
            header,
            buffer_hits: 0,
            buffer_misses: 0,
            disk_reads: 0,
            disk_writes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn stats(&self) -> DiskStorageStats {
        DiskStorageStats {
            buffered_nodes: self.buffer.len() as u64,
            buffer_hits: self.buffer_hits,
            buffer_misses: self.buffer_misses,
            disk_reads: self.disk_reads,
            disk_writes: self.disk_writes,
        }
    }

    /// Appends a node record and points the directory at it. The previous
    /// record, if any, becomes garbage until the file is recreated.
    fn write_record(&mut self, node: &Node) -> GridResult<()> {
        let bytes = encode(node)?;
        let offset = self.file.append(&bytes)?;
        self.directory.insert(
            node.id().clone(),
            RecordLocation {
                offset,
                len: bytes.len() as u64,
            },
        );
        self.disk_writes += 1;
        Ok(())
    }

    /// Writes through the oldest buffered nodes until an insert fits.
    fn evict_for_space(&mut self) -> GridResult<()> {
        while self.buffer.needs_eviction() {
            match self.buffer.evict_oldest() {
                Some((id, node, dirty)) => {
                    if dirty {
                        trace!("write buffer full, writing through {}", id);
                        self.write_record(&node)?;
                    }
                }
                None => break,
            }
        }
        Ok(())
    }
}

impl Storage for BufferedDiskStorage {
    fn store(&mut self, node: &Node) -> GridResult<()> {
        self.evict_for_space()?;
        self.buffer.insert(node.clone(), true);
        Ok(())
    }

    fn retrieve(&mut self, id: &NodeId) -> GridResult<Option<Node>> {
        if let Some(node) = self.buffer.get(id) {
            self.buffer_hits += 1;
            return Ok(Some(node.clone()));
        }
        self.buffer_misses += 1;

        let location = match self.directory.get(id) {
            Some(location) => *location,
            None => return Ok(None),
        };
        let bytes = self.file.read_at(location)?;
        self.disk_reads += 1;
        let node: Node = decode(&bytes)?;

        self.evict_for_space()?;
        self.buffer.insert(node.clone(), false);
        Ok(Some(node))
    }

    fn remove(&mut self, id: &NodeId) -> GridResult<()> {
        self.buffer.remove(id);
        self.directory.remove(id);
        Ok(())
    }

    fn flush(&mut self) -> GridResult<()> {
        for id in self.buffer.dirty_ids() {
            let node = match self.buffer.get(&id) {
                Some(node) => node.clone(),
                None => continue,
            };
            self.write_record(&node)?;
            self.buffer.mark_clean(&id);
        }

        let entries: Vec<(NodeId, RecordLocation)> = self
            .directory
            .iter()
            .map(|(id, location)| (id.clone(), *location))
            .collect();
        let bytes = encode(&entries)?;
        self.header.directory_offset = self.file.append(&bytes)?;
        self.header.directory_len = bytes.len() as u64;
        self.header.record_count = self.directory.len() as u64;
        self.file.write_header(&self.header)?;
        self.file.sync()?;
        debug!("flushed {} records to {:?}", self.directory.len(), self.path());
        Ok(())
    }

    fn clear(&mut self) -> GridResult<()> {
        self.buffer.clear();
        self.directory.clear();
        self.header = DiskHeader::new();
        self.file.truncate()?;
        self.file.write_header(&self.header)?;
        self.file.sync()?;
        Ok(())
    }

    fn properties(&self) -> StorageProperties {
        StorageProperties::BufferedDisk {
            path: self.file.path.clone(),
            buffer_nodes: self.buffer.capacity(),
        }
    }
}
