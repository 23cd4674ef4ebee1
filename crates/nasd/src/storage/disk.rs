//! Capability-scoped file operations on one user's directory.

use std::fs;
use std::io::{self, Read, Write};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, File};
use tracing::{debug, warn};

use nas_protocol::{
    DirectoryEntry, DirectoryListing, Framed, Response, TRANSFER_CHUNK_BYTES,
};

use super::{STORAGE_TARGET, SafePath, StorageError, TransferError};

const CHUNK_BYTES: u64 = TRANSFER_CHUNK_BYTES as u64;

static UPLOAD_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Name prefix of in-flight upload files. Such entries are neither listed
/// nor counted as used space; the quota ledger accounts for them instead.
const PARTIAL_PREFIX: &str = ".nasd-upload-";

/// One user's root directory, opened as a capability.
#[derive(Debug)]
pub struct DiskStorage {
    root: Dir,
    root_path: Utf8PathBuf,
}

impl DiskStorage {
    /// Opens `<base>/<username>`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUsername`] when `username` is not a
    /// single plain path component, or [`StorageError::OpenRoot`] when the
    /// directory cannot be created or opened.
    pub fn open_root(base: &Utf8Path, username: &str) -> Result<Self, StorageError> {
        if !is_plain_component(username) {
            return Err(StorageError::InvalidUsername {
                username: username.to_owned(),
            });
        }
        let root_path = base.join(username);
        fs::create_dir_all(&root_path).map_err(|source| StorageError::OpenRoot {
            path: root_path.clone(),
            source,
        })?;
        let root = Dir::open_ambient_dir(&root_path, ambient_authority()).map_err(|source| {
            StorageError::OpenRoot {
                path: root_path.clone(),
                source,
            }
        })?;
        Ok(Self { root, root_path })
    }

    /// Absolute path of the user's root directory.
    #[must_use]
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    /// Creates `path` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on failure.
    pub fn create_directory(&self, path: &SafePath) -> Result<(), StorageError> {
        self.root
            .create_dir_all(path.as_dir_path())
            .map_err(|source| StorageError::io("create directory", path.as_path(), source))
    }

    /// Deletes a file, or a directory and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when `path` is missing or cannot be
    /// removed.
    pub fn delete(&self, path: &SafePath) -> Result<(), StorageError> {
        let target = path.as_dir_path();
        let metadata = self
            .root
            .symlink_metadata(target)
            .map_err(|source| StorageError::io("inspect", path.as_path(), source))?;
        let removed = if metadata.is_dir() {
            self.root.remove_dir_all(target)
        } else {
            self.root.remove_file(target)
        };
        removed.map_err(|source| StorageError::io("delete", path.as_path(), source))
    }

    /// Moves `from` to `to`, replacing an existing file at `to`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on failure.
    pub fn rename(&self, from: &SafePath, to: &SafePath) -> Result<(), StorageError> {
        self.root
            .rename(from.as_dir_path(), &self.root, to.as_dir_path())
            .map_err(|source| StorageError::io("rename", from.as_path(), source))
    }

    /// Lists the entries of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when `path` is not a readable directory.
    pub fn list_directory(&self, path: &SafePath) -> Result<DirectoryListing, StorageError> {
        let read_error = |source| StorageError::io("list", path.as_path(), source);
        let entries = if path.is_root() {
            self.root.entries()
        } else {
            self.root.read_dir(path.as_dir_path())
        }
        .map_err(read_error)?;

        let mut listed = Vec::new();
        for listed_entry in entries {
            let entry = listed_entry.map_err(read_error)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_partial_upload(&name) {
                continue;
            }
            let file_type = entry.file_type().map_err(read_error)?;
            if file_type.is_dir() {
                listed.push(DirectoryEntry::directory(name));
            } else {
                let size = entry.metadata().map_err(read_error)?.len();
                listed.push(DirectoryEntry::file(name, size));
            }
        }
        Ok(DirectoryListing::new(listed))
    }

    /// Total size of the regular files under the root. Symlinks are not
    /// followed and in-flight uploads are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when a directory cannot be read.
    pub fn used_bytes(&self) -> Result<u64, StorageError> {
        sum_file_sizes(&self.root, Utf8Path::new(""))
    }

    /// Receives exactly `size` bytes of data frames and stores them at `path`.
    ///
    /// Bytes land in a temporary file next to the target, which is renamed
    /// into place once every byte has arrived. If the local write fails the
    /// remaining bytes are still read so the connection stays in sync, and
    /// the error is returned as [`TransferError::Storage`].
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Storage`] for local failures; any other
    /// variant means the connection must be closed.
    pub fn receive_upload<S: Read + Write>(
        &self,
        framed: &mut Framed<S>,
        path: &SafePath,
        size: u64,
    ) -> Result<u64, TransferError> {
        let mut sink = self.open_sink(path);
        let mut remaining = size;
        while remaining > 0 {
            let frame = framed
                .read_frame()?
                .ok_or(TransferError::Closed { remaining })?;
            let len = byte_len(&frame);
            if len > remaining {
                if let Ok(open) = &sink {
                    self.discard(open);
                }
                return Err(TransferError::Overrun { len, remaining });
            }
            remaining -= len;

            if let Ok(open) = &mut sink
                && let Err(source) = open.file.write_all(&frame)
            {
                self.discard(open);
                sink = Err(StorageError::io("write", path.as_path(), source));
            }
        }

        let open = sink?;
        self.commit(open, path)?;
        debug!(
            target: STORAGE_TARGET,
            root = %self.root_path,
            path = %path.as_path(),
            bytes = size,
            "upload stored"
        );
        Ok(size)
    }

    /// Sends the file at `path`: a success response carrying the decimal size,
    /// then the content as data frames.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Storage`] when the file cannot be opened; no
    /// frame has been written in that case. Any other variant means the
    /// connection must be closed.
    pub fn send_download<S: Read + Write>(
        &self,
        framed: &mut Framed<S>,
        path: &SafePath,
    ) -> Result<u64, TransferError> {
        let (mut file, size) = self.open_source(path)?;
        let header = Response::success(size.to_string()).encode()?;
        framed.write_frame(&header)?;

        let mut sent = 0_u64;
        while sent < size {
            let want = (size - sent).min(CHUNK_BYTES);
            let mut chunk = Vec::new();
            let read = (&mut file)
                .take(want)
                .read_to_end(&mut chunk)
                .and_then(|read| {
                    if read == 0 {
                        Err(io::Error::from(io::ErrorKind::UnexpectedEof))
                    } else {
                        Ok(read)
                    }
                });
            if let Err(source) = read {
                return Err(TransferError::SourceFailed {
                    path: path.as_path().to_path_buf(),
                    sent,
                    size,
                    source,
                });
            }
            framed.write_frame(&chunk)?;
            sent += byte_len(&chunk);
        }
        debug!(
            target: STORAGE_TARGET,
            root = %self.root_path,
            path = %path.as_path(),
            bytes = size,
            "download sent"
        );
        Ok(size)
    }

    fn open_source(&self, path: &SafePath) -> Result<(File, u64), StorageError> {
        let metadata = self
            .root
            .metadata(path.as_dir_path())
            .map_err(|source| StorageError::io("inspect", path.as_path(), source))?;
        if !metadata.is_file() {
            return Err(StorageError::NotAFile {
                path: path.as_path().to_path_buf(),
            });
        }
        let file = self
            .root
            .open(path.as_dir_path())
            .map_err(|source| StorageError::io("open", path.as_path(), source))?;
        Ok((file, metadata.len()))
    }

    fn open_sink(&self, path: &SafePath) -> Result<UploadSink, StorageError> {
        let Some((parent, name)) = path.split_parent() else {
            return Err(StorageError::io(
                "upload to",
                path.as_path(),
                io::Error::from(io::ErrorKind::IsADirectory),
            ));
        };
        if !parent.as_str().is_empty() {
            self.root
                .create_dir_all(parent)
                .map_err(|source| StorageError::io("create directory", parent, source))?;
        }
        let sequence = UPLOAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let temp = parent.join(format!(
            "{PARTIAL_PREFIX}{}-{sequence}-{name}",
            process::id()
        ));
        let file = self
            .root
            .create(&temp)
            .map_err(|source| StorageError::io("create", temp.clone(), source))?;
        Ok(UploadSink { file, temp })
    }

    fn commit(&self, mut sink: UploadSink, path: &SafePath) -> Result<(), StorageError> {
        let flushed = sink.file.flush().and_then(|()| sink.file.sync_all());
        if let Err(source) = flushed {
            self.discard(&sink);
            return Err(StorageError::io("write", path.as_path(), source));
        }
        if let Err(source) = self.root.rename(&sink.temp, &self.root, path.as_dir_path()) {
            self.discard(&sink);
            return Err(StorageError::io("store", path.as_path(), source));
        }
        Ok(())
    }

    fn discard(&self, sink: &UploadSink) {
        if let Err(error) = self.root.remove_file(&sink.temp)
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: STORAGE_TARGET,
                root = %self.root_path,
                temp = %sink.temp,
                error = %error,
                "failed to remove partial upload"
            );
        }
    }
}

#[derive(Debug)]
struct UploadSink {
    file: File,
    temp: Utf8PathBuf,
}

fn sum_file_sizes(dir: &Dir, display: &Utf8Path) -> Result<u64, StorageError> {
    let scan_error = |source| StorageError::io("scan", display, source);
    let mut total = 0_u64;
    for scanned in dir.entries().map_err(scan_error)? {
        let entry = scanned.map_err(scan_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_partial_upload(&name) {
            continue;
        }
        let file_type = entry.file_type().map_err(scan_error)?;
        if file_type.is_dir() {
            let child = entry.open_dir().map_err(scan_error)?;
            total = total.saturating_add(sum_file_sizes(&child, &display.join(name))?);
        } else if file_type.is_file() {
            total = total.saturating_add(entry.metadata().map_err(scan_error)?.len());
        }
    }
    Ok(total)
}

fn is_partial_upload(name: &str) -> bool {
    name.starts_with(PARTIAL_PREFIX)
}

fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn byte_len(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}
