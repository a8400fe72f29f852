use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{TEST_FILE_BASE, TEST_FILE_EXT};

/// Cross-platform disk I/O operations trait
pub trait DiskIO: Send + Sync {
    /// Open (creating if needed) a data file for read-write block access.
    /// Existing contents are kept; block offsets decide what is overwritten.
    fn open_for_write(&self, path: &Path, write_sync: bool) -> io::Result<Box<dyn BlockFile>>;

    /// Open an existing data file read-only
    fn open_for_read(&self, path: &Path) -> io::Result<Box<dyn BlockFile>>;

    /// Describe the storage backing `dir`
    fn disk_info(&self, dir: &Path) -> String {
        describe_disk(dir)
    }
}

/// Positioned whole-block operations on an open data file
pub trait BlockFile: Send {
    /// Seek to `offset` and write all of `buf`
    fn write_block_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Seek to `offset` and fill all of `buf`
    fn read_block_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

/// Data file path for `mark_number`: one fixed file in single-file mode,
/// `testdata<mark>.jdm` in multi-file mode.
pub fn test_file_path(data_dir: &Path, multi_file: bool, mark_number: u32) -> PathBuf {
    if multi_file {
        data_dir.join(format!("{}{}.{}", TEST_FILE_BASE, mark_number, TEST_FILE_EXT))
    } else {
        data_dir.join(format!("{}.{}", TEST_FILE_BASE, TEST_FILE_EXT))
    }
}

/// `std::fs::File` based block file
pub struct StdBlockFile {
    file: File,
    sync_each_write: bool,
}

impl StdBlockFile {
    pub fn new(file: File, sync_each_write: bool) -> Self {
        Self {
            file,
            sync_each_write,
        }
    }
}

impl BlockFile for StdBlockFile {
    fn write_block_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        if self.sync_each_write {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn read_block_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }
}

/// Platform-specific disk I/O implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformDiskIO;

impl PlatformDiskIO {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_FLAG_WRITE_THROUGH: u32 = 0x80000000;

    impl DiskIO for PlatformDiskIO {
        fn open_for_write(&self, path: &Path, write_sync: bool) -> io::Result<Box<dyn BlockFile>> {
            let mut options = OpenOptions::new();
            options.read(true).write(true).create(true);
            if write_sync {
                options.custom_flags(FILE_FLAG_WRITE_THROUGH);
            }
            Ok(Box::new(StdBlockFile::new(options.open(path)?, false)))
        }

        fn open_for_read(&self, path: &Path) -> io::Result<Box<dyn BlockFile>> {
            let file = OpenOptions::new().read(true).open(path)?;
            Ok(Box::new(StdBlockFile::new(file, false)))
        }
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use std::os::unix::fs::OpenOptionsExt;

    impl DiskIO for PlatformDiskIO {
        fn open_for_write(&self, path: &Path, write_sync: bool) -> io::Result<Box<dyn BlockFile>> {
            if !write_sync {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(path)?;
                return Ok(Box::new(StdBlockFile::new(file, false)));
            }

            // Try O_DSYNC first, fall back to fdatasync after every block
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .custom_flags(libc::O_DSYNC)
                .open(path)
            {
                Ok(file) => Ok(Box::new(StdBlockFile::new(file, false))),
                Err(_) => {
                    let file = OpenOptions::new()
                        .read(true)
                        .write(true)
                        .create(true)
                        .open(path)?;
                    Ok(Box::new(StdBlockFile::new(file, true)))
                }
            }
        }

        fn open_for_read(&self, path: &Path) -> io::Result<Box<dyn BlockFile>> {
            let file = OpenOptions::new().read(true).open(path)?;
            Ok(Box::new(StdBlockFile::new(file, false)))
        }
    }
}

/// Mount source and filesystem of `dir` where the platform exposes them,
/// otherwise the absolute directory path.
pub fn describe_disk(dir: &Path) -> String {
    let absolute = dir
        .canonicalize()
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(dir)))
        .unwrap_or_else(|_| dir.to_path_buf());

    #[cfg(target_os = "linux")]
    {
        if let Ok(mounts) = std::fs::read_to_string("/proc/mounts") {
            if let Some(info) = mount_for(&mounts, &absolute) {
                return info;
            }
        }
    }

    absolute.display().to_string()
}

/// Longest mount point in a `/proc/mounts` listing that contains `path`
fn mount_for(mounts: &str, path: &Path) -> Option<String> {
    mounts
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let mount_point = Path::new(parts[1]);
            path.starts_with(mount_point)
                .then(|| (mount_point.as_os_str().len(), parts[0], parts[1], parts[2]))
        })
        .max_by_key(|(len, ..)| *len)
        .map(|(_, source, mount_point, fs_type)| {
            format!("{} ({}) on {}", source, fs_type, mount_point)
        })
}
