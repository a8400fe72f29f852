//! I/O operations module
//!
//! Block buffers, block placement, and the platform file access the
//! benchmark phases run on.

pub mod buffer;
pub mod disk;
pub mod placement;

pub use buffer::BlockBuffer;
pub use disk::{describe_disk, test_file_path, BlockFile, DiskIO, PlatformDiskIO, StdBlockFile};
pub use placement::BlockPlacement;
