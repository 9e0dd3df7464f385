/// Filesystem transport: recursive record-file discovery.
pub mod fs;
