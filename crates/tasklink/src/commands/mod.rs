//! Command implementations that work on the file system rather than the
//! engine.

pub mod init;
