//! Record store layer.
//!
//! The record store keeps one row per stored file.  The
//! [`store::FileRecordStore`] trait defines the interface;
//! [`sqlite::SqliteFileStore`] is the default implementation and
//! [`memory::MemoryFileStore`] keeps rows in process memory.

pub mod memory;
pub mod sqlite;
pub mod store;
