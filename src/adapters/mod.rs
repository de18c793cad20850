//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod record_fields;
pub mod sheet_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
