//! Port traits: the seams between the domain and storage, configuration and output.

pub mod config_port;
pub mod records_port;
pub mod report_port;
