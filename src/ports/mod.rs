//! Port traits decoupling the domain from storage and output.

pub mod config_port;
pub mod data_port;
pub mod report_port;
