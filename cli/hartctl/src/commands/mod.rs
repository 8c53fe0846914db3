//! CLI command implementations.

pub mod build;
pub mod config;
pub mod doctor;
pub mod init;
pub mod kill_qemu;
pub mod run;
