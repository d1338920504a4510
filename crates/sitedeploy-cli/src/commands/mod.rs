//! CLI commands

pub mod controller;
pub mod crd;
pub mod deploy;
pub mod status;
