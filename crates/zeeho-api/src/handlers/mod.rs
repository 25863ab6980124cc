//! HTTP request handlers for the ZEEHO API

pub mod commands;
pub mod status;
pub mod vehicle;
