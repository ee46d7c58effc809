//! HTTP handlers

pub mod response;
pub mod swap;
