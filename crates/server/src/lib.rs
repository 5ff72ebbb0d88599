//! Admission prediction HTTP service

pub mod api;
pub mod config;
