//! Core library for the admissions (PPDB) processing pipeline.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
