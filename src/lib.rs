pub mod app;
pub mod cli;
pub mod context;
pub mod registry;
pub mod rest;
pub mod storage;
pub mod tracing;
pub mod types;
