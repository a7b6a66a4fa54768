pub mod api;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod rerank;
pub mod search;
pub mod shared;
pub mod vectordb;
