#![deny(missing_docs)]

//! Core library for the Docstream ingestion server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Upload ingestion pipeline: staging, orchestration, compensation.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document extraction and chunking.
pub mod processor;
/// Qdrant vector store integration.
pub mod qdrant;
