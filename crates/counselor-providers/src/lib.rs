//! Inference layer for Counselor.
//!
//! # Architecture
//!
//! - [`traits::InferenceGateway`] — the one call the rest of the system makes
//! - [`registry`] — static specs for the supported providers + matching logic
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client
//! - [`http_provider::create_provider`] — convenience builder from model name + config

pub mod http_provider;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::{create_provider, HttpProvider, SetupError};
pub use registry::{ProviderConfig, ProviderSpec, PROVIDERS};
pub use traits::{GenerateOptions, InferenceGateway};
