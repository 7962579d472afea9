//! DefiLlama data source for defi-compare.

pub mod client;

pub use client::DefiLlamaModule;
