//! Operator tooling

pub mod client;

pub use client::ClusterClient;
