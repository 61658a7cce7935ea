//! Diorama - educational ask-and-explore 3D scene generation
//!
//! This crate provides the core pipeline for Diorama:
//! - Scene composition: a free-text query becomes a structured scene plan
//! - Model resolution: each planned element is matched to a downloadable asset
//! - Layout validation and per-object educational annotations
//! - HTTP API and CLI around the pipeline

pub mod catalog;
pub mod cli;
pub mod config;
pub mod director;
pub mod render;
pub mod scene;
pub mod server;

pub use config::Config;
