// This file exposes the modules as public modules in the crate

pub mod models;
pub mod normalizer;
pub mod llm_handler;
pub mod engine;
pub mod engine_config;
pub mod session_store;
pub mod export;
pub mod analysis_handlers;
pub mod export_handlers;
