// crates/stockroom-config/src/lib.rs
// ============================================================================
// Module: Stockroom Config Library
// Description: Configuration model and validation.
// Purpose: Single source of truth for stockroom.toml semantics.
// Dependencies: stockroom-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `stockroom-config` defines the configuration model for the Stockroom
//! server. Loading is strict and validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
