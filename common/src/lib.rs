//! # Expandr Common
//!
//! Shared data model for the expansion pipeline: CIDR validation and the
//! usable-host policy, strict address checks, dataset loading and settings.

pub mod config;
pub mod dataset;
pub mod network;
