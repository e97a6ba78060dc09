//! Database queries

pub mod center;
