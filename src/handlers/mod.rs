// src/handlers/mod.rs
pub mod search;
