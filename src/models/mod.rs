// src/models/mod.rs
pub mod search;
pub mod video;
