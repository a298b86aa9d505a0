// src/handlers.rs

pub mod dedup;
pub mod employees;
pub mod leads;
