// src/services.rs

pub mod auth;
pub mod conversion_service;
pub mod dedup_service;
pub mod employee_link_service;
pub mod intake_service;
pub mod tenancy_service;
