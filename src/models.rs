pub mod auth;
pub mod contact;
pub mod conversion;
pub mod dedup;
pub mod employee;
pub mod funnel;
pub mod lead;
