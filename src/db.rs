pub mod contact_repo;
pub use contact_repo::ContactRepository;
pub mod funnel_repo;
pub use funnel_repo::FunnelRepository;
pub mod merge_repo;
pub use merge_repo::MergeRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;

pub mod store;
pub use store::{ContactStore, ContactTx, PgContactStore};

#[cfg(test)]
pub mod memory_store;
