//! Account management for admins and account owners.

pub mod service;

pub use service::UserAdminService;
