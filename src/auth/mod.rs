//! Authentication and authorization.
//!
//! ```text
//! auth/
//! ├── types.rs      # request/response shapes
//! ├── access.rs     # caller role gates
//! ├── service.rs    # register, login, password flows
//! └── core/
//!     ├── password_service.rs
//!     └── token_service.rs
//! ```

pub mod access;
pub mod core;
pub mod service;
pub mod types;

pub use access::Caller;
pub use service::AuthService;
pub use types::{LoginRequest, LoginResponse, RegisterRequest, UserSummary};
