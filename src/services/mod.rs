pub mod directory_service;
pub mod directory_service_impl;
pub mod identity_service;
pub mod identity_service_impl;

pub use directory_service::{DirectoryError, UserDirectoryService, UserPage};
pub use directory_service_impl::SeaOrmDirectoryService;
pub use identity_service::{AuthSession, IdentityError, IdentityService};
pub use identity_service_impl::SeaOrmIdentityService;
