pub mod extractors;
pub mod middleware;
pub mod password;

pub use extractors::AuthenticatedUser;
pub use middleware::{decide, AccessGuard, GuardDecision, LoginState};
pub use password::{hash_password, validate_password, validate_password_length, MAX_PASSWORD_BYTES};
