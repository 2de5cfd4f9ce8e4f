pub mod claims;
pub mod context;
pub mod identity;
pub mod middleware;

pub use claims::Claims;
pub use identity::{IdentityProvider, JwtIdentityProvider};
pub use middleware::RequireAuth;
