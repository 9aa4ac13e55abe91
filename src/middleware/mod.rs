pub mod auth;
pub mod device;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use device::device_key_middleware;
pub use response::{ApiResponse, ApiResult};
