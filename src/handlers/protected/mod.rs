// handlers/protected/mod.rs - Customer handlers (JWT required)
//
// All handlers here receive the caller as `Extension<AuthUser>`.
pub mod auth;
pub mod orders;
pub mod profile;
