// handlers/public/mod.rs - Public handlers (no authentication required)
//
// OTP registration/login flows and anonymous checkout.
pub mod auth;
pub mod checkout;
