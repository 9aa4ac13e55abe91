// handlers/elevated/mod.rs - Kitchen tooling (device key required)
pub mod kitchen;
