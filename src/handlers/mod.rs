// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (customer JWT) → Elevated (kitchen device key)
pub mod elevated; // /api/kitchen/*
pub mod protected; // /api/*
pub mod public; // /auth/*, /checkout/*, /orders
