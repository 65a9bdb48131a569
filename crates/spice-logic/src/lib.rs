//! Pure water and humidity logic for Spice.
//!
//! This crate contains the per-tick algorithms that are independent of any
//! ECS, engine, or save format. Functions take plain data and return
//! results, making them unit-testable and usable from the engine crate, the
//! headless harness, or any other host.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Tuning constants with JSON overrides |
//! | [`error`] | Integration errors for direct indexed access |
//! | [`humidity`] | Room leak weights, push-only diffusion, tile equilibrium |
//! | [`thirst`] | Humidity-scaled dehydration and exhaled moisture |
//! | [`topology`] | Room boundary links and world-tile climate |
//! | [`water`] | Storage/consumer nodes and priority-ordered settlement |

pub mod config;
pub mod error;
pub mod humidity;
pub mod thirst;
pub mod topology;
pub mod water;
