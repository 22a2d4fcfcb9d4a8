//! Client for the off-chain part generator.
//!
//! The generator is an HTTP service that turns a style prompt into a car
//! image and three part descriptors. Its output is untrusted: a
//! [`CarDescriptor`] converts into a plain [`MintCarRequest`] and goes through
//! exactly the same validation as caller-supplied mint input.
//!
//! [`MintCarRequest`]: rush_types::MintCarRequest

pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;

pub use client::{HttpPartGenerator, PartGenerator};
pub use config::GeneratorConfig;
pub use descriptor::{CarDescriptor, GenerationRequest};
pub use error::{GeneratorError, GeneratorResult};
