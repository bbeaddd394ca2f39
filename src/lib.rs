//! Interactive particle field driven by external gravity wells.
//!
//! A [`ParticleField`] owns a fixed population of particles. Every frame the
//! caller hands it the current wells and drawn path samples through
//! [`ParticleField::advance`]; explosions and implosions are applied between
//! frames. Rendering and input live outside this crate's core and talk to the
//! field through read-only views, [`gpu::encode_particles`], or a
//! [`FieldDriver`].

pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod forces;
pub mod gpu;
pub mod impulse;
pub mod integrator;

pub use config::FieldConfig;
pub use driver::{FieldDriver, PathTrail, SharedField};
pub use error::FieldError;
pub use field::ParticleField;
pub use forces::{GravityWell, PathPoint, merge_wells};
pub use gpu::{GpuParticle, GpuParticles, encode_particles};
pub use impulse::Impulse;
