//! Storage-buffer layout shared with the WGSL particle shader.

use encase::{ArrayLength, ShaderType, StorageBuffer};

use crate::error::FieldError;
use crate::field::ParticleField;

#[derive(Debug, Clone, Copy, ShaderType)]
pub struct GpuParticle {
    pub position: cgmath::Vector3<f32>,
    pub speed: f32,
    pub lifetime: f32,
}

#[derive(ShaderType)]
pub struct GpuParticles<'a> {
    pub boundary_radius: f32,
    pub length: ArrayLength,
    #[size(runtime)]
    pub particles: &'a [GpuParticle],
}

pub fn snapshot(field: &ParticleField) -> Vec<GpuParticle> {
    field
        .positions()
        .iter()
        .zip(field.speeds())
        .zip(field.lifetimes())
        .map(|((&position, &speed), &lifetime)| GpuParticle {
            position,
            speed,
            lifetime,
        })
        .collect()
}

/// Encode the field as the bytes of a `GpuParticles` storage buffer.
pub fn encode_particles(field: &ParticleField) -> Result<Vec<u8>, FieldError> {
    let particles = snapshot(field);
    let mut storage = StorageBuffer::new(Vec::new());
    storage.write(&GpuParticles {
        boundary_radius: field.config().boundary_radius,
        length: ArrayLength,
        particles: &particles,
    })?;
    Ok(storage.into_inner())
}
