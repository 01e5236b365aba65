//! Math types used across the engine.
//!
//! Re-exports the [`glam`] vector and matrix types so downstream crates
//! share one math vocabulary (and one SIMD-accelerated implementation).
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
