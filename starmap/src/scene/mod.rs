//! Rendering-collaborator state driven by LOD and picking

pub mod decor;
pub mod materials;

pub use decor::{
    galaxy_label_opacity, galaxy_overlay_opacity, grid_origin_for, system_point_size, ParticleStyle,
    SceneDecor,
};
pub use materials::MaterialRole;
