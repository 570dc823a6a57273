//! Core map types: the system registry and the orbit camera

pub mod camera;
pub mod entity;
