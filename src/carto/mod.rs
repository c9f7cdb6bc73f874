pub mod colour;
pub mod datum;
pub mod globe;
pub mod grid;
pub mod mask;
pub mod mesh;
pub mod projection;
