pub mod hosted;
pub mod image;
pub mod media_probe;
