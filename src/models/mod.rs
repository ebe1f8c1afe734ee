pub mod gemini;
pub mod image;

pub use gemini::*;
pub use image::*;
