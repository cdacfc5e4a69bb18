pub mod image;
pub mod transformation;
pub mod user;
pub mod video;
