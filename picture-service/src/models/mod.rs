pub mod picture;

pub use picture::{Picture, CONTENT_FIELDS};
