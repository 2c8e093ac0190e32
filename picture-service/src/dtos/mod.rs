pub mod pictures;

pub use pictures::{normalize, parse_picture_body, InsertResponse, MessageResponse};
