pub mod health;
pub mod pictures;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use pictures::{
    count_pictures, create_picture, delete_picture, get_picture, list_pictures, update_picture,
};
