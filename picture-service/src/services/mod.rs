pub mod database;
pub mod metrics;
pub mod seed;
pub mod store;

pub use database::MongoDb;
pub use self::metrics::{get_metrics, init_metrics};
pub use seed::{load_seed_file, seed_store};
pub use store::{InsertOutcome, PictureStore};
