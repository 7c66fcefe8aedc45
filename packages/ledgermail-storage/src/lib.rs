pub mod accounts;
pub mod crypto;
pub mod db;
pub mod jobs;
pub mod models;
pub mod processed;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
