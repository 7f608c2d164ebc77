pub mod admission;
pub mod auth;
pub mod club;
pub mod config;
pub mod config_validator;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod index;
pub mod middleware;
pub mod response;
pub mod server;
pub mod store;
pub mod token_bucket;
pub mod validation;

pub use club::{Club, NewClub};
pub use config::Config;
pub use directory::Directory;
pub use error::{ClubsError, ClubsResult};
pub use server::{create_app, create_state};
