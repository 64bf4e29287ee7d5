pub mod error;
pub mod health;
pub mod notifications;
pub mod tasks;
pub mod users;

pub use error::AppError;
