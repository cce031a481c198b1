//! Repository traits for catalog lookups.

pub mod users;
pub mod videos;

pub use users::UserRepo;
pub use videos::VideoRepo;
