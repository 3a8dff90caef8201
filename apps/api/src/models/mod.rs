pub mod community;
pub mod course;
pub mod user;
