pub mod admin;
pub mod cases;
pub mod jobs;
pub mod stream;
pub mod upload;
