pub mod course;
pub mod distance;
pub mod equipment;
pub mod error;
pub mod models;
pub mod settings;
