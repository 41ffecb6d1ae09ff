pub mod logging;
pub mod position;
pub mod reporter;
pub mod stores;
pub mod wearable;
