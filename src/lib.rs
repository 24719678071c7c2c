pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod image_capture;
pub mod storage;

pub use configuration::Config;
pub use controller::Controller;
