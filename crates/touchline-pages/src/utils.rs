//! Helpers shared by feature modules: device classification, input
//! debouncing and JSON requests with a deadline.

pub mod debounce;
pub mod fetch;
pub mod viewport;

pub use debounce::Debouncer;
pub use fetch::{FetchOptions, fetch_json, with_timeout};
pub use viewport::{DeviceClass, Orientation, Viewport, is_touch_device};
