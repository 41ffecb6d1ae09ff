//! Wearable Module
//!
//! Bridges wearable devices to the distance service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     DeviceBridge                         │
//! │   (Routes SDK events, owns startup and shutdown)         │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │ Registry  │  │  Sessions  │  │ Protocol │
//! │           │  │            │  │          │
//! │ - Known   │  │ - Per-device│ │ - Payload│
//! │   devices │  │   workers  │  │   parsing│
//! │ - State   │  │ - Responses│  │ - Result │
//! └───────────┘  └────────────┘  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sdk`] - Traits a wearable SDK adapter implements
//! - [`line_sdk`] - Newline-delimited JSON adapter for an external SDK host
//! - [`registry`] - Known devices and their connection state
//! - [`session`] - Action sessions and request processing
//! - [`protocol`] - Action payload and response formats
//! - [`bridge`] - Event routing between all of the above

pub mod bridge;
pub mod line_sdk;
pub mod protocol;
pub mod registry;
pub mod sdk;
pub mod session;

#[cfg(test)]
mod testing;

pub use bridge::DeviceBridge;
