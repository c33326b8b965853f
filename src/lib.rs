//! Mouse Bridge
//!
//! Turns `dx,dy,L,R` lines from a serial-connected microcontroller into host
//! pointer motion and button events.

pub mod bridge;
pub mod buttons;
pub mod config;
pub mod motion;
pub mod paths;
pub mod pointer;
pub mod protocol;
pub mod transport;

pub use bridge::{Bridge, BridgeSettings, BridgeStats, LineOutcome};
pub use buttons::{ButtonAction, ButtonState, MouseButton, TriggerPolicy};
pub use config::AppConfig;
pub use motion::MotionRounding;
pub use protocol::{decode_line, Frame, FrameError};
