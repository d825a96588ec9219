// VIEW: On-screen text widgets
pub mod hud;

pub use hud::{AxisDisplay, DisplayBuffer, SharedText, TextSink};
