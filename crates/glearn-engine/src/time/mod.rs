//! Time subsystem.
//!
//! Frame timing for the render loop and the overlay that displays it.
//! Call `FrameClock::tick()` once per presented frame to obtain `FrameTime`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
