//! Hand-gesture interpretation
//!
//! Turns a stream of 21-point hand landmark frames into aim coordinates and
//! discrete fire/reload events. Knows nothing about the simulation.

pub mod interpreter;
pub mod landmarks;

pub use interpreter::{GestureConfig, GestureDebugInfo, GestureInterpreter, GestureState};
pub use landmarks::{HandFrame, Landmark, distance_3d, is_finger_curled, is_finger_extended, is_fist};
