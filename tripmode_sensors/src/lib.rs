//! Sensor backends implementing `tripmode_traits::SensorSource`.
//!
//! Only a simulated IMU ships today; it is paced by an injected `Clock`, so
//! tests drive it deterministically with `ManualClock`.
pub mod error;
pub mod motion;
pub mod sim;

pub use error::SensorError;
pub use motion::{Motion, Profile};
pub use sim::{SimulatedImu, SimulationSettings};
