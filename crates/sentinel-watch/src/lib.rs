pub mod observer;

pub use observer::{ArmState, SurveillanceLoop};
