pub mod audit;
pub mod classify;
pub mod color;
pub mod occlusion;
pub mod popup;
pub mod style;

pub use classify::Scanner;
pub use popup::{assess_popup, PopupReport};
