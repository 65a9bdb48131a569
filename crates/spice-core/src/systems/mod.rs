//! Systems - logic that operates on components

mod humidity;
mod rain;
mod water;

pub use humidity::*;
pub use rain::*;
pub use water::*;
