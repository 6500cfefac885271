mod clock;
mod context;

pub use clock::{ticks, ticks_to_duration};
pub use context::TimingContext;
