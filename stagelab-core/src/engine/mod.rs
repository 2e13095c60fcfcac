//! Simulation engine: calendar, day loop, exits, diagnostics,
//! cancellation.

pub mod calendar;
pub mod cancel;
pub mod diagnostics;
pub mod exit;
pub mod sim;

pub use calendar::trading_calendar;
pub use cancel::CancelToken;
pub use diagnostics::Diagnostics;
pub use exit::evaluate_exit;
pub use sim::{run_simulation, SimConfig, SimReport};
