//! Domain types: bars, positions, trades, and the portfolio ledger.

pub mod bar;
pub mod ledger;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use ledger::{EquityPoint, Ledger, LedgerError, OpenRejection};
pub use position::{ExitReason, Position, PositionExit};
pub use trade::TradeRecord;
