//! Indicator columns and the augmented series the gate evaluates.

pub mod columns;
pub mod series;

pub use columns::{atr, rs_line, sma, trailing_max, trailing_min};
pub use series::{
    IndicatorSeries, ATR_PERIOD, SMA_FAST, SMA_MID, SMA_SLOW, TRADING_YEAR, VOLUME_MA_LONG,
    VOLUME_MA_SHORT,
};
