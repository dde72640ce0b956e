pub mod commentary;
pub mod composer;
pub mod direction;
pub mod indicators;
pub mod news_filter;

pub use composer::{compose_signal, position_size};
pub use direction::{DirectionCall, infer_direction, leverage_from_confidence};
pub use indicators::{ema, rsi};
pub use news_filter::NewsFilter;
