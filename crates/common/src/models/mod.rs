pub mod candle;
pub mod news;
pub mod quota;
pub mod signal;

pub use candle::{Candle, closes};
pub use news::{FeedItem, NewsItem};
pub use quota::{Quota, QuotaField};
pub use signal::{ChartSpec, Direction, SignalPost, TradeSignal};
