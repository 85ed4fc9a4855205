pub mod candle;
pub mod history;
pub mod stream;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, CandleStore};
pub use history::HistoryClient;
pub use stream::{parse_stream_message, BarEventKind, StreamFeed, StreamMessage};
