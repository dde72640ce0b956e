pub mod commands;
pub mod news_service;
pub mod quota_reset;
pub mod signal_service;
pub mod telegram_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use commands::CommandService;
pub use news_service::{NewsService, NewsSettings};
pub use quota_reset::QuotaResetJob;
pub use signal_service::{SignalService, SignalSettings};
pub use telegram_service::TelegramService;
