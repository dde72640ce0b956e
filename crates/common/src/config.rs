use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;
use url::Url;

pub const DEFAULT_NEWS_CHAT_ID: i64 = -1002969047835;
pub const DEFAULT_SIGNAL_CHAT_ID: i64 = -1003166387118;

const DEFAULT_RSS_FEEDS: &[&str] = &[
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://cointelegraph.com/rss",
    "https://watcher.guru/news/feed",
    "https://decrypt.co/feed",
    "https://coinmarketcap.com/headlines/news/feed/",
];

const TOP_TICKERS: &[&str] = &[
    "BTC", "ETH", "BNB", "SOL", "XRP", "ADA", "DOGE", "TRX", "TON", "DOT", "AVAX", "LINK", "UNI",
    "XLM", "ICP", "LTC", "ATOM", "NEAR", "APT", "ETC",
];

const NEWS_TERMS: &[&str] = &[
    "bitcoin", "ethereum", "binance", "coinbase", "sec", "etf", "listing", "fed", "powell", "rate",
    "rally", "dump", "hack", "airdrop", "upgrade", "elon", "musk", "trump", "saylor", "vitalik",
    "cz",
];

const SIGNAL_UNIVERSE: &[&str] = &[
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT", "ADAUSDT", "DOGEUSDT", "TRXUSDT",
    "TONUSDT", "AVAXUSDT",
];

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyLimits {
    pub max_news_per_day: u32,
    pub max_signals_per_day: u32,
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub chat_id: i64,
    pub feeds: Vec<Url>,
    pub keywords: Vec<String>,
    pub window_hours: f64,
    pub items_per_feed: usize,
    pub per_run_cap: usize,
    pub send_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub chat_id: i64,
    pub universe: Vec<String>,
    pub interval: String,
    pub candle_limit: u32,
    pub per_run_cap: usize,
    pub equity: f64,
    pub send_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub news_every: Duration,
    pub signals_every: Duration,
    pub daily_reset_at: NaiveTime,
    pub tick: Duration,
    pub startup_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct StateConfig {
    pub dir: PathBuf,
    pub history_max: usize,
    pub history_retain: usize,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub limits: DailyLimits,
    pub news: NewsConfig,
    pub signals: SignalConfig,
    pub schedule: ScheduleConfig,
    pub state: StateConfig,
    pub http_timeout: Duration,
}

impl BotConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first if a `.env` file should apply.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let bot_token = present("BOT_TOKEN")
            .or_else(|| present("TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let limits = DailyLimits {
            max_news_per_day: parse_or(&lookup, "MAX_NEWS_PER_DAY", 7)?,
            max_signals_per_day: parse_or(&lookup, "MAX_SIGNALS_PER_DAY", 4)?,
        };

        let window_hours: f64 = parse_or(&lookup, "NEWS_WINDOW_HOURS", 4.0)?;
        if !(window_hours > 0.0) {
            return Err(ConfigError::Invalid {
                key: "NEWS_WINDOW_HOURS",
                value: window_hours.to_string(),
            });
        }

        let feeds = match lookup("RSS_FEEDS") {
            Some(raw) => parse_feeds(&raw)?,
            None => DEFAULT_RSS_FEEDS
                .iter()
                .filter_map(|f| Url::parse(f).ok())
                .collect(),
        };

        let keywords = TOP_TICKERS
            .iter()
            .chain(NEWS_TERMS.iter())
            .map(|k| k.to_string())
            .collect();

        let news = NewsConfig {
            chat_id: parse_or(&lookup, "NEWS_CHAT_ID", DEFAULT_NEWS_CHAT_ID)?,
            feeds,
            keywords,
            window_hours,
            items_per_feed: 30,
            per_run_cap: 30,
            send_delay: Duration::from_secs(3),
        };

        let equity: f64 = parse_or(&lookup, "EQUITY", 1000.0)?;
        if !(equity > 0.0) {
            return Err(ConfigError::Invalid {
                key: "EQUITY",
                value: equity.to_string(),
            });
        }

        let signals = SignalConfig {
            chat_id: parse_or(&lookup, "SIGNAL_CHAT_ID", DEFAULT_SIGNAL_CHAT_ID)?,
            universe: SIGNAL_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            interval: "15m".to_string(),
            candle_limit: 200,
            per_run_cap: 4,
            equity,
            send_delay: Duration::from_secs(4),
        };

        let schedule = ScheduleConfig {
            news_every: hours(parse_or(&lookup, "NEWS_INTERVAL_HOURS", 3)?, "NEWS_INTERVAL_HOURS")?,
            signals_every: hours(
                parse_or(&lookup, "SIGNAL_INTERVAL_HOURS", 4)?,
                "SIGNAL_INTERVAL_HOURS",
            )?,
            daily_reset_at: match lookup("DAILY_RESET_AT") {
                Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
                    ConfigError::Invalid {
                        key: "DAILY_RESET_AT",
                        value: raw,
                    }
                })?,
                None => NaiveTime::from_hms_opt(0, 5, 0).unwrap_or_default(),
            },
            tick: Duration::from_secs(5),
            startup_delay: Duration::from_secs(5),
        };

        let state = StateConfig {
            dir: lookup("STATE_DIR")
                .or_else(|| lookup("WORKDIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            history_max: 1500,
            history_retain: 800,
        };

        Ok(Self {
            bot_token,
            limits,
            news,
            signals,
            schedule,
            state,
            http_timeout: seconds(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?, "HTTP_TIMEOUT_SECS")?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

/// Positive whole seconds.
fn seconds(n: u64, key: &'static str) -> Result<Duration, ConfigError> {
    if n == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: n.to_string(),
        });
    }
    Ok(Duration::from_secs(n))
}

fn hours(n: u64, key: &'static str) -> Result<Duration, ConfigError> {
    let secs = n.checked_mul(3600).ok_or(ConfigError::Invalid {
        key,
        value: n.to_string(),
    })?;
    seconds(secs, key)
}

fn parse_feeds(raw: &str) -> Result<Vec<Url>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Url::parse(s).map_err(|_| ConfigError::Invalid {
                key: "RSS_FEEDS",
                value: s.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.limits.max_news_per_day, 7);
        assert_eq!(config.limits.max_signals_per_day, 4);
        assert_eq!(config.news.chat_id, DEFAULT_NEWS_CHAT_ID);
        assert_eq!(config.signals.chat_id, DEFAULT_SIGNAL_CHAT_ID);
        assert_eq!(config.news.feeds.len(), 5);
        assert_eq!(config.news.window_hours, 4.0);
        assert_eq!(config.schedule.news_every, Duration::from_secs(3 * 3600));
        assert_eq!(config.schedule.signals_every, Duration::from_secs(4 * 3600));
        assert_eq!(
            config.schedule.daily_reset_at,
            NaiveTime::from_hms_opt(0, 5, 0).unwrap()
        );
        assert_eq!(config.signals.universe.len(), 10);
        assert!(config.news.keywords.iter().any(|k| k == "BTC"));
    }

    #[test]
    fn legacy_token_key_is_accepted() {
        let config = BotConfig::from_lookup(lookup_from(&[("TOKEN", "t")])).unwrap();
        assert_eq!(config.bot_token, "t");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = BotConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn malformed_numbers_are_reported_with_their_key() {
        let err = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("MAX_NEWS_PER_DAY", "seven"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "MAX_NEWS_PER_DAY",
                value: "seven".into()
            }
        );
    }

    #[test]
    fn feed_list_is_validated() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("RSS_FEEDS", "https://a.example/rss, https://b.example/feed"),
        ]))
        .unwrap();
        assert_eq!(config.news.feeds.len(), 2);

        let err = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("RSS_FEEDS", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RSS_FEEDS", .. }));
    }

    #[test]
    fn reset_time_and_state_dir_overrides() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("DAILY_RESET_AT", "01:30"),
            ("WORKDIR", "/var/lib/bot"),
        ]))
        .unwrap();
        assert_eq!(
            config.schedule.daily_reset_at,
            NaiveTime::from_hms_opt(1, 30, 0).unwrap()
        );
        assert_eq!(config.state.dir, PathBuf::from("/var/lib/bot"));
    }

    #[test]
    fn blank_token_falls_back_to_legacy_key() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", "  "), ("TOKEN", "t")])).unwrap();
        assert_eq!(config.bot_token, "t");

        let err = BotConfig::from_lookup(lookup_from(&[("BOT_TOKEN", ""), ("TOKEN", " ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn durations_must_be_positive_and_fit() {
        let huge = u64::MAX.to_string();
        let err = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("NEWS_INTERVAL_HOURS", huge.as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NEWS_INTERVAL_HOURS", .. }));

        let err = BotConfig::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("HTTP_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "HTTP_TIMEOUT_SECS",
                value: "0".into()
            }
        );
    }
}
