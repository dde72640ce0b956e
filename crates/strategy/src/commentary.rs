//! Short keyword-driven remarks appended under a news headline.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Bullish,
    Bearish,
    Eventful,
    Unclear,
}

const BULLISH: &[&str] = &[
    "rise", "rises", "surge", "surges", "up", "bullish", "growth", "increase", "gain", "gains",
    "profit", "rally", "rallies",
];
const BEARISH: &[&str] = &[
    "drop", "drops", "fall", "falls", "bearish", "decline", "declines", "down", "risk", "crash",
    "recession", "dump",
];
const EVENTFUL: &[&str] = &[
    "etf", "approval", "approves", "law", "decision", "update", "adoption", "listing",
];

const COINS: &[(&[&str], &str)] = &[
    (&["btc", "bitcoin"], "BTC"),
    (&["eth", "ethereum"], "ETH"),
    (&["xrp", "ripple"], "XRP"),
    (&["sol", "solana"], "SOL"),
    (&["bnb"], "BNB"),
    (&["doge", "dogecoin"], "DOGE"),
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn mentions(words: &[String], vocabulary: &[&str]) -> bool {
    words.iter().any(|w| vocabulary.contains(&w.as_str()))
}

/// Bullish wording wins over bearish, which wins over event wording.
pub fn headline_tone(text: &str) -> Tone {
    let words = words(text);
    if mentions(&words, BULLISH) {
        Tone::Bullish
    } else if mentions(&words, BEARISH) {
        Tone::Bearish
    } else if mentions(&words, EVENTFUL) {
        Tone::Eventful
    } else {
        Tone::Unclear
    }
}

/// First coin named in `text`, in table order.
pub fn mentioned_coin(text: &str) -> Option<&'static str> {
    let words = words(text);
    COINS
        .iter()
        .find(|(aliases, _)| mentions(&words, aliases))
        .map(|(_, ticker)| *ticker)
}

pub fn market_comment(tone: Tone) -> &'static str {
    match tone {
        Tone::Bullish => "🚀 The news reads positive: the market may push higher.",
        Tone::Bearish => "📉 Analysts seem to expect a pullback: worth staying careful.",
        Tone::Eventful => "⚖️ A notable event that could move the market in the coming days.",
        Tone::Unclear => "🤔 The picture is unclear, watching how it develops.",
    }
}

pub fn coin_outlook(tone: Tone, coin: Option<&str>) -> String {
    let subject = coin.unwrap_or("the market");
    match tone {
        Tone::Bullish => format!("Positive for {}: an upward move is possible.", subject),
        Tone::Bearish => format!("Negative for {}: it may slide in the near term.", subject),
        Tone::Eventful => format!("{} news may bring short-term volatility.", subject),
        Tone::Unclear => format!("{}: mixed signals, keeping an eye on it.", subject),
    }
}

/// Two lines: a market comment and a per-coin outlook.
pub fn commentary(text: &str) -> String {
    let tone = headline_tone(text);
    format!(
        "{}\n{}",
        market_comment(tone),
        coin_outlook(tone, mentioned_coin(text))
    )
}
