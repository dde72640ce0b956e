use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::repls::CommandReplExt;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use tracing::{error, info};

use common::traits::{DeliveryError, MessageSink};

use crate::services::CommandService;

/// Telegram transport for outgoing posts.
pub struct TelegramService {
    bot: Bot,
}

impl TelegramService {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn delivery_error(e: RequestError) -> DeliveryError {
    match e {
        RequestError::Api(api) => DeliveryError::Rejected(api.to_string()),
        other => DeliveryError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl MessageSink for TelegramService {
    async fn send_text(&self, destination: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(destination), text)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }

    async fn send_photo(
        &self,
        destination: i64,
        image: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        self.bot
            .send_photo(ChatId(destination), InputFile::memory(image).file_name("chart.png"))
            .caption(caption)
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "about this bot")]
    Start,
    #[command(description = "version and today's counters")]
    Version,
    #[command(description = "spot price in USD, e.g. /price BTC")]
    Price(String),
    #[command(description = "post a news batch now")]
    News,
    #[command(description = "post a signal batch now")]
    Signal,
    #[command(description = "show this list")]
    Help,
}

/// Answers user commands until the process stops.
pub async fn run_commands(bot: Bot, commands: Arc<CommandService>) {
    info!("Listening for Telegram commands");

    Command::repl(bot, move |bot: Bot, msg: Message, cmd: Command| {
        let commands = commands.clone();
        async move {
            let reply = match cmd {
                Command::Start => commands.start_text(),
                Command::Version => commands.version_text().await,
                Command::Price(args) => commands.price_text(&args).await,
                Command::News => commands.news_text().await,
                Command::Signal => commands.signal_text().await,
                Command::Help => Command::descriptions().to_string(),
            };
            if let Err(e) = bot.send_message(msg.chat.id, reply).await {
                error!("Failed to answer command in chat {}: {}", msg.chat.id, e);
            }
            respond(())
        }
    })
    .await;
}
