//! Discord message handling.
//!
//! Parses incoming messages, runs them through the dispatcher and delivers
//! the replies to the channel, to the author's DMs, or as a nickname change.

use serenity::builder::{CreateMessage, EditMember};
use serenity::model::channel::Message;
use serenity::prelude::*;
use tracing::{debug, error, info};

use crate::commands::{CommandParser, Dispatcher, Invocation};
use crate::common::error::DiscordError;
use crate::common::{split_message, Reply, MAX_MESSAGE_LEN};

/// Discord rejects longer nicknames.
const MAX_NICKNAME_LEN: usize = 32;

/// Turns Discord messages into bot commands.
pub struct CommandHandler {
    parser: CommandParser,
    dispatcher: Dispatcher,
}

impl CommandHandler {
    pub fn new(parser: CommandParser, dispatcher: Dispatcher) -> Self {
        Self { parser, dispatcher }
    }

    pub async fn handle_message(&self, ctx: &Context, msg: &Message) {
        // Ignore bots, ourselves included
        if msg.author.bot {
            return;
        }

        let Some(command) = self.parser.parse(&msg.content) else {
            return;
        };

        // Server nickname first, then global display name
        let user_name = msg
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .or_else(|| msg.author.global_name.clone())
            .unwrap_or_else(|| msg.author.name.clone());

        let invocation = Invocation {
            user_id: msg.author.id.to_string(),
            user_name,
            command,
        };
        info!(
            "Command from {} ({}): {}",
            invocation.user_name, invocation.user_id, msg.content
        );

        for reply in self.dispatcher.dispatch(&invocation).await {
            debug!("Reply: {}", reply.text());
            if let Err(e) = self.deliver(ctx, msg, &reply).await {
                error!("Failed to deliver reply to {}: {}", invocation.user_id, e);
                if matches!(reply, Reply::Nickname(_)) {
                    let notice = format!("⚠️ Could not change your nickname: {}", e);
                    if let Err(e) = msg.channel_id.say(&ctx.http, notice).await {
                        error!("Failed to send nickname failure notice: {}", e);
                    }
                }
            }
        }
    }

    async fn deliver(&self, ctx: &Context, msg: &Message, reply: &Reply) -> Result<(), DiscordError> {
        match reply {
            Reply::Channel(text) => {
                for chunk in split_message(text, MAX_MESSAGE_LEN) {
                    msg.channel_id.say(&ctx.http, chunk).await?;
                }
            }
            Reply::Direct(text) => {
                for chunk in split_message(text, MAX_MESSAGE_LEN) {
                    msg.author
                        .direct_message(&ctx.http, CreateMessage::new().content(chunk))
                        .await?;
                }
            }
            Reply::Nickname(card) => {
                let guild_id = msg.guild_id.ok_or(DiscordError::NotInGuild)?;
                let nickname: String = card.chars().take(MAX_NICKNAME_LEN).collect();
                guild_id
                    .edit_member(&ctx.http, msg.author.id, EditMember::new().nickname(nickname))
                    .await?;
                debug!("Set nickname of {} to '{}'", msg.author.id, card);
                msg.channel_id
                    .say(&ctx.http, format!("✅ Nickname updated: {}", card))
                    .await?;
            }
        }
        Ok(())
    }
}
