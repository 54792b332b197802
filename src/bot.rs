use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ParseMode, User, UserId};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::content::SubmissionContent;
use crate::error::RelayError;
use crate::moderation::{decision_keyboard, Decision};
use crate::session::Sessions;
use crate::store::Store;

const GREETING: &str =
    "Привет! Я бот предложка СКР! Предложка поддерживает отправку сообщений, фото, видео";
const DELIVERY_CONFIRMATION: &str = "Ваше сообщение было отправлено администратору.";
const ACCEPTED_TOAST: &str = "Сообщение принято и отправлено в канал.";
const REJECTED_TOAST: &str = "Сообщение отклонено.";
const BLOCKED_TOAST: &str = "Пользователь заблокирован.";
const NOT_FOUND_TOAST: &str = "Сообщение не найдено. Возможно, бот был перезапущен.";

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config,
            store,
            sessions: Sessions::new(),
        }
    }

    fn moderator_chat(&self) -> ChatId {
        ChatId(self.config.telegram.moderator_chat_id)
    }

    fn channel(&self) -> ChatId {
        ChatId(self.config.telegram.channel_id)
    }
}

/// Start the Telegram bot
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.telegram.bot_token);

    info!("Starting Telegram bot...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("suggestbot"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user = match msg.from.clone() {
        Some(user) => user,
        None => return Ok(()),
    };

    if let Some(text) = msg.text() {
        if text == "/start" || text.starts_with("/start ") {
            return handle_start(&bot, &msg, &user, &state).await;
        }
    }

    match relay_submission(&bot, &msg, &user, &state).await {
        Ok(()) => {}
        // Silent by design: the sender perceives no response at all.
        Err(RelayError::Blocked) => {
            debug!("Dropping message from blocked user {}", user.id);
        }
        Err(RelayError::NotEligible) => {
            debug!("Dropping message from user {} who has not started", user.id);
        }
        Err(RelayError::UnsupportedContent) => {
            debug!("Dropping unsupported content from user {}", user.id);
        }
        Err(RelayError::Api(e)) => return Err(e),
        Err(e) => {
            error!("Failed to relay submission from {}: {:#}", user.id, e);
        }
    }

    Ok(())
}

async fn handle_start(
    bot: &Bot,
    msg: &Message,
    user: &User,
    state: &AppState,
) -> ResponseResult<()> {
    info!("User {} started the bot", user.id);

    if let Err(e) = touch_user(state, user.id).await {
        error!("Failed to record start for user {}: {:#}", user.id, e);
    }
    state.sessions.mark_eligible(user.id).await;

    bot.send_message(msg.chat.id, GREETING).await?;
    Ok(())
}

async fn touch_user(state: &AppState, user_id: UserId) -> Result<()> {
    state.store.record_or_touch_user(user_id.0).await?;
    state.store.record_interaction(user_id.0).await?;
    Ok(())
}

/// Pre-I/O gate, checked in order: blocklist, eligibility flag, content
/// classification. A submission that fails here leaves no trace: nothing
/// is persisted, cached, forwarded, or replied to.
async fn gate_submission(
    msg: &Message,
    user: &User,
    state: &AppState,
) -> Result<SubmissionContent, RelayError> {
    if state.store.is_blocked(user.id.0).await? {
        return Err(RelayError::Blocked);
    }
    if !state.sessions.is_eligible(user.id).await {
        return Err(RelayError::NotEligible);
    }
    SubmissionContent::classify(msg).ok_or(RelayError::UnsupportedContent)
}

/// Relay one inbound submission to the moderator.
async fn relay_submission(
    bot: &Bot,
    msg: &Message,
    user: &User,
    state: &AppState,
) -> Result<(), RelayError> {
    let content = gate_submission(msg, user, state).await?;

    touch_user(state, user.id).await?;
    state
        .sessions
        .put_pending(user.id, msg.id, content.clone())
        .await;

    let keyboard = decision_keyboard(user.id, msg.id);
    let body = content.moderation_caption(&user_link(user));
    match &content {
        SubmissionContent::Text(_) => {
            bot.send_message(state.moderator_chat(), body)
                .reply_markup(keyboard)
                .await?;
        }
        SubmissionContent::Photo { file_id, .. } => {
            bot.send_photo(state.moderator_chat(), InputFile::file_id(file_id.clone()))
                .caption(body)
                .reply_markup(keyboard)
                .await?;
        }
        SubmissionContent::Video { file_id, .. } => {
            bot.send_video(state.moderator_chat(), InputFile::file_id(file_id.clone()))
                .caption(body)
                .reply_markup(keyboard)
                .await?;
        }
    }

    info!(
        "Forwarded {} submission {} from user {} to moderator",
        content.kind(),
        msg.id.0,
        user.id
    );

    bot.send_message(msg.chat.id, DELIVERY_CONFIRMATION).await?;
    Ok(())
}

/// Sender handle shown to the moderator: @username, or first name when the
/// user has no username.
fn user_link(user: &User) -> String {
    match &user.username {
        Some(username) => format!("@{username}"),
        None => user.first_name.clone(),
    }
}

async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let payload = match q.data.as_deref() {
        Some(payload) => payload,
        None => return Ok(()),
    };

    let decision = match Decision::parse(payload) {
        Some(decision) => decision,
        None => {
            warn!("Malformed decision payload: {payload:?}");
            return Ok(());
        }
    };

    if !is_moderator_press(&q, state.config.telegram.moderator_chat_id) {
        warn!("Ignoring decision callback from non-moderator {}", q.from.id);
        return Ok(());
    }

    match apply_decision(&bot, &q, decision, &state).await {
        Ok(toast) => {
            bot.answer_callback_query(q.id.clone()).text(toast).await?;
        }
        Err(RelayError::SubmissionNotFound {
            user_id,
            message_id,
        }) => {
            warn!(
                "Decision for missing submission: user {} message {}",
                user_id, message_id.0
            );
            bot.answer_callback_query(q.id.clone())
                .text(NOT_FOUND_TOAST)
                .await?;
        }
        Err(RelayError::Api(e)) => return Err(e),
        Err(e) => {
            error!("Failed to apply decision {decision:?}: {e:#}");
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}

/// Decision buttons only ever exist in the moderator's chat, but the
/// payload format is guessable, so check where the press came from.
/// `moderator_chat_id` may be a private chat (equal to the moderator's own
/// user id) or a group; in the group case the presser's id never matches,
/// so the prompt's chat is checked too.
fn is_moderator_press(q: &CallbackQuery, moderator_chat_id: i64) -> bool {
    if q.from.id.0 as i64 == moderator_chat_id {
        return true;
    }
    q.message
        .as_ref()
        .is_some_and(|prompt| prompt.chat().id.0 == moderator_chat_id)
}

/// Perform a moderation decision, returning the toast to show the
/// moderator.
async fn apply_decision(
    bot: &Bot,
    q: &CallbackQuery,
    decision: Decision,
    state: &AppState,
) -> Result<&'static str, RelayError> {
    match decision {
        Decision::Accept {
            user_id,
            message_id,
        } => {
            let content = state
                .sessions
                .pending(user_id, message_id)
                .await
                .ok_or(RelayError::SubmissionNotFound {
                    user_id,
                    message_id,
                })?;

            publish(bot, &content, state).await?;
            state.sessions.evict_pending(user_id, message_id).await;

            // Best effort: drop the keyboard so the prompt can't be
            // resolved twice.
            if let Some(prompt) = q.message.as_ref() {
                bot.edit_message_reply_markup(prompt.chat().id, prompt.id())
                    .await
                    .ok();
            }

            info!(
                "Accepted submission {} from user {}, published to channel",
                message_id.0, user_id
            );
            Ok(ACCEPTED_TOAST)
        }
        Decision::Reject {
            user_id,
            message_id,
        } => {
            state.sessions.evict_pending(user_id, message_id).await;

            // Best effort: the prompt may be too old to delete (Telegram
            // refuses after 48h), but the verdict stands either way.
            if let Some(prompt) = q.message.as_ref() {
                bot.delete_message(prompt.chat().id, prompt.id()).await.ok();
            }

            info!("Rejected submission {} from user {}", message_id.0, user_id);
            Ok(REJECTED_TOAST)
        }
        Decision::Block { user_id } => {
            state.store.block_user(user_id.0).await?;

            info!("Blocked user {}", user_id);
            Ok(BLOCKED_TOAST)
        }
    }
}

/// Publish accepted content to the public channel with the promotional
/// footer appended.
async fn publish(bot: &Bot, content: &SubmissionContent, state: &AppState) -> Result<(), RelayError> {
    let body = content.channel_caption(&state.config.footer());
    match content {
        SubmissionContent::Text(_) => {
            bot.send_message(state.channel(), body)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        SubmissionContent::Photo { file_id, .. } => {
            bot.send_photo(state.channel(), InputFile::file_id(file_id.clone()))
                .caption(body)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        SubmissionContent::Video { file_id, .. } => {
            bot.send_video(state.channel(), InputFile::file_id(file_id.clone()))
                .caption(body)
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}
