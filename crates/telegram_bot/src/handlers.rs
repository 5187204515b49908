use engine::{
    ActorId, ActorProfile, BookingReply, CancellationReply, Completed, EngineError, FieldError,
    FormKind, SubmitOutcome, VoteOutcome, fan_out,
};
use teloxide::{
    ApiError, RequestError,
    prelude::*,
    types::{CallbackQuery, ChatId, InlineKeyboardMarkup, InputFile, MessageId, User},
    utils::command::BotCommands,
};

use crate::{
    ConfigParameters,
    commands::Command,
    parsing::{Action, AdminAction},
    ui,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum HandlerError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

type HandlerResult<T> = Result<T, HandlerError>;

/// Text shown on the button press itself, as a toast or a modal alert.
struct Notice {
    text: String,
    alert: bool,
}

impl Notice {
    fn toast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: false,
        }
    }

    fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: true,
        }
    }
}

/// Where to draw a screen: the pressed message when there is one, otherwise
/// a new message.
#[derive(Clone, Copy)]
struct Target {
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl Target {
    fn fresh(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            message_id: None,
        }
    }
}

pub(crate) async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some((from, actor_id)) = sender(msg.from.as_ref()) else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let result = run_command(&bot, &cfg, from, actor_id, chat_id, cmd).await;
    settle(&bot, chat_id, actor_id, result).await
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some((from, actor_id)) = sender(msg.from.as_ref()) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let result = route_text(&bot, &cfg, from, actor_id, chat_id, text).await;
    settle(&bot, chat_id, actor_id, result).await
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some((from, actor_id)) = sender(Some(&q.from)) else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let target = Target {
        chat_id: message.chat().id,
        message_id: Some(message.id()),
    };

    let action = match q.data.as_deref().unwrap_or_default().parse::<Action>() {
        Ok(action) => action,
        Err(err) => {
            tracing::debug!("ignoring callback from {actor_id}: {err}");
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };
    tracing::debug!("actor {actor_id} pressed {action}");

    let notice = match perform(&bot, &cfg, from, actor_id, target, action).await {
        Ok(notice) => notice,
        Err(HandlerError::Request(err)) => {
            if let Err(answer_err) = bot.answer_callback_query(q.id.clone()).await {
                tracing::debug!("failed to answer callback from {actor_id}: {answer_err}");
            }
            return Err(err);
        }
        Err(HandlerError::Engine(err)) => {
            log_engine_error(actor_id, &err);
            Some(Notice::alert(user_message_for_engine_error(&err)))
        }
    };

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = notice {
        answer = answer.text(notice.text).show_alert(notice.alert);
    }
    answer.await?;
    Ok(())
}

async fn run_command(
    bot: &Bot,
    cfg: &ConfigParameters,
    from: &User,
    actor_id: ActorId,
    chat_id: ChatId,
    cmd: Command,
) -> HandlerResult<()> {
    register(cfg, from, actor_id).await?;
    let target = Target::fresh(chat_id);
    match cmd {
        Command::Start => show_home(bot, cfg, actor_id, target).await?,
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .await?;
        }
        Command::Activities => show_catalogue(bot, cfg, actor_id, target).await?,
        Command::MyBookings => show_my_bookings(bot, cfg, actor_id, target).await?,
        Command::Admin => {
            cfg.access.require_admin(actor_id, "opening the admin panel")?;
            cfg.forms.cancel(actor_id).await?;
            show_admin_home(bot, target).await?;
        }
        Command::Cancel => {
            let cancelled =
                cfg.access.is_admin(actor_id) && cfg.forms.cancel(actor_id).await?;
            if cancelled {
                bot.send_message(chat_id, "Действие отменено.").await?;
                show_admin_home(bot, target).await?;
            } else {
                bot.send_message(chat_id, "Нечего отменять.").await?;
            }
        }
    }
    Ok(())
}

async fn route_text(
    bot: &Bot,
    cfg: &ConfigParameters,
    from: &User,
    actor_id: ActorId,
    chat_id: ChatId,
    text: &str,
) -> HandlerResult<()> {
    register(cfg, from, actor_id).await?;
    if is_unknown_command(text) {
        tracing::debug!("actor {actor_id} sent an unknown command {text:?}");
        bot.send_message(chat_id, "Неизвестная команда. Список команд: /help")
            .await?;
        return Ok(());
    }
    match cfg.forms.submit(actor_id, text).await? {
        SubmitOutcome::NoSession => {
            bot.send_message(chat_id, "Используйте меню или команду /start.")
                .await?;
        }
        SubmitOutcome::Advanced(position) => {
            bot.send_message(
                chat_id,
                ui::form_prompt(position, cfg.forms.settings().default_capacity),
            )
            .reply_markup(ui::form_keyboard())
            .await?;
        }
        SubmitOutcome::Rejected { position, error } => {
            let prompt = ui::form_prompt(position, cfg.forms.settings().default_capacity);
            bot.send_message(
                chat_id,
                format!("⚠️ {}\n\n{prompt}", field_error_text(&error)),
            )
            .reply_markup(ui::form_keyboard())
            .await?;
        }
        SubmitOutcome::Completed(completed) => {
            finish_form(bot, cfg, chat_id, completed).await?;
        }
    }
    Ok(())
}

async fn finish_form(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    completed: Completed,
) -> HandlerResult<()> {
    match completed {
        Completed::Activity(activity) => {
            let (text, kb) = ui::render_created_activity(&activity);
            bot.send_message(chat_id, text).reply_markup(kb).await?;
        }
        Completed::Poll(poll) => {
            let recipients = recipients(cfg).await?;
            let (text, kb) = ui::render_poll(&poll);
            let report = fan_out(recipients, |actor_id| {
                let request = bot
                    .send_message(ChatId(actor_id), text.clone())
                    .reply_markup(kb.clone());
                async move { request.await.map(|_| ()) }
            })
            .await;
            tracing::info!("poll {} announced to {} actors", poll.id, report.delivered);
            bot.send_message(
                chat_id,
                ui::fan_out_summary("✅ Опрос создан и отправлен участникам", report),
            )
            .reply_markup(ui::admin_return_keyboard())
            .await?;
        }
        Completed::Broadcast { message } => {
            let recipients = recipients(cfg).await?;
            let report = fan_out(recipients, |actor_id| {
                let request = bot.send_message(ChatId(actor_id), message.clone());
                async move { request.await.map(|_| ()) }
            })
            .await;
            bot.send_message(
                chat_id,
                ui::fan_out_summary("📢 Рассылка завершена", report),
            )
            .reply_markup(ui::admin_return_keyboard())
            .await?;
        }
    }
    Ok(())
}

async fn perform(
    bot: &Bot,
    cfg: &ConfigParameters,
    from: &User,
    actor_id: ActorId,
    target: Target,
    action: Action,
) -> HandlerResult<Option<Notice>> {
    register(cfg, from, actor_id).await?;
    let notice = match action {
        Action::NavHome => {
            show_home(bot, cfg, actor_id, target).await?;
            None
        }
        Action::NavActivities => {
            show_catalogue(bot, cfg, actor_id, target).await?;
            None
        }
        Action::NavBookings => {
            show_my_bookings(bot, cfg, actor_id, target).await?;
            None
        }
        Action::NavAdmin | Action::FormCancel => {
            cfg.access.require_admin(actor_id, "opening the admin panel")?;
            let cancelled = cfg.forms.cancel(actor_id).await?;
            show_admin_home(bot, target).await?;
            cancelled.then(|| Notice::toast("Действие отменено"))
        }
        Action::ShowActivity(activity_id) => {
            show_activity(bot, cfg, actor_id, activity_id, target).await?;
            None
        }
        Action::Book(activity_id) => {
            match cfg.reservations.request_booking(actor_id, activity_id).await? {
                BookingReply::Booked(view) => {
                    let (text, kb) = ui::render_activity(&view);
                    edit_or_send(bot, target, text, kb).await?;
                    Some(Notice::toast("✅ Вы записаны!"))
                }
                BookingReply::AlreadyBooked => {
                    show_activity(bot, cfg, actor_id, activity_id, target).await?;
                    Some(Notice::alert("Вы уже записаны на эту активность"))
                }
                BookingReply::CapacityFull => {
                    show_activity(bot, cfg, actor_id, activity_id, target).await?;
                    Some(Notice::alert("😔 К сожалению, мест больше нет"))
                }
                BookingReply::UnknownActivity => {
                    show_catalogue(bot, cfg, actor_id, target).await?;
                    Some(Notice::alert("Активность не найдена"))
                }
            }
        }
        Action::CancelBooking(activity_id) => {
            let reply = cfg
                .reservations
                .request_cancellation(actor_id, activity_id)
                .await?;
            show_my_bookings(bot, cfg, actor_id, target).await?;
            Some(match reply {
                CancellationReply::Cancelled => Notice::toast("Запись отменена"),
                CancellationReply::NothingToCancel => Notice::alert("Вы не были записаны"),
            })
        }
        Action::Vote { poll, option } => cast_vote(bot, cfg, actor_id, poll, option, target).await?,
        Action::Results(poll) => {
            show_results(bot, cfg, actor_id, poll, target).await?;
            None
        }
        Action::ClosePoll(poll) => {
            let closed = cfg.voting.close(actor_id, poll).await?;
            show_results(bot, cfg, actor_id, poll, target).await?;
            Some(Notice::toast(if closed {
                "🔒 Опрос закрыт"
            } else {
                "Опрос уже закрыт"
            }))
        }
        Action::Admin(admin_action) => admin(bot, cfg, actor_id, admin_action, target).await?,
        Action::Roster(activity_id) => {
            let roster = cfg.reservations.roster(actor_id, activity_id).await?;
            let (text, kb) = ui::render_roster(&roster, cfg.export_tz);
            edit_or_send(bot, target, text, kb).await?;
            None
        }
        Action::Export(activity_id) => {
            let data = cfg
                .reservations
                .export_csv(actor_id, activity_id, cfg.export_tz)
                .await?;
            bot.send_document(
                target.chat_id,
                InputFile::memory(data).file_name(format!("bookings_{activity_id}.csv")),
            )
            .await?;
            Some(Notice::toast("📥 Файл готов"))
        }
    };
    Ok(notice)
}

async fn cast_vote(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    poll_id: engine::PollId,
    option: i64,
    target: Target,
) -> HandlerResult<Option<Notice>> {
    // Closed polls are not solicited any more: a stale button shows the
    // results instead of voting.
    if let Some(poll) = cfg.voting.poll(poll_id).await?
        && !poll.is_active
    {
        show_results(bot, cfg, actor_id, poll_id, target).await?;
        return Ok(Some(Notice::alert("🔒 Опрос закрыт")));
    }

    Ok(Some(
        match cfg.voting.cast_vote(poll_id, actor_id, option).await? {
            VoteOutcome::Voted { option } => {
                show_results(bot, cfg, actor_id, poll_id, target).await?;
                Notice::toast(format!("✅ Ваш голос: {option}"))
            }
            VoteOutcome::AlreadyVoted => Notice::alert("Вы уже проголосовали в этом опросе"),
            VoteOutcome::InvalidOption => Notice::alert("Некорректный вариант ответа"),
            VoteOutcome::PollNotFound => Notice::alert("Опрос не найден"),
        },
    ))
}

async fn admin(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    action: AdminAction,
    target: Target,
) -> HandlerResult<Option<Notice>> {
    let form = match action {
        AdminAction::NewActivity => Some(FormKind::Activity),
        AdminAction::NewPoll => Some(FormKind::Poll),
        AdminAction::Broadcast => Some(FormKind::Broadcast),
        _ => None,
    };
    if let Some(kind) = form {
        let position = cfg.forms.start(actor_id, kind).await?;
        bot.send_message(
            target.chat_id,
            ui::form_prompt(position, cfg.forms.settings().default_capacity),
        )
        .reply_markup(ui::form_keyboard())
        .await?;
        return Ok(None);
    }

    cfg.access.require_admin(actor_id, "listing admin data")?;
    let (text, kb) = match action {
        AdminAction::Polls => ui::render_admin_polls(&cfg.voting.polls(false).await?),
        AdminAction::Participants => ui::render_participants(&cfg.store.list_actors().await?),
        _ => ui::render_admin_activities(&cfg.store.list_activities(false).await?),
    };
    edit_or_send(bot, target, text, kb).await?;
    Ok(None)
}

async fn show_home(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    target: Target,
) -> HandlerResult<()> {
    let (text, kb) = ui::render_home(cfg.access.is_admin(actor_id));
    edit_or_send(bot, target, text, kb).await
}

async fn show_catalogue(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    target: Target,
) -> HandlerResult<()> {
    let entries = cfg.reservations.catalogue(actor_id).await?;
    let (text, kb) = ui::render_catalogue(&entries);
    edit_or_send(bot, target, text, kb).await
}

async fn show_my_bookings(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    target: Target,
) -> HandlerResult<()> {
    let bookings = cfg.reservations.bookings_of(actor_id).await?;
    let (text, kb) = ui::render_my_bookings(&bookings);
    edit_or_send(bot, target, text, kb).await
}

async fn show_activity(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    activity_id: engine::ActivityId,
    target: Target,
) -> HandlerResult<()> {
    let view = cfg.reservations.capacity_view(actor_id, activity_id).await?;
    let (text, kb) = ui::render_activity(&view);
    edit_or_send(bot, target, text, kb).await
}

async fn show_results(
    bot: &Bot,
    cfg: &ConfigParameters,
    actor_id: ActorId,
    poll_id: engine::PollId,
    target: Target,
) -> HandlerResult<()> {
    let results = cfg.voting.results(poll_id).await?;
    let (text, kb) = ui::render_results(&results, cfg.access.is_admin(actor_id));
    edit_or_send(bot, target, text, kb).await
}

async fn show_admin_home(bot: &Bot, target: Target) -> HandlerResult<()> {
    let (text, kb) = ui::render_admin_home();
    edit_or_send(bot, target, text, kb).await
}

async fn edit_or_send(
    bot: &Bot,
    target: Target,
    text: String,
    kb: InlineKeyboardMarkup,
) -> HandlerResult<()> {
    if let Some(message_id) = target.message_id {
        match bot
            .edit_message_text(target.chat_id, message_id, text.clone())
            .reply_markup(kb.clone())
            .await
        {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
            Err(err) => tracing::debug!("edit failed, sending a new message: {err}"),
        }
    }

    bot.send_message(target.chat_id, text)
        .reply_markup(kb)
        .await?;
    Ok(())
}

async fn recipients(cfg: &ConfigParameters) -> HandlerResult<Vec<ActorId>> {
    Ok(cfg
        .store
        .list_actors()
        .await?
        .into_iter()
        .map(|actor| actor.id)
        .collect())
}

async fn register(cfg: &ConfigParameters, from: &User, actor_id: ActorId) -> HandlerResult<()> {
    let profile = ActorProfile {
        username: from.username.clone(),
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
    };
    cfg.store
        .upsert_actor(actor_id, &profile, cfg.access.is_admin(actor_id))
        .await?;
    Ok(())
}

async fn settle(
    bot: &Bot,
    chat_id: ChatId,
    actor_id: ActorId,
    result: HandlerResult<()>,
) -> ResponseResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(HandlerError::Request(err)) => Err(err),
        Err(HandlerError::Engine(err)) => {
            log_engine_error(actor_id, &err);
            bot.send_message(chat_id, user_message_for_engine_error(&err))
                .await?;
            Ok(())
        }
    }
}

/// Known commands are routed before free text, so anything slash-prefixed
/// that reaches here is a command the bot does not have.
fn is_unknown_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

fn sender(from: Option<&User>) -> Option<(&User, ActorId)> {
    let from = from?;
    let actor_id = ActorId::try_from(from.id.0).ok()?;
    Some((from, actor_id))
}

fn log_engine_error(actor_id: ActorId, err: &EngineError) {
    if err.is_transient() {
        tracing::error!("request of actor {actor_id} failed: {err}");
    } else {
        tracing::debug!("request of actor {actor_id} refused: {err}");
    }
}

fn user_message_for_engine_error(err: &EngineError) -> &'static str {
    match err {
        EngineError::PermissionDenied(_) => "⛔️ Доступ запрещен",
        EngineError::NotFound(_) => "Не найдено.",
        EngineError::ValidationFailed(_) => "Некорректные данные.",
        EngineError::StorageUnavailable(_) => "Сервис временно недоступен. Попробуйте позже.",
        EngineError::Corrupted(_) | EngineError::Export(_) => "Произошла ошибка.",
    }
}

fn field_error_text(err: &FieldError) -> String {
    match err {
        FieldError::Empty { .. } => "Значение не может быть пустым. Попробуйте снова.".to_string(),
        FieldError::InvalidCapacity(_) => format!(
            "Введите корректное число или \"{}\". Попробуйте снова.",
            engine::CAPACITY_PLACEHOLDER
        ),
        FieldError::TooFewOptions(_) => {
            format!("Нужно минимум {} варианта ответа.", engine::MIN_OPTIONS)
        }
        FieldError::TooManyOptions(_) => {
            format!("Максимум {} вариантов ответа.", engine::MAX_OPTIONS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusals_and_transient_failures_read_differently() {
        let denied = EngineError::PermissionDenied("closing a poll".to_string());
        let missing = EngineError::NotFound("poll 4".to_string());
        assert_eq!(user_message_for_engine_error(&denied), "⛔️ Доступ запрещен");
        assert_ne!(
            user_message_for_engine_error(&missing),
            user_message_for_engine_error(&denied)
        );
    }

    #[test]
    fn field_errors_name_the_limits() {
        assert!(field_error_text(&FieldError::TooFewOptions(1)).contains('2'));
        assert!(field_error_text(&FieldError::TooManyOptions(11)).contains("10"));
        assert!(field_error_text(&FieldError::InvalidCapacity("abc".to_string())).contains('-'));
    }

    #[test]
    fn slash_text_is_never_a_form_answer() {
        assert!(is_unknown_command("/stop"));
        assert!(is_unknown_command("  /stop now"));
        assert!(!is_unknown_command("Rust workshop"));
        assert!(!is_unknown_command("15 Nov, 14:00 / hall B"));
    }

    #[test]
    fn senders_without_a_signed_id_are_ignored() {
        assert!(sender(None).is_none());
    }
}
