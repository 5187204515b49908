//! Telegram bot.
//!
//! The bot is a thin adapter: it maps updates onto the reservation, voting
//! and form engines and renders their outcomes. Every business rule lives in
//! the engine crate.

use chrono_tz::Tz;
use engine::{
    AccessPolicy, ActorId, FormEngine, FormSettings, ReservationEngine, Store, VotingEngine,
};
use teloxide::{
    RequestError,
    dispatching::{HandlerExt, UpdateHandler},
    prelude::*,
    utils::command::BotCommands,
};

use crate::commands::Command;

mod commands;
mod handlers;
mod parsing;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    access: AccessPolicy,
    store: Store,
    reservations: ReservationEngine,
    voting: VotingEngine,
    forms: FormEngine,
    export_tz: Tz,
}

pub struct Bot {
    token: String,
    store: Store,
    access: AccessPolicy,
    form_settings: FormSettings,
    export_tz: Tz,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!("failed to register bot commands: {err}");
        }

        let parameters = ConfigParameters {
            access: self.access.clone(),
            store: self.store.clone(),
            reservations: ReservationEngine::new(self.store.clone(), self.access.clone()),
            voting: VotingEngine::new(self.store.clone(), self.access.clone()),
            forms: FormEngine::new(
                self.store.clone(),
                self.access.clone(),
                self.form_settings.clone(),
            ),
            export_tz: self.export_tz,
        };

        Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

fn schema() -> UpdateHandler<RequestError> {
    let messages = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handlers::handle_command),
        )
        .branch(dptree::endpoint(handlers::handle_message));

    dptree::entry()
        .branch(messages)
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
}

#[derive(Default, Debug)]
pub struct BotBuilder {
    token: String,
    store: Option<Store>,
    admins: Vec<ActorId>,
    form_settings: FormSettings,
    export_tz: Option<Tz>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn store(mut self, store: Store) -> BotBuilder {
        self.store = Some(store);
        self
    }

    pub fn admins(mut self, admins: Vec<ActorId>) -> BotBuilder {
        self.admins = admins;
        self
    }

    pub fn form_settings(mut self, settings: FormSettings) -> BotBuilder {
        self.form_settings = settings;
        self
    }

    pub fn export_timezone(mut self, tz: Tz) -> BotBuilder {
        self.export_tz = Some(tz);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.is_empty() {
            return Err("telegram token is empty".to_string());
        }
        let store = self
            .store
            .ok_or_else(|| "a store is required to run the bot".to_string())?;
        if self.admins.is_empty() {
            tracing::warn!("no administrators configured, admin panel is unreachable");
        }

        Ok(Bot {
            token: self.token,
            store,
            access: AccessPolicy::new(self.admins),
            form_settings: self.form_settings,
            export_tz: self.export_tz.unwrap_or(Tz::UTC),
        })
    }
}
