//! Command structs

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "Главное меню.")]
    Start,
    #[command(description = "Показать это сообщение.")]
    Help,
    #[command(description = "Список активностей и запись.")]
    Activities,
    #[command(description = "Мои записи.")]
    MyBookings,
    #[command(description = "Панель администратора.")]
    Admin,
    #[command(description = "Прервать заполнение формы.")]
    Cancel,
}
