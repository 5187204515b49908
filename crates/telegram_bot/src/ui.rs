use chrono_tz::Tz;
use engine::{
    Activity, Actor, ActorBooking, CapacityView, CatalogueEntry, FanOutReport, FormKind, Poll,
    PollResults, Roster, StepPosition,
};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::parsing::{Action, AdminAction};

const BAR_WIDTH: usize = 10;

fn button(label: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.to_string())
}

fn back(action: Action) -> Vec<InlineKeyboardButton> {
    vec![button("⬅️ Назад", action)]
}

pub(crate) fn render_home(is_admin: bool) -> (String, InlineKeyboardMarkup) {
    let mut rows = vec![
        vec![button("📋 Активности", Action::NavActivities)],
        vec![button("🎫 Мои записи", Action::NavBookings)],
    ];
    if is_admin {
        rows.push(vec![button("⚙️ Админ-панель", Action::NavAdmin)]);
    }
    (
        "Добро пожаловать! Выберите раздел:".to_string(),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn render_catalogue(entries: &[CatalogueEntry]) -> (String, InlineKeyboardMarkup) {
    let text = if entries.is_empty() {
        "Пока нет доступных активностей.".to_string()
    } else {
        "Выберите активность:".to_string()
    };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .map(|entry| {
            let mark = if entry.is_booked { "✅ " } else { "" };
            vec![button(
                format!("{mark}{}", entry.activity.name),
                Action::ShowActivity(entry.activity.id),
            )]
        })
        .collect();
    rows.push(back(Action::NavHome));

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_activity(view: &CapacityView) -> (String, InlineKeyboardMarkup) {
    let activity = &view.activity;
    let mut text = format!("{}\n", activity.name);
    if !activity.description.is_empty() {
        text.push_str(&format!("\n{}\n", activity.description));
    }
    if !activity.scheduled_at.is_empty() {
        text.push_str(&format!("\n🕐 {}", activity.scheduled_at));
    }
    text.push_str(&format!(
        "\n👥 Записано: {}/{}\n🎟 Свободно мест: {}",
        view.booked,
        view.capacity(),
        view.remaining()
    ));
    if view.is_booked {
        text.push_str("\n\n✅ Вы записаны");
    } else if view.is_full() {
        text.push_str("\n\n😔 Мест нет");
    }

    let mut rows = Vec::new();
    if view.is_booked {
        rows.push(vec![button(
            "❌ Отменить запись",
            Action::CancelBooking(activity.id),
        )]);
    } else if !view.is_full() {
        rows.push(vec![button("✅ Записаться", Action::Book(activity.id))]);
    }
    rows.push(back(Action::NavActivities));

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_my_bookings(bookings: &[ActorBooking]) -> (String, InlineKeyboardMarkup) {
    if bookings.is_empty() {
        return (
            "У вас пока нет записей.".to_string(),
            InlineKeyboardMarkup::new(vec![
                vec![button("📋 Активности", Action::NavActivities)],
                back(Action::NavHome),
            ]),
        );
    }

    let mut text = String::from("Ваши записи:\n");
    let mut rows = Vec::new();
    for (idx, booking) in bookings.iter().enumerate() {
        let activity = &booking.activity;
        text.push_str(&format!("\n{}. {}", idx + 1, activity.name));
        if !activity.scheduled_at.is_empty() {
            text.push_str(&format!(" • {}", activity.scheduled_at));
        }
        rows.push(vec![button(
            format!("❌ {}", activity.name),
            Action::CancelBooking(activity.id),
        )]);
    }
    rows.push(back(Action::NavHome));

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_admin_home() -> (String, InlineKeyboardMarkup) {
    let kb = InlineKeyboardMarkup::new(vec![
        vec![
            button("➕ Активность", Action::Admin(AdminAction::NewActivity)),
            button("📊 Опрос", Action::Admin(AdminAction::NewPoll)),
        ],
        vec![button("📢 Рассылка", Action::Admin(AdminAction::Broadcast))],
        vec![
            button("📋 Записи", Action::Admin(AdminAction::Activities)),
            button("🗳 Опросы", Action::Admin(AdminAction::Polls)),
        ],
        vec![button("👥 Участники", Action::Admin(AdminAction::Participants))],
        back(Action::NavHome),
    ]);
    ("Админ-панель".to_string(), kb)
}

pub(crate) fn form_prompt(position: StepPosition, default_capacity: u32) -> String {
    let prompt = match (position.kind, position.field) {
        (FormKind::Activity, "name") => "Введите название активности:".to_string(),
        (FormKind::Activity, "description") => "Введите описание активности:".to_string(),
        (FormKind::Activity, "scheduled_at") => {
            "Введите дату и время (например: 15 ноября, 14:00):".to_string()
        }
        (FormKind::Activity, _) => format!(
            "Введите максимальное количество участников.\nИли отправьте \"{}\" для значения по умолчанию ({default_capacity}).",
            engine::CAPACITY_PLACEHOLDER
        ),
        (FormKind::Poll, "question") => "Введите вопрос опроса:".to_string(),
        (FormKind::Poll, _) => format!(
            "Введите варианты ответа, каждый с новой строки (от {} до {}):",
            engine::MIN_OPTIONS,
            engine::MAX_OPTIONS
        ),
        (FormKind::Broadcast, _) => "Введите текст рассылки:".to_string(),
    };
    if position.total > 1 {
        format!("Шаг {}/{}\n{prompt}", position.step, position.total)
    } else {
        prompt
    }
}

pub(crate) fn form_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("❌ Отмена", Action::FormCancel)]])
}

pub(crate) fn admin_return_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("⬅️ В админ-панель", Action::NavAdmin)]])
}

pub(crate) fn render_created_activity(activity: &Activity) -> (String, InlineKeyboardMarkup) {
    let text = format!(
        "✅ Активность создана!\n\n{}\n🕐 {}\n👥 Лимит: {} человек",
        activity.name, activity.scheduled_at, activity.capacity
    );
    (text, admin_return_keyboard())
}

pub(crate) fn render_poll(poll: &Poll) -> (String, InlineKeyboardMarkup) {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = poll
        .options
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            vec![button(
                label.clone(),
                Action::Vote {
                    poll: poll.id,
                    option: idx as i64,
                },
            )]
        })
        .collect();
    rows.push(vec![button("📊 Результаты", Action::Results(poll.id))]);
    (
        format!("📊 Опрос\n\n{}", poll.question),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn percentage_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub(crate) fn render_results(results: &PollResults, is_admin: bool) -> (String, InlineKeyboardMarkup) {
    let mut text = format!("📊 {}\n", results.poll.question);
    for option in &results.options {
        text.push_str(&format!(
            "\n{}\n{} {:.0}% ({})",
            option.label,
            percentage_bar(option.percentage),
            option.percentage,
            option.votes
        ));
    }
    text.push_str(&format!("\n\nВсего голосов: {}", results.total));
    if !results.is_active() {
        text.push_str("\n🔒 Опрос закрыт");
    }

    let mut rows = Vec::new();
    if is_admin {
        if results.is_active() {
            rows.push(vec![button(
                "🔒 Закрыть опрос",
                Action::ClosePoll(results.poll.id),
            )]);
        }
        rows.push(back(Action::Admin(AdminAction::Polls)));
    }

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_admin_activities(activities: &[Activity]) -> (String, InlineKeyboardMarkup) {
    let text = if activities.is_empty() {
        "Активностей пока нет.".to_string()
    } else {
        "Выберите активность для просмотра записей:".to_string()
    };
    let mut rows: Vec<Vec<InlineKeyboardButton>> = activities
        .iter()
        .map(|activity| vec![button(activity.name.clone(), Action::Roster(activity.id))])
        .collect();
    rows.push(back(Action::NavAdmin));
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_roster(roster: &Roster, tz: Tz) -> (String, InlineKeyboardMarkup) {
    let mut text = format!(
        "{}\n👥 Записано: {}/{}\n",
        roster.activity.name,
        roster.bookings.len(),
        roster.activity.capacity
    );
    if roster.bookings.is_empty() {
        text.push_str("\nПока никто не записался");
    }
    for (idx, booking) in roster.bookings.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {}{} • {}",
            idx + 1,
            booking.actor.display_name(),
            booking
                .actor
                .handle()
                .map(|h| format!(" ({h})"))
                .unwrap_or_default(),
            booking.booked_at.with_timezone(&tz).format("%d.%m %H:%M")
        ));
    }

    let kb = InlineKeyboardMarkup::new(vec![
        vec![button("📥 Экспорт CSV", Action::Export(roster.activity.id))],
        back(Action::Admin(AdminAction::Activities)),
    ]);
    (text, kb)
}

pub(crate) fn render_admin_polls(polls: &[Poll]) -> (String, InlineKeyboardMarkup) {
    let text = if polls.is_empty() {
        "Опросов пока нет.".to_string()
    } else {
        "Выберите опрос:".to_string()
    };
    let mut rows: Vec<Vec<InlineKeyboardButton>> = polls
        .iter()
        .map(|poll| {
            let mark = if poll.is_active { "🟢" } else { "🔒" };
            vec![button(
                format!("{mark} {}", poll.question),
                Action::Results(poll.id),
            )]
        })
        .collect();
    rows.push(back(Action::NavAdmin));
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_participants(actors: &[Actor]) -> (String, InlineKeyboardMarkup) {
    let mut text = format!("👥 Участников: {}\n", actors.len());
    for actor in actors {
        text.push_str(&format!("\n• {}", actor.display_name()));
        if let Some(handle) = actor.handle() {
            text.push_str(&format!(" ({handle})"));
        }
    }
    (text, InlineKeyboardMarkup::new(vec![back(Action::NavAdmin)]))
}

pub(crate) fn fan_out_summary(title: &str, report: FanOutReport) -> String {
    format!(
        "{title}\n\n✅ Доставлено: {}\n❌ Ошибок: {}",
        report.delivered, report.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_proportional() {
        assert_eq!(percentage_bar(0.0), "░".repeat(BAR_WIDTH));
        assert_eq!(percentage_bar(100.0), "█".repeat(BAR_WIDTH));
        assert_eq!(percentage_bar(50.0), format!("{}{}", "█".repeat(5), "░".repeat(5)));
    }

    #[test]
    fn full_activity_offers_no_booking_button() {
        let view = CapacityView {
            activity: Activity {
                id: 3,
                name: "Workshop".to_string(),
                description: String::new(),
                scheduled_at: String::new(),
                capacity: 1,
                is_active: true,
            },
            booked: 1,
            is_booked: false,
        };
        let (text, kb) = render_activity(&view);
        assert!(text.contains("Мест нет"));
        assert_eq!(kb.inline_keyboard.len(), 1);
    }

    #[test]
    fn capacity_prompt_mentions_the_default() {
        let position = StepPosition {
            kind: FormKind::Activity,
            step: 4,
            total: 4,
            field: "capacity",
        };
        let prompt = form_prompt(position, 50);
        assert!(prompt.starts_with("Шаг 4/4"));
        assert!(prompt.contains("(50)"));
    }
}
