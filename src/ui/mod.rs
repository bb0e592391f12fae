/// View layer
///
/// Pure functions from application state to widgets. All interaction is
/// reported through `Message`s handled in `main.rs`.
pub mod gallery;
pub mod login;
pub mod viewer;

use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Border, Element, Length, Theme};

use crate::state::notice::{NoticeKind, Notices};
use crate::Message;

/// Width of the notification column
const NOTICE_WIDTH: f32 = 320.0;

/// Show `content` with the current notifications stacked below it
pub fn with_notices<'a>(content: Element<'a, Message>, notices: &'a Notices) -> Element<'a, Message> {
    if notices.is_empty() {
        return content;
    }

    let toasts = notices.iter().map(|notice| -> Element<'a, Message> {
        let kind = notice.kind;
        let title = text(&notice.title).size(15);
        let title = match kind {
            NoticeKind::Info => title,
            NoticeKind::Error => title.style(text::danger),
        };

        let card = row![
            column![
                title,
                text(&notice.body).size(13),
                text(notice.posted_at.format("%H:%M:%S").to_string()).size(11),
            ]
            .spacing(2)
            .width(Length::Fill),
            button(text("×").size(14))
                .style(button::text)
                .on_press(Message::DismissNotice(notice.id)),
        ]
        .spacing(8)
        .align_y(Alignment::Start);

        container(card)
            .padding(10)
            .width(Length::Fixed(NOTICE_WIDTH))
            .style(move |theme: &Theme| notice_style(theme, kind))
            .into()
    });

    column![
        container(content).height(Length::Fill),
        row![
            Space::with_width(Length::Fill),
            column(toasts).spacing(6)
        ]
        .padding(10),
    ]
    .into()
}

fn notice_style(theme: &Theme, kind: NoticeKind) -> container::Style {
    let palette = theme.extended_palette();
    let accent = match kind {
        NoticeKind::Info => palette.primary.strong.color,
        NoticeKind::Error => palette.danger.strong.color,
    };

    container::Style {
        background: Some(palette.background.weak.color.into()),
        border: Border {
            color: accent,
            width: 2.0,
            radius: 6.0.into(),
        },
        ..container::Style::default()
    }
}
