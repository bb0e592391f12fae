/// Full-size view of a single image
use iced::widget::{button, column, container, image as iced_image, row, text, Space};
use iced::{Alignment, ContentFit, Element, Length};

use crate::state::data::Item;
use crate::Message;

/// What the viewer shows
pub struct ViewerView<'a> {
    pub item: Option<&'a Item>,
    /// Full image, once fetched
    pub handle: Option<&'a iced_image::Handle>,
    pub has_previous: bool,
    pub has_next: bool,
}

pub fn view(state: ViewerView<'_>) -> Element<'_, Message> {
    let Some(item) = state.item else {
        return container(button("Close").on_press(Message::CloseViewer))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    };

    let title = item
        .description
        .as_deref()
        .unwrap_or_else(|| item.id.as_str());

    let toolbar = row![
        button("Close").on_press(Message::CloseViewer).padding(8),
        text(title).size(18),
        Space::with_width(Length::Fill),
        button("Download")
            .on_press(Message::Download(item.id.clone()))
            .padding(8),
        button("Delete")
            .style(button::danger)
            .on_press(Message::Delete(item.id.clone()))
            .padding(8),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let picture: Element<'_, Message> = match state.handle {
        Some(handle) => iced_image(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => container(text("Loading..."))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    };

    let body = row![
        button(text("<").size(24))
            .style(button::text)
            .on_press_maybe(state.has_previous.then_some(Message::ViewerPrevious)),
        picture,
        button(text(">").size(24))
            .style(button::text)
            .on_press_maybe(state.has_next.then_some(Message::ViewerNext)),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    column![toolbar, body].spacing(12).padding(16).into()
}
