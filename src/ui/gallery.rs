/// Paged image grid with selection and batch controls
use std::collections::HashMap;

use iced::widget::{
    button, checkbox, column, container, image as iced_image, mouse_area, row, scrollable, text,
    Space,
};
use iced::{Alignment, Border, ContentFit, Element, Length, Pixels, Theme};
use iced_aw::Wrap;

use crate::batch::BatchDownload;
use crate::state::data::{Item, ItemId};
use crate::state::gallery::Gallery;
use crate::Message;

const CARD_WIDTH: f32 = 200.0;
const CARD_IMAGE_HEIGHT: f32 = 150.0;
const GRID_SPACING: f32 = 12.0;

/// Everything the grid needs from the application
pub struct GalleryView<'a> {
    pub gallery: &'a Gallery,
    pub thumbnails: &'a HashMap<ItemId, iced_image::Handle>,
    pub source_label: String,
    pub batch: Option<&'a BatchDownload>,
}

pub fn view(state: GalleryView<'_>) -> Element<'_, Message> {
    let GalleryView {
        gallery,
        thumbnails,
        source_label,
        batch,
    } = state;

    column![header(gallery, source_label, batch), grid(gallery, thumbnails)]
        .spacing(12)
        .padding(16)
        .into()
}

fn header<'a>(gallery: &'a Gallery, source_label: String, batch: Option<&'a BatchDownload>) -> Element<'a, Message> {
    let mut bar = row![
        column![text("Image Gallery").size(24), text(source_label).size(12)].spacing(2),
        Space::with_width(Length::Fill),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    if gallery.is_selection_mode() {
        bar = bar
            .push(text(format!("{} selected", gallery.selected_ids().len())))
            .push(button("Deselect All").on_press(Message::DeselectAll).padding(8));
    }

    match batch {
        Some(batch) => {
            let summary = batch.summary();
            let status = if summary.cancelled {
                "Cancelling...".to_string()
            } else {
                format!(
                    "Downloading {} of {}",
                    summary.requested - batch.remaining(),
                    summary.requested
                )
            };
            bar = bar.push(text(status)).push(
                button("Cancel")
                    .style(button::secondary)
                    .on_press_maybe((!summary.cancelled).then_some(Message::CancelBatch))
                    .padding(8),
            );
        }
        None if gallery.is_selection_mode() => {
            bar = bar.push(
                button("Download Selected")
                    .on_press(Message::DownloadSelected)
                    .padding(8),
            );
        }
        None => {}
    }

    bar.push(
        button("Download Folder...")
            .style(button::secondary)
            .on_press(Message::PickDownloadDir)
            .padding(8),
    )
    .push(
        button("Logout")
            .style(button::secondary)
            .on_press(Message::Logout)
            .padding(8),
    )
    .into()
}

fn grid<'a>(gallery: &'a Gallery, thumbnails: &'a HashMap<ItemId, iced_image::Handle>) -> Element<'a, Message> {
    if gallery.items().is_empty() {
        let message = if gallery.is_loading() {
            "Loading images..."
        } else {
            "No Images Found"
        };
        return container(text(message).size(20))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let cards = gallery
        .items()
        .iter()
        .map(|item| card(item, gallery, thumbnails.get(&item.id)))
        .collect();

    let footer: Element<'a, Message> = if gallery.is_loading() {
        text("Loading more...").into()
    } else if gallery.is_exhausted() {
        text(format!("All {} images loaded", gallery.items().len())).into()
    } else {
        button("Load More").on_press(Message::LoadMore).padding(10).into()
    };

    let content = column![
        Wrap::with_elements(cards)
            .spacing(Pixels(GRID_SPACING))
            .line_spacing(Pixels(GRID_SPACING)),
        container(footer).center_x(Length::Fill).padding(16),
    ]
    .spacing(GRID_SPACING);

    scrollable(content)
        .on_scroll(Message::Scrolled)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn card<'a>(item: &'a Item, gallery: &Gallery, thumbnail: Option<&'a iced_image::Handle>) -> Element<'a, Message> {
    let selected = gallery.is_selected(&item.id);

    let picture: Element<'a, Message> = match thumbnail {
        Some(handle) => iced_image(handle.clone())
            .content_fit(ContentFit::Cover)
            .width(Length::Fill)
            .height(Length::Fixed(CARD_IMAGE_HEIGHT))
            .into(),
        None => container(text("...").size(14))
            .center_x(Length::Fill)
            .center_y(Length::Fixed(CARD_IMAGE_HEIGHT))
            .into(),
    };

    let label = item.description.as_deref().unwrap_or_else(|| item.id.as_str());

    let mut actions = row![].spacing(6).align_y(Alignment::Center);
    if gallery.is_selection_mode() {
        let id = item.id.clone();
        actions = actions.push(checkbox("", selected).on_toggle(move |_| Message::ToggleSelection(id.clone())));
    }
    actions = actions
        .push(Space::with_width(Length::Fill))
        .push(
            button(text("Download").size(12))
                .on_press(Message::Download(item.id.clone()))
                .padding(4),
        )
        .push(
            button(text("Delete").size(12))
                .style(button::danger)
                .on_press(Message::Delete(item.id.clone()))
                .padding(4),
        );

    let body = container(
        column![picture, text(label).size(13), actions]
            .spacing(6)
            .width(Length::Fixed(CARD_WIDTH)),
    )
    .padding(6)
    .style(move |theme: &Theme| card_style(theme, selected));

    mouse_area(body)
        .on_press(Message::CardPressed(item.id.clone()))
        .on_release(Message::CardReleased)
        .on_right_press(Message::CardRightPressed(item.id.clone()))
        .on_exit(Message::CardLeft)
        .into()
}

fn card_style(theme: &Theme, selected: bool) -> container::Style {
    let palette = theme.extended_palette();
    let (color, width) = if selected {
        (palette.primary.strong.color, 3.0)
    } else {
        (palette.background.strong.color, 1.0)
    };

    container::Style {
        background: Some(palette.background.weak.color.into()),
        border: Border {
            color,
            width,
            radius: 6.0.into(),
        },
        ..container::Style::default()
    }
}
