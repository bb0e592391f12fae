use iced::widget::{button, column, container, text, text_input};
use iced::{Alignment, Element, Length};

use crate::Message;

/// Contents of the sign-in form
#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Request in flight; the submit button is disabled meanwhile
    pub submitting: bool,
    pub error: Option<String>,
}

impl LoginForm {
    fn can_submit(&self) -> bool {
        !self.submitting && !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

pub fn view(form: &LoginForm) -> Element<'_, Message> {
    let submit = button(text(if form.submitting { "Signing in..." } else { "Sign In" }))
        .padding(10)
        .width(Length::Fill)
        .on_press_maybe(form.can_submit().then_some(Message::SubmitLogin));

    let mut content = column![
        text("Image Gallery").size(36),
        text_input("Username", &form.username)
            .on_input(Message::UsernameChanged)
            .on_submit(Message::SubmitLogin)
            .padding(10),
        text_input("Password", &form.password)
            .on_input(Message::PasswordChanged)
            .on_submit(Message::SubmitLogin)
            .secure(true)
            .padding(10),
        submit,
    ]
    .spacing(16)
    .width(Length::Fixed(320.0))
    .align_x(Alignment::Center);

    if let Some(error) = &form.error {
        content = content.push(text(error).style(text::danger));
    }

    content = content.push(text("Demo credentials: user / password").size(12));

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
