/// Long-press recognition for grid cards
///
/// Turns press / release / leave events into exactly one of
/// click, long-press or nothing per press. The recognizer owns no timer:
/// `press` hands out a token, the caller sleeps for `delay()` and reports
/// back through `elapsed`.
use std::time::Duration;

/// Default hold time before a press becomes a long-press
pub const DEFAULT_LONG_PRESS_DELAY: Duration = Duration::from_millis(300);

/// Pointer button that started a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Identifies the press session a timer was armed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressToken(u64);

#[derive(Debug)]
struct PressSession<T> {
    target: T,
    token: PressToken,
    long_press_fired: bool,
}

/// Disambiguates click from long-press for one pointer
#[derive(Debug)]
pub struct LongPress<T> {
    delay: Duration,
    session: Option<PressSession<T>>,
    next_token: u64,
}

impl<T: Clone> LongPress<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            session: None,
            next_token: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Pointer went down on `target`.
    ///
    /// Returns the token to arm a timer with, or `None` for secondary clicks,
    /// which never take part in long-press handling.
    pub fn press(&mut self, button: PointerButton, target: T) -> Option<PressToken> {
        if button == PointerButton::Secondary {
            return None;
        }

        self.next_token += 1;
        let token = PressToken(self.next_token);
        self.session = Some(PressSession {
            target,
            token,
            long_press_fired: false,
        });
        Some(token)
    }

    /// The timer armed for `token` fired. Returns the long-pressed target.
    pub fn elapsed(&mut self, token: PressToken) -> Option<T> {
        let session = self.session.as_mut()?;
        if session.token != token || session.long_press_fired {
            return None;
        }

        session.long_press_fired = true;
        Some(session.target.clone())
    }

    /// Pointer went up. Returns the clicked target unless a long-press already fired.
    pub fn release(&mut self) -> Option<T> {
        let session = self.session.take()?;
        if session.long_press_fired {
            None
        } else {
            Some(session.target)
        }
    }

    /// Pointer left the card before release; nothing fires.
    pub fn leave(&mut self) {
        self.session = None;
    }

    /// Whether a context menu opened now should be swallowed
    pub fn suppress_context_menu(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.long_press_fired)
    }
}

impl<T: Clone> Default for LongPress<T> {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS_DELAY)
    }
}
