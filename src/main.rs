use iced::widget::{image as iced_image, scrollable};
use iced::{Element, Subscription, Task, Theme};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

mod batch;
mod config;
mod download;
mod error;
mod gesture;
mod logging;
mod source;
mod state;
mod thumbnail;
mod ui;

use batch::{BatchDownload, BatchEvent, Recorded, Step};
use config::Config;
use error::GalleryError;
use gesture::{LongPress, PointerButton, PressToken};
use source::Source;
use state::data::{ItemId, Page};
use state::gallery::{Direction, Gallery, LoadKind, PageOutcome, PageRequest, Removed, ScrollMetrics};
use state::notice::Notices;
use state::session::{self, Session};
use thumbnail::Thumbnail;

/// Simulated round trip of the demo sign-in
const LOGIN_LATENCY: Duration = Duration::from_millis(500);

/// Which top-level screen is showing
#[derive(Debug)]
enum Screen {
    Login(ui::login::LoginForm),
    Gallery,
}

/// Image opened in the full-size viewer
#[derive(Debug)]
struct Viewer {
    id: ItemId,
    /// Full image, once fetched
    handle: Option<iced_image::Handle>,
}

/// Main application state
struct GalleryApp {
    config: Config,
    source: Source,
    session: Session,
    screen: Screen,
    /// Loaded items, selection and paging
    gallery: Gallery,
    /// Click / long-press disambiguation for the grid cards
    press: LongPress<ItemId>,
    thumbnails: HashMap<ItemId, iced_image::Handle>,
    viewer: Option<Viewer>,
    /// Batch download in progress, if any
    batch: Option<BatchDownload>,
    /// Bumped per batch so replies to an earlier batch are recognised
    batch_serial: u64,
    notices: Notices,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    // Sign-in
    UsernameChanged(String),
    PasswordChanged(String),
    SubmitLogin,
    LoginFinished(Result<String, GalleryError>),
    Logout,

    // Paging
    LoadMore,
    PageLoaded(PageRequest, Result<Page, GalleryError>),
    Scrolled(scrollable::Viewport),
    ThumbnailReady(ItemId, Result<Thumbnail, GalleryError>),

    // Pointer gestures on a card
    CardPressed(ItemId),
    CardRightPressed(ItemId),
    CardReleased,
    CardLeft,
    LongPressElapsed(PressToken),

    // Selection
    ToggleSelection(ItemId),
    DeselectAll,

    // Single image actions
    Delete(ItemId),
    Deleted(Removed, Result<(), GalleryError>),
    Download(ItemId),
    Downloaded(ItemId, Result<PathBuf, GalleryError>),
    ViewerLoaded(ItemId, Result<Vec<u8>, GalleryError>),
    ViewerPrevious,
    ViewerNext,
    CloseViewer,

    // Batch download
    DownloadSelected,
    BatchItemDone(u64, ItemId, Result<PathBuf, GalleryError>),
    BatchAdvance(u64),
    CancelBatch,

    // Settings and notifications
    PickDownloadDir,
    DownloadDirPicked(Option<PathBuf>),
    DismissNotice(u64),
    Tick,
}

impl GalleryApp {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let (config, config_error) = match Config::load() {
            Ok(config) => (config, None),
            Err(err) => (Config::default(), Some(err)),
        };

        let mut notices = Notices::new(config.notice_ttl());
        if let Some(err) = config_error {
            warn!("Falling back to default config: {}", err);
            notices.error("Configuration", err.user_message());
        }

        let source = Source::from_config(&config.source).unwrap_or_else(|err| {
            warn!("Falling back to the demo collection: {}", err);
            notices.error("Configuration", format!("Using the demo collection. {}", err));
            Source::demo()
        });

        let session = if config.remember_session {
            Session::restore(Config::session_path())
        } else {
            Session::in_memory()
        };

        info!("Image gallery started with source: {}", source.label());

        let mut app = GalleryApp {
            source: source.with_token(session.token().map(str::to_string)),
            screen: Screen::Login(ui::login::LoginForm::default()),
            gallery: Gallery::new(config.page_size),
            press: LongPress::new(config.long_press_delay()),
            thumbnails: HashMap::new(),
            viewer: None,
            batch: None,
            batch_serial: 0,
            notices,
            session,
            config,
        };

        let task = if app.session.is_authenticated() {
            app.screen = Screen::Gallery;
            app.load_initial()
        } else {
            Task::none()
        };

        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UsernameChanged(value) => {
                if let Screen::Login(form) = &mut self.screen {
                    form.username = value;
                }
                Task::none()
            }
            Message::PasswordChanged(value) => {
                if let Screen::Login(form) = &mut self.screen {
                    form.password = value;
                }
                Task::none()
            }
            Message::SubmitLogin => {
                let Screen::Login(form) = &mut self.screen else {
                    return Task::none();
                };
                if form.submitting {
                    return Task::none();
                }
                form.submitting = true;
                form.error = None;

                Task::perform(
                    session::authenticate(form.username.clone(), form.password.clone(), LOGIN_LATENCY),
                    Message::LoginFinished,
                )
            }
            Message::LoginFinished(result) => self.finish_login(result),
            Message::Logout => {
                self.logout();
                Task::none()
            }

            Message::LoadMore => match self.gallery.begin_more() {
                Some(request) => self.fetch_page(request),
                None => Task::none(),
            },
            Message::PageLoaded(request, result) => self.apply_page(request, result),
            Message::Scrolled(viewport) => {
                let metrics = ScrollMetrics {
                    offset_y: viewport.absolute_offset().y,
                    viewport_height: viewport.bounds().height,
                    content_height: viewport.content_bounds().height,
                };
                match self.gallery.on_scroll(metrics, self.config.scroll_threshold_px) {
                    Some(request) => self.fetch_page(request),
                    None => Task::none(),
                }
            }
            Message::ThumbnailReady(id, result) => {
                match result {
                    Ok(thumb) if self.gallery.item(&id).is_some() => {
                        let handle = iced_image::Handle::from_rgba(thumb.width, thumb.height, thumb.pixels);
                        self.thumbnails.insert(id, handle);
                    }
                    Ok(_) => {}
                    Err(err) => warn!(id = %id, "Thumbnail failed: {}", err),
                }
                Task::none()
            }

            Message::CardPressed(id) => match self.press.press(PointerButton::Primary, id) {
                Some(token) => Task::perform(tokio::time::sleep(self.press.delay()), move |_| {
                    Message::LongPressElapsed(token)
                }),
                None => Task::none(),
            },
            Message::CardRightPressed(id) => {
                if self.press.suppress_context_menu() {
                    debug!(id = %id, "Context menu swallowed after long press");
                }
                Task::none()
            }
            Message::LongPressElapsed(token) => {
                if let Some(id) = self.press.elapsed(token) {
                    self.gallery.start_selection(&id);
                }
                Task::none()
            }
            Message::CardReleased => match self.press.release() {
                Some(id) if self.gallery.is_selection_mode() => {
                    self.gallery.toggle_selection(&id);
                    Task::none()
                }
                Some(id) => self.open_viewer(id),
                None => Task::none(),
            },
            Message::CardLeft => {
                self.press.leave();
                Task::none()
            }

            Message::ToggleSelection(id) => {
                self.gallery.toggle_selection(&id);
                Task::none()
            }
            Message::DeselectAll => {
                self.gallery.deselect_all();
                Task::none()
            }

            Message::Delete(id) => self.delete(id),
            Message::Deleted(removed, result) => {
                match result {
                    Ok(()) => {
                        self.thumbnails.remove(&removed.item.id);
                        self.notices
                            .info("Image Deleted", "The image has been successfully removed.");
                    }
                    Err(err) => {
                        warn!(id = %removed.item.id, "Delete failed: {}", err);
                        if self.config.restore_failed_deletes {
                            self.gallery.restore(removed);
                        }
                        self.notices.error("Error", format!("Failed to delete image. {}", err.user_message()));
                    }
                }
                Task::none()
            }
            Message::Download(id) => {
                let Some(item) = self.gallery.item(&id).cloned() else {
                    return Task::none();
                };
                Task::perform(
                    download::download_item(self.source.clone(), item, self.config.download_dir()),
                    move |result| Message::Downloaded(id.clone(), result),
                )
            }
            Message::Downloaded(id, result) => {
                match result {
                    Ok(path) => self.notices.info("Download Complete", format!("Saved {}", path.display())),
                    Err(err) => {
                        warn!(id = %id, "Download failed: {}", err);
                        self.notices.error("Download Failed", format!("Could not download {}.", id));
                    }
                }
                Task::none()
            }
            Message::ViewerLoaded(id, result) => {
                let Some(viewer) = self.viewer.as_mut().filter(|v| v.id == id) else {
                    return Task::none();
                };
                match result {
                    Ok(bytes) => viewer.handle = Some(iced_image::Handle::from_bytes(bytes)),
                    Err(err) => {
                        warn!(id = %id, "Could not open image: {}", err);
                        self.viewer = None;
                        self.notices.error("Error", err.user_message());
                    }
                }
                Task::none()
            }
            Message::ViewerPrevious => self.step_viewer(Direction::Previous),
            Message::ViewerNext => self.step_viewer(Direction::Next),
            Message::CloseViewer => {
                self.viewer = None;
                Task::none()
            }

            Message::DownloadSelected => {
                if self.batch.is_some() || !self.gallery.is_selection_mode() {
                    return Task::none();
                }
                let (batch, started) =
                    BatchDownload::start(self.gallery.selected_ids().to_vec(), self.config.batch_pacing());
                self.batch = Some(batch);
                self.batch_serial += 1;
                self.on_batch_event(started);
                self.advance_batch()
            }
            Message::BatchItemDone(serial, id, result) => {
                let current = self.batch_serial;
                let Some(batch) = self.batch.as_mut().filter(|_| serial == current) else {
                    debug!(id = %id, "Dropping reply from an earlier batch");
                    return Task::none();
                };
                let Recorded::Counted(event) = batch.record(&id, result.map(|_| ())) else {
                    // Still waiting on the item handed out by `next`
                    return Task::none();
                };
                let pause = batch.pause();

                if let Some(event) = event {
                    self.on_batch_event(event);
                }
                match pause {
                    Some(pause) => Task::perform(tokio::time::sleep(pause), move |_| Message::BatchAdvance(serial)),
                    None => self.advance_batch(),
                }
            }
            Message::BatchAdvance(serial) if serial == self.batch_serial => self.advance_batch(),
            Message::BatchAdvance(_) => Task::none(),
            Message::CancelBatch => {
                if let Some(batch) = self.batch.as_mut() {
                    batch.cancel();
                }
                Task::none()
            }

            Message::PickDownloadDir => Task::perform(
                async {
                    rfd::AsyncFileDialog::new()
                        .set_title("Choose Download Folder")
                        .pick_folder()
                        .await
                        .map(|folder| folder.path().to_path_buf())
                },
                Message::DownloadDirPicked,
            ),
            Message::DownloadDirPicked(Some(dir)) => {
                self.config.download_dir = Some(dir.clone());
                match self.config.save() {
                    Ok(()) => self
                        .notices
                        .info("Download Folder", format!("Downloads will be saved to {}", dir.display())),
                    Err(err) => {
                        warn!("Could not save config: {}", err);
                        self.notices.error("Download Folder", err.user_message());
                    }
                }
                Task::none()
            }
            Message::DownloadDirPicked(None) => Task::none(),
            Message::DismissNotice(id) => {
                self.notices.dismiss(id);
                Task::none()
            }
            Message::Tick => {
                self.notices.expire(chrono::Local::now());
                Task::none()
            }
        }
    }

    fn finish_login(&mut self, result: Result<String, GalleryError>) -> Task<Message> {
        let Screen::Login(form) = &mut self.screen else {
            return Task::none();
        };
        form.submitting = false;

        let token = match result {
            Ok(token) => token,
            Err(err) => {
                warn!("Sign-in refused: {}", err);
                form.error = Some(err.user_message().to_string());
                return Task::none();
            }
        };

        if let Err(err) = self.session.sign_in(token.clone()) {
            warn!("Could not store session: {}", err);
            form.error = Some(err.user_message().to_string());
            return Task::none();
        }

        self.source = self.source.clone().with_token(Some(token));
        self.screen = Screen::Gallery;
        self.load_initial()
    }

    /// Tear down everything tied to the signed-in user
    fn logout(&mut self) {
        if let Err(err) = self.session.sign_out() {
            warn!("Could not clear stored session: {}", err);
        }
        self.source = self.source.clone().with_token(None);
        self.gallery.reset();
        self.press.leave();
        self.thumbnails.clear();
        self.viewer = None;
        self.batch = None;
        self.screen = Screen::Login(ui::login::LoginForm::default());
    }

    fn load_initial(&mut self) -> Task<Message> {
        match self.gallery.begin_initial() {
            Some(request) => self.fetch_page(request),
            None => Task::none(),
        }
    }

    fn fetch_page(&self, request: PageRequest) -> Task<Message> {
        let source = self.source.clone();
        Task::perform(
            async move { source.list_images(request.page, request.limit).await },
            move |result| Message::PageLoaded(request, result),
        )
    }

    fn apply_page(&mut self, request: PageRequest, result: Result<Page, GalleryError>) -> Task<Message> {
        match self.gallery.finish_page(request, result) {
            Ok(PageOutcome::Applied { appended, duplicates }) => {
                if duplicates > 0 {
                    debug!(duplicates, next_page = self.gallery.cursor(), "Skipped images already on screen");
                }
                if request.kind == LoadKind::Initial {
                    self.thumbnails.clear();
                }
                self.load_thumbnails(appended)
            }
            Ok(PageOutcome::Discarded) => Task::none(),
            Err(err) => {
                self.notices
                    .error("Error", format!("Failed to load images. {}", err.user_message()));
                Task::none()
            }
        }
    }

    fn load_thumbnails(&self, ids: Vec<ItemId>) -> Task<Message> {
        let tasks = ids.into_iter().filter_map(|id| {
            let url = self.gallery.item(&id)?.image_url.clone();
            let source = self.source.clone();

            Some(Task::perform(
                async move {
                    let bytes = source.fetch_binary(&url).await?;
                    thumbnail::generate_thumbnail(bytes).await
                },
                move |result| Message::ThumbnailReady(id.clone(), result),
            ))
        });

        Task::batch(tasks)
    }

    fn open_viewer(&mut self, id: ItemId) -> Task<Message> {
        let Some(item) = self.gallery.item(&id) else {
            return Task::none();
        };
        let url = item.image_url.clone();
        let source = self.source.clone();
        self.viewer = Some(Viewer {
            id: id.clone(),
            handle: None,
        });

        Task::perform(
            async move { source.fetch_binary(&url).await },
            move |result| Message::ViewerLoaded(id.clone(), result),
        )
    }

    /// Show the neighbouring image; does nothing at either end of the loaded items
    fn step_viewer(&mut self, direction: Direction) -> Task<Message> {
        let Some(viewer) = &self.viewer else {
            return Task::none();
        };
        match self.gallery.neighbour(&viewer.id, direction) {
            Some(item) => {
                let id = item.id.clone();
                self.open_viewer(id)
            }
            None => Task::none(),
        }
    }

    /// Optimistic delete: the card disappears before the server answers
    fn delete(&mut self, id: ItemId) -> Task<Message> {
        let Some(removed) = self.gallery.remove(&id) else {
            return Task::none();
        };
        if self.viewer.as_ref().is_some_and(|v| v.id == id) {
            self.viewer = None;
        }

        let source = self.source.clone();
        Task::perform(
            async move { source.delete_image(&id).await },
            move |result| Message::Deleted(removed.clone(), result),
        )
    }

    /// Start the next download of the running batch, or wrap it up
    fn advance_batch(&mut self) -> Task<Message> {
        let Some(batch) = self.batch.as_mut() else {
            return Task::none();
        };
        let gallery = &self.gallery;

        match batch.next(|id| gallery.item(id).cloned()) {
            Step::Download(item) => {
                let id = item.id.clone();
                let serial = self.batch_serial;
                Task::perform(
                    download::download_item(self.source.clone(), item, self.config.download_dir()),
                    move |result| Message::BatchItemDone(serial, id.clone(), result),
                )
            }
            Step::Finished(summary) => {
                self.batch = None;
                self.on_batch_event(BatchEvent::Finished(summary));
                Task::none()
            }
        }
    }

    fn on_batch_event(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Started { total } => self.notices.info(
                "Starting Batch Download",
                format!("Preparing to download {} images.", total),
            ),
            BatchEvent::ItemFailed { id, error } => self.notices.error(
                "Download Failed",
                format!("Could not download {}. {}", id, error.user_message()),
            ),
            BatchEvent::Finished(summary) if summary.cancelled => self.notices.info(
                "Batch Download Cancelled",
                format!("{} of {} images downloaded.", summary.downloaded, summary.requested),
            ),
            BatchEvent::Finished(summary) => {
                let mut body = format!("{} of {} images downloaded.", summary.downloaded, summary.requested);
                if summary.skipped > 0 {
                    body.push_str(&format!(" {} no longer available.", summary.skipped));
                }
                self.notices.info("Batch Download Complete", body);
                self.gallery.deselect_all();
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let content = match &self.screen {
            Screen::Login(form) => ui::login::view(form),
            Screen::Gallery => match &self.viewer {
                Some(viewer) => ui::viewer::view(ui::viewer::ViewerView {
                    item: self.gallery.item(&viewer.id),
                    handle: viewer.handle.as_ref(),
                    has_previous: self.gallery.neighbour(&viewer.id, Direction::Previous).is_some(),
                    has_next: self.gallery.neighbour(&viewer.id, Direction::Next).is_some(),
                }),
                None => ui::gallery::view(ui::gallery::GalleryView {
                    gallery: &self.gallery,
                    thumbnails: &self.thumbnails,
                    source_label: self.source.label(),
                    batch: self.batch.as_ref(),
                }),
            },
        };

        ui::with_notices(content, &self.notices)
    }

    /// Expire notifications while any are showing
    fn subscription(&self) -> Subscription<Message> {
        if self.notices.is_empty() {
            Subscription::none()
        } else {
            iced::time::every(Duration::from_secs(1)).map(|_| Message::Tick)
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    logging::init();

    iced::application("Image Gallery", GalleryApp::update, GalleryApp::view)
        .subscription(GalleryApp::subscription)
        .theme(GalleryApp::theme)
        .centered()
        .run_with(GalleryApp::new)
}
