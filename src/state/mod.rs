/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - Loaded items, selection and paging (gallery.rs)
/// - Sign-in token (session.rs)
/// - User-visible notifications (notice.rs)

pub mod data;
pub mod gallery;
pub mod notice;
pub mod session;
