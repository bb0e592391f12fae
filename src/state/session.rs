/// Sign-in state
///
/// The token is opaque: its presence is what grants access. It lives in
/// memory, and optionally in a file so a restart keeps the user signed in.
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{GalleryError, Result};

/// Demo credentials accepted by `authenticate`
const DEMO_USERNAME: &str = "user";
const DEMO_PASSWORD: &str = "password";

#[derive(Debug, Default)]
pub struct Session {
    token: Option<String>,
    /// File the token is mirrored to, if remembering is enabled
    store: Option<PathBuf>,
}

impl Session {
    /// Session kept in memory only
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Session backed by `store`, picking up a token left there earlier.
    ///
    /// An unreadable store is treated as signed out.
    pub fn restore(store: PathBuf) -> Self {
        let token = match std::fs::read_to_string(&store) {
            Ok(token) => Some(token.trim().to_string()).filter(|t| !t.is_empty()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("Could not read session from {}: {}", store.display(), err);
                None
            }
        };

        if token.is_some() {
            info!("Restored session from {}", store.display());
        }

        Self {
            token,
            store: Some(store),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn sign_in(&mut self, token: String) -> Result<()> {
        if let Some(store) = &self.store {
            if let Some(parent) = store.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(store, &token)?;
        }

        self.token = Some(token);
        info!("Signed in");
        Ok(())
    }

    /// Forget the token. The in-memory token is dropped even if the store
    /// cannot be cleaned up.
    pub fn sign_out(&mut self) -> Result<()> {
        self.token = None;
        info!("Signed out");

        if let Some(store) = &self.store {
            match std::fs::remove_file(store) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

/// Check credentials against the demo account and issue a token
pub async fn authenticate(username: String, password: String, latency: Duration) -> Result<String> {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    if username == DEMO_USERNAME && password == DEMO_PASSWORD {
        Ok(format!("demo-{}", Utc::now().timestamp_millis()))
    } else {
        Err(GalleryError::Auth(format!("unknown user {username:?} or wrong password")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_authenticate() {
        let token = authenticate("user".into(), "password".into(), Duration::ZERO)
            .await
            .unwrap();
        assert!(token.starts_with("demo-"));

        let err = authenticate("user".into(), "guess".into(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Auth(_)));
    }

    #[test]
    fn test_in_memory_session() {
        let mut session = Session::in_memory();
        assert!(!session.is_authenticated());

        session.sign_in("t".to_string()).unwrap();
        assert_eq!(session.token(), Some("t"));

        session.sign_out().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_stored_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("state").join("session");

        let mut session = Session::restore(store.clone());
        assert!(!session.is_authenticated());
        session.sign_in("abc".to_string()).unwrap();

        let restored = Session::restore(store.clone());
        assert_eq!(restored.token(), Some("abc"));

        session.sign_out().unwrap();
        assert!(!store.exists());
        assert!(!Session::restore(store).is_authenticated());
    }
}
