use crate::browser::{Browser, BrowserError, BrowserKind};

/// Opens browser sessions.
///
/// The runner asks for exactly one session per run and owns it until the run ends.
#[allow(async_fn_in_trait)]
pub trait SessionFactory {
    /// The session type handed out.
    type Session: Browser;

    /// Opens a new session of the given `kind`. In `private_mode`, the browser starts an
    /// incognito/in-private window without access to existing profile data.
    async fn create_session(
        &self,
        kind: BrowserKind,
        private_mode: bool,
    ) -> Result<Self::Session, BrowserError>;
}
