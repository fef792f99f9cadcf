use std::sync::{Arc, Mutex, MutexGuard};
use storefront_scenario::prelude::*;

pub const STORE_URL: &str = "https://store.steampowered.com/";
const APP_URL: &str = "https://store.steampowered.com/app/2669320/EA_SPORTS_FC_25/";
const ABOUT_URL: &str = "https://store.steampowered.com/about/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Blank,
    Home,
    App,
    DownloadDialog,
    About,
}

/// What the fake store shows, and what happened to it.
#[derive(Debug, Clone)]
pub struct StoreState {
    pub location: Location,
    pub reachable: bool,
    pub typed: Option<String>,
    pub results: Vec<String>,
    /// Number of lookups of the suggestions before they show up.
    pub results_after_polls: usize,
    /// Number of lookups of the shown suggestions that hit a re-rendered row.
    pub stale_result_polls: usize,
    /// Where the first search suggestion leads.
    pub app_url: String,
    pub app_name: String,
    pub download_button: bool,
    pub install_clickable: bool,
    pub playing_now: String,
    pub online: String,
    pub maximized: bool,
    pub quit: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            location: Location::Blank,
            reachable: true,
            typed: None,
            results: vec![
                "EA SPORTS FC™ 25\n59,99€".to_owned(),
                "FIFA 22\n".to_owned(),
                "FIFA 23\n".to_owned(),
            ],
            results_after_polls: 0,
            stale_result_polls: 0,
            app_url: APP_URL.to_owned(),
            app_name: " EA SPORTS FC™ 25 ".to_owned(),
            download_button: true,
            install_clickable: true,
            playing_now: "PLAYING NOW\n8,123,456".to_owned(),
            online: "ONLINE\n33,456,789".to_owned(),
            maximized: false,
            quit: false,
        }
    }
}

fn stat(class: &str) -> Locator {
    Locator::xpath(format!("//div[div[@class='online_stat_label {class}']]"))
}

/// An in-memory stand-in for the store, driven like a real browser session.
#[derive(Debug, Clone)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("store state not poisoned")
    }

    fn missing(locator: &Locator) -> BrowserError {
        BrowserError::NoSuchElement {
            locator: locator.clone(),
        }
    }

    fn present(state: &StoreState, locator: &Locator) -> bool {
        let search_results = Locator::css(".match_app");
        match state.location {
            Location::Blank => false,
            Location::Home => {
                *locator == Locator::id("store_nav_search_term")
                    || (*locator == search_results && Self::results_shown(state))
            }
            Location::App => {
                *locator == Locator::css(".apphub_AppName")
                    || (*locator == Locator::xpath(r#"//*[@id="demoGameBtn"]/a"#)
                        && state.download_button)
            }
            Location::DownloadDialog => {
                *locator == Locator::xpath("//a[*[text()='No, I need Steam']]")
            }
            Location::About => [
                Locator::id("about_header_area"),
                Locator::class_name("about_install_steam_link"),
                stat("gamers_in_game"),
                stat("gamers_online"),
            ]
            .contains(locator),
        }
    }

    fn results_shown(state: &StoreState) -> bool {
        state.typed.is_some() && state.results_after_polls == 0
    }
}

impl Browser for FakeStore {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state();
        if !state.reachable {
            return Err(BrowserError::Navigation {
                url: url.to_owned(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            });
        }
        state.location = Location::Home;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let state = self.state();
        Ok(match state.location {
            Location::Blank => "about:blank".to_owned(),
            Location::Home => STORE_URL.to_owned(),
            Location::App | Location::DownloadDialog => state.app_url.clone(),
            Location::About => ABOUT_URL.to_owned(),
        })
    }

    async fn maximize(&self) -> Result<(), BrowserError> {
        self.state().maximized = true;
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<String, BrowserError> {
        let state = self.state();
        if !Self::present(&state, locator) {
            return Err(Self::missing(locator));
        }
        Ok(if *locator == Locator::css(".apphub_AppName") {
            state.app_name.clone()
        } else if *locator == stat("gamers_in_game") {
            state.playing_now.clone()
        } else if *locator == stat("gamers_online") {
            state.online.clone()
        } else {
            String::new()
        })
    }

    async fn texts(&self, locator: &Locator) -> Result<Vec<String>, BrowserError> {
        let mut state = self.state();
        if *locator != Locator::css(".match_app") || state.typed.is_none() {
            return Ok(Vec::new());
        }
        if state.results_after_polls > 0 {
            state.results_after_polls -= 1;
            return Ok(Vec::new());
        }
        if state.stale_result_polls > 0 {
            state.stale_result_polls -= 1;
            return Err(BrowserError::StaleElement {
                locator: locator.clone(),
            });
        }
        Ok(state.results.clone())
    }

    async fn state(&self, locator: &Locator) -> Result<ElementState, BrowserError> {
        let state = self.state();
        if !Self::present(&state, locator) {
            return Err(Self::missing(locator));
        }
        let clickable = *locator != Locator::class_name("about_install_steam_link")
            || state.install_clickable;
        Ok(ElementState {
            displayed: clickable,
            enabled: clickable,
        })
    }

    async fn clear_and_type(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let mut state = self.state();
        if !Self::present(&state, locator) {
            return Err(Self::missing(locator));
        }
        state.typed = Some(text.to_owned());
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        let mut state = self.state();
        if !Self::present(&state, locator) {
            return Err(Self::missing(locator));
        }
        state.location = match state.location {
            Location::App => Location::DownloadDialog,
            Location::DownloadDialog => Location::About,
            other => other,
        };
        Ok(())
    }

    async fn script_click(&self, locator: &Locator) -> Result<(), BrowserError> {
        let mut state = self.state();
        if !Self::present(&state, locator) {
            return Err(Self::missing(locator));
        }
        if state.location == Location::Home {
            state.location = Location::App;
        }
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, BrowserError> {
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn quit(self) -> Result<(), BrowserError> {
        self.state().quit = true;
        Ok(())
    }
}

/// Hands out [`FakeStore`] sessions that all share one observable state.
#[derive(Debug, Clone, Default)]
pub struct FakeStoreFactory {
    state: Arc<Mutex<StoreState>>,
    pub browser_missing: bool,
}

impl FakeStoreFactory {
    pub fn new(state: StoreState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            browser_missing: false,
        }
    }

    /// A factory that fails to open any session.
    pub fn without_browser() -> Self {
        Self {
            browser_missing: true,
            ..Self::default()
        }
    }

    /// Snapshot of the store after (or during) a run.
    pub fn snapshot(&self) -> StoreState {
        self.state.lock().expect("store state not poisoned").clone()
    }
}

impl SessionFactory for FakeStoreFactory {
    type Session = FakeStore;

    async fn create_session(
        &self,
        kind: BrowserKind,
        _private_mode: bool,
    ) -> Result<FakeStore, BrowserError> {
        if self.browser_missing {
            return Err(BrowserError::Provisioning {
                source: format!("no {kind} installation found").into(),
            });
        }
        Ok(FakeStore {
            state: Arc::clone(&self.state),
        })
    }
}
