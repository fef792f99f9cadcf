//! "Search and navigate to the Steam About page".
//!
//! Searches the store for a game, checks the first two suggestions, opens the first one,
//! follows its download link to the "About Steam" page and checks what that page shows.

use crate::browser::{Browser, Locator};
use crate::report::ReportSink;
use crate::scenario::{Scenario, ScenarioError, Steps, Verdict, eq_ignore_case};
use regex::Regex;
use std::sync::LazyLock;
use typed_builder::TypedBuilder;

const SEARCH_INPUT: &str = "store_nav_search_term";
const SEARCH_RESULT: &str = ".match_app";
const APP_NAME: &str = ".apphub_AppName";
const DOWNLOAD_BUTTON: &str = r#"//*[@id="demoGameBtn"]/a"#;
const NO_STEAM_BUTTON: &str = "//a[*[text()='No, I need Steam']]";
const ABOUT_HEADER: &str = "about_header_area";
const INSTALL_STEAM_LINK: &str = "about_install_steam_link";
const PLAYING_NOW_STAT: &str = "online_stat_label gamers_in_game";
const ONLINE_STAT: &str = "online_stat_label gamers_online";

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// The store scenario, parameterized over where it runs and what it expects to find.
#[derive(Debug, Clone, TypedBuilder)]
pub struct StoreAboutScenario {
    #[builder(default = "https://store.steampowered.com/".to_owned(), setter(into))]
    pub base_url: String,

    #[builder(default = "FIFA".to_owned(), setter(into))]
    pub search_term: String,

    /// Expected title of the first search suggestion.
    #[builder(default = "EA SPORTS FC™ 25".to_owned(), setter(into))]
    pub first_result: String,

    /// Expected title of the second search suggestion.
    #[builder(default = "FIFA 22".to_owned(), setter(into))]
    pub second_result: String,
}

impl Default for StoreAboutScenario {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StoreAboutScenario {
    /// `<host>/<page>`, e.g. `store.steampowered.com/app`, for matching against URLs.
    fn page_url_fragment(&self, page: &str) -> String {
        let host = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_scheme, rest)| rest)
            .trim_end_matches('/');
        format!("{host}/{page}")
    }
}

impl Scenario for StoreAboutScenario {
    fn name(&self) -> &str {
        "Search and navigate to the Steam About page"
    }

    async fn run<B: Browser, R: ReportSink + ?Sized>(
        &self,
        steps: &mut Steps<'_, B, R>,
    ) -> Result<(), ScenarioError> {
        let search_result = Locator::css(SEARCH_RESULT);

        // Pre-conditions.
        steps.info("Pre-condition 0.1: The browser opens in private mode");
        steps
            .action(
                &format!("Pre-condition 0.2: Go to {}", self.base_url),
                async |page| page.goto(&self.base_url).await,
            )
            .await?;

        // Step 1.
        steps
            .action(
                &format!("Step 1: Type '{}' in the search field", self.search_term),
                async |page| {
                    page.type_into(&Locator::id(SEARCH_INPUT), &self.search_term)
                        .await
                },
            )
            .await?;
        let titles = steps
            .action("Step 1: Wait for the search suggestions", async |page| {
                page.texts_at_least(&search_result, 2).await
            })
            .await?;
        let first_title = first_line(&titles[0]);
        let second_title = first_line(&titles[1]);

        steps
            .verify(
                &format!("Verification 1.1: first search result = '{first_title}'"),
                async |_page| {
                    Ok(Verdict::check(
                        eq_ignore_case(&first_title, &self.first_result),
                        format!(
                            "Expected Result 1.1: The first search result is '{}': '{first_title}'",
                            self.first_result
                        ),
                        format!(
                            "Verification 1.1: expected 1st item = '{}', actual 1st item = '{first_title}'",
                            self.first_result
                        ),
                    ))
                },
            )
            .await;
        steps
            .verify(
                &format!("Verification 1.2: second search result = '{second_title}'"),
                async |_page| {
                    Ok(Verdict::check(
                        eq_ignore_case(&second_title, &self.second_result),
                        format!(
                            "Expected Result 1.2: The second search result is '{}': '{second_title}'",
                            self.second_result
                        ),
                        format!(
                            "Verification 1.2: expected 2nd item = '{}', actual 2nd item = '{second_title}'",
                            self.second_result
                        ),
                    ))
                },
            )
            .await;

        // Step 2.
        steps
            .action(
                "Step 2: Click the first result using JavaScript",
                async |page| page.script_click_first(&search_result).await,
            )
            .await?;
        let app_page = self.page_url_fragment("app");
        steps
            .verify("Verification 2.1: The game page is displayed", async |page| {
                page.url_containing(&app_page).await?;
                Ok(Verdict::Pass(
                    "Expected Result 2.1: The game page is displayed".to_owned(),
                ))
            })
            .await;
        steps
            .verify(
                "Verification 2.2: The game name equals the name of the 1st search result",
                async |page| {
                    let app_name = page.text(&Locator::css(APP_NAME)).await?;
                    let app_name = app_name.trim();
                    Ok(Verdict::check(
                        eq_ignore_case(app_name, &first_title),
                        "Expected Result 2.2: The game name equals the name of the 1st search result",
                        format!(
                            "Verification 2.2: expected game name = '{first_title}', actual game name = '{app_name}'"
                        ),
                    ))
                },
            )
            .await;

        // Step 3.
        steps
            .action("Step 3: Click the 'Download' button", async |page| {
                page.click(&Locator::xpath(DOWNLOAD_BUTTON)).await
            })
            .await?;

        // Step 4.
        steps
            .action("Step 4: Click the 'No, I need Steam' button", async |page| {
                page.click(&Locator::xpath(NO_STEAM_BUTTON)).await
            })
            .await?;
        let about_page = self.page_url_fragment("about");
        steps
            .verify("Verification 4.1: The 'About Steam' page is displayed", async |page| {
                page.url_containing(&about_page).await?;
                let header = page.state(&Locator::id(ABOUT_HEADER)).await?;
                Ok(Verdict::check(
                    header.enabled,
                    "Expected Result 4.1: The 'About Steam' page is displayed",
                    "Verification 4.1: The 'About Steam' header is not enabled",
                ))
            })
            .await;
        steps
            .verify("Verification 4.2: The 'Install Steam' button is clickable", async |page| {
                let install = page.state(&Locator::class_name(INSTALL_STEAM_LINK)).await?;
                Ok(Verdict::check(
                    install.is_clickable(),
                    "Expected Result 4.2: The 'Install Steam' button is clickable",
                    format!("Verification 4.2: The 'Install Steam' button is not clickable: {install:?}"),
                ))
            })
            .await;
        steps
            .verify(
                "Verification 4.3: 'Playing now' gamers are fewer than 'online' gamers",
                async |page| {
                    let playing_now = parse_stat(&page.text(&stat_locator(PLAYING_NOW_STAT)).await?);
                    let online = parse_stat(&page.text(&stat_locator(ONLINE_STAT)).await?);
                    Ok(Verdict::check(
                        playing_now < online,
                        format!(
                            "Expected Result 4.3: 'Playing now' ({playing_now}) is less than 'Online' ({online})"
                        ),
                        format!(
                            "Verification 4.3: 'Playing now' ({playing_now}) is not less than 'Online' ({online})"
                        ),
                    ))
                },
            )
            .await;

        Ok(())
    }
}

/// Search suggestions render the title on the first line and the price below it.
fn first_line(text: &str) -> String {
    text.trim().lines().next().unwrap_or_default().trim().to_owned()
}

fn stat_locator(class: &str) -> Locator {
    Locator::xpath(format!("//div[div[@class='{class}']]"))
}

/// First number in a statistic such as `"PLAYING NOW\n12,345,678"`. Zero if there is none.
fn parse_stat(raw: &str) -> u64 {
    let digits = raw.replace(',', "");
    DIGITS
        .find(&digits)
        .and_then(|found| found.as_str().parse().ok())
        .unwrap_or(0)
}
