//! Moves the listing from one page to the next.
//!
//! The site's pagination control is rendered inconsistently, so no single
//! selector reliably finds "the next page". Strategies are tried in a fixed
//! priority order against a snapshot of the controls and the first one that
//! both picks a control and manages to click it wins:
//!
//! 1. [`ExactNumber`]: the control labelled `current + 1`.
//! 2. [`NextArrow`]: the trailing arrow icon.
//! 3. [`AnyGreater`]: any numbered control past the current page, for
//!    pagination that skips numbers behind an ellipsis.
//!
//! When none of them advances, the listing has no more pages.

use crate::config::{CrawlConfig, TimingConfig};
use crate::error::Result;
use crate::parsers::listing::listing_fingerprint;
use crate::parsers::pagination::{self, PaginationControl};
use crate::session::{ElementTarget, RendererSession, SCROLL_TO_BOTTOM};
use std::time::Duration;

/// Result of one attempt to advance the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Advanced(u32),
    NoMorePages,
}

/// How a chosen control should be clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    /// Regular click, retried from script if it is intercepted
    DirectThenForced,
    /// Script click only
    Forced,
}

/// A control chosen by a strategy and the page it leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub target: ElementTarget,
    pub page: u32,
    pub mode: ClickMode,
}

/// Picks the control to click, if any, from a snapshot of the pagination
pub trait PageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(&self, controls: &[PaginationControl], current_page: u32) -> Option<Advance>;
}

/// The control labelled exactly `current + 1`
pub struct ExactNumber;

impl PageStrategy for ExactNumber {
    fn name(&self) -> &'static str {
        "exact-number"
    }

    fn select(&self, controls: &[PaginationControl], current_page: u32) -> Option<Advance> {
        let wanted = current_page + 1;
        controls
            .iter()
            .find(|c| c.visible && !c.active && c.page_number() == Some(wanted))
            .map(|c| Advance {
                target: c.target(),
                page: wanted,
                mode: ClickMode::DirectThenForced,
            })
    }
}

/// The trailing "next" arrow.
///
/// Prefers a control holding the arrow icon; otherwise the last control, if it
/// holds any icon. Controls styled as the current page are skipped.
pub struct NextArrow;

impl PageStrategy for NextArrow {
    fn name(&self) -> &'static str {
        "next-arrow"
    }

    fn select(&self, controls: &[PaginationControl], current_page: u32) -> Option<Advance> {
        let usable = |c: &&PaginationControl| c.visible && !c.active && !c.highlighted;

        controls
            .iter()
            .filter(|c| c.has_arrow)
            .find(usable)
            .or_else(|| controls.last().filter(|c| c.has_icon).filter(usable))
            .map(|c| Advance {
                target: c.target(),
                page: current_page + 1,
                mode: ClickMode::DirectThenForced,
            })
    }
}

/// Any clickable numbered control past the current page; its label becomes the page number
pub struct AnyGreater;

impl PageStrategy for AnyGreater {
    fn name(&self) -> &'static str {
        "any-greater"
    }

    fn select(&self, controls: &[PaginationControl], current_page: u32) -> Option<Advance> {
        controls
            .iter()
            .filter(|c| c.visible && c.clickable && !c.active)
            .find_map(|c| {
                let page = c.page_number().filter(|page| *page > current_page)?;
                Some(Advance {
                    target: c.target(),
                    page,
                    mode: ClickMode::Forced,
                })
            })
    }
}

/// The strategies in priority order
pub fn default_strategies() -> Vec<Box<dyn PageStrategy>> {
    vec![Box::new(ExactNumber), Box::new(NextArrow), Box::new(AnyGreater)]
}

/// Replaces the markup guess of each control's visibility with what the live
/// page reports. A control the session cannot inspect keeps its guess.
async fn refresh_visibility<S>(session: &mut S, controls: &mut [PaginationControl])
where
    S: RendererSession + ?Sized,
{
    for control in controls.iter_mut() {
        match session.is_displayed(&control.target()).await {
            Ok(displayed) => control.visible = displayed,
            Err(e) => ::log::debug!(
                "Visibility of control {} unknown, keeping markup guess: {}",
                control.position,
                e
            ),
        }
    }
}

/// Drives the live session from one listing page to the next
pub struct Navigator {
    strategies: Vec<Box<dyn PageStrategy>>,
    scroll_pause: Duration,
    scroll_into_view_pause: Duration,
    click_settle: Duration,
    verify_advance: bool,
}

impl Navigator {
    pub fn new(timing: &TimingConfig, crawl: &CrawlConfig) -> Self {
        Self {
            strategies: default_strategies(),
            scroll_pause: timing.scroll_pause(),
            scroll_into_view_pause: timing.scroll_into_view_pause(),
            click_settle: timing.click_settle(),
            verify_advance: crawl.verify_advance,
        }
    }

    /// Replace the strategy list, keeping priority order
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn PageStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Tries every strategy in order and reports the first advance.
    ///
    /// Only failures to read the page surface as errors; a strategy whose click
    /// fails simply yields to the next one.
    pub async fn advance<S>(&self, session: &mut S, current_page: u32) -> Result<NavigationOutcome>
    where
        S: RendererSession + ?Sized,
    {
        session.run_script(SCROLL_TO_BOTTOM).await?;
        tokio::time::sleep(self.scroll_pause).await;

        let markup = session.current_markup().await?;
        let mut controls = pagination::parse_controls(&markup);
        refresh_visibility(session, &mut controls).await;
        ::log::debug!(
            "Page {}: {} pagination controls visible",
            current_page,
            controls.iter().filter(|c| c.visible).count()
        );
        if controls.is_empty() {
            return Ok(NavigationOutcome::NoMorePages);
        }

        let before = self.verify_advance.then(|| listing_fingerprint(&markup));

        for strategy in &self.strategies {
            let Some(advance) = strategy.select(&controls, current_page) else {
                ::log::trace!("Strategy {} found no control", strategy.name());
                continue;
            };

            if let Err(e) = self.perform(session, &advance).await {
                ::log::warn!(
                    "Strategy {} could not click {}: {}",
                    strategy.name(),
                    advance.target.xpath,
                    e
                );
                continue;
            }
            tokio::time::sleep(self.click_settle).await;

            if let Some(before) = &before {
                if !self.content_changed(session, before).await {
                    ::log::warn!(
                        "Strategy {} clicked towards page {} but the listing did not change",
                        strategy.name(),
                        advance.page
                    );
                    continue;
                }
            }

            ::log::info!("Advanced to page {} via {}", advance.page, strategy.name());
            return Ok(NavigationOutcome::Advanced(advance.page));
        }

        Ok(NavigationOutcome::NoMorePages)
    }

    async fn perform<S>(&self, session: &mut S, advance: &Advance) -> Result<()>
    where
        S: RendererSession + ?Sized,
    {
        session.scroll_into_view(&advance.target).await?;
        tokio::time::sleep(self.scroll_into_view_pause).await;

        match advance.mode {
            ClickMode::Forced => session.force_click(&advance.target).await,
            ClickMode::DirectThenForced => match session.click(&advance.target).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    ::log::debug!("Direct click intercepted ({}), retrying from script", e);
                    session.force_click(&advance.target).await
                }
            },
        }
    }

    async fn content_changed<S>(&self, session: &mut S, before: &[String]) -> bool
    where
        S: RendererSession + ?Sized,
    {
        match session.current_markup().await {
            Ok(markup) => listing_fingerprint(&markup) != before,
            Err(e) => {
                ::log::debug!("Could not re-read page after advancing: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{listing_page, pagination};
    use crate::parsers::pagination::parse_controls;
    use crate::session::scripted::{ClickKind, ScriptedSession};

    fn controls(markup: &str) -> Vec<PaginationControl> {
        parse_controls(markup)
    }

    fn navigator(verify: bool) -> Navigator {
        let crawl = CrawlConfig {
            verify_advance: verify,
            ..CrawlConfig::default()
        };
        Navigator::new(&TimingConfig::immediate(), &crawl)
    }

    #[test]
    fn test_exact_number_skips_active_and_hidden() {
        let markup = r#"<ul class="list-none">
            <li class="h-8 w-8 bg-green-700">1</li>
            <li class="h-8 w-8 hidden cursor-pointer">2</li>
            <li class="h-8 w-8 cursor-pointer">3</li>
        </ul>"#;
        assert_eq!(ExactNumber.select(&controls(markup), 1), None);

        let advance = ExactNumber.select(&controls(markup), 2).unwrap();
        assert_eq!(advance.page, 3);
        assert_eq!(advance.target.position, 3);
        assert_eq!(advance.mode, ClickMode::DirectThenForced);
    }

    #[test]
    fn test_exact_number_takes_breakpoint_visible_control() {
        let markup = r#"<ul class="list-none">
            <li class="h-8 w-8 bg-green-700 text-white">1</li>
            <li class="h-8 w-8 hidden md:flex cursor-pointer">2</li>
        </ul>"#;
        let advance = ExactNumber.select(&controls(markup), 1).unwrap();
        assert_eq!(advance.page, 2);
        assert_eq!(advance.target.position, 2);
    }

    #[test]
    fn test_next_arrow_prefers_arrow_icon() {
        let snapshot = controls(&pagination(4, &[3, 4], true));
        let advance = NextArrow.select(&snapshot, 4).unwrap();
        assert_eq!(advance.page, 5);
        assert_eq!(advance.target.position, 3);
    }

    #[test]
    fn test_next_arrow_falls_back_to_last_icon() {
        let markup = r#"<ul class="list-none">
            <li class="h-8 w-8 bg-green-700 text-white">7</li>
            <li class="h-8 w-8 cursor-pointer"><svg class="chevron"></svg></li>
        </ul>"#;
        let advance = NextArrow.select(&controls(markup), 7).unwrap();
        assert_eq!(advance.page, 8);
        assert_eq!(advance.target.position, 2);
    }

    #[test]
    fn test_next_arrow_ignores_active_arrow() {
        let markup = r#"<ul class="list-none">
            <li class="h-8 w-8 text-white"><svg class="ml-2"></svg></li>
        </ul>"#;
        assert_eq!(NextArrow.select(&controls(markup), 3), None);
    }

    #[test]
    fn test_any_greater_takes_label_as_page() {
        let markup = r#"<ul class="list-none">
            <li class="h-8 w-8 cursor-pointer">1</li>
            <li class="h-8 w-8 bg-green-700">2</li>
            <li class="h-8 w-8">...</li>
            <li class="h-8 w-8">9</li>
            <li class="h-8 w-8 cursor-pointer">12</li>
        </ul>"#;
        let advance = AnyGreater.select(&controls(markup), 2).unwrap();
        assert_eq!(advance.page, 12);
        assert_eq!(advance.target.position, 5);
        assert_eq!(advance.mode, ClickMode::Forced);
        assert_eq!(ExactNumber.select(&controls(markup), 2), None);
    }

    #[tokio::test]
    async fn test_exact_number_wins_over_arrow() {
        let pages = vec![
            listing_page(&[("A", "/a")], &pagination(1, &[1, 2, 3], true)),
            listing_page(&[("B", "/b")], &pagination(2, &[1, 2, 3], true)),
            listing_page(&[("C", "/c")], &pagination(3, &[1, 2, 3], false)),
        ];
        let mut session = ScriptedSession::new(pages);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(false).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Advanced(2));

        let log = session.log();
        assert_eq!(log.clicks.len(), 1);
        assert_eq!(log.clicks[0].0, ClickKind::Direct);
        assert!(log.clicks[0].1.ends_with("[2]"));
        assert_eq!(log.scripts[0], SCROLL_TO_BOTTOM);
    }

    #[tokio::test]
    async fn test_intercepted_click_retried_from_script() {
        let pages = vec![
            listing_page(&[("A", "/a")], &pagination(1, &[1, 2], false)),
            listing_page(&[("B", "/b")], &pagination(2, &[1, 2], false)),
        ];
        let mut session = ScriptedSession::new(pages).intercepting_clicks();
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(false).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Advanced(2));

        let kinds: Vec<ClickKind> = session.log().clicks.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![ClickKind::Direct, ClickKind::Forced]);
    }

    #[tokio::test]
    async fn test_failed_click_yields_to_next_strategy() {
        let pages = vec![
            listing_page(&[("A", "/a")], &pagination(1, &[1, 2], true)),
            listing_page(&[("B", "/b")], &pagination(2, &[1, 2], false)),
        ];
        let mut session = ScriptedSession::new(pages).with_dead_control(2);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(false).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Advanced(2));

        let log = session.log();
        let kinds: Vec<ClickKind> = log.clicks.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![ClickKind::Direct, ClickKind::Forced, ClickKind::Direct]);
        assert!(log.clicks[2].1.ends_with("[3]"));
    }

    #[tokio::test]
    async fn test_live_visibility_overrides_markup() {
        // Control 2 looks fine in the markup but the browser does not show it.
        let pages = vec![
            listing_page(&[("A", "/a")], &pagination(1, &[1, 2, 3], true)),
            listing_page(&[("B", "/b")], &pagination(2, &[1, 2, 3], true)),
        ];
        let mut session = ScriptedSession::new(pages).with_undisplayed_control(2);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(false).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Advanced(2));

        let log = session.log();
        assert_eq!(log.clicks.len(), 1);
        assert!(log.clicks[0].1.ends_with("[4]"));
    }

    #[tokio::test]
    async fn test_no_controls_means_no_more_pages() {
        let mut session = ScriptedSession::new(vec![listing_page(&[("A", "/a")], "")]);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(false).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::NoMorePages);
        assert!(session.log().clicks.is_empty());
    }

    #[tokio::test]
    async fn test_last_page_has_no_candidate() {
        let last = listing_page(&[("A", "/a")], &pagination(3, &[1, 2, 3], false));
        let mut session = ScriptedSession::new(vec![last]);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(false).advance(&mut session, 3).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::NoMorePages);
    }

    #[tokio::test]
    async fn test_verification_rejects_unchanged_listing() {
        let same = listing_page(&[("A", "/a")], &pagination(1, &[1, 2], false));
        let mut session = ScriptedSession::new(vec![same.clone(), same]);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(true).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::NoMorePages);
    }

    #[tokio::test]
    async fn test_verification_accepts_changed_listing() {
        let pages = vec![
            listing_page(&[("A", "/a")], &pagination(1, &[1, 2], false)),
            listing_page(&[("B", "/b")], &pagination(2, &[1, 2], false)),
        ];
        let mut session = ScriptedSession::new(pages);
        session.load("https://www.myscheme.gov.in/search").await.unwrap();

        let outcome = navigator(true).advance(&mut session, 1).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Advanced(2));
    }
}
