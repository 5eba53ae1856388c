//! In-memory session that replays fixture markup, used by the crawl tests.

use super::{ElementTarget, RendererSession, SessionProvider};
use crate::error::{Result, ScrapeError};
use crate::parsers::pagination;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClickKind {
    Direct,
    Forced,
}

#[derive(Debug, Default)]
pub(crate) struct SessionLog {
    pub loads: Vec<String>,
    pub scripts: Vec<String>,
    pub scrolled_into_view: Vec<String>,
    pub clicks: Vec<(ClickKind, String)>,
    pub markup_reads: usize,
    pub opened: usize,
    pub closed: usize,
}

/// Replays a fixed list of pages. Clicking a numbered pagination control jumps
/// to that page; clicking anything else moves one page forward.
#[derive(Clone)]
pub(crate) struct ScriptedSession {
    pages: Vec<String>,
    current: Option<usize>,
    fail_load: bool,
    intercept_direct_clicks: bool,
    broken_pages: HashSet<usize>,
    dead_controls: HashSet<usize>,
    unreachable: HashSet<String>,
    undisplayed: HashSet<usize>,
    failing_scripts: HashSet<usize>,
    failing_scripts_from: Option<usize>,
    panic_on_markup: bool,
    log: Arc<Mutex<SessionLog>>,
}

impl ScriptedSession {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            current: None,
            fail_load: false,
            intercept_direct_clicks: false,
            broken_pages: HashSet::new(),
            dead_controls: HashSet::new(),
            unreachable: HashSet::new(),
            undisplayed: HashSet::new(),
            failing_scripts: HashSet::new(),
            failing_scripts_from: None,
            panic_on_markup: false,
            log: Arc::new(Mutex::new(SessionLog::default())),
        }
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn intercepting_clicks(mut self) -> Self {
        self.intercept_direct_clicks = true;
        self
    }

    /// Reading markup on the given 0-based page index fails
    pub fn with_broken_page(mut self, index: usize) -> Self {
        self.broken_pages.insert(index);
        self
    }

    /// Loading exactly this URL fails
    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// Every click on the pagination control at `position` fails
    pub fn with_dead_control(mut self, position: usize) -> Self {
        self.dead_controls.insert(position);
        self
    }

    /// The live page reports the control at `position` as not displayed,
    /// whatever its markup says
    pub fn with_undisplayed_control(mut self, position: usize) -> Self {
        self.undisplayed.insert(position);
        self
    }

    /// The `call`-th script run (1-based, counted across clones) fails
    pub fn failing_script_call(mut self, call: usize) -> Self {
        self.failing_scripts.insert(call);
        self
    }

    /// Every script run from the `call`-th onwards fails
    pub fn failing_scripts_from(mut self, call: usize) -> Self {
        self.failing_scripts_from = Some(call);
        self
    }

    /// Reading markup panics, as a crashed renderer binding would
    pub fn panicking_markup(mut self) -> Self {
        self.panic_on_markup = true;
        self
    }

    pub fn log(&self) -> MutexGuard<'_, SessionLog> {
        self.log.lock().unwrap()
    }

    fn follow(&mut self, target: &ElementTarget) -> Result<()> {
        let current = self
            .current
            .ok_or_else(|| ScrapeError::Navigation("no page loaded".to_string()))?;
        if self.dead_controls.contains(&target.position) {
            return Err(ScrapeError::ElementNotFound(target.xpath.clone()));
        }
        let controls = pagination::parse_controls(&self.pages[current]);
        let control = controls
            .iter()
            .find(|c| c.position == target.position)
            .ok_or_else(|| ScrapeError::ElementNotFound(target.xpath.clone()))?;

        let next = match control.page_number() {
            Some(number) => (number as usize).saturating_sub(1),
            None => current + 1,
        };
        if next >= self.pages.len() {
            return Err(ScrapeError::Navigation(format!("no fixture page {}", next + 1)));
        }
        self.current = Some(next);
        Ok(())
    }
}

#[async_trait]
impl RendererSession for ScriptedSession {
    async fn load(&mut self, url: &str) -> Result<()> {
        self.log().loads.push(url.to_string());
        if self.fail_load || self.unreachable.contains(url) {
            return Err(ScrapeError::Navigation(format!("cannot reach {}", url)));
        }
        self.current = Some(0);
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String> {
        self.log().markup_reads += 1;
        if self.panic_on_markup {
            panic!("renderer crashed while reading markup");
        }
        let current = self
            .current
            .ok_or_else(|| ScrapeError::Navigation("no page loaded".to_string()))?;
        if self.broken_pages.contains(&current) {
            return Err(ScrapeError::Navigation(format!("page {} crashed", current + 1)));
        }
        Ok(self.pages[current].clone())
    }

    async fn run_script(&mut self, script: &str) -> Result<serde_json::Value> {
        let call = {
            let mut log = self.log();
            log.scripts.push(script.to_string());
            log.scripts.len()
        };
        let failing = self.failing_scripts.contains(&call)
            || self.failing_scripts_from.is_some_and(|from| call >= from);
        if failing {
            return Err(ScrapeError::Navigation(format!("script call {} failed", call)));
        }
        Ok(serde_json::Value::Null)
    }

    async fn is_displayed(&mut self, target: &ElementTarget) -> Result<bool> {
        let current = self
            .current
            .ok_or_else(|| ScrapeError::Navigation("no page loaded".to_string()))?;
        if self.undisplayed.contains(&target.position) {
            return Ok(false);
        }
        pagination::parse_controls(&self.pages[current])
            .iter()
            .find(|c| c.position == target.position)
            .map(|c| c.visible)
            .ok_or_else(|| ScrapeError::ElementNotFound(target.xpath.clone()))
    }

    async fn scroll_into_view(&mut self, target: &ElementTarget) -> Result<()> {
        self.log().scrolled_into_view.push(target.xpath.clone());
        Ok(())
    }

    async fn click(&mut self, target: &ElementTarget) -> Result<()> {
        self.log().clicks.push((ClickKind::Direct, target.xpath.clone()));
        if self.intercept_direct_clicks {
            return Err(ScrapeError::Navigation("click intercepted".to_string()));
        }
        self.follow(target)
    }

    async fn force_click(&mut self, target: &ElementTarget) -> Result<()> {
        self.log().clicks.push((ClickKind::Forced, target.xpath.clone()));
        self.follow(target)
    }

    async fn close(&mut self) -> Result<()> {
        self.log().closed += 1;
        Ok(())
    }
}

/// Hands out copies of one scripted session that all write to the same log
#[derive(Clone)]
pub(crate) struct ScriptedProvider {
    template: ScriptedSession,
    refuse: bool,
}

impl ScriptedProvider {
    pub fn new(template: ScriptedSession) -> Self {
        Self {
            template,
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            template: ScriptedSession::new(Vec::new()),
            refuse: true,
        }
    }

    pub fn log(&self) -> MutexGuard<'_, SessionLog> {
        self.template.log()
    }
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    type Session = ScriptedSession;

    async fn open(&self) -> Result<ScriptedSession> {
        if self.refuse {
            return Err(ScrapeError::Connect("no webdriver available".to_string()));
        }
        self.template.log().opened += 1;
        Ok(self.template.clone())
    }
}
