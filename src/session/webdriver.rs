use super::{ElementTarget, RendererSession, SessionProvider};
use crate::config::BrowserConfig;
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};

const SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({behavior: 'smooth', block: 'center'});";
const SCRIPT_CLICK: &str = "arguments[0].click();";

/// Common local WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444",
];

/// Opens one headless Chrome session per call through a WebDriver server
#[derive(Debug, Clone)]
pub struct WebDriverProvider {
    config: BrowserConfig,
}

impl WebDriverProvider {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    /// Chrome capabilities with automation flags suppressed
    fn capabilities(&self) -> Map<String, Value> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("user-agent={}", self.config.user_agent),
        ];
        if self.config.headless {
            args.insert(0, "--headless=new".to_string());
        }

        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
                "useAutomationExtension": false,
            }),
        );
        caps
    }

    async fn connect(&self, webdriver_url: &str) -> std::result::Result<Client, String> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        builder.connect(webdriver_url).await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SessionProvider for WebDriverProvider {
    type Session = WebDriverSession;

    async fn open(&self) -> Result<WebDriverSession> {
        let primary = self.config.webdriver_url.as_str();
        match self.connect(primary).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", primary);
                return Ok(WebDriverSession::new(client));
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", primary, e);
            }
        }

        for url in FALLBACK_WEBDRIVER_URLS.iter().filter(|url| **url != primary) {
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(WebDriverSession::new(client));
            }
        }

        Err(ScrapeError::Connect(format!(
            "no WebDriver server reachable at {} or the usual local ports; \
             start one or set WEBDRIVER_URL",
            primary
        )))
    }
}

/// Only a missing element is `ElementNotFound`; transport and session failures keep their cause
fn lookup_error(error: CmdError, xpath: &str) -> ScrapeError {
    if error.is_no_such_element() {
        ScrapeError::ElementNotFound(xpath.to_string())
    } else {
        ScrapeError::WebDriver(error)
    }
}

/// A single browser window driven over WebDriver
pub struct WebDriverSession {
    client: Client,
    closed: bool,
}

impl WebDriverSession {
    fn new(client: Client) -> Self {
        Self {
            client,
            closed: false,
        }
    }

    async fn element(&self, target: &ElementTarget) -> Result<Element> {
        self.client
            .find(Locator::XPath(&target.xpath))
            .await
            .map_err(|e| lookup_error(e, &target.xpath))
    }

    async fn run_on_element(&self, script: &str, target: &ElementTarget) -> Result<Value> {
        let element = self.element(target).await?;
        let arg = serde_json::to_value(&element)
            .map_err(|e| ScrapeError::Navigation(format!("cannot pass element to script: {}", e)))?;
        Ok(self.client.execute(script, vec![arg]).await?)
    }
}

#[async_trait]
impl RendererSession for WebDriverSession {
    async fn load(&mut self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation(format!("{}: {}", url, e)))
    }

    async fn current_markup(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn run_script(&mut self, script: &str) -> Result<Value> {
        Ok(self.client.execute(script, Vec::new()).await?)
    }

    async fn is_displayed(&mut self, target: &ElementTarget) -> Result<bool> {
        let element = self.element(target).await?;
        Ok(element.is_displayed().await?)
    }

    async fn scroll_into_view(&mut self, target: &ElementTarget) -> Result<()> {
        self.run_on_element(SCROLL_INTO_VIEW, target).await?;
        Ok(())
    }

    async fn click(&mut self, target: &ElementTarget) -> Result<()> {
        let element = self.element(target).await?;
        element.click().await?;
        Ok(())
    }

    async fn force_click(&mut self, target: &ElementTarget) -> Result<()> {
        self.run_on_element(SCRIPT_CLICK, target).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client.clone().close().await?;
        Ok(())
    }
}
