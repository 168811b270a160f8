//! Playwright browser automation
//!
//! A long-lived Node process drives one Playwright page. Commands and replies
//! travel as one JSON object per line over the child's stdin/stdout, so page
//! state survives between calls.

use std::process::{Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info};

use crate::browser::{Browser, Element, Key};
use crate::error::{VerifyError, VerifyResult};
use crate::runner::BrowserLauncher;

/// Extra time granted to the bridge beyond the in-page wait budget
const REPLY_MARGIN: Duration = Duration::from_secs(30);

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const pw = require(require.resolve('playwright', { paths: [process.cwd()] }));

const [, , browserName, headless, width, height] = process.argv;

function reply(obj) {
  process.stdout.write(JSON.stringify(obj) + '\n');
}

(async () => {
  const browser = await pw[browserName].launch({ headless: headless === 'true' });
  const context = await browser.newContext({
    viewport: { width: Number(width), height: Number(height) }
  });
  const page = await context.newPage();

  async function present(sel, timeout) {
    try {
      await page.locator(sel).first().waitFor({ state: 'attached', timeout });
    } catch (e) {
      const err = new Error('not found: ' + sel);
      err.kind = 'not_found';
      throw err;
    }
  }

  async function run(cmd) {
    const sel = cmd.selector;
    const timeout = cmd.timeout;
    switch (cmd.op) {
      case 'visit': await page.goto(cmd.value); return null;
      case 'reload': await page.reload(); return null;
      case 'wait_for': await page.waitForSelector(sel, { state: 'visible', timeout }); return null;
      case 'wait_for_hidden': await page.waitForSelector(sel, { state: 'hidden', timeout }); return null;
      case 'click': await present(sel, timeout); await page.locator(sel).first().click({ timeout }); return null;
      case 'click_nth': await present(sel, timeout); await page.locator(sel).nth(cmd.index).click({ timeout }); return null;
      case 'fill': await present(sel, timeout); await page.locator(sel).first().fill(cmd.value, { timeout }); return null;
      case 'select': await present(sel, timeout); await page.locator(sel).first().selectOption(cmd.value, { timeout }); return null;
      case 'attribute': await present(sel, timeout); return (await page.locator(sel).first().getAttribute(cmd.value)) || '';
      case 'value': await present(sel, timeout); return await page.locator(sel).first().inputValue();
      case 'selected': await present(sel, timeout); return await page.locator(sel).first().evaluate(el => el.value);
      case 'count': return await page.locator(sel).count();
      case 'visible': return (await page.locator(sel).count()) > 0 && await page.locator(sel).first().isVisible();
      case 'url': return page.url();
      case 'key': await page.keyboard.press(cmd.value); return null;
      case 'close': await browser.close(); reply({ id: cmd.id, ok: true, value: null }); process.exit(0);
      default: throw new Error('unknown op ' + cmd.op);
    }
  }

  reply({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    const cmd = JSON.parse(line);
    try {
      reply({ id: cmd.id, ok: true, value: await run(cmd) });
    } catch (e) {
      const kind = e.kind || (e.name === 'TimeoutError' ? 'timeout' : 'error');
      reply({ id: cmd.id, ok: false, kind, message: e.message });
    }
  }
  await browser.close();
})().catch(e => {
  reply({ id: 0, ok: false, kind: 'error', message: e.message });
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Wait budget when a call does not pass its own
    pub default_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            default_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Browser capability backed by a Playwright bridge process
pub struct PlaywrightBrowser {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    default_timeout: Duration,
    // Holds the bridge script on disk for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightBrowser {
    /// Launch a fresh browser; one instance per target run
    pub async fn launch(config: &PlaywrightConfig) -> VerifyResult<Self> {
        Self::check_playwright_installed()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!("Starting Playwright bridge: {}", script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .arg(config.browser.as_str())
            .arg(config.headless.to_string())
            .arg(config.viewport_width.to_string())
            .arg(config.viewport_height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VerifyError::Driver(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VerifyError::Driver("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VerifyError::Driver("bridge stdout unavailable".into()))?;

        let mut browser = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            default_timeout: config.default_timeout,
            _script_dir: script_dir,
        };

        let ready = browser.read_reply(REPLY_MARGIN, "launch").await?;
        if ready.id != 0 {
            return Err(VerifyError::Driver(format!(
                "unexpected handshake id {}",
                ready.id
            )));
        }

        info!("Playwright {} browser ready", config.browser.as_str());
        Ok(browser)
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> VerifyResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(VerifyError::Driver(
                "Playwright not found. Install with: npx playwright install".into(),
            )),
        }
    }

    /// Close the browser and wait for the bridge to exit
    pub async fn close(mut self) -> VerifyResult<()> {
        let _ = self.request("close", json!({}), None).await;
        self.stop();
        let _ = self.child.wait().await;
        Ok(())
    }

    fn stop(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }
        let _ = self.child.start_kill();
    }

    async fn request(
        &mut self,
        op: &str,
        mut args: Value,
        timeout: Option<Duration>,
    ) -> VerifyResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let timeout = timeout.unwrap_or(self.default_timeout);
        args["id"] = json!(id);
        args["op"] = json!(op);
        args["timeout"] = json!(timeout.as_millis() as u64);

        let mut line = serde_json::to_string(&args)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = self.read_reply(timeout + REPLY_MARGIN, op).await?;
        if reply.id != id {
            return Err(VerifyError::Driver(format!(
                "reply id {} does not match request {}",
                reply.id, id
            )));
        }
        if reply.ok {
            return Ok(reply.value);
        }

        let selector = args["selector"].as_str().unwrap_or(op).to_string();
        let message = reply.message.unwrap_or_default();
        Err(match reply.kind.as_deref() {
            Some("not_found") => VerifyError::ElementNotFound { selector },
            Some("timeout") => VerifyError::Timeout(selector),
            _ => VerifyError::Driver(format!("{} failed: {}", op, message)),
        })
    }

    async fn read_reply(&mut self, wait: Duration, op: &str) -> VerifyResult<Reply> {
        let line = tokio::time::timeout(wait, self.stdout.next_line())
            .await
            .map_err(|_| VerifyError::Driver(format!("bridge did not answer `{}`", op)))??
            .ok_or_else(|| VerifyError::Driver("bridge exited".into()))?;
        let reply: Reply = serde_json::from_str(&line)?;
        if reply.id == 0 && !reply.ok {
            return Err(VerifyError::Driver(reply.message.unwrap_or_default()));
        }
        Ok(reply)
    }

    async fn request_string(&mut self, op: &str, args: Value) -> VerifyResult<String> {
        let value = self.request(op, args, None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

impl Drop for PlaywrightBrowser {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl Browser for PlaywrightBrowser {
    async fn visit(&mut self, url: &str) -> VerifyResult<()> {
        debug!("visit {}", url);
        self.request("visit", json!({ "value": url }), None).await?;
        Ok(())
    }

    async fn reload(&mut self) -> VerifyResult<()> {
        self.request("reload", json!({}), None).await?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Option<Duration>) -> VerifyResult<()> {
        self.request("wait_for", json!({ "selector": selector }), timeout)
            .await?;
        Ok(())
    }

    async fn wait_for_hidden(
        &mut self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> VerifyResult<()> {
        self.request("wait_for_hidden", json!({ "selector": selector }), timeout)
            .await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> VerifyResult<()> {
        debug!("click {}", selector);
        self.request("click", json!({ "selector": selector }), None)
            .await?;
        Ok(())
    }

    async fn click_element(&mut self, element: &Element) -> VerifyResult<()> {
        self.request(
            "click_nth",
            json!({ "selector": element.selector, "index": element.index }),
            None,
        )
        .await?;
        Ok(())
    }

    async fn fill_in(&mut self, selector: &str, value: &str) -> VerifyResult<()> {
        self.request("fill", json!({ "selector": selector, "value": value }), None)
            .await?;
        Ok(())
    }

    async fn select(&mut self, selector: &str, value: &str) -> VerifyResult<()> {
        self.request("select", json!({ "selector": selector, "value": value }), None)
            .await?;
        Ok(())
    }

    async fn get_attribute(&mut self, selector: &str, attribute: &str) -> VerifyResult<String> {
        self.request_string("attribute", json!({ "selector": selector, "value": attribute }))
            .await
    }

    async fn get_value(&mut self, selector: &str) -> VerifyResult<String> {
        self.request_string("value", json!({ "selector": selector }))
            .await
    }

    async fn get_selected_value(&mut self, selector: &str) -> VerifyResult<String> {
        self.request_string("selected", json!({ "selector": selector }))
            .await
    }

    async fn all(&mut self, selector: &str) -> VerifyResult<Vec<Element>> {
        let count = self
            .request("count", json!({ "selector": selector }), None)
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        Ok((0..count)
            .map(|index| Element {
                selector: selector.to_string(),
                index,
            })
            .collect())
    }

    async fn has_visible(&mut self, selector: &str) -> VerifyResult<bool> {
        let value = self
            .request("visible", json!({ "selector": selector }), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn current_url(&mut self) -> VerifyResult<String> {
        self.request_string("url", json!({})).await
    }

    async fn send_keys(&mut self, key: Key) -> VerifyResult<()> {
        self.request("key", json!({ "value": key.as_str() }), None)
            .await?;
        Ok(())
    }
}

/// Launches one Playwright browser per target run
pub struct PlaywrightLauncher {
    config: PlaywrightConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    type Browser = PlaywrightBrowser;

    async fn launch(&self) -> VerifyResult<PlaywrightBrowser> {
        PlaywrightBrowser::launch(&self.config).await
    }

    async fn release(&self, browser: PlaywrightBrowser) {
        if let Err(e) = browser.close().await {
            debug!("Browser did not close cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_kind_from_cli_value() {
        use clap::ValueEnum;

        assert_eq!(BrowserKind::from_str("firefox", false), Ok(BrowserKind::Firefox));
        assert_eq!(BrowserKind::from_str("webkit", false), Ok(BrowserKind::Webkit));
        assert!(BrowserKind::from_str("anything", false).is_err());
        assert_eq!(BrowserKind::Webkit.as_str(), "webkit");
    }

    #[test]
    fn test_reply_parsing() {
        let reply: Reply =
            serde_json::from_str(r#"{"id":3,"ok":false,"kind":"timeout","message":"x"}"#).unwrap();
        assert_eq!(reply.id, 3);
        assert!(!reply.ok);
        assert_eq!(reply.kind.as_deref(), Some("timeout"));
        assert!(reply.value.is_null());
    }

    #[test]
    fn test_bridge_script_handles_every_op() {
        for op in [
            "visit", "reload", "wait_for", "wait_for_hidden", "click", "click_nth", "fill",
            "select", "attribute", "value", "selected", "count", "visible", "url", "key", "close",
        ] {
            assert!(
                BRIDGE_SCRIPT.contains(&format!("case '{}'", op)),
                "bridge is missing op {}",
                op
            );
        }
    }
}
