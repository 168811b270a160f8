//! Browser capability consumed by the workflow
//!
//! Selectors are Playwright selectors: plain CSS, or `xpath=` prefixed XPath.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VerifyResult;

/// Handle to the n-th element matched by a selector at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub selector: String,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    Tab,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Escape => "Escape",
            Key::Enter => "Enter",
            Key::Tab => "Tab",
        }
    }
}

/// Navigation, query and interaction primitives over one browser page.
///
/// Operations on an absent element fail with `ElementNotFound` or `Timeout`.
#[async_trait]
pub trait Browser: Send {
    async fn visit(&mut self, url: &str) -> VerifyResult<()>;

    async fn reload(&mut self) -> VerifyResult<()>;

    /// Wait until the selector is visible. `None` uses the driver default.
    async fn wait_for(&mut self, selector: &str, timeout: Option<Duration>) -> VerifyResult<()>;

    /// Wait until the selector is hidden or detached.
    async fn wait_for_hidden(&mut self, selector: &str, timeout: Option<Duration>)
        -> VerifyResult<()>;

    async fn click(&mut self, selector: &str) -> VerifyResult<()>;

    async fn click_element(&mut self, element: &Element) -> VerifyResult<()>;

    /// Click the `<label for="...">` bound to the given id.
    async fn click_label_for(&mut self, target_id: &str) -> VerifyResult<()> {
        self.click(&format!("label[for=\"{}\"]", target_id)).await
    }

    async fn click_button_named(&mut self, name: &str) -> VerifyResult<()> {
        self.click(&format!("button[name=\"{}\"]", name)).await
    }

    async fn fill_in(&mut self, selector: &str, value: &str) -> VerifyResult<()>;

    async fn select(&mut self, selector: &str, value: &str) -> VerifyResult<()>;

    async fn get_attribute(&mut self, selector: &str, attribute: &str) -> VerifyResult<String>;

    async fn get_value(&mut self, selector: &str) -> VerifyResult<String>;

    async fn get_selected_value(&mut self, selector: &str) -> VerifyResult<String>;

    /// Every element currently matching the selector, possibly none.
    async fn all(&mut self, selector: &str) -> VerifyResult<Vec<Element>>;

    async fn has_visible(&mut self, selector: &str) -> VerifyResult<bool>;

    async fn current_url(&mut self) -> VerifyResult<String>;

    /// Query parameter of the current URL; empty when absent.
    async fn url_parameter(&mut self, name: &str) -> VerifyResult<String> {
        let current = self.current_url().await?;
        let parsed = url::Url::parse(&current)?;
        Ok(parsed
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default())
    }

    async fn send_keys(&mut self, key: Key) -> VerifyResult<()>;
}
