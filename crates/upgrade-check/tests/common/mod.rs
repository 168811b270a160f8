//! Scripted in-memory browser shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use shop_upgrade_check::checkout::{FIVE_STEP_MARKER, ONE_PAGE_MARKER};
use shop_upgrade_check::config::{SettleDelays, WorkflowConfig};
use shop_upgrade_check::runner::BrowserLauncher;
use shop_upgrade_check::{Browser, Element, Key, VerifyError, VerifyResult};

pub const SHOP_URL: &str = "http://shop.example.com";
pub const PRODUCT_URL: &str = "http://shop.example.com/index.php?id_product=7&controller=product";
pub const SUBMIT_ORDER: &str = "#center_column form button[type=\"submit\"]";

/// Records every action and answers queries from configured page state
#[derive(Debug, Default)]
pub struct FakeBrowser {
    pub actions: Vec<String>,
    /// Selectors that resolve to nothing
    pub missing: HashSet<String>,
    /// Selectors reported by `has_visible`
    pub visible: HashSet<String>,
    /// Element counts returned by `all`
    pub counts: HashMap<String, usize>,
    /// Field values, keyed by selector, or `selector@attribute` for attributes
    pub values: HashMap<String, String>,
    /// Page the browser lands on after clicking a selector
    pub navigations: HashMap<String, String>,
    pub url: String,
}

impl FakeBrowser {
    /// A storefront where every step succeeds through one-page checkout
    pub fn happy_path() -> Self {
        let mut browser = FakeBrowser::default();
        browser.counts.insert(".content-checklist li[onclick]".into(), 3);
        browser.counts.insert("#center_column input[type=\"checkbox\"]".into(), 2);
        browser.counts.insert("i.fa-building, i.icon-building".into(), 1);
        browser.counts.insert(".shopping_cart a".into(), 1);
        browser.counts.insert("table.history-status tr".into(), 2);
        browser.values.insert(
            "#page-header-desc-product-preview@href".into(),
            PRODUCT_URL.into(),
        );
        browser.values.insert("#address1".into(), "16 rue de la Paix".into());
        browser.values.insert("#postcode".into(), "75002".into());
        browser.values.insert("#city".into(), "Paris".into());
        browser.values.insert("#id_country".into(), "8".into());
        browser.values.insert("#phone".into(), "0102030405".into());
        browser.values.insert("#phone_mobile".into(), "0607080910".into());
        browser.visible.insert(ONE_PAGE_MARKER.into());
        browser.order_confirmed_as("42");
        browser
    }

    /// Switch the cart page to the five-step checkout
    pub fn with_five_step_checkout(mut self) -> Self {
        self.visible.remove(ONE_PAGE_MARKER);
        self.visible.insert(FIVE_STEP_MARKER.into());
        self
    }

    pub fn order_confirmed_as(&mut self, id_order: &str) {
        self.navigations.insert(
            SUBMIT_ORDER.into(),
            format!(
                "{}/index.php?controller=order-confirmation&id_cart=3&id_order={}",
                SHOP_URL, id_order
            ),
        );
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.missing.insert(selector.into());
        self
    }

    pub fn showing(mut self, selector: &str) -> Self {
        self.visible.insert(selector.into());
        self
    }

    pub fn with_count(mut self, selector: &str, count: usize) -> Self {
        self.counts.insert(selector.into(), count);
        self
    }

    pub fn did(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    pub fn touched(&self, fragment: &str) -> bool {
        self.actions.iter().any(|a| a.contains(fragment))
    }

    fn check(&self, selector: &str) -> VerifyResult<()> {
        if self.missing.contains(selector) {
            Err(VerifyError::not_found(selector))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn visit(&mut self, url: &str) -> VerifyResult<()> {
        self.actions.push(format!("visit {}", url));
        self.url = url.to_string();
        Ok(())
    }

    async fn reload(&mut self) -> VerifyResult<()> {
        self.actions.push("reload".into());
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Option<Duration>) -> VerifyResult<()> {
        self.actions.push(format!("wait {}", selector));
        if self.missing.contains(selector) {
            return Err(VerifyError::Timeout(selector.to_string()));
        }
        Ok(())
    }

    async fn wait_for_hidden(
        &mut self,
        selector: &str,
        _timeout: Option<Duration>,
    ) -> VerifyResult<()> {
        self.actions.push(format!("wait_hidden {}", selector));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> VerifyResult<()> {
        self.check(selector)?;
        self.actions.push(format!("click {}", selector));
        if let Some(url) = self.navigations.get(selector) {
            self.url = url.clone();
        }
        Ok(())
    }

    async fn click_element(&mut self, element: &Element) -> VerifyResult<()> {
        self.check(&element.selector)?;
        self.actions
            .push(format!("click_nth {}#{}", element.selector, element.index));
        Ok(())
    }

    async fn fill_in(&mut self, selector: &str, value: &str) -> VerifyResult<()> {
        self.check(selector)?;
        self.actions.push(format!("fill {}={}", selector, value));
        Ok(())
    }

    async fn select(&mut self, selector: &str, value: &str) -> VerifyResult<()> {
        self.check(selector)?;
        self.actions.push(format!("select {}={}", selector, value));
        Ok(())
    }

    async fn get_attribute(&mut self, selector: &str, attribute: &str) -> VerifyResult<String> {
        self.check(selector)?;
        Ok(self
            .values
            .get(&format!("{}@{}", selector, attribute))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_value(&mut self, selector: &str) -> VerifyResult<String> {
        self.check(selector)?;
        Ok(self.values.get(selector).cloned().unwrap_or_default())
    }

    async fn get_selected_value(&mut self, selector: &str) -> VerifyResult<String> {
        self.get_value(selector).await
    }

    async fn all(&mut self, selector: &str) -> VerifyResult<Vec<Element>> {
        let count = self.counts.get(selector).copied().unwrap_or(0);
        Ok((0..count)
            .map(|index| Element {
                selector: selector.to_string(),
                index,
            })
            .collect())
    }

    async fn has_visible(&mut self, selector: &str) -> VerifyResult<bool> {
        Ok(self.visible.contains(selector))
    }

    async fn current_url(&mut self) -> VerifyResult<String> {
        Ok(self.url.clone())
    }

    async fn send_keys(&mut self, key: Key) -> VerifyResult<()> {
        self.actions.push(format!("key {}", key.as_str()));
        Ok(())
    }
}

/// Hands out pre-built browsers in order
pub struct FakeLauncher {
    queue: Mutex<VecDeque<VerifyResult<FakeBrowser>>>,
}

impl FakeLauncher {
    pub fn new(browsers: Vec<VerifyResult<FakeBrowser>>) -> Self {
        Self {
            queue: Mutex::new(browsers.into()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Browser = FakeBrowser;

    async fn launch(&self) -> VerifyResult<FakeBrowser> {
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(VerifyError::Driver("no browser left".into())))
    }
}

pub fn workflow_config(skip_checklist: bool) -> WorkflowConfig {
    let mut config = WorkflowConfig {
        settle: SettleDelays::none(),
        ..Default::default()
    };
    config.policy.skip_checklist = skip_checklist;
    config
}
