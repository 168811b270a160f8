//! Checkout strategy selection
//!
//! The storefront presents either a one-page checkout or the classic
//! five-step one. Exactly one strategy runs per order, and both end on the
//! order confirmation page whose URL carries `id_order`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::browser::Browser;
use crate::error::{VerifyError, VerifyResult};

/// Terms-of-service label bound to the `cgv` checkbox, shown up front in one-page checkout
pub const ONE_PAGE_MARKER: &str = "label[for=\"cgv\"]";

/// Button leading into the five-step flow from the cart summary
pub const FIVE_STEP_MARKER: &str = ".btn.btn-default.standard-checkout";

const TERMS_CHECKBOX_ID: &str = "cgv";
const SUBMIT_ORDER: &str = "#center_column form button[type=\"submit\"]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutStrategy {
    OnePage,
    FiveStep,
}

impl CheckoutStrategy {
    /// Decide from the cart page. The one-page marker selects one-page checkout,
    /// anything else falls through to the five-step flow. Both markers visible
    /// at once is ambiguous.
    pub async fn detect<B: Browser + ?Sized>(browser: &mut B) -> VerifyResult<Self> {
        if !browser.has_visible(ONE_PAGE_MARKER).await? {
            return Ok(CheckoutStrategy::FiveStep);
        }

        if browser.has_visible(FIVE_STEP_MARKER).await? {
            return Err(VerifyError::AssertionFailed(
                "both one-page and five-step checkout markers are visible".into(),
            ));
        }

        Ok(CheckoutStrategy::OnePage)
    }

    /// Complete the purchase and return the order id read from the confirmation URL
    pub async fn place_order<B: Browser + ?Sized>(
        self,
        browser: &mut B,
        payment_module: &str,
    ) -> VerifyResult<i64> {
        let payment_link = format!("a.{}", payment_module);

        match self {
            CheckoutStrategy::OnePage => {
                info!("Proceeding to checkout in OPC");
                browser.click_label_for(TERMS_CHECKBOX_ID).await?;
                browser.wait_for(&payment_link, None).await?;
                browser.click(&payment_link).await?;
                browser.click(SUBMIT_ORDER).await?;
            }
            CheckoutStrategy::FiveStep => {
                info!("Proceeding to checkout in five steps");
                browser.click(FIVE_STEP_MARKER).await?;
                browser.click_button_named("processAddress").await?;

                match browser.click_label_for(TERMS_CHECKBOX_ID).await {
                    Ok(()) => {}
                    Err(e) if e.is_absence() => info!("Terms checkbox absent, skipping it"),
                    Err(e) => return Err(e),
                }

                browser.click_button_named("processCarrier").await?;
                browser.click(&payment_link).await?;
                browser.click(SUBMIT_ORDER).await?;
            }
        }

        order_id_from_url(browser).await
    }
}

/// Detect the strategy and place the order with it
pub async fn select<B: Browser + ?Sized>(browser: &mut B, payment_module: &str) -> VerifyResult<i64> {
    let strategy = CheckoutStrategy::detect(browser).await?;
    strategy.place_order(browser, payment_module).await
}

/// Shared extraction contract: a missing or non-numeric `id_order` reads as 0
async fn order_id_from_url<B: Browser + ?Sized>(browser: &mut B) -> VerifyResult<i64> {
    let raw = browser.url_parameter("id_order").await?;
    Ok(parse_order_id(&raw))
}

fn parse_order_id(raw: &str) -> i64 {
    let digits: String = raw
        .trim()
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
        .map(|(_, c)| c)
        .collect();
    digits.parse().unwrap_or(0)
}
