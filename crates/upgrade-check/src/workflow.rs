//! Verification workflow: an ordered state machine of business steps
//!
//! Each run walks `Stage::STEPS` in order against one target, carrying a
//! [`VerificationContext`] forward. The first failing step moves the run to
//! `Stage::Failed` and nothing after it executes.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::browser::{Browser, Key};
use crate::checkout;
use crate::config::WorkflowConfig;
use crate::context::{CapturedAddress, CustomerDraft, VerificationContext, VerificationTarget};
use crate::error::{VerifyError, VerifyResult};
use crate::shop::RemoteShop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    NotStarted,
    Onboarding,
    AdminLogin,
    ChecklistCompletion,
    GoLive,
    ProductSelection,
    PaymentModuleSetup,
    AddressCapture,
    CustomerRegistration,
    OrderPlacement,
    OrderValidation,
    Completed,
    Failed,
}

impl Stage {
    /// Executable steps in run order
    pub const STEPS: [Stage; 10] = [
        Stage::Onboarding,
        Stage::AdminLogin,
        Stage::ChecklistCompletion,
        Stage::GoLive,
        Stage::ProductSelection,
        Stage::PaymentModuleSetup,
        Stage::AddressCapture,
        Stage::CustomerRegistration,
        Stage::OrderPlacement,
        Stage::OrderValidation,
    ];

    /// Steps skipped when the checklist is disabled
    pub fn is_checklist_step(self) -> bool {
        matches!(
            self,
            Stage::Onboarding | Stage::ChecklistCompletion | Stage::GoLive
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub stage: Stage,
    pub status: StepStatus,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub stage: Stage,
    pub reason: String,
}

/// Outcome of one target's run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub target: VerificationTarget,
    /// `Completed` or `Failed`
    pub final_stage: Stage,
    pub steps: Vec<StepRecord>,
    pub failure: Option<StepFailure>,
    pub order_id: Option<u64>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.final_stage == Stage::Completed
    }

    /// A run that failed before its first step
    pub fn not_started(target: VerificationTarget, error: &VerifyError) -> Self {
        Self {
            target,
            final_stage: Stage::Failed,
            steps: vec![],
            failure: Some(StepFailure {
                stage: Stage::NotStarted,
                reason: error.to_string(),
            }),
            order_id: None,
            duration_ms: 0,
        }
    }
}

enum StepOutcome {
    Passed,
    Skipped,
}

const ONBOARDING_PANEL: &str = ".upgrade-check.panel-popup";
const CHECKLIST: &str = ".content-checklist";
const CHECKLIST_ITEMS: &str = ".content-checklist li[onclick]";
const CHECKLIST_FINISHED: &str = ".content-checklist .btn.finished";
const PRODUCT_PAGE_READY: &str = "#add_to_cart";
const ERROR_BANNER: &str = ".alert.alert-danger";
const SUCCESS_BANNER: &str = "div.alert.alert-success";
const ORDER_HISTORY_ROWS: &str = "table.history-status tr";

/// Status entries expected once an order has been placed then validated
pub const EXPECTED_HISTORY_ENTRIES: usize = 2;

/// Runs the verification steps against one target
pub struct Workflow<B: Browser> {
    target: VerificationTarget,
    shop: RemoteShop<B>,
    config: WorkflowConfig,
    context: VerificationContext,
    stage: Stage,
}

impl<B: Browser> Workflow<B> {
    /// Bind a fresh browser to the target's front and back office
    pub fn new(browser: B, target: &VerificationTarget, config: WorkflowConfig) -> Self {
        Self {
            target: target.clone(),
            shop: RemoteShop::new(browser, target),
            config,
            context: VerificationContext::default(),
            stage: Stage::NotStarted,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn context(&self) -> &VerificationContext {
        &self.context
    }

    pub fn into_browser(self) -> B {
        self.shop.into_browser()
    }

    /// Execute every step in order, stopping at the first failure
    pub async fn run(&mut self) -> RunReport {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(Stage::STEPS.len());
        let mut failure = None;

        for stage in Stage::STEPS {
            self.stage = stage;
            let step_start = Instant::now();
            let result = self.execute(stage).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            let status = match result {
                Ok(StepOutcome::Passed) => {
                    info!("✓ {} ({} ms)", stage, duration_ms);
                    StepStatus::Passed
                }
                Ok(StepOutcome::Skipped) => StepStatus::Skipped,
                Err(e) => {
                    error!("✗ {} - {}", stage, e);
                    failure = Some(StepFailure {
                        stage,
                        reason: e.to_string(),
                    });
                    StepStatus::Failed
                }
            };
            steps.push(StepRecord {
                stage,
                status,
                duration_ms,
            });

            if failure.is_some() {
                break;
            }
        }

        self.stage = if failure.is_some() {
            Stage::Failed
        } else {
            Stage::Completed
        };

        RunReport {
            target: self.target.clone(),
            final_stage: self.stage,
            steps,
            failure,
            order_id: self.context.order_id,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn execute(&mut self, stage: Stage) -> VerifyResult<StepOutcome> {
        if self.config.policy.skip_checklist && stage.is_checklist_step() {
            info!("Skipping checklist-related step {} as asked", stage);
            return Ok(StepOutcome::Skipped);
        }

        match stage {
            Stage::Onboarding => self.dismiss_onboarding().await?,
            Stage::AdminLogin => self.admin_login().await?,
            Stage::ChecklistCompletion => self.complete_checklist().await?,
            Stage::GoLive => self.go_live().await?,
            Stage::ProductSelection => self.select_product().await?,
            Stage::PaymentModuleSetup => self.setup_payment_module().await?,
            Stage::AddressCapture => self.capture_address().await?,
            Stage::CustomerRegistration => self.register_customer().await?,
            Stage::OrderPlacement => self.place_order().await?,
            Stage::OrderValidation => self.validate_order().await?,
            Stage::NotStarted | Stage::Completed | Stage::Failed => {
                return Err(VerifyError::AssertionFailed(format!(
                    "{} is not an executable step",
                    stage
                )))
            }
        }
        Ok(StepOutcome::Passed)
    }

    async fn dismiss_onboarding(&mut self) -> VerifyResult<()> {
        let url = self.shop.back_office_url().to_string();
        let browser = self.shop.browser();
        browser.visit(&url).await?;
        browser.wait_for(ONBOARDING_PANEL, None).await?;
        browser.click(".btn.finished").await?;
        browser.wait_for_hidden(ONBOARDING_PANEL, None).await
    }

    async fn admin_login(&mut self) -> VerifyResult<()> {
        let admin = self.config.admin.clone();
        self.shop.login(&admin.email, &admin.password).await
    }

    async fn complete_checklist(&mut self) -> VerifyResult<()> {
        let browser = self.shop.browser();
        let items = browser.all(CHECKLIST_ITEMS).await?;
        debug!("Checking {} outstanding checklist item(s)", items.len());
        for item in &items {
            browser.click_element(item).await?;
        }

        // The widget reports completion slightly before it really is
        settle(self.config.settle.checklist).await;

        self.shop.browser().wait_for(CHECKLIST_FINISHED, None).await
    }

    async fn go_live(&mut self) -> VerifyResult<()> {
        let browser = self.shop.browser();
        browser.click(CHECKLIST_FINISHED).await?;
        browser.reload().await?;

        settle(self.config.settle.go_live).await;

        if self.shop.browser().has_visible(CHECKLIST).await? {
            return Err(VerifyError::AssertionFailed(
                "checklist is still visible after going live and reloading".into(),
            ));
        }
        Ok(())
    }

    async fn select_product(&mut self) -> VerifyResult<()> {
        self.shop.visit_controller("AdminProducts", &[]).await?;
        let browser = self.shop.browser();
        browser.select("[name=\"productFilter_active\"]", "1").await?;
        browser.click("#submitFilterButtonproduct").await?;
        // Highest stock first so the product can be ordered later
        browser
            .click("xpath=//a[contains(@href, \"productOrderby=sav_quantity&productOrderway=desc\")]")
            .await?;

        match browser.click("#table-product tr.odd:first-child a.edit").await {
            Ok(()) => {}
            Err(e) if e.is_absence() => {
                return Err(VerifyError::AssertionFailed(
                    "no active product with stock exists".into(),
                ))
            }
            Err(e) => return Err(e),
        }

        let product_url = browser
            .get_attribute("#page-header-desc-product-preview", "href")
            .await?;
        if product_url.is_empty() {
            return Err(VerifyError::AssertionFailed(
                "product has no preview URL".into(),
            ));
        }

        browser.visit(&product_url).await?;
        browser.wait_for(PRODUCT_PAGE_READY, None).await?;

        info!("Selected product {}", product_url);
        self.context.product_url = Some(product_url);
        Ok(())
    }

    async fn setup_payment_module(&mut self) -> VerifyResult<()> {
        let module = self.config.payment_module.clone();
        self.shop.visit_controller("AdminModules", &[]).await?;

        let browser = self.shop.browser();
        browser.fill_in("#moduleQuicksearch", &module).await?;
        browser.wait_for(&format!("#anchor{}", capitalize(&module)), None).await?;

        let install_link = format!("xpath=//a[contains(@href, \"install={}\")]", module);
        match browser.click(&install_link).await {
            Ok(()) => info!("Installing {}", module),
            Err(e) if e.is_absence() => {
                info!("Looks like {} is already installed, will reset it", module);
                self.shop
                    .visit_controller(
                        "AdminModules",
                        &[("module_name", Some(module.as_str())), ("reset", None)],
                    )
                    .await?;
            }
            Err(e) => return Err(e),
        }

        self.shop.browser().wait_for(SUCCESS_BANNER, None).await
    }

    async fn capture_address(&mut self) -> VerifyResult<()> {
        self.shop.visit_controller("AdminAddresses", &[]).await?;
        let browser = self.shop.browser();
        // Most recent first to raise the odds of a valid address
        browser
            .click("xpath=//a[contains(@href, \"addressOrderby=id_address&addressOrderway=desc\")]")
            .await?;

        match browser.click("#form-address table tr.odd:first-child a.edit").await {
            Ok(()) => {}
            Err(e) if e.is_absence() => {
                return Err(VerifyError::AssertionFailed("no address record exists".into()))
            }
            Err(e) => return Err(e),
        }

        let address = CapturedAddress {
            address1: browser.get_value("#address1").await?,
            postcode: browser.get_value("#postcode").await?,
            city: browser.get_value("#city").await?,
            country: browser.get_selected_value("#id_country").await?,
            phone: browser.get_value("#phone").await?,
            phone_mobile: browser.get_value("#phone_mobile").await?,
        };

        let customer = CustomerDraft::from_address(address);
        info!("Generated customer {}", customer.email);
        self.context.customer = Some(customer);
        Ok(())
    }

    async fn register_customer(&mut self) -> VerifyResult<()> {
        let customer = self.context.customer.clone().ok_or_else(|| {
            VerifyError::AssertionFailed("no customer captured before registration".into())
        })?;
        let password = self.config.customer_password.clone();
        let front_office = self.shop.front_office_url().to_string();

        let browser = self.shop.browser();
        browser.visit(&front_office).await?;
        browser.click(".header_user_info a.login").await?;
        browser.fill_in("#email_create", &customer.email).await?;
        browser.click("#SubmitCreate").await?;
        browser.fill_in("#customer_firstname", &customer.first_name).await?;
        browser.fill_in("#customer_lastname", &customer.last_name).await?;
        browser.fill_in("#passwd", &password).await?;

        let consents = browser.all("#center_column input[type=\"checkbox\"]").await?;
        for checkbox in &consents {
            browser.click_element(checkbox).await?;
        }

        browser.click("#submitAccount").await?;

        // Some themes open a blocking modal after sign-up
        browser.send_keys(Key::Escape).await?;

        let company = browser
            .all("i.fa-building, i.icon-building")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::not_found("i.fa-building, i.icon-building"))?;
        browser.click_element(&company).await?;

        browser.fill_in("#address1", &customer.address1).await?;
        browser.select("#id_country", &customer.country).await?;
        browser.fill_in("#city", &customer.city).await?;
        browser.fill_in("#postcode", &customer.postcode).await?;
        browser.fill_in("#phone", &customer.phone).await?;
        browser.fill_in("#phone_mobile", &customer.phone_mobile).await?;
        browser.click("#submitAddress").await?;

        if browser.has_visible(ERROR_BANNER).await? {
            return Err(VerifyError::AssertionFailed("address was not saved".into()));
        }
        Ok(())
    }

    async fn place_order(&mut self) -> VerifyResult<()> {
        let product_url = self.context.product_url.clone().ok_or_else(|| {
            VerifyError::AssertionFailed("no product selected before ordering".into())
        })?;
        if self.context.customer.is_none() {
            return Err(VerifyError::AssertionFailed(
                "no customer registered before ordering".into(),
            ));
        }

        self.shop.browser().visit(&product_url).await?;

        // The product page keeps rebuilding itself for a while after load
        settle(self.config.settle.product_page).await;

        let browser = self.shop.browser();
        browser.wait_for(PRODUCT_PAGE_READY, None).await?;
        browser.click("#add_to_cart button").await?;

        match browser.click(".layer_cart_product .cross").await {
            Ok(()) => {}
            Err(e) if e.is_absence() => debug!("No cart modal to close"),
            Err(e) => return Err(e),
        }

        settle(self.config.settle.cart).await;

        let browser = self.shop.browser();
        let cart = browser
            .all(".shopping_cart a")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::not_found(".shopping_cart a"))?;
        browser.click_element(&cart).await?;

        let order_id = checkout::select(browser, &self.config.payment_module).await?;
        if order_id <= 0 {
            return Err(VerifyError::AssertionFailed(format!(
                "order doesn't seem to have been successful (id_order = {})",
                order_id
            )));
        }

        info!("Placed order {}", order_id);
        self.context.order_id = Some(order_id as u64);
        Ok(())
    }

    async fn validate_order(&mut self) -> VerifyResult<()> {
        let order_id = self.context.order_id.ok_or_else(|| {
            VerifyError::AssertionFailed("no order placed before validation".into())
        })?;

        self.shop.orders().visit_by_id(order_id).await?.validate().await?;

        let entries = self.shop.browser().all(ORDER_HISTORY_ROWS).await?.len();
        if entries != EXPECTED_HISTORY_ENTRIES {
            return Err(VerifyError::AssertionFailed(format!(
                "order status was not changed: history shows {} entries, expected {}",
                entries, EXPECTED_HISTORY_ENTRIES
            )));
        }
        Ok(())
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        debug!("Settling for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
