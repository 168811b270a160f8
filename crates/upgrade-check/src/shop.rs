//! Shop facade: semantic endpoints of the storefront over a browser

use tracing::{debug, info};
use url::Url;

use crate::browser::Browser;
use crate::context::VerificationTarget;
use crate::error::{VerifyError, VerifyResult};

/// Order state applied when an administrator validates an order
pub const PAYMENT_ACCEPTED_STATE: &str = "2";

/// Query parameter for `visit_controller`; a `None` value renders as a bare key
pub type ControllerParam<'a> = (&'a str, Option<&'a str>);

/// A storefront deployment reached through one browser
pub struct RemoteShop<B: Browser> {
    browser: B,
    front_office_url: String,
    back_office_url: String,
}

impl<B: Browser> RemoteShop<B> {
    pub fn new(browser: B, target: &VerificationTarget) -> Self {
        Self {
            browser,
            front_office_url: target.front_office_url().to_string(),
            back_office_url: target.back_office_url(),
        }
    }

    pub fn browser(&mut self) -> &mut B {
        &mut self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser
    }

    pub fn front_office_url(&self) -> &str {
        &self.front_office_url
    }

    pub fn back_office_url(&self) -> &str {
        &self.back_office_url
    }

    /// Authenticate against the back office login form
    pub async fn login(&mut self, email: &str, password: &str) -> VerifyResult<()> {
        info!("Logging in to back office as {}", email);
        let url = self.back_office_url.clone();
        let browser = &mut self.browser;

        browser.visit(&url).await?;
        browser.fill_in("#email", email).await?;
        browser.fill_in("#passwd", password).await?;
        browser.click_button_named("submitLogin").await?;

        match browser.wait_for("#header_employee_box", None).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_absence() => {
                if browser.has_visible("#error").await? {
                    Err(VerifyError::Authentication(format!(
                        "credentials for {} were rejected",
                        email
                    )))
                } else {
                    Err(VerifyError::Authentication(
                        "no back office session after login".into(),
                    ))
                }
            }
            Err(e) => Err(e),
        }
    }

    pub fn controller_url(&self, name: &str, params: &[ControllerParam<'_>]) -> VerifyResult<String> {
        let mut url = Url::parse(&format!("{}/index.php", self.back_office_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("controller", name);
            for (key, value) in params {
                match value {
                    Some(value) => query.append_pair(key, value),
                    None => query.append_key_only(key),
                };
            }
        }
        Ok(url.to_string())
    }

    /// Open a back office controller page
    pub async fn visit_controller(
        &mut self,
        name: &str,
        params: &[ControllerParam<'_>],
    ) -> VerifyResult<()> {
        let url = self.controller_url(name, params)?;
        debug!("Visiting controller {}", name);
        self.browser.visit(&url).await
    }

    pub fn orders(&mut self) -> Orders<'_, B> {
        Orders { shop: self }
    }
}

/// Back office orders section
pub struct Orders<'a, B: Browser> {
    shop: &'a mut RemoteShop<B>,
}

impl<'a, B: Browser> Orders<'a, B> {
    pub async fn visit_by_id(self, id: u64) -> VerifyResult<OrderPage<'a, B>> {
        let id_str = id.to_string();
        self.shop
            .visit_controller("AdminOrders", &[("id_order", Some(id_str.as_str())), ("vieworder", None)])
            .await?;
        Ok(OrderPage { shop: self.shop, id })
    }
}

/// A single order opened in the back office
pub struct OrderPage<'a, B: Browser> {
    shop: &'a mut RemoteShop<B>,
    id: u64,
}

impl<'a, B: Browser> OrderPage<'a, B> {
    /// Move the order to the accepted-payment state
    pub async fn validate(self) -> VerifyResult<()> {
        info!("Validating order {}", self.id);
        let browser = self.shop.browser();
        browser.select("#id_order_state", PAYMENT_ACCEPTED_STATE).await?;
        browser.click_button_named("submitState").await
    }
}
