//! Run policy and runner configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::preflight::PreflightConfig;

/// Step-selection policy, resolved once at the process boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunPolicy {
    /// Skip onboarding, checklist completion and go-live
    pub skip_checklist: bool,
}

impl RunPolicy {
    /// Interpret an environment-style flag value (`NO_CHECKLIST`).
    ///
    /// Unset, empty, `0` and `false` leave the checklist enabled.
    pub fn from_flag(value: Option<&str>) -> Self {
        let skip_checklist = match value.map(str::trim) {
            None | Some("") => false,
            Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
        };
        Self { skip_checklist }
    }
}

/// Fixed grace periods after actions whose readiness signal precedes stability
#[derive(Debug, Clone, Copy)]
pub struct SettleDelays {
    /// After clicking every checklist item
    pub checklist: Duration,
    /// After clicking go-live and reloading
    pub go_live: Duration,
    /// After revisiting the product page, before adding to cart
    pub product_page: Duration,
    /// After dismissing the optional cart modal
    pub cart: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            checklist: Duration::from_secs(5),
            go_live: Duration::from_secs(5),
            product_page: Duration::from_secs(15),
            cart: Duration::from_secs(5),
        }
    }
}

impl SettleDelays {
    pub fn none() -> Self {
        Self {
            checklist: Duration::ZERO,
            go_live: Duration::ZERO,
            product_page: Duration::ZERO,
            cart: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "pub@prestashop.com".to_string(),
            password: "123456789".to_string(),
        }
    }
}

/// Everything a single workflow run needs besides the target itself
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub policy: RunPolicy,
    pub admin: Credentials,
    /// Password given to the freshly registered customer
    pub customer_password: String,
    /// Payment module searched, installed or reset, then used at checkout
    pub payment_module: String,
    pub settle: SettleDelays,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            policy: RunPolicy::default(),
            admin: Credentials::default(),
            customer_password: "123456789".to_string(),
            payment_module: "bankwire".to_string(),
            settle: SettleDelays::default(),
        }
    }
}

/// Configuration for the multi-target runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub workflow: WorkflowConfig,
    /// `None` disables the reachability probe
    pub preflight: Option<PreflightConfig>,
    /// Targets verified concurrently
    pub jobs: usize,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowConfig::default(),
            preflight: Some(PreflightConfig::default()),
            jobs: 1,
            output_dir: PathBuf::from("test-results"),
        }
    }
}
