//! Storefront Upgrade Verification
//!
//! This crate verifies, end to end, that an upgraded storefront deployment is
//! operational:
//! - Resolves deployments from a `DOMAIN` override or a CSV table
//! - Drives a real browser through Playwright, one browser per deployment
//! - Walks a fixed business workflow from onboarding to order validation
//! - Reports, per deployment, success or the first failing step
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  VerificationRunner                          │
//! │    ├── TargetSource::resolve() -> [VerificationTarget]      │
//! │    ├── preflight::probe(url)                                │
//! │    ├── BrowserLauncher::launch() -> impl Browser            │
//! │    └── Workflow::run() -> RunReport                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Workflow (per target, owns VerificationContext)            │
//! │    ├── Onboarding / ChecklistCompletion / GoLive (skippable)│
//! │    ├── AdminLogin                                           │
//! │    ├── ProductSelection        -> context.product_url       │
//! │    ├── PaymentModuleSetup      (install, else reset)        │
//! │    ├── AddressCapture          -> context.customer          │
//! │    ├── CustomerRegistration                                 │
//! │    ├── OrderPlacement          -> checkout::select          │
//! │    │     ├── OnePage                                        │
//! │    │     └── FiveStep                                       │
//! │    └── OrderValidation         (history has 2 entries)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RemoteShop (front office, back office, orders) over Browser│
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod checkout;
pub mod config;
pub mod context;
pub mod error;
pub mod playwright;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod shop;
pub mod targets;
pub mod workflow;

pub use browser::{Browser, Element, Key};
pub use config::{RunPolicy, RunnerConfig, WorkflowConfig};
pub use context::{CustomerDraft, VerificationContext, VerificationTarget};
pub use error::{VerifyError, VerifyResult};
pub use runner::{BrowserLauncher, SuiteReport, VerificationRunner};
pub use targets::TargetSource;
pub use workflow::{RunReport, Stage, Workflow};
