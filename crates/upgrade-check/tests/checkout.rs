//! Checkout strategy selection against scripted cart pages

mod common;

use common::{FakeBrowser, SUBMIT_ORDER};
use shop_upgrade_check::checkout::{self, CheckoutStrategy, FIVE_STEP_MARKER, ONE_PAGE_MARKER};
use shop_upgrade_check::VerifyError;

#[tokio::test]
async fn one_page_marker_runs_only_one_page_checkout() {
    let mut browser = FakeBrowser::happy_path();

    let strategy = CheckoutStrategy::detect(&mut browser).await.unwrap();
    assert_eq!(strategy, CheckoutStrategy::OnePage);

    let id = checkout::select(&mut browser, "bankwire").await.unwrap();
    assert_eq!(id, 42);

    assert!(browser.did(&format!("click {}", ONE_PAGE_MARKER)));
    assert!(browser.did("wait a.bankwire"));
    assert!(browser.did(&format!("click {}", SUBMIT_ORDER)));
    assert!(!browser.touched("standard-checkout"));
    assert!(!browser.touched("processAddress"));
    assert!(!browser.touched("processCarrier"));
}

#[tokio::test]
async fn absent_marker_runs_five_step_checkout() {
    let mut browser = FakeBrowser::happy_path().with_five_step_checkout();

    let id = checkout::select(&mut browser, "bankwire").await.unwrap();
    assert_eq!(id, 42);

    let expected = [
        format!("click {}", FIVE_STEP_MARKER),
        "click button[name=\"processAddress\"]".to_string(),
        format!("click {}", ONE_PAGE_MARKER),
        "click button[name=\"processCarrier\"]".to_string(),
        "click a.bankwire".to_string(),
        format!("click {}", SUBMIT_ORDER),
    ];
    assert_eq!(browser.actions, expected);
    assert!(!browser.did("wait a.bankwire"));
}

#[tokio::test]
async fn five_step_checkout_tolerates_missing_terms() {
    let mut browser = FakeBrowser::happy_path()
        .with_five_step_checkout()
        .without(ONE_PAGE_MARKER);

    let id = checkout::select(&mut browser, "bankwire").await.unwrap();
    assert_eq!(id, 42);

    assert!(!browser.did(&format!("click {}", ONE_PAGE_MARKER)));
    assert!(browser.did("click button[name=\"processCarrier\"]"));
    assert!(browser.did("click a.bankwire"));
}

#[tokio::test]
async fn one_page_checkout_requires_terms() {
    let mut browser = FakeBrowser::happy_path().without(ONE_PAGE_MARKER);

    let err = checkout::select(&mut browser, "bankwire").await.unwrap_err();
    assert!(matches!(err, VerifyError::ElementNotFound { .. }));
}

#[tokio::test]
async fn both_markers_are_ambiguous() {
    let mut browser = FakeBrowser::happy_path().showing(FIVE_STEP_MARKER);

    let err = CheckoutStrategy::detect(&mut browser).await.unwrap_err();
    assert!(matches!(err, VerifyError::AssertionFailed(_)));
    assert!(browser.actions.is_empty());
}

#[tokio::test]
async fn no_marker_falls_through_to_five_step() {
    let mut browser = FakeBrowser::happy_path();
    browser.visible.clear();

    let strategy = CheckoutStrategy::detect(&mut browser).await.unwrap();
    assert_eq!(strategy, CheckoutStrategy::FiveStep);

    let id = checkout::select(&mut browser, "bankwire").await.unwrap();
    assert_eq!(id, 42);
    assert_eq!(browser.actions[0], format!("click {}", FIVE_STEP_MARKER));
    assert!(browser.did("click button[name=\"processCarrier\"]"));
}

#[tokio::test]
async fn five_step_without_its_button_reports_missing_element() {
    let mut browser = FakeBrowser::happy_path().without(FIVE_STEP_MARKER);
    browser.visible.clear();

    let err = checkout::select(&mut browser, "bankwire").await.unwrap_err();
    assert!(matches!(err, VerifyError::ElementNotFound { ref selector } if selector == FIVE_STEP_MARKER));
    assert!(browser.actions.is_empty());
}

#[tokio::test]
async fn payment_module_drives_payment_link() {
    let mut browser = FakeBrowser::happy_path().with_five_step_checkout();

    checkout::select(&mut browser, "cheque").await.unwrap();
    assert!(browser.did("click a.cheque"));
}
