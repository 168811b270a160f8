//! Per-run verification state

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One deployment under verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationTarget {
    pub url: String,
}

impl VerificationTarget {
    pub fn from_domain(domain: &str) -> Self {
        Self {
            url: format!("http://{}", domain.trim()),
        }
    }

    pub fn front_office_url(&self) -> &str {
        &self.url
    }

    pub fn back_office_url(&self) -> String {
        format!("{}/backoffice", self.url.trim_end_matches('/'))
    }
}

/// Customer identity built from an existing address record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address1: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
    pub phone: String,
    pub phone_mobile: String,
}

/// Address fields read from the back office
#[derive(Debug, Clone, Default)]
pub struct CapturedAddress {
    pub address1: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
    pub phone: String,
    pub phone_mobile: String,
}

impl CustomerDraft {
    pub fn from_address(address: CapturedAddress) -> Self {
        Self {
            first_name: "Selenium".to_string(),
            last_name: "LeChat".to_string(),
            email: unique_email(),
            address1: address.address1,
            postcode: address.postcode,
            city: address.city,
            country: address.country,
            phone: address.phone,
            phone_mobile: address.phone_mobile,
        }
    }
}

/// Email that will not collide with earlier runs against the same shop
pub fn unique_email() -> String {
    let mut hasher = Sha256::new();
    hasher.update(chrono::Utc::now().to_rfc3339().as_bytes());
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    let token = hex::encode(hasher.finalize());
    format!("{}@example.com", &token[..32])
}

/// Mutable record carried across the steps of one run
#[derive(Debug, Clone, Default)]
pub struct VerificationContext {
    pub product_url: Option<String>,
    pub customer: Option<CustomerDraft>,
    pub order_id: Option<u64>,
}
