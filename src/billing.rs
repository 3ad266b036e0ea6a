//! Subscription Plans and Checkout
//!
//! Static plan catalogue plus Stripe Checkout session creation over the
//! form-encoded REST API.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Used when the request carries no `Origin` header
pub const FALLBACK_ORIGIN: &str = "http://localhost";

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Plan ID is required")]
    MissingPlan,
    #[error("Payment API key not configured")]
    MissingApiKey,
    #[error("Payment request failed: {0}")]
    Transport(String),
    #[error("Payment API returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl Serialize for CheckoutError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for CheckoutError {
    fn from(e: reqwest::Error) -> Self {
        CheckoutError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: &'static str,
    /// Monthly price in USD
    pub price: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_id: Option<&'static str>,
    pub features: &'static [&'static str],
}

pub fn plans() -> Vec<Plan> {
    vec![
        Plan {
            name: "Free Plan",
            price: 0,
            price_id: None,
            features: &[
                "5 flashcard generations per month",
                "2 saved flashcard sets",
                "No access to flashcard games",
            ],
        },
        Plan {
            name: "Pro Plan",
            price: 1,
            price_id: Some("price_1PoeXzBGuZJEG2quSrgzetsk"),
            features: &[
                "Unlimited text to flashcard generation",
                "500 doc to flashcard generations per month",
                "Unlimited saved flashcard sets",
                "Limited access to flashcard games",
            ],
        },
        Plan {
            name: "Enterprise",
            price: 5,
            price_id: Some("price_1PoebEBGuZJEG2qu67A2rEW5"),
            features: &[
                "Unlimited text to flashcard generation",
                "Unlimited doc to flashcard generation",
                "Unlimited saved flashcard sets",
                "Unlimited access to flashcard games",
            ],
        },
    ]
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
}

#[derive(Clone)]
pub struct CheckoutClient {
    http: Client,
    base_url: String,
    secret_key: Option<String>,
}

impl CheckoutClient {
    pub fn new(base_url: &str, secret_key: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    /// Create a subscription checkout session and return its id
    pub async fn create_session(&self, plan: &str, origin: Option<&str>) -> Result<String, CheckoutError> {
        let plan = plan.trim();
        if plan.is_empty() {
            return Err(CheckoutError::MissingPlan);
        }
        let secret_key = self.secret_key.as_deref().ok_or(CheckoutError::MissingApiKey)?;

        let form = checkout_form(plan, origin.unwrap_or(FALLBACK_ORIGIN));
        let resp = self.http.post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(secret_key)
            .form(&form)
            .send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            error!(status = %status, body = %text, "Error creating checkout session");
            return Err(CheckoutError::Http { status, body: text });
        }

        let session: CheckoutSession = serde_json::from_str(&text)
            .map_err(|e| CheckoutError::Deserialize(format!("{}: {}", e, text)))?;
        info!(session = %session.id, plan = %plan, "Created checkout session");
        Ok(session.id)
    }
}

/// Form fields for a one-seat card subscription
fn checkout_form(plan: &str, origin: &str) -> Vec<(&'static str, String)> {
    let origin = origin.trim_end_matches('/');
    vec![
        ("payment_method_types[]", "card".to_string()),
        ("line_items[0][price]", plan.to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("mode", "subscription".to_string()),
        ("success_url", format!("{origin}/success?session_id={{CHECKOUT_SESSION_ID}}")),
        ("cancel_url", format!("{origin}/canceled")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_catalogue() {
        let plans = plans();
        assert_eq!(plans.len(), 3);
        assert!(plans[0].price_id.is_none());
        assert!(plans.iter().skip(1).all(|p| p.price_id.is_some() && p.price > 0));

        let json = serde_json::to_value(&plans[1]).unwrap();
        assert_eq!(json["priceId"], "price_1PoeXzBGuZJEG2quSrgzetsk");
        assert!(serde_json::to_value(&plans[0]).unwrap().get("priceId").is_none());
    }

    #[test]
    fn test_checkout_form() {
        let form = checkout_form("price_123", "https://memorix.app/");
        let get = |key: &str| form.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("line_items[0][price]"), Some("price_123"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(
            get("success_url"),
            Some("https://memorix.app/success?session_id={CHECKOUT_SESSION_ID}")
        );
        assert_eq!(get("cancel_url"), Some("https://memorix.app/canceled"));
    }

    #[tokio::test]
    async fn test_missing_plan_checked_first() {
        let client = CheckoutClient::new("https://api.stripe.com", None);
        assert!(matches!(client.create_session("  ", None).await, Err(CheckoutError::MissingPlan)));
        assert!(matches!(
            client.create_session("price_123", None).await,
            Err(CheckoutError::MissingApiKey)
        ));
    }
}
