//! Test checkout gateway.

use std::sync::Mutex;

use async_trait::async_trait;
use verdant_core::error::DomainError;
use verdant_marketplace::domain::repository::{CheckoutGateway, CheckoutRequest, CheckoutSession};

/// A checkout gateway that records requests and answers with numbered
/// sessions (`cs_test_1`, `cs_test_2`, ...).
#[derive(Debug, Default)]
pub struct RecordingGateway {
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl RecordingGateway {
    /// Create an empty recording gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all checkout requests.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckoutGateway for RecordingGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, DomainError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let n = requests.len();
        Ok(CheckoutSession {
            session_id: format!("cs_test_{n}"),
            url: format!("https://checkout.stripe.test/c/pay/cs_test_{n}"),
        })
    }
}
