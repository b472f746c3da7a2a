//! Customer lookup behind the customer service circuit breaker.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::Customer;
use crate::error::{FlujoError, Result};
use crate::ports::CustomerLookup;
use crate::resilience::{resolve, FallbackPolicy, ResiliencePolicy};

pub struct CustomerService {
    lookup: Arc<dyn CustomerLookup>,
    policy: Arc<ResiliencePolicy>,
    fallback: FallbackPolicy<Customer>,
}

impl CustomerService {
    /// Degrades to `Customer::placeholder()` on infrastructure failures
    pub fn new(lookup: Arc<dyn CustomerLookup>, policy: Arc<ResiliencePolicy>) -> Self {
        Self {
            lookup,
            policy,
            fallback: FallbackPolicy::Substitute(Customer::placeholder()),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy<Customer>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Protected lookup without fallback: every failure is returned.
    pub async fn get_by_id(&self, id: i64) -> Result<Customer> {
        validate_id(id)?;
        self.policy
            .protect(|| self.lookup.customer_by_id(id))
            .await
            .map_err(FlujoError::from)
    }

    /// Protected lookup for callers that prefer degraded data to a failure.
    ///
    /// `NotFound` is returned as is. Infrastructure failures go through the
    /// fallback policy, which by default substitutes the placeholder customer.
    pub async fn get_by_id_with_protection(&self, id: i64) -> Result<Customer> {
        validate_id(id)?;

        match self.policy.protect(|| self.lookup.customer_by_id(id)).await {
            Ok(customer) => {
                debug!("Customer {} fetched", id);
                Ok(customer)
            }
            Err(err) => {
                let customer =
                    resolve(self.policy.dependency(), err, &self.fallback).map_err(FlujoError::from)?;
                info!(
                    "Returning fallback customer for ID: {} due to {} degradation",
                    id,
                    self.policy.dependency()
                );
                Ok(customer)
            }
        }
    }
}

fn validate_id(id: i64) -> Result<()> {
    if id <= 0 {
        return Err(FlujoError::InvalidRequest(format!(
            "customer id must be positive, got {}",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PolicyConfig, CUSTOMER_SERVICE};
    use crate::error::{CallError, ErrorKind};
    use crate::ports::MockCustomerLookup;

    fn policy() -> Arc<ResiliencePolicy> {
        let config = PolicyConfig {
            max_attempts: 1,
            ..Default::default()
        };
        Arc::new(ResiliencePolicy::new(CUSTOMER_SERVICE, &config))
    }

    fn customer(id: i64) -> Customer {
        Customer {
            customer_id: Some(id),
            full_name: "John Doe".to_string(),
            gender: None,
            age: Some(30),
            identification: "1712345678".to_string(),
            address: "Quito".to_string(),
            phone: "0999999999".to_string(),
            email: "john.doe@email.com".to_string(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_success_returns_customer() {
        let mut lookup = MockCustomerLookup::new();
        lookup
            .expect_customer_by_id()
            .withf(|id| *id == 1)
            .returning(|id| Ok(customer(id)));

        let service = CustomerService::new(Arc::new(lookup), policy());
        let found = service.get_by_id_with_protection(1).await.unwrap();

        assert_eq!(found, customer(1));
        assert!(!found.is_placeholder());
    }

    #[tokio::test]
    async fn test_not_found_is_propagated() {
        let mut lookup = MockCustomerLookup::new();
        lookup.expect_customer_by_id().returning(|id| {
            Err(CallError::NotFound {
                target: CUSTOMER_SERVICE.to_string(),
                resource: format!("customer {}", id),
            })
        });

        let service = CustomerService::new(Arc::new(lookup), policy());
        let err = service.get_by_id_with_protection(999).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_timeout_returns_placeholder() {
        let mut lookup = MockCustomerLookup::new();
        lookup.expect_customer_by_id().returning(|_| {
            Err(CallError::Timeout {
                target: CUSTOMER_SERVICE.to_string(),
                elapsed_ms: 10_000,
            })
        });

        let service = CustomerService::new(Arc::new(lookup), policy());
        let found = service.get_by_id_with_protection(1).await.unwrap();

        assert!(found.is_placeholder());
    }

    #[tokio::test]
    async fn test_propagate_policy_returns_infrastructure_error() {
        let mut lookup = MockCustomerLookup::new();
        lookup.expect_customer_by_id().returning(|_| {
            Err(CallError::ConnectionError {
                target: CUSTOMER_SERVICE.to_string(),
                message: "refused".to_string(),
            })
        });

        let service = CustomerService::new(Arc::new(lookup), policy())
            .with_fallback(FallbackPolicy::Propagate);
        let err = service.get_by_id_with_protection(1).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConnectionError);
    }

    #[tokio::test]
    async fn test_non_positive_id_is_rejected() {
        let mut lookup = MockCustomerLookup::new();
        lookup.expect_customer_by_id().times(0);

        let service = CustomerService::new(Arc::new(lookup), policy());
        let err = service.get_by_id(0).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
