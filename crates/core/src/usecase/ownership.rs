use std::sync::Arc;

use async_trait::async_trait;

use crate::customer::Customer;
use crate::invoice::Invoice;

#[async_trait]
pub trait InvoiceOwnershipPort: Send + Sync {
    async fn invoice(&self, id: u64) -> Option<Invoice>;
    async fn customer(&self, id: u64) -> Option<Customer>;
}

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    NotOwner,
    UnknownInvoice,
}

/// Decides whether a user owns an invoice through its customer.
///
/// Evaluated on every request; ownership is never cached.
#[derive(Clone)]
pub struct InvoiceOwnership {
    port: Arc<dyn InvoiceOwnershipPort>,
}

impl InvoiceOwnership {
    pub fn new(port: Arc<dyn InvoiceOwnershipPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, invoice_id: u64, user_id: &str) -> Ownership {
        let Some(invoice) = self.port.invoice(invoice_id).await else {
            return Ownership::UnknownInvoice;
        };
        match self.port.customer(invoice.customer_id).await {
            Some(customer) if customer.user_id == user_id => Ownership::Owner,
            _ => Ownership::NotOwner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePort;

    #[async_trait]
    impl InvoiceOwnershipPort for FakePort {
        async fn invoice(&self, id: u64) -> Option<Invoice> {
            (id == 1).then(|| Invoice::new(5, 6, 2018))
        }

        async fn customer(&self, id: u64) -> Option<Customer> {
            (id == 5).then(|| Customer {
                id,
                name: "3skills".into(),
                user_id: "owner".into(),
            })
        }
    }

    #[tokio::test]
    async fn owner_matches_customer_user() {
        let uc = InvoiceOwnership::new(Arc::new(FakePort));
        assert_eq!(uc.run(1, "owner").await, Ownership::Owner);
        assert_eq!(uc.run(1, "intruder").await, Ownership::NotOwner);
        assert_eq!(uc.run(2, "owner").await, Ownership::UnknownInvoice);
    }
}
