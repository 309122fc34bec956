use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;

use restvoice_core::{
    Activity, Booking, Customer, Invoice, Project, Rate, RepositoryError,
};

/// Next id per collection. Ids start at 1 and are never reused.
#[derive(Debug)]
struct Sequences {
    activity: u64,
    booking: u64,
    customer: u64,
    invoice: u64,
    project: u64,
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            activity: 1,
            booking: 1,
            customer: 1,
            invoice: 1,
            project: 1,
        }
    }
}

fn next(seq: &mut u64) -> u64 {
    let id = *seq;
    *seq += 1;
    id
}

#[derive(Debug, Default)]
struct Tables {
    /// Activities keyed by owning user and id.
    activities: BTreeMap<(String, u64), Activity>,
    bookings: BTreeMap<u64, Booking>,
    customers: BTreeMap<u64, Customer>,
    invoices: BTreeMap<u64, Invoice>,
    projects: BTreeMap<u64, Project>,
    rates: HashMap<(u64, u64), Rate>,
    sequences: Sequences,
}

/// In-memory repository behind a single [`RwLock`].
///
/// Every mutation takes the write lock for the whole store, so id
/// assignment and the insert that uses the id happen atomically. Reads share
/// the lock and see a consistent snapshot of all tables.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Activities -------------------------------------------------------

    pub async fn create_activity(&self, mut activity: Activity) -> Activity {
        let mut tables = self.tables.write().await;
        activity.id = next(&mut tables.sequences.activity);
        activity.updated = Utc::now();
        tables
            .activities
            .insert((activity.user_id.clone(), activity.id), activity.clone());
        activity
    }

    pub async fn activities(&self, user_id: &str) -> Vec<Activity> {
        let tables = self.tables.read().await;
        tables
            .activities
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn activity(&self, user_id: &str, id: u64) -> Option<Activity> {
        let tables = self.tables.read().await;
        tables.activities.get(&(user_id.to_owned(), id)).cloned()
    }

    // -- Bookings ---------------------------------------------------------

    pub async fn create_booking(&self, mut booking: Booking) -> Result<Booking, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.invoices.contains_key(&booking.invoice_id) {
            return Err(RepositoryError::not_found("invoice", booking.invoice_id));
        }
        booking.id = next(&mut tables.sequences.booking);
        tables.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    pub async fn delete_booking(
        &self,
        invoice_id: u64,
        booking_id: u64,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get(&booking_id) {
            Some(b) if b.invoice_id == invoice_id => {
                tables.bookings.remove(&booking_id);
                Ok(())
            }
            _ => Err(RepositoryError::not_found("booking", booking_id)),
        }
    }

    pub async fn bookings_by_invoice(&self, invoice_id: u64) -> Vec<Booking> {
        let tables = self.tables.read().await;
        Self::bookings_of(&tables, invoice_id)
    }

    fn bookings_of(tables: &Tables, invoice_id: u64) -> Vec<Booking> {
        tables
            .bookings
            .values()
            .filter(|b| b.invoice_id == invoice_id)
            .cloned()
            .collect()
    }

    // -- Customers --------------------------------------------------------

    pub async fn create_customer(&self, mut customer: Customer) -> Customer {
        let mut tables = self.tables.write().await;
        customer.id = next(&mut tables.sequences.customer);
        tables.customers.insert(customer.id, customer.clone());
        customer
    }

    pub async fn customers(&self) -> Vec<Customer> {
        self.tables.read().await.customers.values().cloned().collect()
    }

    pub async fn customer(&self, id: u64) -> Option<Customer> {
        self.tables.read().await.customers.get(&id).cloned()
    }

    // -- Projects ---------------------------------------------------------

    pub async fn create_project(&self, mut project: Project) -> Result<Project, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&project.customer_id) {
            return Err(RepositoryError::not_found("customer", project.customer_id));
        }
        project.id = next(&mut tables.sequences.project);
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    pub async fn projects(&self, customer_id: u64) -> Vec<Project> {
        let tables = self.tables.read().await;
        tables
            .projects
            .values()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect()
    }

    // -- Rates ------------------------------------------------------------

    /// Insert or replace the rate for `(project_id, activity_id)`.
    pub async fn create_rate(&self, rate: Rate) -> Result<Rate, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&rate.project_id) {
            return Err(RepositoryError::not_found("project", rate.project_id));
        }
        tables
            .rates
            .insert((rate.project_id, rate.activity_id), rate);
        Ok(rate)
    }

    pub async fn rate(&self, project_id: u64, activity_id: u64) -> Option<Rate> {
        let tables = self.tables.read().await;
        tables.rates.get(&(project_id, activity_id)).copied()
    }

    // -- Invoices ---------------------------------------------------------

    pub async fn create_invoice(&self, mut invoice: Invoice) -> Result<Invoice, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&invoice.customer_id) {
            return Err(RepositoryError::not_found("customer", invoice.customer_id));
        }
        invoice.id = next(&mut tables.sequences.invoice);
        invoice.bookings.clear();
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    pub async fn invoice(&self, id: u64, with_bookings: bool) -> Option<Invoice> {
        let tables = self.tables.read().await;
        let mut invoice = tables.invoices.get(&id).cloned()?;
        if with_bookings {
            invoice.bookings = Self::bookings_of(&tables, id);
        }
        Some(invoice)
    }

    /// Replace a stored invoice. Bookings are kept in their own table and
    /// are never written through the invoice.
    pub async fn update_invoice(&self, mut invoice: Invoice) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(slot) = tables.invoices.get_mut(&invoice.id) else {
            return Err(RepositoryError::not_found("invoice", invoice.id));
        };
        invoice.bookings.clear();
        *slot = invoice;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use restvoice_core::InvoiceStatus;

    use super::*;

    async fn seeded() -> (MemoryRepository, Customer, Invoice) {
        let repo = MemoryRepository::new();
        let customer = repo
            .create_customer(Customer {
                name: "3skills".into(),
                user_id: "user-1".into(),
                ..Customer::default()
            })
            .await;
        let invoice = repo
            .create_invoice(Invoice::new(customer.id, 6, 2018))
            .await
            .unwrap();
        (repo, customer, invoice)
    }

    #[tokio::test]
    async fn ids_start_at_one_per_collection() {
        let (repo, customer, invoice) = seeded().await;
        assert_eq!(customer.id, 1);
        assert_eq!(invoice.id, 1);

        let activity = repo.create_activity(Activity::new("Programming", "user-1")).await;
        assert_eq!(activity.id, 1);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let (repo, _, invoice) = seeded().await;
        let first = repo
            .create_booking(Booking {
                invoice_id: invoice.id,
                ..Booking::new(1, 1, 2.0)
            })
            .await
            .unwrap();
        repo.delete_booking(invoice.id, first.id).await.unwrap();

        let second = repo
            .create_booking(Booking {
                invoice_id: invoice.id,
                ..Booking::new(1, 1, 3.0)
            })
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(repo.bookings_by_invoice(invoice.id).await.len(), 1);
    }

    #[tokio::test]
    async fn delete_booking_checks_invoice() {
        let (repo, _, invoice) = seeded().await;
        let booking = repo
            .create_booking(Booking {
                invoice_id: invoice.id,
                ..Booking::new(1, 1, 2.0)
            })
            .await
            .unwrap();

        let err = repo.delete_booking(invoice.id + 1, booking.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "booking", .. }));
        assert!(repo.delete_booking(invoice.id, booking.id).await.is_ok());
        assert!(repo.delete_booking(invoice.id, booking.id).await.is_err());
    }

    #[tokio::test]
    async fn activities_are_scoped_to_user() {
        let repo = MemoryRepository::new();
        let mine = repo.create_activity(Activity::new("Programming", "user-1")).await;
        repo.create_activity(Activity::new("Design", "user-2")).await;

        let listed = repo.activities("user-1").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Programming");
        assert!(repo.activity("user-2", mine.id).await.is_none());
        assert!(repo.activity("user-1", mine.id).await.is_some());
    }

    #[tokio::test]
    async fn missing_rate_is_none() {
        let repo = MemoryRepository::new();
        assert!(repo.rate(1, 1).await.is_none());
    }

    #[tokio::test]
    async fn rates_are_replaced_per_project_and_activity() {
        let (repo, customer, _) = seeded().await;
        let project = repo
            .create_project(Project {
                customer_id: customer.id,
                name: "Instantfoo.com".into(),
                ..Project::default()
            })
            .await
            .unwrap();

        for price in [50.0, 60.0] {
            repo.create_rate(Rate {
                project_id: project.id,
                activity_id: 1,
                price,
            })
            .await
            .unwrap();
        }
        let rate = repo.rate(project.id, 1).await.unwrap();
        assert!((rate.price - 60.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn invoice_expands_bookings_on_request() {
        let (repo, _, invoice) = seeded().await;
        repo.create_booking(Booking {
            invoice_id: invoice.id,
            ..Booking::new(1, 1, 2.0)
        })
        .await
        .unwrap();

        assert!(repo.invoice(invoice.id, false).await.unwrap().bookings.is_empty());
        assert_eq!(repo.invoice(invoice.id, true).await.unwrap().bookings.len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_invoice_but_not_bookings() {
        let (repo, _, mut invoice) = seeded().await;
        invoice.status = InvoiceStatus::Paid;
        invoice.bookings.push(Booking::new(1, 1, 1.0));
        repo.update_invoice(invoice.clone()).await.unwrap();

        let stored = repo.invoice(invoice.id, true).await.unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert!(stored.bookings.is_empty());

        invoice.id = 99;
        assert!(repo.update_invoice(invoice).await.is_err());
    }

    #[tokio::test]
    async fn invoice_requires_customer() {
        let repo = MemoryRepository::new();
        let err = repo.create_invoice(Invoice::new(5, 6, 2018)).await.unwrap_err();
        assert_eq!(err, RepositoryError::not_found("customer", 5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_unique_ids() {
        let repo = Arc::new(MemoryRepository::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.create_customer(Customer {
                    name: format!("customer-{i}"),
                    ..Customer::default()
                })
                .await
                .id
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(ids.iter().max(), Some(&64));
    }
}
