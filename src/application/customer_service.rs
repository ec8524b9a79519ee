use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::application::validation::{validate_customer, validate_customer_search};
use crate::domain::customer::{Customer, CustomerInput};
use crate::domain::errors::DomainError;
use crate::domain::filters::CustomerSearch;
use crate::domain::pagination::Paged;
use crate::domain::ports::Store;
use crate::domain::unit_of_work::Change;

pub struct CustomerService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> CustomerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_customer(&self, input: CustomerInput) -> Result<Customer, DomainError> {
        let birth_date = validate_customer(&input, Utc::now().date_naive())?;
        self.ensure_email_free(&input.email, None)?;

        let customer = Customer {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            birth_date,
        };
        self.store
            .commit(Change::InsertCustomer(customer.clone()).into())?;
        log::info!("created customer {}", customer.id);
        Ok(customer)
    }

    pub fn get_customer(&self, id: Uuid) -> Result<Customer, DomainError> {
        self.store.find_customer(id)?.ok_or_else(|| {
            log::debug!("customer {id} not found");
            DomainError::not_found("Customer not found")
        })
    }

    /// Rewrites all four fields. Last write wins.
    pub fn update_customer(&self, id: Uuid, input: CustomerInput) -> Result<Customer, DomainError> {
        let birth_date = validate_customer(&input, Utc::now().date_naive())?;
        let existing = self.get_customer(id)?;
        self.ensure_email_free(&input.email, Some(existing.id))?;

        let customer = Customer {
            id: existing.id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            birth_date,
        };
        self.store
            .commit(Change::UpdateCustomer(customer.clone()).into())?;
        log::info!("updated customer {id}");
        Ok(customer)
    }

    pub fn delete_customer(&self, id: Uuid) -> Result<(), DomainError> {
        let existing = self.get_customer(id)?;
        self.store
            .commit(Change::DeleteCustomer(existing.id).into())?;
        log::info!("deleted customer {id}");
        Ok(())
    }

    pub fn search_customers(&self, search: &CustomerSearch) -> Result<Paged<Customer>, DomainError> {
        validate_customer_search(search)?;
        self.store
            .search_customers(&search.clauses(), search.page.clamp())
    }

    fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        match self.store.find_customer_by_email(email)? {
            Some(other) if Some(other.id) != owner => {
                Err(DomainError::conflict("Email already in use"))
            }
            _ => Ok(()),
        }
    }
}
