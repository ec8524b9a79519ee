use uuid::Uuid;

use super::customer::Customer;
use super::errors::DomainError;
use super::filters::{CustomerClause, OrderClause, ProductClause};
use super::order::OrderView;
use super::pagination::{Paged, Pagination};
use super::product::Product;
use super::report::{OrderTotal, OrderTotalsFilter};
use super::unit_of_work::UnitOfWork;

pub trait CustomerRepository: Send + Sync + 'static {
    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError>;
    /// Ordered by name ascending.
    fn search_customers(
        &self,
        clauses: &[CustomerClause],
        page: Pagination,
    ) -> Result<Paged<Customer>, DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DomainError>;
    /// Returns only the products that exist; missing ids are silently skipped.
    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    /// Ordered by title ascending.
    fn search_products(
        &self,
        clauses: &[ProductClause],
        page: Pagination,
    ) -> Result<Paged<Product>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn find_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    /// Ordered by creation time, newest first.
    fn search_orders(
        &self,
        clauses: &[OrderClause],
        page: Pagination,
    ) -> Result<Paged<OrderView>, DomainError>;
}

pub trait ReportRepository: Send + Sync + 'static {
    fn order_totals(&self, filter: &OrderTotalsFilter) -> Result<Vec<OrderTotal>, DomainError>;
}

/// Everything the services need from persistence.
pub trait Store: CustomerRepository + ProductRepository + OrderRepository + ReportRepository {
    /// Apply every buffered change in one transaction, or none of them.
    fn commit(&self, work: UnitOfWork) -> Result<(), DomainError>;
}
