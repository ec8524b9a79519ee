//! A `Store` held entirely in memory.
//!
//! Mirrors the Postgres store's semantics (ordering, unique keys, foreign
//! keys, all-or-nothing commits) so services and handlers can be exercised
//! without a database.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::customer::Customer;
use crate::domain::errors::DomainError;
use crate::domain::filters::{CustomerClause, OrderClause, ProductClause};
use crate::domain::order::{Order, OrderLine, OrderLineView, OrderView};
use crate::domain::pagination::{Paged, Pagination};
use crate::domain::ports::{
    CustomerRepository, OrderRepository, ProductRepository, ReportRepository, Store,
};
use crate::domain::product::Product;
use crate::domain::report::{OrderTotal, OrderTotalsFilter};
use crate::domain::unit_of_work::{Change, UnitOfWork};
use crate::infrastructure::{
    reference_violation, unique_violation, CUSTOMER_EMAIL_KEY, PRODUCT_SLUG_KEY,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<Uuid, Customer>,
    products: BTreeMap<Uuid, Product>,
    orders: BTreeMap<Uuid, Order>,
    lines: Vec<OrderLine>,
}

impl Tables {
    fn lines_of(&self, order_id: Uuid) -> Vec<&OrderLine> {
        let mut lines: Vec<&OrderLine> = self
            .lines
            .iter()
            .filter(|line| line.order_id == order_id)
            .collect();
        lines.sort_by_key(|line| line.line_number);
        lines
    }

    fn view(&self, order: &Order) -> OrderView {
        let customer_name = self
            .customers
            .get(&order.customer_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        OrderView {
            id: order.id,
            customer_id: order.customer_id,
            customer_name,
            created_at: order.created_at,
            updated_at: order.updated_at,
            lines: self
                .lines_of(order.id)
                .into_iter()
                .map(|line| OrderLineView {
                    id: line.id,
                    product_id: line.product_id,
                    product_title: self
                        .products
                        .get(&line.product_id)
                        .map(|p| p.title.clone())
                        .unwrap_or_default(),
                    quantity: line.quantity,
                    unit_price: line.unit_price.clone(),
                    total: line.total.clone(),
                })
                .collect(),
        }
    }

    fn order_matches(&self, order: &Order, clauses: &[OrderClause]) -> bool {
        let Some(customer) = self.customers.get(&order.customer_id) else {
            return false;
        };
        let products: Vec<&Product> = self
            .lines_of(order.id)
            .into_iter()
            .filter_map(|line| self.products.get(&line.product_id))
            .collect();
        clauses
            .iter()
            .all(|clause| clause.matches(order, customer, &products))
    }

    fn unique_email(&self, customer: &Customer) -> Result<(), DomainError> {
        let taken = self
            .customers
            .values()
            .any(|c| c.email == customer.email && c.id != customer.id);
        if taken {
            return Err(unique_violation(Some(CUSTOMER_EMAIL_KEY)));
        }
        Ok(())
    }

    fn unique_slug(&self, product: &Product) -> Result<(), DomainError> {
        let taken = self
            .products
            .values()
            .any(|p| p.slug == product.slug && p.id != product.id);
        if taken {
            return Err(unique_violation(Some(PRODUCT_SLUG_KEY)));
        }
        Ok(())
    }

    fn apply(&mut self, change: Change) -> Result<(), DomainError> {
        match change {
            Change::InsertCustomer(customer) | Change::UpdateCustomer(customer) => {
                self.unique_email(&customer)?;
                self.customers.insert(customer.id, customer);
            }
            Change::DeleteCustomer(id) => {
                if self.orders.values().any(|o| o.customer_id == id) {
                    return Err(reference_violation());
                }
                self.customers
                    .remove(&id)
                    .ok_or_else(|| DomainError::not_found("Customer not found"))?;
            }
            Change::InsertProduct(product) | Change::UpdateProduct(product) => {
                self.unique_slug(&product)?;
                self.products.insert(product.id, product);
            }
            Change::DeleteProduct(id) => {
                if self.lines.iter().any(|l| l.product_id == id) {
                    return Err(reference_violation());
                }
                self.products
                    .remove(&id)
                    .ok_or_else(|| DomainError::not_found("Product not found"))?;
            }
            Change::InsertOrder(new_order) => {
                if !self.customers.contains_key(&new_order.order.customer_id) {
                    return Err(reference_violation());
                }
                if new_order
                    .lines
                    .iter()
                    .any(|l| !self.products.contains_key(&l.product_id))
                {
                    return Err(reference_violation());
                }
                self.orders.insert(new_order.order.id, new_order.order);
                self.lines.extend(new_order.lines);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|_| DomainError::Store("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|_| DomainError::Store("in-memory store lock poisoned".to_string()))
    }
}

fn paged<T>(items: Vec<T>, page: Pagination) -> Paged<T> {
    let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
    Paged {
        items: page.slice(items),
        total,
        page,
    }
}

impl CustomerRepository for InMemoryStore {
    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    fn search_customers(
        &self,
        clauses: &[CustomerClause],
        page: Pagination,
    ) -> Result<Paged<Customer>, DomainError> {
        let tables = self.read()?;
        let mut matches: Vec<Customer> = tables
            .customers
            .values()
            .filter(|c| clauses.iter().all(|clause| clause.matches(c)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paged(matches, page))
    }
}

impl ProductRepository for InMemoryStore {
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DomainError> {
        Ok(self
            .read()?
            .products
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let tables = self.read()?;
        Ok(tables
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn search_products(
        &self,
        clauses: &[ProductClause],
        page: Pagination,
    ) -> Result<Paged<Product>, DomainError> {
        let tables = self.read()?;
        let mut matches: Vec<Product> = tables
            .products
            .values()
            .filter(|p| clauses.iter().all(|clause| clause.matches(p)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(paged(matches, page))
    }
}

impl OrderRepository for InMemoryStore {
    fn find_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let tables = self.read()?;
        Ok(tables.orders.get(&id).map(|order| tables.view(order)))
    }

    fn search_orders(
        &self,
        clauses: &[OrderClause],
        page: Pagination,
    ) -> Result<Paged<OrderView>, DomainError> {
        let tables = self.read()?;
        let mut matches: Vec<&Order> = tables
            .orders
            .values()
            .filter(|order| tables.order_matches(order, clauses))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paged(matches, page).map(|order| tables.view(order)))
    }
}

impl ReportRepository for InMemoryStore {
    fn order_totals(&self, filter: &OrderTotalsFilter) -> Result<Vec<OrderTotal>, DomainError> {
        let tables = self.read()?;
        let totals = tables
            .orders
            .values()
            .filter(|order| filter.window.contains(order.created_at))
            .filter_map(|order| {
                let customer = tables.customers.get(&order.customer_id)?;
                if !filter.customer.iter().all(|clause| clause.matches(customer)) {
                    return None;
                }
                let total = tables
                    .lines_of(order.id)
                    .into_iter()
                    .fold(BigDecimal::from(0), |acc, line| acc + &line.total);
                Some(OrderTotal {
                    order_id: order.id,
                    customer_id: customer.id,
                    customer_name: customer.name.clone(),
                    customer_email: customer.email.clone(),
                    created_at: order.created_at,
                    total,
                })
            })
            .collect();
        Ok(totals)
    }
}

impl Store for InMemoryStore {
    fn commit(&self, work: UnitOfWork) -> Result<(), DomainError> {
        let mut tables = self.write()?;
        let mut staged = tables.clone();
        for change in work.into_changes() {
            staged.apply(change)?;
        }
        *tables = staged;
        Ok(())
    }
}
