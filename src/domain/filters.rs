//! Search criteria and the predicate clauses they compile into.
//!
//! Every search request is turned into a flat list of clauses which the
//! store ANDs together. Blank text filters and absent bounds produce no
//! clause at all. Text clauses carry the needle already trimmed and
//! lower-cased, so matching is a case-insensitive "contains".

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::customer::Customer;
use super::order::Order;
use super::pagination::PageRequest;
use super::product::Product;

/// Normalise a text filter; `None` when nothing is left after trimming.
pub fn fold(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_lowercase())
}

pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerClause {
    NameContains(String),
    EmailContains(String),
    PhoneContains(String),
}

impl CustomerClause {
    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            CustomerClause::NameContains(needle) => contains_folded(&customer.name, needle),
            CustomerClause::EmailContains(needle) => contains_folded(&customer.email, needle),
            CustomerClause::PhoneContains(needle) => contains_folded(&customer.phone, needle),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductClause {
    TitleContains(String),
    DescriptionContains(String),
    SlugContains(String),
    PriceAtLeast(BigDecimal),
    PriceAtMost(BigDecimal),
}

impl ProductClause {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            ProductClause::TitleContains(needle) => contains_folded(&product.title, needle),
            ProductClause::DescriptionContains(needle) => {
                contains_folded(&product.description, needle)
            }
            ProductClause::SlugContains(needle) => contains_folded(&product.slug, needle),
            ProductClause::PriceAtLeast(min) => &product.price >= min,
            ProductClause::PriceAtMost(max) => &product.price <= max,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderClause {
    IdIs(Uuid),
    Customer(CustomerClause),
    /// Satisfied when at least one line's product satisfies the inner clause.
    AnyProduct(ProductClause),
    CreatedFrom(DateTime<Utc>),
    CreatedUntil(DateTime<Utc>),
    UpdatedFrom(DateTime<Utc>),
    UpdatedUntil(DateTime<Utc>),
}

impl OrderClause {
    pub fn matches(&self, order: &Order, customer: &Customer, products: &[&Product]) -> bool {
        match self {
            OrderClause::IdIs(id) => order.id == *id,
            OrderClause::Customer(clause) => clause.matches(customer),
            OrderClause::AnyProduct(clause) => products.iter().any(|p| clause.matches(p)),
            OrderClause::CreatedFrom(at) => order.created_at >= *at,
            OrderClause::CreatedUntil(at) => order.created_at <= *at,
            OrderClause::UpdatedFrom(at) => order.updated_at >= *at,
            OrderClause::UpdatedUntil(at) => order.updated_at <= *at,
        }
    }
}

/// Accumulates clauses, skipping filters that were not supplied.
#[derive(Debug)]
pub struct ClauseBuilder<C> {
    clauses: Vec<C>,
}

impl<C> ClauseBuilder<C> {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    pub fn contains(self, value: Option<&str>, clause: impl FnOnce(String) -> C) -> Self {
        self.when(value.and_then(fold), clause)
    }

    pub fn when<T>(mut self, value: Option<T>, clause: impl FnOnce(T) -> C) -> Self {
        if let Some(value) = value {
            self.clauses.push(clause(value));
        }
        self
    }

    pub fn build(self) -> Vec<C> {
        self.clauses
    }
}

impl<C> Default for ClauseBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerSearch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub page: PageRequest,
}

impl CustomerSearch {
    pub fn clauses(&self) -> Vec<CustomerClause> {
        ClauseBuilder::new()
            .contains(self.name.as_deref(), CustomerClause::NameContains)
            .contains(self.email.as_deref(), CustomerClause::EmailContains)
            .contains(self.phone.as_deref(), CustomerClause::PhoneContains)
            .build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductSearch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub page: PageRequest,
}

impl ProductSearch {
    pub fn clauses(&self) -> Vec<ProductClause> {
        ClauseBuilder::new()
            .contains(self.title.as_deref(), ProductClause::TitleContains)
            .contains(self.description.as_deref(), ProductClause::DescriptionContains)
            .contains(self.slug.as_deref(), ProductClause::SlugContains)
            .when(self.min_price.clone(), ProductClause::PriceAtLeast)
            .when(self.max_price.clone(), ProductClause::PriceAtMost)
            .build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    pub id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub product_title: Option<String>,
    pub product_description: Option<String>,
    pub product_slug: Option<String>,
    pub product_price_start: Option<BigDecimal>,
    pub product_price_end: Option<BigDecimal>,
    pub created_at_start: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
    pub updated_at_start: Option<DateTime<Utc>>,
    pub updated_at_end: Option<DateTime<Utc>>,
    pub page: PageRequest,
}

impl OrderSearch {
    pub fn clauses(&self) -> Vec<OrderClause> {
        use CustomerClause as C;
        use ProductClause as P;

        ClauseBuilder::new()
            .when(self.id, OrderClause::IdIs)
            .contains(self.customer_name.as_deref(), |v| {
                OrderClause::Customer(C::NameContains(v))
            })
            .contains(self.customer_email.as_deref(), |v| {
                OrderClause::Customer(C::EmailContains(v))
            })
            .contains(self.customer_phone.as_deref(), |v| {
                OrderClause::Customer(C::PhoneContains(v))
            })
            .contains(self.product_title.as_deref(), |v| {
                OrderClause::AnyProduct(P::TitleContains(v))
            })
            .contains(self.product_description.as_deref(), |v| {
                OrderClause::AnyProduct(P::DescriptionContains(v))
            })
            .contains(self.product_slug.as_deref(), |v| {
                OrderClause::AnyProduct(P::SlugContains(v))
            })
            .when(self.product_price_start.clone(), |v| {
                OrderClause::AnyProduct(P::PriceAtLeast(v))
            })
            .when(self.product_price_end.clone(), |v| {
                OrderClause::AnyProduct(P::PriceAtMost(v))
            })
            .when(self.created_at_start, OrderClause::CreatedFrom)
            .when(self.created_at_end, OrderClause::CreatedUntil)
            .when(self.updated_at_start, OrderClause::UpdatedFrom)
            .when(self.updated_at_end, OrderClause::UpdatedUntil)
            .build()
    }
}
