use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::application::validation::{
    validate_order_header, validate_order_search, validate_quantities,
};
use crate::domain::errors::DomainError;
use crate::domain::filters::OrderSearch;
use crate::domain::order::{NewOrder, Order, OrderInput, OrderLine, OrderLineView, OrderView};
use crate::domain::pagination::Paged;
use crate::domain::ports::Store;
use crate::domain::product::Product;
use crate::domain::unit_of_work::{Change, UnitOfWork};

pub struct OrderService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Places an order. Unit prices are copied from the products as they are
    /// now; the order and every line are committed together or not at all.
    pub fn create_order(&self, input: OrderInput) -> Result<OrderView, DomainError> {
        let (customer_id, requested) = validate_order_header(&input)?;

        let customer = self.store.find_customer(customer_id)?.ok_or_else(|| {
            log::debug!("order rejected: customer {customer_id} not found");
            DomainError::not_found("Customer not found")
        })?;

        validate_quantities(requested)?;

        let wanted: BTreeSet<Uuid> = requested.iter().map(|line| line.product_id).collect();
        let wanted: Vec<Uuid> = wanted.into_iter().collect();
        let products: HashMap<Uuid, Product> = self
            .store
            .find_products(&wanted)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        if products.len() < wanted.len() {
            log::debug!(
                "order rejected: resolved {} of {} products",
                products.len(),
                wanted.len()
            );
            return Err(DomainError::not_found("One or more products not found"));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            created_at: now,
            updated_at: now,
        };

        let mut lines = Vec::with_capacity(requested.len());
        let mut views = Vec::with_capacity(requested.len());
        for (line_number, line) in (1..).zip(requested) {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| DomainError::not_found("One or more products not found"))?;
            let unit_price = product.price.clone();
            let total = &unit_price * &BigDecimal::from(line.quantity);
            let id = Uuid::new_v4();

            views.push(OrderLineView {
                id,
                product_id: product.id,
                product_title: product.title.clone(),
                quantity: line.quantity,
                unit_price: unit_price.clone(),
                total: total.clone(),
            });
            lines.push(OrderLine {
                id,
                order_id: order.id,
                product_id: product.id,
                line_number,
                quantity: line.quantity,
                unit_price,
                total,
            });
        }

        let view = OrderView {
            id: order.id,
            customer_id: customer.id,
            customer_name: customer.name,
            created_at: order.created_at,
            updated_at: order.updated_at,
            lines: views,
        };

        let mut work = UnitOfWork::new();
        work.register(Change::InsertOrder(NewOrder { order, lines }));
        self.store.commit(work)?;

        log::info!(
            "created order {} for customer {} ({} lines, total {})",
            view.id,
            view.customer_id,
            view.lines.len(),
            view.total_amount()
        );
        Ok(view)
    }

    pub fn get_order(&self, id: Uuid) -> Result<OrderView, DomainError> {
        self.store.find_order(id)?.ok_or_else(|| {
            log::debug!("order {id} not found");
            DomainError::not_found("Order not found")
        })
    }

    pub fn search_orders(&self, search: &OrderSearch) -> Result<Paged<OrderView>, DomainError> {
        validate_order_search(search)?;
        self.store.search_orders(&search.clauses(), search.page.clamp())
    }
}
