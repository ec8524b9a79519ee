use std::sync::Arc;

use crate::application::validation::{validate_best_customers, validate_revenue};
use crate::domain::errors::DomainError;
use crate::domain::pagination::{Paged, Pagination};
use crate::domain::ports::Store;
use crate::domain::report::{
    best_customers, revenue_by_period, BestCustomerRow, BestCustomersRequest, OrderTotalsFilter,
    RevenuePeriodRow, RevenueRequest,
};

pub struct ReportService<S: ?Sized> {
    store: Arc<S>,
}

fn page_of<T>(rows: Vec<T>, page: Pagination) -> Paged<T> {
    let total = i64::try_from(rows.len()).unwrap_or(i64::MAX);
    Paged {
        items: page.slice(rows),
        total,
        page,
    }
}

impl<S: Store + ?Sized> ReportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn best_customers(
        &self,
        request: &BestCustomersRequest,
    ) -> Result<Paged<BestCustomerRow>, DomainError> {
        validate_best_customers(request)?;
        let totals = self.store.order_totals(&request.filter())?;
        let rows = best_customers(totals, &request.criteria());
        Ok(page_of(rows, request.page.clamp()))
    }

    pub fn revenue_by_period(
        &self,
        request: &RevenueRequest,
    ) -> Result<Paged<RevenuePeriodRow>, DomainError> {
        let window = validate_revenue(request)?;
        let filter = OrderTotalsFilter {
            customer: Vec::new(),
            window,
        };
        let totals = self.store.order_totals(&filter)?;
        let rows = revenue_by_period(totals, &request.criteria());
        Ok(page_of(rows, request.page.clamp()))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::customer::Customer;
    use crate::domain::order::{NewOrder, Order, OrderLine};
    use crate::domain::pagination::PageRequest;
    use crate::domain::product::Product;
    use crate::domain::unit_of_work::{Change, UnitOfWork};
    use crate::infrastructure::memory::InMemoryStore;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn customer(name: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555-0100".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 3).unwrap(),
        }
    }

    fn order(customer: &Customer, product: &Product, at: DateTime<Utc>, qty: i32) -> Change {
        let id = Uuid::new_v4();
        Change::InsertOrder(NewOrder {
            order: Order {
                id,
                customer_id: customer.id,
                created_at: at,
                updated_at: at,
            },
            lines: vec![OrderLine {
                id: Uuid::new_v4(),
                order_id: id,
                product_id: product.id,
                line_number: 1,
                quantity: qty,
                unit_price: product.price.clone(),
                total: &product.price * &BigDecimal::from(qty),
            }],
        })
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    /// Ada: two orders in January (10 + 20). Bob: one order in March (50).
    fn seeded() -> ReportService<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let ada = customer("Ada");
        let bob = customer("Bob");
        let widget = Product {
            id: Uuid::new_v4(),
            title: "Widget".to_string(),
            description: "A widget".to_string(),
            slug: "widget".to_string(),
            price: dec("10.00"),
        };

        let mut work = UnitOfWork::new();
        work.register(Change::InsertCustomer(ada.clone()))
            .register(Change::InsertCustomer(bob.clone()))
            .register(Change::InsertProduct(widget.clone()))
            .register(order(&ada, &widget, at(2024, 1, 5), 1))
            .register(order(&ada, &widget, at(2024, 1, 20), 2))
            .register(order(&bob, &widget, at(2024, 3, 1), 5));
        store.commit(work).unwrap();
        ReportService::new(store)
    }

    #[test]
    fn best_customers_default_to_spent_descending() {
        let svc = seeded();
        let page = svc
            .best_customers(&BestCustomersRequest::default())
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].customer_name, "Bob");
        assert_eq!(page.items[0].spent_amount, dec("50.00"));
        assert_eq!(page.items[1].total_orders, 2);
        assert_eq!(page.items[1].spent_amount, dec("30.00"));
    }

    #[test]
    fn best_customers_post_filter_counts_groups() {
        let svc = seeded();
        let request = BestCustomersRequest {
            min_orders: Some(2),
            ..Default::default()
        };
        let page = svc.best_customers(&request).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].customer_name, "Ada");
    }

    #[test]
    fn best_customers_name_filter_applies_before_grouping() {
        let svc = seeded();
        let request = BestCustomersRequest {
            customer_name: Some("bo".to_string()),
            ..Default::default()
        };
        let page = svc.best_customers(&request).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].total_orders, 1);
    }

    #[test]
    fn revenue_groups_by_month_in_chronological_order() {
        let svc = seeded();
        let page = svc.revenue_by_period(&RevenueRequest::default()).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!((page.items[0].year, page.items[0].month), (2024, 1));
        assert_eq!(page.items[0].month_name(), "January");
        assert_eq!(page.items[0].total_revenue, dec("30.00"));
        assert_eq!(page.items[1].month_name(), "March");
    }

    #[test]
    fn revenue_window_includes_whole_end_month() {
        let svc = seeded();
        let request = RevenueRequest {
            start_period: Some("2024-02".to_string()),
            end_period: Some("2024-03".to_string()),
            ..Default::default()
        };
        let page = svc.revenue_by_period(&request).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].total_orders, 1);
    }

    #[test]
    fn revenue_rejects_malformed_period() {
        let svc = seeded();
        let request = RevenueRequest {
            start_period: Some("2024-13".to_string()),
            ..Default::default()
        };
        let err = svc.revenue_by_period(&request).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid period format. Use YYYY-MM for startPeriod/endPeriod."
        );
    }

    #[test]
    fn report_pages_are_sliced_after_sorting() {
        let svc = seeded();
        let request = RevenueRequest {
            order_direction: Some("desc".to_string()),
            page: PageRequest::new(Some(2), Some(1)),
            ..Default::default()
        };
        let page = svc.revenue_by_period(&request).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].month, 1);
    }
}
