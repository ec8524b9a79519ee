use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ReportRepository;
use crate::domain::report::{OrderTotal, OrderTotalsFilter};
use crate::schema::{customers, order_lines, orders};

use super::customer_repo::matching_customer_ids;
use super::DieselStore;

type TotalSource = (Uuid, Uuid, String, String, DateTime<Utc>, BigDecimal);

impl ReportRepository for DieselStore {
    /// One row per order line, folded into per-order totals here; grouping
    /// by customer or month happens in the domain.
    fn order_totals(&self, filter: &OrderTotalsFilter) -> Result<Vec<OrderTotal>, DomainError> {
        let mut conn = self.conn()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let customer_ids = matching_customer_ids(conn, &filter.customer)?;

            let mut query = order_lines::table
                .inner_join(orders::table.inner_join(customers::table))
                .select((
                    orders::id,
                    orders::customer_id,
                    customers::name,
                    customers::email,
                    orders::created_at,
                    order_lines::total,
                ))
                .into_boxed();
            if let Some(ids) = customer_ids {
                query = query.filter(orders::customer_id.eq_any(ids));
            }
            if let Some(from) = filter.window.from {
                query = query.filter(orders::created_at.ge(from));
            }
            if let Some(before) = filter.window.before {
                query = query.filter(orders::created_at.lt(before));
            }

            let rows: Vec<TotalSource> = query.load(conn)?;

            let mut totals: BTreeMap<Uuid, OrderTotal> = BTreeMap::new();
            for (order_id, customer_id, customer_name, customer_email, created_at, line_total) in
                rows
            {
                totals
                    .entry(order_id)
                    .or_insert_with(|| OrderTotal {
                        order_id,
                        customer_id,
                        customer_name,
                        customer_email,
                        created_at,
                        total: BigDecimal::from(0),
                    })
                    .total += line_total;
            }
            Ok(totals.into_values().collect())
        })
    }
}
