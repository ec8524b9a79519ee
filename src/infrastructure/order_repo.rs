use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::filters::{CustomerClause, OrderClause};
use crate::domain::order::{OrderLineView, OrderView};
use crate::domain::pagination::{Paged, Pagination};
use crate::domain::ports::OrderRepository;
use crate::schema::{customers, order_lines, orders, products};

use super::customer_repo::matching_customer_ids;
use super::models::{OrderLineRow, OrderRow};
use super::product_repo::matching_product_ids;
use super::DieselStore;

/// An order clause once its customer and product parts have been resolved
/// to id sets, leaving only predicates on the `orders` table itself.
#[derive(Debug, Clone)]
enum OrderFilter {
    Id(Uuid),
    IdIn(Vec<Uuid>),
    CustomerIn(Vec<Uuid>),
    CreatedFrom(DateTime<Utc>),
    CreatedUntil(DateTime<Utc>),
    UpdatedFrom(DateTime<Utc>),
    UpdatedUntil(DateTime<Utc>),
}

type OrderPredicate = Box<dyn BoxableExpression<orders::table, Pg, SqlType = Bool>>;

impl OrderFilter {
    fn predicate(&self) -> OrderPredicate {
        match self {
            OrderFilter::Id(id) => Box::new(orders::id.eq(*id)),
            OrderFilter::IdIn(ids) => Box::new(orders::id.eq_any(ids.clone())),
            OrderFilter::CustomerIn(ids) => Box::new(orders::customer_id.eq_any(ids.clone())),
            OrderFilter::CreatedFrom(at) => Box::new(orders::created_at.ge(*at)),
            OrderFilter::CreatedUntil(at) => Box::new(orders::created_at.le(*at)),
            OrderFilter::UpdatedFrom(at) => Box::new(orders::updated_at.ge(*at)),
            OrderFilter::UpdatedUntil(at) => Box::new(orders::updated_at.le(*at)),
        }
    }
}

fn resolve(conn: &mut PgConnection, clauses: &[OrderClause]) -> QueryResult<Vec<OrderFilter>> {
    let customer: Vec<CustomerClause> = clauses
        .iter()
        .filter_map(|clause| match clause {
            OrderClause::Customer(inner) => Some(inner.clone()),
            _ => None,
        })
        .collect();

    let mut filters = Vec::with_capacity(clauses.len());
    if let Some(ids) = matching_customer_ids(conn, &customer)? {
        filters.push(OrderFilter::CustomerIn(ids));
    }

    for clause in clauses {
        let filter = match clause {
            OrderClause::IdIs(id) => OrderFilter::Id(*id),
            OrderClause::Customer(_) => continue,
            OrderClause::AnyProduct(inner) => {
                let product_ids = matching_product_ids(conn, inner)?;
                let order_ids = order_lines::table
                    .filter(order_lines::product_id.eq_any(&product_ids))
                    .select(order_lines::order_id)
                    .distinct()
                    .load(conn)?;
                OrderFilter::IdIn(order_ids)
            }
            OrderClause::CreatedFrom(at) => OrderFilter::CreatedFrom(*at),
            OrderClause::CreatedUntil(at) => OrderFilter::CreatedUntil(*at),
            OrderClause::UpdatedFrom(at) => OrderFilter::UpdatedFrom(*at),
            OrderClause::UpdatedUntil(at) => OrderFilter::UpdatedUntil(*at),
        };
        filters.push(filter);
    }
    Ok(filters)
}

fn filtered(filters: &[OrderFilter]) -> orders::BoxedQuery<'static, Pg> {
    filters
        .iter()
        .fold(orders::table.into_boxed(), |query, filter| {
            query.filter(filter.predicate())
        })
}

/// Attach customer names and lines (ordered by line number) to order rows,
/// preserving the order of `rows`.
fn load_views(conn: &mut PgConnection, rows: Vec<OrderRow>) -> QueryResult<Vec<OrderView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<Uuid> = rows.iter().map(|o| o.id).collect();
    let customer_ids: Vec<Uuid> = rows.iter().map(|o| o.customer_id).collect();

    let names: HashMap<Uuid, String> = customers::table
        .filter(customers::id.eq_any(&customer_ids))
        .select((customers::id, customers::name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let line_rows: Vec<(OrderLineRow, String)> = order_lines::table
        .inner_join(products::table)
        .filter(order_lines::order_id.eq_any(&order_ids))
        .select((OrderLineRow::as_select(), products::title))
        .order((order_lines::order_id.asc(), order_lines::line_number.asc()))
        .load(conn)?;

    let mut lines: HashMap<Uuid, Vec<OrderLineView>> = HashMap::new();
    for (line, product_title) in line_rows {
        lines.entry(line.order_id).or_default().push(OrderLineView {
            id: line.id,
            product_id: line.product_id,
            product_title,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total: line.total,
        });
    }

    Ok(rows
        .into_iter()
        .map(|o| OrderView {
            id: o.id,
            customer_id: o.customer_id,
            customer_name: names.get(&o.customer_id).cloned().unwrap_or_default(),
            created_at: o.created_at,
            updated_at: o.updated_at,
            lines: lines.remove(&o.id).unwrap_or_default(),
        })
        .collect())
}

impl OrderRepository for DieselStore {
    fn find_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.conn()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        Ok(load_views(&mut conn, vec![order])?.pop())
    }

    fn search_orders(
        &self,
        clauses: &[OrderClause],
        page: Pagination,
    ) -> Result<Paged<OrderView>, DomainError> {
        let mut conn = self.conn()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let filters = resolve(conn, clauses)?;
            let total: i64 = filtered(&filters).count().get_result(conn)?;

            let rows = filtered(&filters)
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.asc()))
                .limit(page.size())
                .offset(page.offset())
                .load(conn)?;

            Ok(Paged {
                items: load_views(conn, rows)?,
                total,
                page,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, NaiveDate, Utc};
    use uuid::Uuid;

    use crate::domain::customer::Customer;
    use crate::domain::errors::DomainError;
    use crate::domain::filters::{CustomerClause, OrderClause, ProductClause};
    use crate::domain::order::{NewOrder, Order, OrderLine};
    use crate::domain::pagination::{PageRequest, Pagination};
    use crate::domain::ports::{OrderRepository, Store};
    use crate::domain::product::Product;
    use crate::domain::unit_of_work::{Change, UnitOfWork};
    use crate::infrastructure::test_support::setup_store;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn customer(name: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555-0100".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    fn product(title: &str, price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: title.to_string(),
            slug: title.to_lowercase(),
            price: dec(price),
        }
    }

    fn new_order(customer: &Customer, items: &[(&Product, i32)], age_days: i64) -> NewOrder {
        let at = Utc::now() - Duration::days(age_days);
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            created_at: at,
            updated_at: at,
        };
        let lines = (1..)
            .zip(items)
            .map(|(line_number, (product, quantity))| OrderLine {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: product.id,
                line_number,
                quantity: *quantity,
                unit_price: product.price.clone(),
                total: &product.price * &BigDecimal::from(*quantity),
            })
            .collect();
        NewOrder { order, lines }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn order_and_lines_roundtrip_in_line_order() {
        let (_container, store) = setup_store().await;
        let ada = customer("Ada");
        let mug = product("Mug", "9.99");
        let pot = product("Teapot", "30.00");
        let order = new_order(&ada, &[(&pot, 1), (&mug, 3)], 0);
        let order_id = order.order.id;

        let mut work = UnitOfWork::new();
        work.register(Change::InsertCustomer(ada))
            .register(Change::InsertProduct(mug))
            .register(Change::InsertProduct(pot))
            .register(Change::InsertOrder(order));
        store.commit(work).expect("commit failed");

        let view = store
            .find_order(order_id)
            .expect("find failed")
            .expect("order should exist");
        assert_eq!(view.customer_name, "Ada");
        let titles: Vec<_> = view.lines.iter().map(|l| l.product_title.as_str()).collect();
        assert_eq!(titles, vec!["Teapot", "Mug"]);
        assert_eq!(view.total_amount(), dec("59.97"));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn failed_commit_leaves_nothing_behind() {
        let (_container, store) = setup_store().await;
        let ada = customer("Ada");
        let ghost = product("Ghost", "1.00");
        let order = new_order(&ada, &[(&ghost, 1)], 0);

        let mut work = UnitOfWork::new();
        work.register(Change::InsertCustomer(ada.clone()))
            .register(Change::InsertOrder(order));
        let err = store.commit(work).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let page = store
            .search_orders(&[], Pagination::default())
            .expect("search failed");
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn search_filters_by_customer_product_and_dates() {
        let (_container, store) = setup_store().await;
        let ada = customer("Ada");
        let bob = customer("Bob");
        let mug = product("Mug", "9.99");
        let pot = product("Teapot", "30.00");
        let recent = new_order(&ada, &[(&mug, 1), (&pot, 1)], 1);
        let old = new_order(&ada, &[(&mug, 1)], 30);
        let bobs = new_order(&bob, &[(&pot, 2)], 2);
        let (recent_id, bobs_id) = (recent.order.id, bobs.order.id);

        let mut work = UnitOfWork::new();
        work.register(Change::InsertCustomer(ada))
            .register(Change::InsertCustomer(bob))
            .register(Change::InsertProduct(mug))
            .register(Change::InsertProduct(pot))
            .register(Change::InsertOrder(recent))
            .register(Change::InsertOrder(old))
            .register(Change::InsertOrder(bobs));
        store.commit(work).expect("commit failed");

        let all = store
            .search_orders(&[], Pagination::default())
            .expect("search failed");
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].id, recent_id, "newest first");

        let teapots = store
            .search_orders(
                &[OrderClause::AnyProduct(ProductClause::TitleContains(
                    "teapot".to_string(),
                ))],
                Pagination::default(),
            )
            .expect("search failed");
        assert_eq!(teapots.total, 2);

        let adas_teapots = store
            .search_orders(
                &[
                    OrderClause::Customer(CustomerClause::NameContains("ada".to_string())),
                    OrderClause::AnyProduct(ProductClause::PriceAtLeast(dec("20"))),
                ],
                Pagination::default(),
            )
            .expect("search failed");
        assert_eq!(adas_teapots.total, 1);
        assert_eq!(adas_teapots.items[0].id, recent_id);

        let last_week = store
            .search_orders(
                &[OrderClause::CreatedFrom(Utc::now() - Duration::days(7))],
                PageRequest::new(Some(2), Some(1)).clamp(),
            )
            .expect("search failed");
        assert_eq!(last_week.total, 2);
        assert_eq!(last_week.items.len(), 1);
        assert_eq!(last_week.items[0].id, bobs_id);
    }
}
