use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use uuid::Uuid;

use crate::domain::customer::Customer;
use crate::domain::errors::DomainError;
use crate::domain::filters::CustomerClause;
use crate::domain::pagination::{Paged, Pagination};
use crate::domain::ports::CustomerRepository;
use crate::schema::customers;

use super::models::CustomerRow;
use super::{like_pattern, DieselStore};

type CustomerPredicate = Box<dyn BoxableExpression<customers::table, Pg, SqlType = Bool>>;

fn predicate(clause: &CustomerClause) -> CustomerPredicate {
    match clause {
        CustomerClause::NameContains(v) => Box::new(customers::name.ilike(like_pattern(v))),
        CustomerClause::EmailContains(v) => Box::new(customers::email.ilike(like_pattern(v))),
        CustomerClause::PhoneContains(v) => Box::new(customers::phone.ilike(like_pattern(v))),
    }
}

fn filtered(clauses: &[CustomerClause]) -> customers::BoxedQuery<'static, Pg> {
    clauses
        .iter()
        .fold(customers::table.into_boxed(), |query, clause| {
            query.filter(predicate(clause))
        })
}

/// Ids of the customers matching every clause, or `None` when there is
/// nothing to filter on.
pub(crate) fn matching_customer_ids(
    conn: &mut PgConnection,
    clauses: &[CustomerClause],
) -> QueryResult<Option<Vec<Uuid>>> {
    if clauses.is_empty() {
        return Ok(None);
    }
    filtered(clauses)
        .select(customers::id)
        .load(conn)
        .map(Some)
}

impl CustomerRepository for DieselStore {
    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.conn()?;
        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.conn()?;
        let row = customers::table
            .filter(customers::email.eq(email))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn search_customers(
        &self,
        clauses: &[CustomerClause],
        page: Pagination,
    ) -> Result<Paged<Customer>, DomainError> {
        let mut conn = self.conn()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(clauses).count().get_result(conn)?;

            let rows = filtered(clauses)
                .select(CustomerRow::as_select())
                .order((customers::name.asc(), customers::id.asc()))
                .limit(page.size())
                .offset(page.offset())
                .load(conn)?;

            Ok(Paged {
                items: rows.into_iter().map(Customer::from).collect(),
                total,
                page,
            })
        })
    }
}
