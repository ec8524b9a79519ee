pub mod customer_repo;
pub mod memory;
pub mod models;
pub mod order_repo;
pub mod product_repo;
pub mod report_repo;

#[cfg(test)]
pub(crate) mod test_support;

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::{DbConn, DbPool};
use crate::domain::errors::DomainError;
use crate::domain::ports::Store;
use crate::domain::unit_of_work::{Change, UnitOfWork};
use crate::schema::{customers, order_lines, orders, products};

use models::{CustomerRow, OrderLineRow, OrderRow, ProductRow};

pub(crate) const CUSTOMER_EMAIL_KEY: &str = "customers_email_key";
pub(crate) const PRODUCT_SLUG_KEY: &str = "products_slug_key";

/// Maps a unique-key violation to the conflict a caller would have seen had
/// the pre-commit uniqueness check caught it.
pub(crate) fn unique_violation(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some(CUSTOMER_EMAIL_KEY) => DomainError::conflict("Email already in use"),
        Some(PRODUCT_SLUG_KEY) => DomainError::conflict("Slug already in use"),
        _ => DomainError::conflict("Record already exists"),
    }
}

/// Foreign keys fail the same way in both directions: deleting a referenced
/// row and inserting a row that points at a missing one.
pub(crate) fn reference_violation() -> DomainError {
    DomainError::conflict("Change conflicts with related records")
}

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                unique_violation(info.constraint_name())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                reference_violation()
            }
            other => DomainError::Store(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Store(e.to_string())
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Postgres-backed store. Repository traits are implemented in the sibling
/// `*_repo` modules; this module owns the connection pool and the commit.
#[derive(Clone)]
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn conn(&self) -> Result<DbConn, DomainError> {
        Ok(self.pool.get()?)
    }
}

fn expect_one(affected: usize, missing: &str) -> Result<(), DomainError> {
    if affected == 0 {
        return Err(DomainError::not_found(missing));
    }
    Ok(())
}

fn apply(conn: &mut PgConnection, change: Change) -> Result<(), DomainError> {
    match change {
        Change::InsertCustomer(customer) => {
            diesel::insert_into(customers::table)
                .values(&CustomerRow::from(customer))
                .execute(conn)?;
        }
        Change::UpdateCustomer(customer) => {
            let row = CustomerRow::from(customer);
            let affected = diesel::update(customers::table.find(row.id))
                .set(&row)
                .execute(conn)?;
            expect_one(affected, "Customer not found")?;
        }
        Change::DeleteCustomer(id) => {
            let affected = diesel::delete(customers::table.find(id)).execute(conn)?;
            expect_one(affected, "Customer not found")?;
        }
        Change::InsertProduct(product) => {
            diesel::insert_into(products::table)
                .values(&ProductRow::from(product))
                .execute(conn)?;
        }
        Change::UpdateProduct(product) => {
            let row = ProductRow::from(product);
            let affected = diesel::update(products::table.find(row.id))
                .set(&row)
                .execute(conn)?;
            expect_one(affected, "Product not found")?;
        }
        Change::DeleteProduct(id) => {
            let affected = diesel::delete(products::table.find(id)).execute(conn)?;
            expect_one(affected, "Product not found")?;
        }
        Change::InsertOrder(new_order) => {
            diesel::insert_into(orders::table)
                .values(&OrderRow::from(new_order.order))
                .execute(conn)?;
            let lines: Vec<OrderLineRow> =
                new_order.lines.into_iter().map(OrderLineRow::from).collect();
            diesel::insert_into(order_lines::table)
                .values(&lines)
                .execute(conn)?;
        }
    }
    Ok(())
}

impl Store for DieselStore {
    fn commit(&self, work: UnitOfWork) -> Result<(), DomainError> {
        if work.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let count = work.len();
        conn.transaction::<_, DomainError, _>(|conn| {
            for change in work.into_changes() {
                apply(conn, change)?;
            }
            Ok(())
        })
        .inspect_err(|e| {
            if let DomainError::Store(detail) = e {
                log::error!("commit of {count} change(s) rolled back: {detail}");
            }
        })
    }
}

/// `%needle%` for ILIKE, with the needle's own wildcards escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
