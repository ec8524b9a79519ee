use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::filters::ProductClause;
use crate::domain::pagination::{Paged, Pagination};
use crate::domain::ports::ProductRepository;
use crate::domain::product::Product;
use crate::schema::products;

use super::models::ProductRow;
use super::{like_pattern, DieselStore};

type ProductPredicate = Box<dyn BoxableExpression<products::table, Pg, SqlType = Bool>>;

fn predicate(clause: &ProductClause) -> ProductPredicate {
    match clause {
        ProductClause::TitleContains(v) => Box::new(products::title.ilike(like_pattern(v))),
        ProductClause::DescriptionContains(v) => {
            Box::new(products::description.ilike(like_pattern(v)))
        }
        ProductClause::SlugContains(v) => Box::new(products::slug.ilike(like_pattern(v))),
        ProductClause::PriceAtLeast(min) => Box::new(products::price.ge(min.clone())),
        ProductClause::PriceAtMost(max) => Box::new(products::price.le(max.clone())),
    }
}

fn filtered<'a>(clauses: impl IntoIterator<Item = &'a ProductClause>) -> products::BoxedQuery<'static, Pg> {
    clauses
        .into_iter()
        .fold(products::table.into_boxed(), |query, clause| {
            query.filter(predicate(clause))
        })
}

/// Ids of the products matching a single clause.
pub(crate) fn matching_product_ids(
    conn: &mut PgConnection,
    clause: &ProductClause,
) -> QueryResult<Vec<Uuid>> {
    filtered([clause]).select(products::id).load(conn)
}

impl ProductRepository for DieselStore {
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.conn()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DomainError> {
        let mut conn = self.conn()?;
        let row = products::table
            .filter(products::slug.eq(slug))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.conn()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn search_products(
        &self,
        clauses: &[ProductClause],
        page: Pagination,
    ) -> Result<Paged<Product>, DomainError> {
        let mut conn = self.conn()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(clauses).count().get_result(conn)?;

            let rows = filtered(clauses)
                .select(ProductRow::as_select())
                .order((products::title.asc(), products::id.asc()))
                .limit(page.size())
                .offset(page.offset())
                .load(conn)?;

            Ok(Paged {
                items: rows.into_iter().map(Product::from).collect(),
                total,
                page,
            })
        })
    }
}
