use std::sync::Arc;

use uuid::Uuid;

use crate::application::validation::{validate_product, validate_product_search};
use crate::domain::errors::DomainError;
use crate::domain::filters::ProductSearch;
use crate::domain::pagination::Paged;
use crate::domain::ports::Store;
use crate::domain::product::{Product, ProductInput};
use crate::domain::unit_of_work::Change;

pub struct ProductService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> ProductService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_product(&self, input: ProductInput) -> Result<Product, DomainError> {
        validate_product(&input)?;
        self.ensure_slug_free(&input.slug, None)?;

        let product = Product {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            slug: input.slug,
            price: input.price,
        };
        self.store
            .commit(Change::InsertProduct(product.clone()).into())?;
        log::info!("created product {} ({})", product.id, product.slug);
        Ok(product)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.store.find_product(id)?.ok_or_else(|| {
            log::debug!("product {id} not found");
            DomainError::not_found("Product not found")
        })
    }

    /// Existing order lines keep the price they were placed at.
    pub fn update_product(&self, id: Uuid, input: ProductInput) -> Result<Product, DomainError> {
        validate_product(&input)?;
        let existing = self.get_product(id)?;
        self.ensure_slug_free(&input.slug, Some(existing.id))?;

        let product = Product {
            id: existing.id,
            title: input.title,
            description: input.description,
            slug: input.slug,
            price: input.price,
        };
        self.store
            .commit(Change::UpdateProduct(product.clone()).into())?;
        log::info!("updated product {id}");
        Ok(product)
    }

    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        let existing = self.get_product(id)?;
        self.store.commit(Change::DeleteProduct(existing.id).into())?;
        log::info!("deleted product {id}");
        Ok(())
    }

    pub fn search_products(&self, search: &ProductSearch) -> Result<Paged<Product>, DomainError> {
        validate_product_search(search)?;
        self.store
            .search_products(&search.clauses(), search.page.clamp())
    }

    fn ensure_slug_free(&self, slug: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        match self.store.find_product_by_slug(slug)? {
            Some(other) if Some(other.id) != owner => {
                Err(DomainError::conflict("Slug already in use"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::infrastructure::memory::InMemoryStore;

    fn service() -> ProductService<InMemoryStore> {
        ProductService::new(Arc::new(InMemoryStore::new()))
    }

    fn input(title: &str, slug: &str, price: &str) -> ProductInput {
        ProductInput {
            title: title.to_string(),
            description: format!("{title} description"),
            slug: slug.to_string(),
            price: BigDecimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn create_assigns_id_and_keeps_fields() {
        let svc = service();
        let created = svc.create_product(input("Mug", "mug", "9.99")).unwrap();
        let fetched = svc.get_product(created.id).unwrap();
        assert_eq!(fetched.slug, "mug");
        assert_eq!(fetched.price, BigDecimal::from_str("9.99").unwrap());
    }

    #[test]
    fn zero_price_is_rejected() {
        let svc = service();
        let err = svc.create_product(input("Mug", "mug", "0")).unwrap_err();
        assert_eq!(err.to_string(), "Price must be greater than zero");
    }

    #[test]
    fn duplicate_slug_is_a_conflict() {
        let svc = service();
        svc.create_product(input("Mug", "mug", "9.99")).unwrap();
        let err = svc.create_product(input("Cup", "mug", "4.00")).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == "Slug already in use"));
    }

    #[test]
    fn update_unknown_product_is_not_found() {
        let svc = service();
        let err = svc
            .update_product(Uuid::new_v4(), input("Mug", "mug", "9.99"))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(ref m) if m == "Product not found"));
    }

    #[test]
    fn search_rejects_inverted_price_range() {
        let svc = service();
        let search = ProductSearch {
            min_price: Some(BigDecimal::from(10)),
            max_price: Some(BigDecimal::from(5)),
            ..Default::default()
        };
        let err = svc.search_products(&search).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn search_orders_by_title() {
        let svc = service();
        svc.create_product(input("Teapot", "teapot", "30")).unwrap();
        svc.create_product(input("Kettle", "kettle", "25")).unwrap();
        svc.create_product(input("Mug", "mug", "9.99")).unwrap();

        let search = ProductSearch {
            min_price: Some(BigDecimal::from(10)),
            ..Default::default()
        };
        let page = svc.search_products(&search).unwrap();
        let titles: Vec<_> = page.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Kettle", "Teapot"]);
        assert_eq!(page.total, 2);
    }
}
