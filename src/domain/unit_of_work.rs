use uuid::Uuid;

use super::customer::Customer;
use super::order::NewOrder;
use super::product::Product;

#[derive(Debug, Clone)]
pub enum Change {
    InsertCustomer(Customer),
    UpdateCustomer(Customer),
    DeleteCustomer(Uuid),
    InsertProduct(Product),
    UpdateProduct(Product),
    DeleteProduct(Uuid),
    InsertOrder(NewOrder),
}

/// Writes buffered for one request. Nothing reaches the store until the
/// whole batch is handed to `Store::commit`, which applies it atomically.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    changes: Vec<Change>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

impl From<Change> for UnitOfWork {
    fn from(change: Change) -> Self {
        Self {
            changes: vec![change],
        }
    }
}
