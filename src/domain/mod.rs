pub mod customer;
pub mod errors;
pub mod filters;
pub mod order;
pub mod pagination;
pub mod ports;
pub mod product;
pub mod report;
pub mod unit_of_work;
