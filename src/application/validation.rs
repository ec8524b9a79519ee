//! Request validation, applied before any store access.
//!
//! Field rules fail fast on the first violation. Query rules echo the
//! offending values back so the caller can see what was rejected.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::domain::customer::CustomerInput;
use crate::domain::errors::{DomainError, Rejection};
use crate::domain::filters::{CustomerSearch, OrderSearch, ProductSearch};
use crate::domain::order::{OrderInput, OrderLineInput};
use crate::domain::pagination::{PageRequest, MAX_PAGE_SIZE};
use crate::domain::product::ProductInput;
use crate::domain::report::{BestCustomersRequest, Period, PeriodWindow, RevenueRequest};

pub type ValidationResult<T> = Result<T, DomainError>;

fn require(value: &str, field: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Returns the validated birth date.
pub fn validate_customer(input: &CustomerInput, today: NaiveDate) -> ValidationResult<NaiveDate> {
    require(&input.name, "Name")?;
    require(&input.email, "Email")?;
    require(&input.phone, "Phone")?;
    let birth_date = input
        .birth_date
        .ok_or_else(|| DomainError::validation("BirthDate is required"))?;
    if birth_date > today {
        return Err(DomainError::validation("BirthDate cannot be in the future"));
    }
    if !input.email.validate_email() {
        return Err(DomainError::validation("Email is invalid"));
    }
    Ok(birth_date)
}

pub fn validate_product(input: &ProductInput) -> ValidationResult<()> {
    require(&input.title, "Title")?;
    require(&input.description, "Description")?;
    require(&input.slug, "Slug")?;
    if input.price <= BigDecimal::from(0) {
        return Err(DomainError::validation("Price must be greater than zero"));
    }
    Ok(())
}

/// Header checks that precede the customer lookup.
pub fn validate_order_header(input: &OrderInput) -> ValidationResult<(Uuid, &[OrderLineInput])> {
    let customer_id = input
        .customer_id
        .filter(|id| !id.is_nil())
        .ok_or_else(|| DomainError::validation("CustomerId is required"))?;
    let lines = input
        .lines
        .as_deref()
        .filter(|lines| !lines.is_empty())
        .ok_or_else(|| DomainError::validation("Order must have at least one line"))?;
    Ok((customer_id, lines))
}

pub fn validate_quantities(lines: &[OrderLineInput]) -> ValidationResult<()> {
    if lines.iter().any(|line| line.quantity <= 0) {
        return Err(DomainError::validation(
            "Quantity must be greater than zero",
        ));
    }
    Ok(())
}

fn page_number_invalid(page: &PageRequest) -> bool {
    page.number.is_some_and(|n| n < 1)
}

fn page_size_invalid(page: &PageRequest) -> bool {
    page.size.is_some_and(|s| !(1..=MAX_PAGE_SIZE).contains(&s))
}

/// Paging rules for entity searches: each bad field is named on its own.
pub fn validate_search_page(page: &PageRequest) -> ValidationResult<()> {
    let number = page_number_invalid(page);
    let size = page_size_invalid(page);
    let message = match (number, size) {
        (false, false) => return Ok(()),
        (true, false) => "Invalid pagination: PageNumber must be >= 1.",
        (false, true) => "Invalid pagination: PageSize must be between 1 and 100.",
        (true, true) => {
            "Invalid pagination: PageNumber must be >= 1 and PageSize must be between 1 and 100."
        }
    };
    let mut rejection = Rejection::new(message);
    if number {
        rejection = rejection.with("pageNumber", json!(page.number));
    }
    if size {
        rejection = rejection.with("pageSize", json!(page.size));
    }
    Err(DomainError::Validation(rejection))
}

/// Paging rules for reports: absent values default, bad values echo both.
pub fn validate_report_page(page: &PageRequest) -> ValidationResult<()> {
    if page_number_invalid(page) || page_size_invalid(page) {
        let rejection = Rejection::new(
            "Invalid pagination parameters. PageNumber must be >= 1 and PageSize must be between 1 and 100.",
        )
        .with("pageNumber", json!(page.number.unwrap_or(1)))
        .with("pageSize", json!(page.size.unwrap_or(10)));
        return Err(DomainError::Validation(rejection));
    }
    Ok(())
}

fn inverted<T: PartialOrd>(low: &Option<T>, high: &Option<T>) -> bool {
    matches!((low, high), (Some(low), Some(high)) if low > high)
}

fn echo<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn bounds<T: Serialize>(keys: (&str, &str), low: &Option<T>, high: &Option<T>) -> Value {
    let mut map = Map::new();
    map.insert(keys.0.to_string(), echo(low));
    map.insert(keys.1.to_string(), echo(high));
    Value::Object(map)
}

/// Collects every inverted range of a request into one rejection.
struct RangeCheck {
    rejection: Rejection,
    failed: bool,
}

impl RangeCheck {
    fn new(message: &str) -> Self {
        Self {
            rejection: Rejection::new(message),
            failed: false,
        }
    }

    fn check<T: PartialOrd + Serialize>(
        mut self,
        field: &str,
        keys: (&str, &str),
        low: &Option<T>,
        high: &Option<T>,
    ) -> Self {
        if inverted(low, high) {
            self.rejection = self.rejection.with(field, bounds(keys, low, high));
            self.failed = true;
        }
        self
    }

    fn finish(self) -> ValidationResult<()> {
        if self.failed {
            return Err(DomainError::Validation(self.rejection));
        }
        Ok(())
    }
}

pub fn validate_customer_search(search: &CustomerSearch) -> ValidationResult<()> {
    validate_search_page(&search.page)
}

pub fn validate_product_search(search: &ProductSearch) -> ValidationResult<()> {
    if inverted(&search.min_price, &search.max_price) {
        let rejection =
            Rejection::new("Invalid price range: MinPrice cannot be greater than MaxPrice.")
                .with("minPrice", echo(&search.min_price))
                .with("maxPrice", echo(&search.max_price));
        return Err(DomainError::Validation(rejection));
    }
    validate_search_page(&search.page)
}

pub fn validate_order_search(search: &OrderSearch) -> ValidationResult<()> {
    const START_END: (&str, &str) = ("start", "end");
    RangeCheck::new("Invalid range filter(s). Ensure that Start is less than or equal to End.")
        .check(
            "productPrice",
            START_END,
            &search.product_price_start,
            &search.product_price_end,
        )
        .check(
            "createdAt",
            START_END,
            &search.created_at_start,
            &search.created_at_end,
        )
        .check(
            "updatedAt",
            START_END,
            &search.updated_at_start,
            &search.updated_at_end,
        )
        .finish()?;
    validate_search_page(&search.page)
}

pub fn validate_best_customers(request: &BestCustomersRequest) -> ValidationResult<()> {
    const MIN_MAX: (&str, &str) = ("min", "max");
    validate_report_page(&request.page)?;
    RangeCheck::new("Invalid range filter(s). Ensure that Min is less than or equal to Max.")
        .check("orders", MIN_MAX, &request.min_orders, &request.max_orders)
        .check("spent", MIN_MAX, &request.min_spent, &request.max_spent)
        .finish()
}

fn parse_period(raw: &Option<String>) -> Result<Option<Period>, ()> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Period::parse(value).map(Some).ok_or(()),
    }
}

/// Returns the parsed `created_at` window on success.
pub fn validate_revenue(request: &RevenueRequest) -> ValidationResult<PeriodWindow> {
    validate_report_page(&request.page)?;

    let (start, end) = match (
        parse_period(&request.start_period),
        parse_period(&request.end_period),
    ) {
        (Ok(start), Ok(end)) => (start, end),
        _ => {
            let rejection =
                Rejection::new("Invalid period format. Use YYYY-MM for startPeriod/endPeriod.")
                    .with("startPeriod", echo(&request.start_period))
                    .with("endPeriod", echo(&request.end_period));
            return Err(DomainError::Validation(rejection));
        }
    };

    const MIN_MAX: (&str, &str) = ("min", "max");
    let mut check = RangeCheck::new(
        "Invalid range filter(s). Ensure that Min/Start is less than or equal to Max/End.",
    );
    if inverted(&start, &end) {
        check.rejection = check.rejection.with(
            "period",
            bounds(("start", "end"), &request.start_period, &request.end_period),
        );
        check.failed = true;
    }
    check
        .check("orders", MIN_MAX, &request.min_orders, &request.max_orders)
        .check("revenue", MIN_MAX, &request.min_revenue, &request.max_revenue)
        .finish()?;

    Ok(PeriodWindow::between(start, end))
}
