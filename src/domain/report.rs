//! Best-customer and revenue-by-period aggregation.
//!
//! The store hands over one [`OrderTotal`] per order that survived the
//! pre-aggregation filters. Grouping, the min/max post-filters and sorting
//! all happen here, over the materialised groups; paging is the caller's
//! last step.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, Month, TimeZone, Utc};
use uuid::Uuid;

use super::filters::{ClauseBuilder, CustomerClause};
use super::pagination::PageRequest;

/// A calendar month, written `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub const MIN_YEAR: i32 = 1900;
    pub const MAX_YEAR: i32 = 9999;

    pub fn new(year: i32, month: u32) -> Option<Self> {
        let valid = (Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) && (1..=12).contains(&month);
        valid.then_some(Self { year, month })
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        if month.contains('-') {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First instant of the month, UTC.
    pub fn start(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// First instant of the following month, UTC.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// `created_at` window for revenue reports. `from` is inclusive, `before`
/// exclusive, so an end period covers its month up to the last instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodWindow {
    pub from: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl PeriodWindow {
    pub fn between(start: Option<Period>, end: Option<Period>) -> Self {
        Self {
            from: start.map(|p| p.start()),
            before: end.map(|p| p.end_exclusive()),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.before.map_or(true, |before| at < before)
    }
}

/// Source rows for both reports are selected with these filters.
#[derive(Debug, Clone, Default)]
pub struct OrderTotalsFilter {
    pub customer: Vec<CustomerClause>,
    pub window: PeriodWindow,
}

/// One order reduced to what the reports need.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotal {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Unknown or missing directions fall back to `default`.
    pub fn parse(raw: Option<&str>, default: SortDirection) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => default,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestCustomersSort {
    TotalOrders,
    SpentAmount,
}

impl BestCustomersSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("totalorders" | "orders") => BestCustomersSort::TotalOrders,
            _ => BestCustomersSort::SpentAmount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenueSort {
    TotalOrders,
    TotalRevenue,
    Chronological,
}

impl RevenueSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("totalorders" | "orders") => RevenueSort::TotalOrders,
            Some("totalrevenue" | "revenue") => RevenueSort::TotalRevenue,
            _ => RevenueSort::Chronological,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BestCustomersCriteria {
    pub min_orders: Option<i64>,
    pub max_orders: Option<i64>,
    pub min_spent: Option<BigDecimal>,
    pub max_spent: Option<BigDecimal>,
    pub sort: BestCustomersSort,
    pub direction: SortDirection,
}

impl Default for BestCustomersCriteria {
    fn default() -> Self {
        Self {
            min_orders: None,
            max_orders: None,
            min_spent: None,
            max_spent: None,
            sort: BestCustomersSort::SpentAmount,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevenueCriteria {
    pub min_orders: Option<i64>,
    pub max_orders: Option<i64>,
    pub min_revenue: Option<BigDecimal>,
    pub max_revenue: Option<BigDecimal>,
    pub sort: RevenueSort,
    pub direction: SortDirection,
}

impl Default for RevenueCriteria {
    fn default() -> Self {
        Self {
            min_orders: None,
            max_orders: None,
            min_revenue: None,
            max_revenue: None,
            sort: RevenueSort::Chronological,
            direction: SortDirection::Asc,
        }
    }
}

/// Best-customers request as received, before validation.
#[derive(Debug, Clone, Default)]
pub struct BestCustomersRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub min_orders: Option<i64>,
    pub max_orders: Option<i64>,
    pub min_spent: Option<BigDecimal>,
    pub max_spent: Option<BigDecimal>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub page: PageRequest,
}

impl BestCustomersRequest {
    pub fn filter(&self) -> OrderTotalsFilter {
        OrderTotalsFilter {
            customer: ClauseBuilder::new()
                .contains(self.customer_name.as_deref(), CustomerClause::NameContains)
                .contains(self.customer_email.as_deref(), CustomerClause::EmailContains)
                .build(),
            window: PeriodWindow::default(),
        }
    }

    pub fn criteria(&self) -> BestCustomersCriteria {
        BestCustomersCriteria {
            min_orders: self.min_orders,
            max_orders: self.max_orders,
            min_spent: self.min_spent.clone(),
            max_spent: self.max_spent.clone(),
            sort: BestCustomersSort::parse(self.order_by.as_deref()),
            direction: SortDirection::parse(self.order_direction.as_deref(), SortDirection::Desc),
        }
    }
}

/// Revenue-by-period request as received. Periods stay raw strings until
/// validation parses them.
#[derive(Debug, Clone, Default)]
pub struct RevenueRequest {
    pub start_period: Option<String>,
    pub end_period: Option<String>,
    pub min_orders: Option<i64>,
    pub max_orders: Option<i64>,
    pub min_revenue: Option<BigDecimal>,
    pub max_revenue: Option<BigDecimal>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub page: PageRequest,
}

impl RevenueRequest {
    pub fn criteria(&self) -> RevenueCriteria {
        RevenueCriteria {
            min_orders: self.min_orders,
            max_orders: self.max_orders,
            min_revenue: self.min_revenue.clone(),
            max_revenue: self.max_revenue.clone(),
            sort: RevenueSort::parse(self.order_by.as_deref()),
            direction: SortDirection::parse(self.order_direction.as_deref(), SortDirection::Asc),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestCustomerRow {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub total_orders: i64,
    pub spent_amount: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenuePeriodRow {
    pub year: i32,
    pub month: u32,
    pub total_orders: i64,
    pub total_revenue: BigDecimal,
}

impl RevenuePeriodRow {
    /// English month name, independent of any locale.
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map_or("", |m| m.name())
    }
}

fn within<T: PartialOrd>(value: &T, min: Option<&T>, max: Option<&T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

pub fn best_customers(
    totals: Vec<OrderTotal>,
    criteria: &BestCustomersCriteria,
) -> Vec<BestCustomerRow> {
    let mut groups: BTreeMap<Uuid, BestCustomerRow> = BTreeMap::new();
    for total in totals {
        let row = groups
            .entry(total.customer_id)
            .or_insert_with(|| BestCustomerRow {
                customer_id: total.customer_id,
                customer_name: total.customer_name.clone(),
                customer_email: total.customer_email.clone(),
                total_orders: 0,
                spent_amount: BigDecimal::from(0),
            });
        row.total_orders += 1;
        row.spent_amount += total.total;
    }

    let mut rows: Vec<BestCustomerRow> = groups
        .into_values()
        .filter(|row| {
            within(
                &row.total_orders,
                criteria.min_orders.as_ref(),
                criteria.max_orders.as_ref(),
            ) && within(
                &row.spent_amount,
                criteria.min_spent.as_ref(),
                criteria.max_spent.as_ref(),
            )
        })
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match criteria.sort {
            BestCustomersSort::TotalOrders => a.total_orders.cmp(&b.total_orders),
            BestCustomersSort::SpentAmount => a.spent_amount.cmp(&b.spent_amount),
        };
        criteria.direction.apply(ordering)
    });
    rows
}

pub fn revenue_by_period(
    totals: Vec<OrderTotal>,
    criteria: &RevenueCriteria,
) -> Vec<RevenuePeriodRow> {
    let mut groups: BTreeMap<(i32, u32), RevenuePeriodRow> = BTreeMap::new();
    for total in totals {
        let key = (total.created_at.year(), total.created_at.month());
        let row = groups.entry(key).or_insert_with(|| RevenuePeriodRow {
            year: key.0,
            month: key.1,
            total_orders: 0,
            total_revenue: BigDecimal::from(0),
        });
        row.total_orders += 1;
        row.total_revenue += total.total;
    }

    let mut rows: Vec<RevenuePeriodRow> = groups
        .into_values()
        .filter(|row| {
            within(
                &row.total_orders,
                criteria.min_orders.as_ref(),
                criteria.max_orders.as_ref(),
            ) && within(
                &row.total_revenue,
                criteria.min_revenue.as_ref(),
                criteria.max_revenue.as_ref(),
            )
        })
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match criteria.sort {
            RevenueSort::TotalOrders => a.total_orders.cmp(&b.total_orders),
            RevenueSort::TotalRevenue => a.total_revenue.cmp(&b.total_revenue),
            RevenueSort::Chronological => (a.year, a.month).cmp(&(b.year, b.month)),
        };
        criteria.direction.apply(ordering)
    });
    rows
}
