//! Aggregations over active order records.
//!
//! Each aggregation is implemented as a struct that implements the
//! [Aggregation](crate::operation::Aggregation) trait. Money is accumulated as exact decimals
//! and only rounded when an entry is emitted, so rounding errors do not compound.

use rust_decimal::Decimal;

use crate::groups::Groups;
use crate::models::{CategoryEntry, Kpis, MonthlyEntry, RegionEntry, SizeEntry};
use crate::operation::Aggregation;
use crate::record::{Fulfilment, OrderRecord};
use crate::rounding::{average, percentage, round_money};

/// Running sums of a set of orders.
#[derive(Debug, Default)]
struct Totals {
    revenue: Decimal,
    quantity: i64,
    orders: u64,
}

impl Totals {
    fn add(&mut self, amount: Decimal, quantity: i64) {
        self.revenue = self.revenue.saturating_add(amount);
        self.quantity = self.quantity.saturating_add(quantity);
        self.orders += 1;
    }

    fn add_record(&mut self, record: &OrderRecord) {
        self.add(record.amount(), record.quantity())
    }

    /// Average order value; 0 for no orders.
    fn average(&self) -> Decimal {
        average(self.revenue, self.orders)
    }
}

/// Group records by a text key, returning the groups sorted by revenue, highest first.
///
/// The sort is stable, so groups with equal revenue keep the order in which they were first
/// seen.
fn group_by_revenue<'a, F>(records: &[&'a OrderRecord], key: F) -> Vec<(String, Totals)>
where
    F: Fn(&'a OrderRecord) -> std::borrow::Cow<'a, str>,
{
    let mut groups = Groups::<Totals>::new();
    for record in records.iter().copied() {
        groups.get_or_default(&key(record)).add_record(record);
    }
    groups.into_sorted_by(|a, b| b.1.revenue.cmp(&a.1.revenue))
}

/// Return headline KPIs over all active records.
pub struct Kpi {}

impl Aggregation for Kpi {
    type Output = Kpis;

    fn execute(records: &[&OrderRecord]) -> Kpis {
        let mut totals = Totals::default();
        let mut b2b_revenue = Decimal::ZERO;
        let mut b2c_revenue = Decimal::ZERO;
        let mut amazon_fulfilled_orders = 0;
        let mut merchant_fulfilled_orders = 0;
        for record in records {
            let amount = record.amount();
            totals.add(amount, record.quantity());
            if record.is_b2b() {
                b2b_revenue = b2b_revenue.saturating_add(amount);
            } else {
                b2c_revenue = b2c_revenue.saturating_add(amount);
            }
            match record.fulfilment() {
                Fulfilment::Amazon => amazon_fulfilled_orders += 1,
                Fulfilment::Merchant => merchant_fulfilled_orders += 1,
                Fulfilment::Other => (),
            }
        }
        Kpis {
            total_revenue: round_money(totals.revenue),
            total_orders: totals.orders,
            average_order_value: round_money(totals.average()),
            total_quantity_sold: totals.quantity,
            b2b_revenue: round_money(b2b_revenue),
            b2c_revenue: round_money(b2c_revenue),
            b2b_percentage: round_money(percentage(b2b_revenue, totals.revenue)),
            amazon_fulfilled_orders,
            merchant_fulfilled_orders,
        }
    }
}

/// Return revenue and order count per shipping state, highest revenue first.
///
/// All states are returned; limiting the list is up to the caller.
pub struct Regional {}

impl Aggregation for Regional {
    type Output = Vec<RegionEntry>;

    fn execute(records: &[&OrderRecord]) -> Vec<RegionEntry> {
        group_by_revenue(records, OrderRecord::ship_state)
            .into_iter()
            .map(|(state, totals)| RegionEntry {
                state,
                revenue: round_money(totals.revenue),
                order_count: totals.orders,
            })
            .collect()
    }
}

/// Return revenue, quantity, order count and average order value per product category, highest
/// revenue first.
pub struct Category {}

impl Aggregation for Category {
    type Output = Vec<CategoryEntry>;

    fn execute(records: &[&OrderRecord]) -> Vec<CategoryEntry> {
        group_by_revenue(records, OrderRecord::category)
            .into_iter()
            .map(|(category, totals)| CategoryEntry {
                category,
                revenue: round_money(totals.revenue),
                quantity_sold: totals.quantity,
                order_count: totals.orders,
                avg_order_value: round_money(totals.average()),
            })
            .collect()
    }
}

/// Return revenue, quantity and order count per product size, highest revenue first.
pub struct Size {}

impl Aggregation for Size {
    type Output = Vec<SizeEntry>;

    fn execute(records: &[&OrderRecord]) -> Vec<SizeEntry> {
        group_by_revenue(records, OrderRecord::size)
            .into_iter()
            .map(|(size, totals)| SizeEntry {
                size,
                revenue: round_money(totals.revenue),
                quantity_sold: totals.quantity,
                order_count: totals.orders,
            })
            .collect()
    }
}

/// Return revenue, order count and average order value per month, in chronological order.
pub struct Monthly {}

/// Running sums of one month.
struct MonthTotals {
    /// Label of the first record seen in the month.
    month_name: String,
    totals: Totals,
}

impl Aggregation for Monthly {
    type Output = Vec<MonthlyEntry>;

    fn execute(records: &[&OrderRecord]) -> Vec<MonthlyEntry> {
        let mut groups = Groups::<MonthTotals>::new();
        for record in records.iter().copied() {
            groups
                .get_or_insert_with(&record.year_month(), || MonthTotals {
                    month_name: record.month_name().into_owned(),
                    totals: Totals::default(),
                })
                .totals
                .add_record(record);
        }
        // Keys are zero-padded YYYY-MM, so byte-wise order is chronological.
        groups
            .into_sorted_by(|a, b| a.0.cmp(&b.0))
            .into_iter()
            .map(|(year_month, month)| MonthlyEntry {
                year_month,
                month_name: month.month_name,
                revenue: round_money(month.totals.revenue),
                order_count: month.totals.orders,
                avg_order_value: round_money(month.totals.average()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::filter_active;
    use crate::test_utils::{order, sample_records};

    fn active(records: &[OrderRecord]) -> Vec<&OrderRecord> {
        filter_active(records)
    }

    /// Whether a value has at most two decimal places.
    fn is_rounded(value: f64) -> bool {
        let scaled = value * 100.0;
        (scaled - scaled.round()).abs() < 1e-6
    }

    #[test]
    fn kpi_worked_example() {
        let records = vec![
            order(&[("Amount", "100"), ("Status", "Active"), ("ship-state", "A")]),
            order(&[("Amount", "50"), ("Status", "Cancelled"), ("ship-state", "A")]),
            order(&[("Amount", "200"), ("Status", "Active"), ("ship-state", "B")]),
        ];
        let kpis = Kpi::execute(&active(&records));
        assert_eq!(300.0, kpis.total_revenue);
        assert_eq!(2, kpis.total_orders);
        assert_eq!(150.0, kpis.average_order_value);
    }

    #[test]
    fn kpi_b2b_split() {
        let records = vec![
            order(&[("B2B", "True"), ("Amount", "100")]),
            order(&[("B2B", "False"), ("Amount", "50")]),
        ];
        let kpis = Kpi::execute(&active(&records));
        assert_eq!(100.0, kpis.b2b_revenue);
        assert_eq!(50.0, kpis.b2c_revenue);
        assert_eq!(66.67, kpis.b2b_percentage);
    }

    #[test]
    fn kpi_fulfilment_and_quantity() {
        let records = vec![
            order(&[("fulfilled-by", "Amazon"), ("Qty", "2")]),
            order(&[("fulfilled-by", "Merchant"), ("Qty", "1")]),
            order(&[("fulfilled-by", "Easy Ship"), ("Qty", "x")]),
            order(&[("fulfilled-by", "Amazon")]),
        ];
        let kpis = Kpi::execute(&active(&records));
        assert_eq!(2, kpis.amazon_fulfilled_orders);
        assert_eq!(1, kpis.merchant_fulfilled_orders);
        assert_eq!(3, kpis.total_quantity_sold);
        assert_eq!(4, kpis.total_orders);
    }

    #[test]
    fn kpi_empty_input() {
        let kpis = Kpi::execute(&[]);
        assert_eq!(Kpis::default(), kpis);
        assert_eq!(0.0, kpis.average_order_value);
        assert_eq!(0.0, kpis.b2b_percentage);
    }

    #[test]
    fn kpi_zero_revenue() {
        let records = vec![order(&[("B2B", "True"), ("Amount", "0")])];
        let kpis = Kpi::execute(&active(&records));
        assert_eq!(1, kpis.total_orders);
        assert_eq!(0.0, kpis.b2b_percentage);
        assert_eq!(0.0, kpis.average_order_value);
    }

    #[test]
    fn kpi_accumulates_exactly() {
        let records: Vec<_> = (0..10).map(|_| order(&[("Amount", "0.1")])).collect();
        let kpis = Kpi::execute(&active(&records));
        assert_eq!(1.0, kpis.total_revenue);
        assert_eq!(0.1, kpis.average_order_value);
    }

    #[test]
    fn regional_worked_example() {
        let records = vec![
            order(&[("Amount", "100"), ("Status", "Active"), ("ship-state", "A")]),
            order(&[("Amount", "50"), ("Status", "Cancelled"), ("ship-state", "A")]),
            order(&[("Amount", "200"), ("Status", "Active"), ("ship-state", "B")]),
        ];
        let regions = Regional::execute(&active(&records));
        assert_eq!(
            vec![
                RegionEntry {
                    state: "B".to_string(),
                    revenue: 200.0,
                    order_count: 1
                },
                RegionEntry {
                    state: "A".to_string(),
                    revenue: 100.0,
                    order_count: 1
                },
            ],
            regions
        );
    }

    #[test]
    fn regional_ties_keep_first_seen_order() {
        let records = vec![
            order(&[("Amount", "10"), ("ship-state", "KERALA")]),
            order(&[("Amount", "10"), ("ship-state", "GOA")]),
            order(&[("Amount", "30"), ("ship-state", "PUNJAB")]),
            order(&[("Amount", "10"), ("ship-state", "ASSAM")]),
        ];
        let states: Vec<_> = Regional::execute(&active(&records))
            .into_iter()
            .map(|entry| entry.state)
            .collect();
        assert_eq!(vec!["PUNJAB", "KERALA", "GOA", "ASSAM"], states);
    }

    #[test]
    fn regional_missing_state_is_unknown() {
        let records = vec![
            order(&[("Amount", "5")]),
            order(&[("Amount", "7"), ("ship-state", "")]),
        ];
        let regions = Regional::execute(&active(&records));
        assert_eq!(1, regions.len());
        assert_eq!("Unknown", regions[0].state);
        assert_eq!(12.0, regions[0].revenue);
        assert_eq!(2, regions[0].order_count);
    }

    #[test]
    fn regional_revenue_sums_to_total() {
        let records = sample_records();
        let active = active(&records);
        let total: f64 = Regional::execute(&active).iter().map(|r| r.revenue).sum();
        let kpis = Kpi::execute(&active);
        assert!((total - kpis.total_revenue).abs() < 0.01 * active.len() as f64);
    }

    #[test]
    fn category_order_counts_sum_to_total() {
        let records = sample_records();
        let active = active(&records);
        let categories = Category::execute(&active);
        let count: u64 = categories.iter().map(|c| c.order_count).sum();
        assert_eq!(Kpi::execute(&active).total_orders, count);
        assert!(categories
            .windows(2)
            .all(|pair| pair[0].revenue >= pair[1].revenue));
    }

    #[test]
    fn category_entries() {
        let records = vec![
            order(&[("Category", "Set"), ("Amount", "100"), ("Qty", "1")]),
            order(&[("Category", "kurta"), ("Amount", "40"), ("Qty", "2")]),
            order(&[("Category", "Set"), ("Amount", "50.5"), ("Qty", "3")]),
            order(&[("Category", "Set"), ("Amount", "x"), ("Qty", "1")]),
        ];
        let categories = Category::execute(&active(&records));
        assert_eq!(
            vec![
                CategoryEntry {
                    category: "Set".to_string(),
                    revenue: 150.5,
                    quantity_sold: 5,
                    order_count: 3,
                    avg_order_value: 50.17,
                },
                CategoryEntry {
                    category: "kurta".to_string(),
                    revenue: 40.0,
                    quantity_sold: 2,
                    order_count: 1,
                    avg_order_value: 40.0,
                },
            ],
            categories
        );
    }

    #[test]
    fn size_entries() {
        let records = vec![
            order(&[("Size", "M"), ("Amount", "10"), ("Qty", "1")]),
            order(&[("Size", "XL"), ("Amount", "25"), ("Qty", "1")]),
            order(&[("Size", "M"), ("Amount", "20"), ("Qty", "2")]),
        ];
        let sizes = Size::execute(&active(&records));
        assert_eq!(2, sizes.len());
        assert_eq!("M", sizes[0].size);
        assert_eq!(30.0, sizes[0].revenue);
        assert_eq!(3, sizes[0].quantity_sold);
        assert_eq!("XL", sizes[1].size);
    }

    #[test]
    fn monthly_ordered_chronologically() {
        let records = vec![
            order(&[("Year", "2022"), ("Month", "12"), ("MonthName", "December")]),
            order(&[("Year", "2022"), ("Month", "4"), ("MonthName", "April")]),
            order(&[("Year", "2022"), ("Month", "4"), ("MonthName", "Apr")]),
        ];
        let months = Monthly::execute(&active(&records));
        let keys: Vec<_> = months.iter().map(|m| m.year_month.as_str()).collect();
        assert_eq!(vec!["2022-04", "2022-12"], keys);
        assert_eq!("April", months[0].month_name);
        assert_eq!(2, months[0].order_count);
    }

    #[test]
    fn monthly_defaults_and_averages() {
        let records = vec![
            order(&[("Amount", "10")]),
            order(&[("Amount", "20"), ("Month", "1")]),
            order(&[("Amount", "5"), ("Year", "2021"), ("Month", "3")]),
        ];
        let months = Monthly::execute(&active(&records));
        assert_eq!(
            vec![
                MonthlyEntry {
                    year_month: "2021-03".to_string(),
                    month_name: "Unknown".to_string(),
                    revenue: 5.0,
                    order_count: 1,
                    avg_order_value: 5.0,
                },
                MonthlyEntry {
                    year_month: "2022-01".to_string(),
                    month_name: "Unknown".to_string(),
                    revenue: 30.0,
                    order_count: 2,
                    avg_order_value: 15.0,
                },
            ],
            months
        );
    }

    #[test]
    fn monetary_fields_are_rounded() {
        let records = vec![
            order(&[("Amount", "10.005"), ("Category", "A"), ("ship-state", "X")]),
            order(&[("Amount", "3.333"), ("Category", "A"), ("ship-state", "Y")]),
            order(&[("Amount", "1.1111"), ("Category", "B"), ("B2B", "True")]),
        ];
        let active = active(&records);
        let kpis = Kpi::execute(&active);
        for value in [
            kpis.total_revenue,
            kpis.average_order_value,
            kpis.b2b_revenue,
            kpis.b2c_revenue,
            kpis.b2b_percentage,
        ] {
            assert!(is_rounded(value), "{value}");
        }
        for entry in Regional::execute(&active) {
            assert!(is_rounded(entry.revenue));
        }
        for entry in Category::execute(&active) {
            assert!(is_rounded(entry.revenue));
            assert!(is_rounded(entry.avg_order_value));
        }
        for entry in Monthly::execute(&active) {
            assert!(is_rounded(entry.revenue));
            assert!(is_rounded(entry.avg_order_value));
        }
    }
}
