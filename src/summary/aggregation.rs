//! Expense aggregation for the summary endpoints.
//!
//! Groups expenses by merchant or by calendar bucket and computes whole-set
//! statistics. Everything here is pure and works on slices already loaded
//! from the database.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    expense::Expense,
    summary::Timeframe,
    time_range::TimeRange,
    timezone::LocalTimezone,
};

/// The number of expenses and total spent at one merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantSummary {
    /// The merchant name, exactly as recorded.
    pub merchant: String,
    /// How many expenses were made at the merchant.
    pub count: usize,
    /// The sum of the expense amounts.
    pub total_amount: f64,
}

/// The number of expenses and total spent in one calendar bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeCount {
    /// The bucket label, see [Timeframe::bucket_label].
    pub time_period: String,
    /// How many expenses fall in the bucket.
    pub count: usize,
    /// The sum of the expense amounts.
    pub total_amount: f64,
}

/// Headline statistics over all of a user's expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// The expense with the largest amount.
    pub largest_expense: Option<Expense>,
    /// The mean of the daily totals over the days that have expenses.
    pub average_daily_expense: f64,
    /// The merchant with the highest total spend.
    pub top_merchant: Option<String>,
}

/// Group expenses by merchant, largest total first.
///
/// Merchants are compared exactly, so "Cafe" and "cafe" are different
/// merchants. Amounts are summed as raw numbers regardless of currency.
/// The order of merchants with equal totals is unspecified.
pub fn group_by_merchant(expenses: &[Expense]) -> Vec<MerchantSummary> {
    let mut summaries: Vec<MerchantSummary> = Vec::new();
    let mut index_by_merchant: HashMap<&str, usize> = HashMap::new();

    for expense in expenses {
        let index = *index_by_merchant
            .entry(expense.merchant.as_str())
            .or_insert_with(|| {
                summaries.push(MerchantSummary {
                    merchant: expense.merchant.clone(),
                    count: 0,
                    total_amount: 0.0,
                });
                summaries.len() - 1
            });

        let summary = &mut summaries[index];
        summary.count += 1;
        summary.total_amount += expense.amount;
    }

    summaries.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));
    summaries
}

/// Count and total the expenses in `range` per calendar bucket.
///
/// Buckets are keyed by the local date of each expense in `timezone` and are
/// returned in chronological order. Expenses outside `range` are ignored.
pub fn group_by_timeframe(
    expenses: &[Expense],
    timeframe: Timeframe,
    range: TimeRange,
    timezone: LocalTimezone,
) -> Vec<TimeframeCount> {
    let mut buckets: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for expense in expenses
        .iter()
        .filter(|expense| range.contains(expense.created_at))
    {
        let label = timeframe.bucket_label(timezone.local_date(expense.created_at));
        let (count, total) = buckets.entry(label).or_insert((0, 0.0));
        *count += 1;
        *total += expense.amount;
    }

    buckets
        .into_iter()
        .map(|(time_period, (count, total_amount))| TimeframeCount {
            time_period,
            count,
            total_amount,
        })
        .collect()
}

/// Compute the largest expense, average daily spend and top merchant.
///
/// The average is taken over daily totals, so several expenses on the same
/// day count as one data point. Ties for the largest expense go to the
/// earliest in `expenses`; ties for the top merchant go to the merchant seen
/// first.
///
/// # Errors
/// Returns [Error::NoExpenses] if `expenses` is empty.
pub fn summarize(expenses: &[Expense], timezone: LocalTimezone) -> Result<UserSummary, Error> {
    let Some(first) = expenses.first() else {
        return Err(Error::NoExpenses);
    };

    let largest_expense = expenses.iter().skip(1).fold(first, |largest, expense| {
        if expense.amount > largest.amount {
            expense
        } else {
            largest
        }
    });

    let daily_totals = group_by_day(expenses, timezone);
    let average_daily_expense = daily_totals.values().sum::<f64>() / daily_totals.len() as f64;

    let top_merchant = group_by_merchant_in_first_seen_order(expenses)
        .into_iter()
        .fold(None::<(&str, f64)>, |top, (merchant, total)| match top {
            Some((_, top_total)) if total <= top_total => top,
            _ => Some((merchant, total)),
        })
        .map(|(merchant, _)| merchant.to_owned());

    Ok(UserSummary {
        largest_expense: Some(largest_expense.clone()),
        average_daily_expense,
        top_merchant,
    })
}

fn group_by_day(expenses: &[Expense], timezone: LocalTimezone) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    for expense in expenses {
        let day = Timeframe::Day.bucket_label(timezone.local_date(expense.created_at));
        *totals.entry(day).or_insert(0.0) += expense.amount;
    }

    totals
}

fn group_by_merchant_in_first_seen_order(expenses: &[Expense]) -> Vec<(&str, f64)> {
    let mut totals: Vec<(&str, f64)> = Vec::new();
    let mut index_by_merchant: HashMap<&str, usize> = HashMap::new();

    for expense in expenses {
        match index_by_merchant.get(expense.merchant.as_str()) {
            Some(&index) => totals[index].1 += expense.amount,
            None => {
                index_by_merchant.insert(expense.merchant.as_str(), totals.len());
                totals.push((expense.merchant.as_str(), expense.amount));
            }
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        expense::Expense,
        summary::{
            Timeframe,
            aggregation::{
                MerchantSummary, TimeframeCount, group_by_merchant, group_by_timeframe,
                summarize,
            },
        },
        time_range::TimeRange,
        timezone::LocalTimezone,
    };

    fn create_test_expense(amount: f64, merchant: &str, created_at: OffsetDateTime) -> Expense {
        Expense {
            external_id: format!("{merchant}-{amount}-{}", created_at.unix_timestamp()),
            user_id: "user".to_owned(),
            amount,
            currency: "INR".to_owned(),
            merchant: merchant.to_owned(),
            created_at,
        }
    }

    /// Three expenses at midday IST over two days.
    fn example_expenses() -> Vec<Expense> {
        vec![
            create_test_expense(10.0, "A", datetime!(2024-01-01 06:30 UTC)),
            create_test_expense(30.0, "B", datetime!(2024-01-01 06:30 UTC)),
            create_test_expense(5.0, "A", datetime!(2024-01-02 06:30 UTC)),
        ]
    }

    fn all_of_2024() -> TimeRange {
        TimeRange {
            start: datetime!(2024-01-01 00:00 +05:30),
            end: datetime!(2025-01-01 00:00 +05:30),
        }
    }

    #[test]
    fn groups_by_merchant_largest_total_first() {
        let got = group_by_merchant(&example_expenses());

        assert_eq!(
            got,
            vec![
                MerchantSummary {
                    merchant: "B".to_owned(),
                    count: 1,
                    total_amount: 30.0,
                },
                MerchantSummary {
                    merchant: "A".to_owned(),
                    count: 2,
                    total_amount: 15.0,
                },
            ]
        );
    }

    #[test]
    fn merchant_totals_add_up_to_the_total_spent() {
        let expenses = vec![
            create_test_expense(1.25, "Cafe", datetime!(2024-03-01 00:00 UTC)),
            create_test_expense(2.5, "cafe", datetime!(2024-03-02 00:00 UTC)),
            create_test_expense(4.0, "Cafe ", datetime!(2024-03-03 00:00 UTC)),
            create_test_expense(8.0, "Cafe", datetime!(2024-03-04 00:00 UTC)),
        ];

        let got = group_by_merchant(&expenses);

        assert_eq!(got.len(), 3, "merchants should not be normalised");
        assert_eq!(got.iter().map(|s| s.count).sum::<usize>(), expenses.len());
        assert_eq!(
            got.iter().map(|s| s.total_amount).sum::<f64>(),
            expenses.iter().map(|e| e.amount).sum::<f64>()
        );
    }

    #[test]
    fn group_by_merchant_handles_empty_input() {
        assert!(group_by_merchant(&[]).is_empty());
    }

    #[test]
    fn groups_by_day() {
        let got = group_by_timeframe(
            &example_expenses(),
            Timeframe::Day,
            all_of_2024(),
            LocalTimezone::default(),
        );

        assert_eq!(
            got,
            vec![
                TimeframeCount {
                    time_period: "2024-01-01".to_owned(),
                    count: 2,
                    total_amount: 40.0,
                },
                TimeframeCount {
                    time_period: "2024-01-02".to_owned(),
                    count: 1,
                    total_amount: 5.0,
                },
            ]
        );
    }

    #[test]
    fn groups_by_week_month_and_year() {
        let expenses = vec![
            create_test_expense(1.0, "A", datetime!(2024-01-31 06:00 UTC)),
            create_test_expense(2.0, "A", datetime!(2024-02-01 06:00 UTC)),
            create_test_expense(4.0, "A", datetime!(2024-02-20 06:00 UTC)),
        ];
        let range = all_of_2024();
        let timezone = LocalTimezone::default();

        let weeks = group_by_timeframe(&expenses, Timeframe::Week, range, timezone);
        let months = group_by_timeframe(&expenses, Timeframe::Month, range, timezone);
        let years = group_by_timeframe(&expenses, Timeframe::Year, range, timezone);

        let labels = |counts: &[TimeframeCount]| {
            counts
                .iter()
                .map(|count| (count.time_period.clone(), count.count))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            labels(&weeks),
            vec![("2024-W05".to_owned(), 2), ("2024-W08".to_owned(), 1)]
        );
        assert_eq!(
            labels(&months),
            vec![("2024-01".to_owned(), 1), ("2024-02".to_owned(), 2)]
        );
        assert_eq!(labels(&years), vec![("2024".to_owned(), 3)]);
    }

    #[test]
    fn buckets_use_local_date() {
        let expenses = vec![create_test_expense(
            7.0,
            "A",
            datetime!(2024-01-01 20:00 UTC),
        )];

        let got = group_by_timeframe(
            &expenses,
            Timeframe::Day,
            all_of_2024(),
            LocalTimezone::default(),
        );

        assert_eq!(got[0].time_period, "2024-01-02");
    }

    #[test]
    fn ignores_expenses_outside_range() {
        let range = TimeRange {
            start: datetime!(2024-01-01 06:30 UTC),
            end: datetime!(2024-01-02 06:30 UTC),
        };

        let got = group_by_timeframe(
            &example_expenses(),
            Timeframe::Year,
            range,
            LocalTimezone::default(),
        );

        assert_eq!(
            got,
            vec![TimeframeCount {
                time_period: "2024".to_owned(),
                count: 2,
                total_amount: 40.0,
            }]
        );
    }

    #[test]
    fn summarizes_expenses() {
        let got = summarize(&example_expenses(), LocalTimezone::default()).unwrap();

        assert_eq!(got.largest_expense.map(|expense| expense.amount), Some(30.0));
        assert_eq!(got.average_daily_expense, 22.5);
        assert_eq!(got.top_merchant, Some("B".to_owned()));
    }

    #[test]
    fn largest_expense_tie_goes_to_first() {
        let expenses = vec![
            create_test_expense(3.0, "A", datetime!(2024-01-01 06:00 UTC)),
            create_test_expense(9.0, "B", datetime!(2024-01-02 06:00 UTC)),
            create_test_expense(9.0, "C", datetime!(2024-01-03 06:00 UTC)),
        ];

        let got = summarize(&expenses, LocalTimezone::default()).unwrap();

        assert_eq!(got.largest_expense.unwrap().merchant, "B");
    }

    #[test]
    fn top_merchant_tie_goes_to_first_seen() {
        let expenses = vec![
            create_test_expense(5.0, "A", datetime!(2024-01-01 06:00 UTC)),
            create_test_expense(10.0, "B", datetime!(2024-01-02 06:00 UTC)),
            create_test_expense(5.0, "A", datetime!(2024-01-03 06:00 UTC)),
        ];

        let got = summarize(&expenses, LocalTimezone::default()).unwrap();

        assert_eq!(got.top_merchant, Some("A".to_owned()));
    }

    #[test]
    fn summarize_fails_on_empty_input() {
        assert_eq!(
            summarize(&[], LocalTimezone::default()),
            Err(Error::NoExpenses)
        );
    }
}
