use std::{
    collections::HashMap,
    convert::Infallible,
    fmt,
    str::FromStr,
};

use api_types::expense::ExpenseRecord;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    amount::{amount_of, sum},
    category::category_of,
    dates::{adjust_for_timezone, days_in_month, is_current_month, is_current_year, month_name},
};

/// Calendar month used as the grouping key of [`Aggregator::group_by_month`].
///
/// Ordering is chronological (year, then month).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = month_name(self.month).unwrap_or("Unknown");
        write!(f, "{name} {}", self.year)
    }
}

/// Expenses of one month, ready to be rendered as a collapsible section.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthGroup<'a> {
    /// `"<MonthName> <Year>"`
    pub month: String,
    pub key: MonthKey,
    pub expenses: Vec<&'a ExpenseRecord>,
    pub total: f64,
    pub is_open: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

/// Named period relative to the aggregator's "now".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Month,
    Year,
    All,
}

impl FromStr for Period {
    type Err = Infallible;

    /// Unknown names mean [`Period::All`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::All,
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        })
    }
}

/// Pure views over a list of expenses.
///
/// The aggregator only carries the display timezone and the instant used as
/// "now"; the same input always yields the same output. Expense rows are
/// never modified, results borrow from the input slice.
#[derive(Clone, Copy, Debug)]
pub struct Aggregator {
    tz: Tz,
    now: DateTime<Utc>,
}

impl Aggregator {
    pub fn new(tz: Tz) -> Self {
        Self::at(tz, Utc::now())
    }

    /// Aggregator with a fixed "now".
    pub fn at(tz: Tz, now: DateTime<Utc>) -> Self {
        Self { tz, now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.tz).date_naive()
    }

    /// Timezone-adjusted date-time of an expense. Rows with an unreadable
    /// date are treated as happening now.
    pub fn date_of(&self, expense: &ExpenseRecord) -> NaiveDateTime {
        adjust_for_timezone(&expense.expense_date, self.tz).unwrap_or_else(|| {
            tracing::debug!(date = %expense.expense_date, "unreadable expense date");
            self.now.with_timezone(&self.tz).naive_local()
        })
    }

    pub fn group_by_month<'a>(
        &self,
        expenses: &'a [ExpenseRecord],
    ) -> HashMap<MonthKey, Vec<&'a ExpenseRecord>> {
        let mut grouped: HashMap<MonthKey, Vec<&'a ExpenseRecord>> = HashMap::new();
        for expense in expenses {
            let date = self.date_of(expense);
            let key = MonthKey {
                year: date.year(),
                month: date.month(),
            };
            grouped.entry(key).or_default().push(expense);
        }
        grouped
    }

    /// Month groups, newest month first.
    pub fn to_month_groups<'a>(
        &self,
        grouped: HashMap<MonthKey, Vec<&'a ExpenseRecord>>,
    ) -> Vec<MonthGroup<'a>> {
        let mut groups: Vec<MonthGroup<'a>> = grouped
            .into_iter()
            .map(|(key, expenses)| MonthGroup {
                month: key.to_string(),
                key,
                total: sum(expenses.iter().copied()),
                expenses,
                is_open: true,
            })
            .collect();
        groups.sort_by(|a, b| b.key.cmp(&a.key));
        groups
    }

    /// One slot per day of `month` (1-12); empty for an invalid month.
    pub fn daily_totals(&self, expenses: &[ExpenseRecord], year: i32, month: u32) -> Vec<f64> {
        let mut totals = vec![0.0; days_in_month(year, month) as usize];
        for expense in expenses {
            let date = self.date_of(expense);
            if date.year() != year || date.month() != month {
                continue;
            }
            if let Some(slot) = totals.get_mut(date.day0() as usize) {
                *slot += amount_of(expense);
            }
        }
        totals
    }

    /// Largest categories first, at most `limit` entries. Equal totals keep
    /// the order in which their category was first seen.
    pub fn category_totals(&self, expenses: &[ExpenseRecord], limit: usize) -> Vec<CategoryTotal> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut totals: Vec<CategoryTotal> = Vec::new();

        for expense in expenses {
            let category = category_of(expense);
            let amount = amount_of(expense);
            match index.get(category.as_ref()) {
                Some(&i) => totals[i].amount += amount,
                None => {
                    index.insert(category.to_string(), totals.len());
                    totals.push(CategoryTotal {
                        category: category.into_owned(),
                        amount,
                    });
                }
            }
        }

        totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        totals.truncate(limit);
        totals
    }

    /// Expenses whose adjusted calendar date lies in `start..=end`. A missing
    /// bound disables the filter.
    pub fn filter_by_date_range<'a>(
        &self,
        expenses: &'a [ExpenseRecord],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<&'a ExpenseRecord> {
        let (Some(start), Some(end)) = (start, end) else {
            return expenses.iter().collect();
        };
        expenses
            .iter()
            .filter(|expense| (start..=end).contains(&self.date_of(expense).date()))
            .collect()
    }

    pub fn filter_by_period<'a>(
        &self,
        expenses: &'a [ExpenseRecord],
        period: Period,
    ) -> Vec<&'a ExpenseRecord> {
        let today = self.today();
        expenses
            .iter()
            .filter(|expense| {
                let date = self.date_of(expense).date();
                match period {
                    Period::Month => is_current_month(date, today),
                    Period::Year => is_current_year(date, today),
                    Period::All => true,
                }
            })
            .collect()
    }

    /// Highest amounts first.
    pub fn top_expenses<'a>(
        &self,
        expenses: &'a [ExpenseRecord],
        limit: usize,
    ) -> Vec<&'a ExpenseRecord> {
        let mut sorted: Vec<&ExpenseRecord> = expenses.iter().collect();
        sorted.sort_by(|a, b| amount_of(b).total_cmp(&amount_of(a)));
        sorted.truncate(limit);
        sorted
    }

    /// Newest first.
    pub fn recent_expenses<'a>(
        &self,
        expenses: &'a [ExpenseRecord],
        limit: usize,
    ) -> Vec<&'a ExpenseRecord> {
        let mut sorted: Vec<(NaiveDateTime, &ExpenseRecord)> = expenses
            .iter()
            .map(|expense| (self.date_of(expense), expense))
            .collect();
        sorted.sort_by(|a, b| b.0.cmp(&a.0));
        sorted.into_iter().take(limit).map(|(_, e)| e).collect()
    }

    pub fn total_for_period(&self, expenses: &[ExpenseRecord], period: Period) -> f64 {
        sum(self.filter_by_period(expenses, period))
    }
}
