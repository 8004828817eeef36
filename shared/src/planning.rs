//! Roll-ups shown on an event's dashboard: task progress, spending against
//! the event budget, and collection sizes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Event, Expense, Guest, GuestKind, Task, TaskStatus};

/// Rounds to whole cents
fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub done: usize,
    pub total: usize,
    /// Whole percent of tasks done; 0 with no tasks
    pub percent: u32,
}

impl TaskProgress {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let done = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
        let percent = if total == 0 {
            0
        } else {
            (done as f64 * 100.0 / total as f64).round() as u32
        };
        Self {
            done,
            total,
            percent,
        }
    }
}

/// Spending of an event checked against its budget
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_spent: f64,
    pub by_category: BTreeMap<String, f64>,
    /// Keyed by expense date
    pub by_day: BTreeMap<String, f64>,
    pub budget: Option<f64>,
    /// Budget minus spending; negative once over budget
    pub remaining: Option<f64>,
    /// Share of the budget used, capped at 100
    pub spent_percent: Option<u32>,
    pub over_budget: bool,
}

impl BudgetSummary {
    /// A missing or non-positive budget means the event has none
    pub fn of(expenses: &[Expense], budget: Option<f64>) -> Self {
        let mut total = 0.0;
        let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
        let mut by_day: BTreeMap<String, f64> = BTreeMap::new();
        for e in expenses {
            total += e.value;
            *by_category.entry(e.category.clone()).or_default() += e.value;
            *by_day.entry(e.date.clone()).or_default() += e.value;
        }
        let total_spent = cents(total);
        by_category.values_mut().for_each(|v| *v = cents(*v));
        by_day.values_mut().for_each(|v| *v = cents(*v));

        let budget = budget.filter(|b| b.is_finite() && *b > 0.0);
        Self {
            total_spent,
            by_category,
            by_day,
            budget,
            remaining: budget.map(|b| cents(b - total_spent)),
            spent_percent: budget.map(|b| (total_spent / b * 100.0).min(100.0).round() as u32),
            over_budget: budget.is_some_and(|b| total_spent > b),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuestCount {
    pub total: usize,
    pub adults: usize,
    pub children: usize,
}

impl GuestCount {
    pub fn of(guests: &[Guest]) -> Self {
        let children = guests.iter().filter(|g| g.kind == GuestKind::Child).count();
        Self {
            total: guests.len(),
            adults: guests.len() - children,
            children,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub guests: GuestCount,
    pub tasks: TaskProgress,
    pub expenses: BudgetSummary,
    pub inspirations: usize,
}

impl EventSummary {
    pub fn new(
        event: &Event,
        guests: &[Guest],
        tasks: &[Task],
        expenses: &[Expense],
        inspirations: usize,
    ) -> Self {
        Self {
            guests: GuestCount::of(guests),
            tasks: TaskProgress::of(tasks),
            expenses: BudgetSummary::of(expenses, event.budget),
            inspirations,
        }
    }
}
