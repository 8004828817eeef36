use axum::{
    extract::{Extension, Path, State},
    Json,
};
use log::info;
use partyplanner_shared::models::{now_millis, Event, Expense, MessageResponse};
use partyplanner_shared::planning::BudgetSummary;
use partyplanner_shared::store::AppStore;
use uuid::Uuid;

use super::{category_or_default, load_viewable_event, parse_day};
use crate::error::{AppError, Result};
use crate::models::{CreateExpenseRequest, UpdateExpenseRequest};
use crate::state::AppState;

fn check_value(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AppError::bad_request(
            "Expense value must be a positive amount.".into(),
        ))
    }
}

fn photo_url(raw: Option<String>) -> Option<String> {
    raw.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

/// Current spending of the event against its budget
async fn budget_summary<S: AppStore>(store: &S, event: &Event) -> Result<BudgetSummary> {
    let expenses = store.get_expenses(&event.id).await?;
    Ok(BudgetSummary::of(&expenses, event.budget))
}

// GET /events/:id/expenses
pub async fn get_expenses<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let expenses = state.store.get_expenses(&id).await?;
    let summary = BudgetSummary::of(&expenses, event.budget);
    Ok(Json(serde_json::json!({ "expenses": expenses, "summary": summary })))
}

// POST /events/:id/expenses
pub async fn create_expense<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let item = payload.item.trim();
    if item.is_empty() {
        return Err(AppError::bad_request("Expense item is required.".into()));
    }
    let value = check_value(payload.value)?;
    let date = parse_day(&payload.date, "Expense date")?;
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;

    let expense = Expense {
        id: Uuid::new_v4().to_string(),
        event_id: id.clone(),
        item: item.to_string(),
        category: category_or_default(payload.category),
        value,
        date,
        image_url: photo_url(payload.image_url),
        created_at: now_millis(),
    };
    let expense = state.store.put_expense(expense).await?;
    info!("Added expense {} to event {}", expense.id, id);

    let summary = budget_summary(state.store.as_ref(), &event).await?;
    if summary.over_budget {
        info!(
            "Event {} is over budget: {} spent",
            id, summary.total_spent
        );
    }
    Ok(Json(serde_json::json!({ "expense": expense, "summary": summary })))
}

// PATCH /events/:id/expenses/:expense_id
pub async fn update_expense<S>(
    State(state): State<AppState<S>>,
    Path((id, expense_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let mut expense = state.store.get_expense(&id, &expense_id).await?;

    if let Some(item) = payload.item {
        let item = item.trim();
        if item.is_empty() {
            return Err(AppError::bad_request("Expense item cannot be empty.".into()));
        }
        expense.item = item.to_string();
    }
    if payload.category.is_some() {
        expense.category = category_or_default(payload.category);
    }
    if let Some(value) = payload.value {
        expense.value = check_value(value)?;
    }
    if let Some(date) = payload.date {
        expense.date = parse_day(&date, "Expense date")?;
    }
    if payload.image_url.is_some() {
        expense.image_url = photo_url(payload.image_url);
    }

    let expense = state.store.put_expense(expense).await?;
    let summary = budget_summary(state.store.as_ref(), &event).await?;
    Ok(Json(serde_json::json!({ "expense": expense, "summary": summary })))
}

// DELETE /events/:id/expenses/:expense_id
pub async fn delete_expense<S>(
    State(state): State<AppState<S>>,
    Path((id, expense_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    state.store.get_expense(&id, &expense_id).await?;
    state.store.delete_expense(&id, &expense_id).await?;
    info!("Removed expense {} from event {}", expense_id, id);

    Ok(Json(MessageResponse {
        message: "Expense removed".into(),
    }))
}
