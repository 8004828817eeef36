use axum::{
    extract::{Extension, Path, State},
    Json,
};
use partyplanner_shared::invite::InviteTemplate;
use partyplanner_shared::store::AppStore;

use super::{load_template, load_viewable_event};
use crate::error::Result;
use crate::state::AppState;

// GET /events/:id/template
pub async fn get_template<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<InviteTemplate>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let template = load_template(state.store.as_ref(), &id).await?;
    Ok(Json(template))
}
