pub mod admin;
pub mod availability;
pub mod contact;
pub mod events;
pub mod fellowship;
pub mod hosts;
pub mod locations;
pub mod messaging;
pub mod payments;
pub mod ratings;
pub mod speakers;
pub mod uploads;

use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use cni_core::domain::{Host, Speaker, User};

pub(crate) async fn require_host(state: &AppState, user: &User) -> ApiResult<Host> {
    state
        .storage
        .get_host_by_user(row_id(user.id)?)
        .await?
        .ok_or_else(|| ApiError::forbidden("a host profile is required"))
}

pub(crate) async fn require_speaker(state: &AppState, user: &User) -> ApiResult<Speaker> {
    state
        .storage
        .get_speaker_by_user(row_id(user.id)?)
        .await?
        .ok_or_else(|| ApiError::forbidden("a speaker profile is required"))
}
