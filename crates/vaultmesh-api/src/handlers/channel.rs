//! Channel listing and state transitions, and the inbox sync/delete path
//! that hands messages off to the vault owner.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use vaultmesh_types::VaultMeshError;

use crate::dto::{
    parse_id, ChannelDto, DeleteInboxMessagesRequest, GetChannelMessagesQuery,
    GetChannelMessagesResponse, GetChannelsQuery, GetChannelsResponse,
    GetInboxMessagesForSyncResponse, InboxMessageDto, UpdateChannelMinDifficultyRequest,
    UpdateChannelStatusRequest, VaultScopedQuery,
};
use crate::error::ApiResult;
use crate::extractor::AuthenticatedVault;
use crate::state::AppState;

pub async fn get_channels(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Query(query): Query<GetChannelsQuery>,
) -> ApiResult<Json<GetChannelsResponse>> {
    let vault_id = parse_id("vaultId", &query.vault_id)?;
    auth.require(vault_id)?;

    let channels = state.channels.list_for_vault(vault_id).await;
    Ok(Json(GetChannelsResponse {
        channels: channels.into_iter().map(ChannelDto::from).collect(),
        has_more: false,
    }))
}

pub async fn get_channel_messages(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Query(query): Query<GetChannelMessagesQuery>,
) -> ApiResult<Json<GetChannelMessagesResponse>> {
    let vault_id = parse_id("vaultId", &query.vault_id)?;
    auth.require(vault_id)?;
    let channel_id = parse_id("channelId", &query.channel_id)?;

    let owns_channel = state
        .channels
        .list_for_vault(vault_id)
        .await
        .iter()
        .any(|c| c.id == channel_id);
    if !owns_channel {
        return Err(VaultMeshError::NotFound("channel".to_string()).into());
    }

    let messages = state.channels.get_channel_messages(channel_id).await;
    Ok(Json(GetChannelMessagesResponse {
        messages: messages.into_iter().map(InboxMessageDto::from).collect(),
        has_more: false,
    }))
}

pub async fn update_channel_status(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<UpdateChannelStatusRequest>,
) -> ApiResult<Json<ChannelDto>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;
    let channel_id = parse_id("channelId", &request.channel_id)?;

    let channel = state
        .channels
        .update_status(vault_id, channel_id, request.status)
        .await?;
    Ok(Json(ChannelDto::from(channel)))
}

pub async fn update_channel_min_difficulty(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<UpdateChannelMinDifficultyRequest>,
) -> ApiResult<Json<ChannelDto>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;
    let channel_id = parse_id("channelId", &request.channel_id)?;

    let channel = state
        .channels
        .update_min_difficulty(vault_id, channel_id, request.min_difficulty)
        .await?;
    Ok(Json(ChannelDto::from(channel)))
}

pub async fn get_inbox_messages_for_sync(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Query(query): Query<VaultScopedQuery>,
) -> ApiResult<Json<GetInboxMessagesForSyncResponse>> {
    let vault_id = parse_id("vaultId", &query.vault_id)?;
    auth.require(vault_id)?;

    let messages = state.channels.get_inbox_messages_for_sync(vault_id).await;
    Ok(Json(GetInboxMessagesForSyncResponse {
        messages: messages.into_iter().map(InboxMessageDto::from).collect(),
    }))
}

pub async fn delete_inbox_messages(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<DeleteInboxMessagesRequest>,
) -> ApiResult<Json<()>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;

    let mut ids = Vec::with_capacity(request.message_ids.len());
    for raw in &request.message_ids {
        ids.push(parse_id("messageIds[]", raw)?);
    }
    state.channels.delete_inbox_messages(vault_id, &ids).await;
    Ok(Json(()))
}
