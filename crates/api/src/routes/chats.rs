//! Chat room routes: direct rooms, messages, unread tracking and moderation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::chat::{
    system_text, ChatNotification, ChatRoomDetail, InviteParticipantRequest,
    ListChatMessagesQuery, ListChatMessagesResponse, ListChatRoomsResponse,
    ListNotificationsResponse, MuteResponse, NotificationQuery, RenameRoomRequest, RoomOutcome,
    SendMessageRequest, StartChatRequest, StartChatResponse,
};
use domain::models::{ChatMessage, ChatRoom};
use persistence::repositories::{ChatRepository, RoomAccess, UserRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_chat_message_sent;

/// Loads a room the viewer participates in. Former participants get 403.
async fn participant_room(
    repo: &ChatRepository,
    room_id: Uuid,
    viewer: Uuid,
) -> Result<ChatRoom, ApiError> {
    match repo.access(room_id, viewer).await? {
        RoomAccess::Participant(room) => Ok(room.into()),
        RoomAccess::NotParticipant => Err(ApiError::Forbidden(
            "You are not a participant of this room".to_string(),
        )),
        RoomAccess::NotFound => Err(ApiError::NotFound("Chat room not found".to_string())),
    }
}

async fn display_name(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    UserRepository::new(state.pool.clone())
        .display_name(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Open the direct room with another user, creating it on first contact.
///
/// POST /api/v1/chats
pub async fn start_chat(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<StartChatRequest>,
) -> Result<(StatusCode, Json<StartChatResponse>), ApiError> {
    request.validate()?;
    if request.other_user_id == user_auth.user_id {
        return Err(ApiError::Validation(
            "Cannot start a chat with yourself".to_string(),
        ));
    }
    let other_name = display_name(&state, request.other_user_id).await?;

    let repo = ChatRepository::new(state.pool.clone());
    if let Some(room) = repo
        .find_direct_room(user_auth.user_id, request.other_user_id)
        .await?
    {
        return Ok((
            StatusCode::OK,
            Json(StartChatResponse {
                room: room.into(),
                created: false,
            }),
        ));
    }

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&other_name);
    let room: ChatRoom = repo
        .create_room(user_auth.user_id, request.other_user_id, name)
        .await?
        .into();

    info!(
        room_id = %room.id,
        user_id = %user_auth.user_id,
        other_user_id = %request.other_user_id,
        "Chat room created"
    );
    Ok((
        StatusCode::CREATED,
        Json(StartChatResponse {
            room,
            created: true,
        }),
    ))
}

/// The caller's rooms, most recent activity first.
///
/// GET /api/v1/chats
pub async fn list_rooms(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListChatRoomsResponse>, ApiError> {
    let rooms: Vec<ChatRoom> = ChatRepository::new(state.pool.clone())
        .list_rooms(user_auth.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total_unread = rooms.iter().map(|r| i64::from(r.unread_count)).sum();

    Ok(Json(ListChatRoomsResponse {
        count: rooms.len(),
        data: rooms,
        total_unread,
    }))
}

/// Rooms with unseen messages from others since `since`, skipping muted rooms.
///
/// GET /api/v1/chats/notifications?since=
pub async fn notifications(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let data: Vec<ChatNotification> = ChatRepository::new(state.pool.clone())
        .list_rooms(user_auth.user_id)
        .await?
        .into_iter()
        .map(ChatRoom::from)
        .filter_map(|room| ChatNotification::for_room(&room, user_auth.user_id, query.since))
        .collect();

    Ok(Json(ListNotificationsResponse {
        count: data.len(),
        data,
    }))
}

/// View a room. Zeroes only the viewer's unread counter.
///
/// GET /api/v1/chats/:room_id
pub async fn get_room(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
) -> Result<Json<ChatRoomDetail>, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    let mut room = participant_room(&repo, room_id, user_auth.user_id).await?;

    repo.mark_read(room_id, user_auth.user_id).await?;
    room.unread_count = 0;

    let participants = repo
        .participants(room_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ChatRoomDetail { room, participants }))
}

/// POST /api/v1/chats/:room_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    participant_room(&repo, room_id, user_auth.user_id).await?;
    repo.mark_read(room_id, user_auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/chats/:room_id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
    Query(query): Query<ListChatMessagesQuery>,
) -> Result<Json<ListChatMessagesResponse>, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    participant_room(&repo, room_id, user_auth.user_id).await?;

    let limit = state.config.limits.page_size(query.limit);
    let data: Vec<ChatMessage> = repo
        .list_messages(room_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListChatMessagesResponse {
        count: data.len(),
        data,
    }))
}

/// Send a message. Every other participant's unread counter goes up by one.
///
/// POST /api/v1/chats/:room_id/messages
pub async fn send_message(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    request.validate()?;

    let repo = ChatRepository::new(state.pool.clone());
    let message: ChatMessage = match repo
        .send_message(room_id, user_auth.user_id, request.text.trim())
        .await?
    {
        Some(message) => message.into(),
        None => {
            // Distinguish a missing room from a non-participant.
            participant_room(&repo, room_id, user_auth.user_id).await?;
            return Err(ApiError::Forbidden(
                "You are not a participant of this room".to_string(),
            ));
        }
    };

    record_chat_message_sent();
    tracing::debug!(room_id = %room_id, message_id = %message.id, "Chat message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

/// Invite another user. Any participant may invite.
///
/// POST /api/v1/chats/:room_id/participants
pub async fn invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
    Json(request): Json<InviteParticipantRequest>,
) -> Result<StatusCode, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    participant_room(&repo, room_id, user_auth.user_id).await?;
    let name = display_name(&state, request.user_id).await?;

    if !repo
        .add_participant(room_id, request.user_id, &system_text::invited(&name))
        .await?
    {
        return Err(ApiError::Conflict(
            "User is already a participant".to_string(),
        ));
    }

    info!(room_id = %room_id, invited = %request.user_id, by = %user_auth.user_id, "User invited to chat");
    Ok(StatusCode::CREATED)
}

/// Rename a room. Owner only.
///
/// PUT /api/v1/chats/:room_id/name
pub async fn rename(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
    Json(request): Json<RenameRoomRequest>,
) -> Result<Json<ChatRoom>, ApiError> {
    request.validate()?;

    let repo = ChatRepository::new(state.pool.clone());
    let room = participant_room(&repo, room_id, user_auth.user_id).await?;
    if !room.is_owner(user_auth.user_id) {
        return Err(ApiError::Forbidden(
            "Only the room owner can rename the room".to_string(),
        ));
    }

    let name = request.name.trim();
    repo.rename(room_id, name, &system_text::renamed(name)).await?;

    info!(room_id = %room_id, "Chat room renamed");
    Ok(Json(participant_room(&repo, room_id, user_auth.user_id).await?))
}

/// Flip the caller's mute flag.
///
/// POST /api/v1/chats/:room_id/mute
pub async fn toggle_mute(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
) -> Result<Json<MuteResponse>, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    match repo.toggle_mute(room_id, user_auth.user_id).await? {
        Some(muted) => Ok(Json(MuteResponse { muted })),
        None => {
            participant_room(&repo, room_id, user_auth.user_id).await?;
            Err(ApiError::Forbidden(
                "You are not a participant of this room".to_string(),
            ))
        }
    }
}

/// Leave a room. The room is deleted when fewer than two would remain.
///
/// POST /api/v1/chats/:room_id/leave
pub async fn leave(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomOutcome>, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    participant_room(&repo, room_id, user_auth.user_id).await?;
    let name = display_name(&state, user_auth.user_id).await?;

    let outcome = repo
        .remove_participant(room_id, user_auth.user_id, &system_text::left(&name))
        .await?
        .ok_or_else(|| ApiError::NotFound("Chat room not found".to_string()))?;

    info!(room_id = %room_id, user_id = %user_auth.user_id, outcome = ?outcome, "Left chat room");
    Ok(Json(outcome))
}

/// Remove another participant. Owner only.
///
/// DELETE /api/v1/chats/:room_id/participants/:user_id
pub async fn kick(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((room_id, target)): Path<(Uuid, Uuid)>,
) -> Result<Json<RoomOutcome>, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    let room = participant_room(&repo, room_id, user_auth.user_id).await?;
    if !room.is_owner(user_auth.user_id) {
        return Err(ApiError::Forbidden(
            "Only the room owner can remove participants".to_string(),
        ));
    }
    if target == user_auth.user_id {
        return Err(ApiError::Validation(
            "Use leave to exit your own room".to_string(),
        ));
    }
    let name = display_name(&state, target).await?;

    let outcome = repo
        .remove_participant(room_id, target, &system_text::kicked(&name))
        .await?
        .ok_or_else(|| ApiError::NotFound("User is not a participant".to_string()))?;

    info!(room_id = %room_id, kicked = %target, outcome = ?outcome, "Participant removed");
    Ok(Json(outcome))
}
