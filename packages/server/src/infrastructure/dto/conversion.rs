//! Conversion logic between DTOs and domain entities.

use hiroba_shared::time::millis_to_jst_rfc3339;

use crate::domain::{Connection, EventKind, InboundMessage, OutboundEvent, Room};
use crate::infrastructure::dto::{http, websocket as ws};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<ws::InboundPayload> for InboundMessage {
    fn from(dto: ws::InboundPayload) -> Self {
        InboundMessage::new(dto.message)
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<EventKind> for ws::EventType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Joined => ws::EventType::NewUser,
            EventKind::Chat => ws::EventType::Chat,
            EventKind::Left => ws::EventType::Leave,
        }
    }
}

impl From<&OutboundEvent> for ws::OutboundPayload {
    fn from(event: &OutboundEvent) -> Self {
        Self {
            from: event.from.clone(),
            r#type: event.kind.into(),
            message: event.text.clone(),
        }
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            name: room.name.as_str().to_string(),
            members: room
                .members
                .iter()
                .map(|member| member.username.as_str().to_string())
                .collect(),
            created_at: millis_to_jst_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Connection> for http::MemberDetailDto {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id.to_string(),
            username: connection.username.as_str().to_string(),
            connected_at: millis_to_jst_rfc3339(connection.connected_at.value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            name: room.name.as_str().to_string(),
            members: room.members.iter().map(Into::into).collect(),
            created_at: millis_to_jst_rfc3339(room.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionIdFactory, RoomName, Timestamp, Username};

    #[test]
    fn test_inbound_payload_to_domain() {
        // テスト項目: 受信 DTO がドメインの InboundMessage に変換される
        // given (前提条件):
        let dto = ws::InboundPayload {
            message: "/direct bob hi".to_string(),
        };

        // when (操作):
        let message: InboundMessage = dto.into();

        // then (期待する結果):
        assert_eq!(message.text, "/direct bob hi");
    }

    #[test]
    fn test_event_kinds_map_to_wire_types() {
        // テスト項目: イベント種別が送信フレームの Type に対応付けられる
        // given (前提条件):
        let kinds = [EventKind::Joined, EventKind::Chat, EventKind::Left];

        // when (操作):
        let types: Vec<ws::EventType> = kinds.into_iter().map(Into::into).collect();

        // then (期待する結果):
        assert_eq!(
            types,
            vec![
                ws::EventType::NewUser,
                ws::EventType::Chat,
                ws::EventType::Leave
            ]
        );
    }

    #[test]
    fn test_outbound_event_to_dto() {
        // テスト項目: ドメインの OutboundEvent が送信 DTO に変換される
        // given (前提条件):
        let event = OutboundEvent::new("alice", EventKind::Chat, "hi");

        // when (操作):
        let dto = ws::OutboundPayload::from(&event);

        // then (期待する結果):
        assert_eq!(dto.from, "alice");
        assert_eq!(dto.r#type, ws::EventType::Chat);
        assert_eq!(dto.message, "hi");
    }

    #[test]
    fn test_room_to_http_dtos() {
        // テスト項目: Room が一覧・詳細の HTTP DTO に変換される
        // given (前提条件):
        let mut room = Room::new(RoomName::from("lobby"), Timestamp::new(1672498800000));
        let alice = Connection::new(
            ConnectionIdFactory::generate(),
            Username::from("alice"),
            RoomName::from("lobby"),
            Timestamp::new(1672498800000),
        );
        room.add_member(alice.clone()).unwrap();

        // when (操作):
        let summary = http::RoomSummaryDto::from(&room);
        let detail = http::RoomDetailDto::from(&room);

        // then (期待する結果):
        assert_eq!(summary.name, "lobby");
        assert_eq!(summary.members, vec!["alice".to_string()]);
        assert!(summary.created_at.starts_with("2023-01-01T00:00:00"));
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.members[0].id, alice.id.to_string());
        assert_eq!(detail.members[0].username, "alice");
    }
}
