//! UseCase: メッセージ配送処理
//!
//! 受信メッセージをブロードキャストかダイレクトメッセージかに振り分け、
//! ルームのメンバーに配送します。
//!
//! ## 配送ルール
//!
//! - ブロードキャストは送信者以外の同じルームのメンバー全員に届く
//! - ダイレクトメッセージは送信者のルーム内だけで宛先を探す
//! - 宛先が見つからない場合は送信者に System からの返信が 1 通だけ届く
//! - 一部の宛先への送信失敗はログに残して残りの宛先への配送を続ける
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：ブロードキャスト、ダイレクトメッセージ
//! - 異常系：宛先不在、送信失敗する宛先が混ざっている場合
//! - エッジケース：送信者しかいないルーム、既に削除されたルーム

use std::sync::Arc;

use crate::domain::{
    Connection, EventKind, InboundMessage, InboundRoute, MessagePusher, OutboundEvent,
    RoomRepository, Username,
};

/// Result of a direct message attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectOutcome {
    /// Delivered to the first member with the target username
    Delivered,
    /// A member matched but pushing to it failed
    Undeliverable,
    /// Nobody in the sender's room has that username; the sender got a
    /// `System` reply
    UserNotFound,
}

/// メッセージ配送のユースケース
pub struct Dispatcher {
    /// Repository（ルームレジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl Dispatcher {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 参加・退出を他のメンバーに通知（本文は空）
    pub async fn announce(&self, connection: &Connection, kind: EventKind) -> usize {
        self.broadcast(connection, kind, "").await
    }

    /// 受信メッセージを振り分けて配送
    pub async fn route_inbound(&self, connection: &Connection, message: &InboundMessage) {
        match message.route() {
            InboundRoute::Broadcast(text) => {
                let delivered = self.broadcast(connection, EventKind::Chat, &text).await;
                tracing::debug!(
                    "Chat from '{}' in room '{}' delivered to {} member(s)",
                    connection.username,
                    connection.room,
                    delivered
                );
            }
            InboundRoute::Direct {
                target: Some(target),
                text,
            } => {
                self.send_direct(connection, &target, &text).await;
            }
            InboundRoute::Direct { target: None, .. } => {
                self.reply_user_not_found(connection).await;
            }
        }
    }

    /// 送信者以外のルームメンバー全員にイベントを送信
    ///
    /// # Returns
    ///
    /// 送信に成功したメンバー数。ルームが存在しない場合は何もせず 0。
    pub async fn broadcast(&self, connection: &Connection, kind: EventKind, text: &str) -> usize {
        let Some(members) = self.repository.members(&connection.room).await else {
            tracing::debug!(
                "Room '{}' no longer exists, skipping broadcast",
                connection.room
            );
            return 0;
        };

        let event = OutboundEvent::new(connection.username.as_str(), kind, text);
        let mut delivered = 0;
        for member in members.iter().filter(|member| member.id != connection.id) {
            // 一部の送信失敗は許容し、残りのメンバーへの配送を続ける
            match self.message_pusher.push_to(&member.id, &event).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Failed to push {:?} event to '{}' ({}): {}",
                    kind,
                    member.username,
                    member.id,
                    e
                ),
            }
        }
        delivered
    }

    /// 送信者のルーム内で `target` という名前の最初のメンバーに送信
    ///
    /// 見つからない場合は送信者に "User not found" を返信する。
    pub async fn send_direct(
        &self,
        sender: &Connection,
        target: &Username,
        text: &str,
    ) -> DirectOutcome {
        let recipient = self
            .repository
            .members(&sender.room)
            .await
            .and_then(|members| members.into_iter().find(|m| &m.username == target));

        let Some(recipient) = recipient else {
            tracing::info!(
                "Direct message from '{}' to unknown user '{}' in room '{}'",
                sender.username,
                target,
                sender.room
            );
            self.reply_user_not_found(sender).await;
            return DirectOutcome::UserNotFound;
        };

        let event = OutboundEvent::new(sender.username.as_str(), EventKind::Chat, text);
        match self.message_pusher.push_to(&recipient.id, &event).await {
            Ok(()) => {
                tracing::debug!(
                    "Direct message from '{}' delivered to '{}'",
                    sender.username,
                    recipient.username
                );
                DirectOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to push direct message to '{}' ({}): {}",
                    recipient.username,
                    recipient.id,
                    e
                );
                DirectOutcome::Undeliverable
            }
        }
    }

    async fn reply_user_not_found(&self, sender: &Connection) {
        let reply = OutboundEvent::user_not_found();
        if let Err(e) = self.message_pusher.push_to(&sender.id, &reply).await {
            tracing::warn!(
                "Failed to reply to '{}' ({}): {}",
                sender.username,
                sender.id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionId, ConnectionIdFactory, MessagePushError, MockMessagePusher, RoomName,
            Timestamp,
        },
        infrastructure::{
            dto::websocket::{EventType, OutboundPayload},
            message_pusher::WebSocketMessagePusher,
            repository::InMemoryRoomRepository,
        },
    };
    use tokio::sync::mpsc;

    /// A joined connection together with the receiving end of its queue
    struct Member {
        connection: Connection,
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl Member {
        fn received(&mut self) -> Vec<OutboundPayload> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.rx.try_recv() {
                frames.push(serde_json::from_str(&frame).unwrap());
            }
            frames
        }
    }

    struct Fixture {
        repository: Arc<InMemoryRoomRepository>,
        pusher: Arc<WebSocketMessagePusher>,
        dispatcher: Dispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let repository = Arc::new(InMemoryRoomRepository::new());
            let pusher = Arc::new(WebSocketMessagePusher::default());
            let dispatcher = Dispatcher::new(repository.clone(), pusher.clone());
            Self {
                repository,
                pusher,
                dispatcher,
            }
        }

        async fn join(&self, username: &str, room: &str) -> Member {
            let connection = Connection::new(
                ConnectionIdFactory::generate(),
                Username::from(username),
                RoomName::from(room),
                Timestamp::new(1_000),
            );
            let (tx, rx) = mpsc::unbounded_channel();
            self.pusher.register_client(connection.id, tx).await.unwrap();
            self.repository
                .join(&connection.room, connection.clone())
                .await
                .unwrap();
            Member { connection, rx }
        }
    }

    fn payload(from: &str, r#type: EventType, message: &str) -> OutboundPayload {
        OutboundPayload {
            from: from.to_string(),
            r#type,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_other_members_only() {
        // テスト項目: ブロードキャストは同じルームの他メンバーだけに届き、送信者と他ルームには届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let mut bob = fixture.join("bob", "lobby").await;
        let mut carol = fixture.join("carol", "lobby").await;
        let mut dave = fixture.join("dave", "dev").await;

        // when (操作):
        let message = InboundMessage::new("hello");
        fixture
            .dispatcher
            .route_inbound(&alice.connection, &message)
            .await;

        // then (期待する結果):
        let expected = vec![payload("alice", EventType::Chat, "hello")];
        assert_eq!(bob.received(), expected);
        assert_eq!(carol.received(), expected);
        assert!(alice.received().is_empty());
        assert!(dave.received().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_other_members_is_noop() {
        // テスト項目: 送信者しかいないルームへのブロードキャストは何も送らない
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;

        // when (操作):
        let delivered = fixture
            .dispatcher
            .broadcast(&alice.connection, EventKind::Chat, "anyone?")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
        assert!(alice.received().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_to_missing_room_is_noop() {
        // テスト項目: 既に削除されたルームへのブロードキャストはエラーにならず 0 件
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.join("alice", "lobby").await;
        fixture
            .repository
            .leave(&alice.connection.room, &alice.connection.id)
            .await;

        // when (操作):
        let delivered = fixture
            .dispatcher
            .broadcast(&alice.connection, EventKind::Chat, "hello")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_announce_sends_empty_text() {
        // テスト項目: 参加・退出の通知は本文が空で、種別が New User / Leave になる
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let bob = fixture.join("bob", "lobby").await;

        // when (操作):
        fixture
            .dispatcher
            .announce(&bob.connection, EventKind::Joined)
            .await;
        fixture
            .dispatcher
            .announce(&bob.connection, EventKind::Left)
            .await;

        // then (期待する結果):
        assert_eq!(
            alice.received(),
            vec![
                payload("bob", EventType::NewUser, ""),
                payload("bob", EventType::Leave, ""),
            ]
        );
    }

    #[tokio::test]
    async fn test_direct_message_reaches_target_only() {
        // テスト項目: ダイレクトメッセージは宛先だけに本文付きで届く
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let mut bob = fixture.join("bob", "lobby").await;
        let mut carol = fixture.join("carol", "lobby").await;

        // when (操作):
        let message = InboundMessage::new("/direct bob meet at 5");
        fixture
            .dispatcher
            .route_inbound(&alice.connection, &message)
            .await;

        // then (期待する結果):
        assert_eq!(
            bob.received(),
            vec![payload("alice", EventType::Chat, "meet at 5")]
        );
        assert!(alice.received().is_empty());
        assert!(carol.received().is_empty());
    }

    #[tokio::test]
    async fn test_direct_message_to_unknown_user_replies_to_sender() {
        // テスト項目: 宛先不在のダイレクトメッセージは送信者にだけ System から 1 通返信される
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let mut bob = fixture.join("bob", "lobby").await;

        // when (操作):
        let outcome = fixture
            .dispatcher
            .send_direct(&alice.connection, &Username::from("zed"), "hi")
            .await;

        // then (期待する結果):
        assert_eq!(outcome, DirectOutcome::UserNotFound);
        assert_eq!(
            alice.received(),
            vec![payload("System", EventType::Chat, "User not found")]
        );
        assert!(bob.received().is_empty());
    }

    #[tokio::test]
    async fn test_direct_message_does_not_cross_rooms() {
        // テスト項目: 他のルームにいるユーザーには届かず、宛先不在として扱われる
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let mut bob = fixture.join("bob", "dev").await;

        // when (操作):
        let message = InboundMessage::new("/direct bob psst");
        fixture
            .dispatcher
            .route_inbound(&alice.connection, &message)
            .await;

        // then (期待する結果):
        assert!(bob.received().is_empty());
        assert_eq!(
            alice.received(),
            vec![payload("System", EventType::Chat, "User not found")]
        );
    }

    #[tokio::test]
    async fn test_direct_message_without_target_replies_to_sender() {
        // テスト項目: 宛先のない /direct は、空のユーザー名のメンバーがいても宛先不在になる
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let mut nameless = fixture.join("", "lobby").await;

        // when (操作):
        let message = InboundMessage::new("/direct");
        fixture
            .dispatcher
            .route_inbound(&alice.connection, &message)
            .await;

        // then (期待する結果):
        assert!(nameless.received().is_empty());
        assert_eq!(
            alice.received(),
            vec![payload("System", EventType::Chat, "User not found")]
        );
    }

    #[tokio::test]
    async fn test_direct_message_picks_first_joined_duplicate() {
        // テスト項目: 同名のメンバーが複数いる場合、先に参加した方にだけ届く
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.join("alice", "lobby").await;
        let mut first_bob = fixture.join("bob", "lobby").await;
        let mut second_bob = fixture.join("bob", "lobby").await;

        // when (操作):
        let outcome = fixture
            .dispatcher
            .send_direct(&alice.connection, &Username::from("bob"), "hi")
            .await;

        // then (期待する結果):
        assert_eq!(outcome, DirectOutcome::Delivered);
        assert_eq!(first_bob.received().len(), 1);
        assert!(second_bob.received().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_survives_dead_peer() {
        // テスト項目: 送信キューが閉じたメンバーがいても残りのメンバーには届く
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.join("alice", "lobby").await;
        let dead = fixture.join("dead", "lobby").await;
        let mut carol = fixture.join("carol", "lobby").await;
        drop(dead.rx);

        // when (操作):
        let delivered = fixture
            .dispatcher
            .broadcast(&alice.connection, EventKind::Chat, "still there?")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(
            carol.received(),
            vec![payload("alice", EventType::Chat, "still there?")]
        );
    }

    #[tokio::test]
    async fn test_direct_message_to_closed_queue_is_undeliverable() {
        // テスト項目: 宛先の送信キューが閉じていれば Undeliverable で、誰にも何も届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let mut alice = fixture.join("alice", "lobby").await;
        let bob = fixture.join("bob", "lobby").await;
        let mut carol = fixture.join("carol", "lobby").await;
        drop(bob.rx);

        // when (操作):
        let outcome = fixture
            .dispatcher
            .send_direct(&alice.connection, &Username::from("bob"), "are you there?")
            .await;

        // then (期待する結果):
        assert_eq!(outcome, DirectOutcome::Undeliverable);
        assert!(alice.received().is_empty());
        assert!(carol.received().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_continues_after_push_error() {
        // テスト項目: MessagePusher がエラーを返しても後続メンバーへの送信が行われる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let room = RoomName::from("lobby");
        let members: Vec<Connection> = ["alice", "broken", "carol"]
            .into_iter()
            .map(|name| {
                Connection::new(
                    ConnectionIdFactory::generate(),
                    Username::from(name),
                    room.clone(),
                    Timestamp::new(1_000),
                )
            })
            .collect();
        for member in &members {
            repository.join(&room, member.clone()).await.unwrap();
        }
        let sender_id = members[0].id;
        let broken_id = members[1].id;
        let carol_id = members[2].id;

        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf(move |id: &ConnectionId, _| *id == broken_id)
            .times(1)
            .returning(move |id, _| Err(MessagePushError::ClientNotFound(*id)));
        pusher
            .expect_push_to()
            .withf(move |id: &ConnectionId, event: &OutboundEvent| {
                *id == carol_id && event.from == "alice" && event.text == "hi"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        pusher
            .expect_push_to()
            .withf(move |id: &ConnectionId, _| *id == sender_id)
            .never();
        let dispatcher = Dispatcher::new(repository, Arc::new(pusher));

        // when (操作):
        let delivered = dispatcher
            .broadcast(&members[0], EventKind::Chat, "hi")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
    }
}
