#![cfg(test)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ledger_bot::{
    base::{
        config::{Config, ConfigInner},
        types::{DebitOutcome, Res, TransferOutcome, Void},
    },
    interaction::mention::{InboundMessage, MENTION_REPLY, handle_inbound_message_internal},
    runtime::Runtime,
    service::{
        chat::{ChatClient, GenericChatClient},
        db::DbClient,
    },
};
use mockall::mock;

// Mocks.

// Mock chat client for testing.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        fn bot_user_id(&self) -> &str;
        async fn start(&self) -> Void;
        async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void;
    }
}

fn get_mock_chat() -> MockChat {
    let mut mock = MockChat::new();

    mock.expect_bot_user_id().return_const("U12345".to_string());
    mock.expect_start().returning(|| Ok(()));

    mock
}

/// Helper function to setup the test environment.
async fn setup_test_environment(chat: MockChat) -> Runtime {
    let config = Config {
        inner: Arc::new(ConfigInner {
            slack_app_token: "xapp-test".to_string(),
            slack_bot_token: "xoxb-test".to_string(),
            db_endpoint: "mem://".to_string(),
            ..Default::default()
        }),
    };

    // Initialize the database (using in-memory for tests).
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");

    let chat = ChatClient::new(Arc::new(chat));

    Runtime { config, db, chat }
}

async fn setup_db() -> DbClient {
    setup_test_environment(get_mock_chat()).await.db
}

fn message(sender: &str, text: &str, thread_ts: Option<&str>) -> InboundMessage {
    InboundMessage::new(
        "C01TEST".to_string(),
        "1234567890.123456".to_string(),
        thread_ts.map(str::to_string),
        Some(sender.to_string()),
        text.to_string(),
    )
}

// Ledger.

#[tokio::test]
async fn test_ledger_walkthrough() {
    let db = setup_db().await;

    // A fresh account reads as zero, and now exists.
    assert_eq!(db.get_balance("u1").await.unwrap(), 0);
    assert_eq!(db.get_or_create_account("u1").await.unwrap().balance, 0);

    assert_eq!(db.add_balance("u1", 50).await.unwrap(), 50);

    let outcome = db.subtract_balance("u1", 100).await.unwrap();
    assert_eq!(outcome, DebitOutcome::InsufficientFunds { balance: 50, requested: 100 });
    assert_eq!(db.get_balance("u1").await.unwrap(), 50);

    assert_eq!(db.subtract_balance("u1", 50).await.unwrap(), DebitOutcome::Applied { balance: 0 });

    assert_eq!(db.set_balance("u2", 200).await.unwrap(), 200);
    let outcome = db.transfer_balance("u2", "u1", 75).await.unwrap();
    assert!(outcome.is_completed());
    assert_eq!(outcome, TransferOutcome::Completed { from_balance: 125, to_balance: 75 });
    assert_eq!(db.get_balance("u2").await.unwrap(), 125);
    assert_eq!(db.get_balance("u1").await.unwrap(), 75);

    let outcome = db.transfer_balance("u2", "u1", 1000).await.unwrap();
    assert!(!outcome.is_completed());
    assert_eq!(db.get_balance("u2").await.unwrap(), 125);
    assert_eq!(db.get_balance("u1").await.unwrap(), 75);
}

#[tokio::test]
async fn test_add_balance_accumulates_and_allows_negative() {
    let db = setup_db().await;

    assert_eq!(db.add_balance("acc", 10).await.unwrap(), 10);
    assert_eq!(db.add_balance("acc", 5).await.unwrap(), 15);
    assert_eq!(db.add_balance("acc", -40).await.unwrap(), -25);
    assert_eq!(db.get_balance("acc").await.unwrap(), -25);
}

#[tokio::test]
async fn test_set_balance_overrides_prior_value() {
    let db = setup_db().await;

    db.add_balance("setter", 999).await.unwrap();

    assert_eq!(db.set_balance("setter", -3).await.unwrap(), -3);
    assert_eq!(db.get_balance("setter").await.unwrap(), -3);

    // A negative balance blocks any positive debit.
    assert!(!db.subtract_balance("setter", 1).await.unwrap().is_applied());
}

#[tokio::test]
async fn test_subtract_exact_balance_reaches_zero() {
    let db = setup_db().await;

    db.set_balance("exact", 30).await.unwrap();

    let outcome = db.subtract_balance("exact", 30).await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!(outcome.balance(), 0);
}

#[tokio::test]
async fn test_transfer_to_fresh_account_creates_it() {
    let db = setup_db().await;

    db.set_balance("payer", 10).await.unwrap();

    assert!(db.transfer_balance("payer", "payee", 10).await.unwrap().is_completed());
    assert_eq!(db.get_balance("payer").await.unwrap(), 0);
    assert_eq!(db.get_balance("payee").await.unwrap(), 10);
}

#[tokio::test]
async fn test_failed_transfer_from_empty_account() {
    let db = setup_db().await;

    db.set_balance("receiver", 4).await.unwrap();

    let outcome = db.transfer_balance("empty", "receiver", 1).await.unwrap();

    assert_eq!(outcome, TransferOutcome::InsufficientFunds { balance: 0, requested: 1 });
    assert_eq!(db.get_balance("empty").await.unwrap(), 0);
    assert_eq!(db.get_balance("receiver").await.unwrap(), 4);
}

#[tokio::test]
async fn test_reads_do_not_touch_timestamps() {
    let db = setup_db().await;

    let created = db.get_or_create_account("reader").await.unwrap();
    assert_eq!(created.created_at, created.updated_at);

    for _ in 0..3 {
        let again = db.get_or_create_account("reader").await.unwrap();
        assert_eq!(again, created);
    }
}

/// Waits long enough for the second-resolution clock to tick over.
async fn next_second() {
    tokio::time::sleep(Duration::from_millis(1100)).await;
}

#[tokio::test]
async fn test_add_balance_refreshes_updated_at() {
    let db = setup_db().await;

    let before = db.get_or_create_account("adder").await.unwrap();
    next_second().await;
    db.add_balance("adder", 1).await.unwrap();
    let after = db.get_or_create_account("adder").await.unwrap();

    assert_eq!(after.balance, 1);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_set_balance_refreshes_updated_at() {
    let db = setup_db().await;

    let before = db.get_or_create_account("setter2").await.unwrap();
    next_second().await;
    db.set_balance("setter2", 7).await.unwrap();
    let after = db.get_or_create_account("setter2").await.unwrap();

    assert_eq!(after.balance, 7);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_debit_refreshes_updated_at_but_refusal_does_not() {
    let db = setup_db().await;

    db.set_balance("debtor", 5).await.unwrap();
    let before = db.get_or_create_account("debtor").await.unwrap();

    next_second().await;
    assert!(!db.subtract_balance("debtor", 6).await.unwrap().is_applied());
    assert_eq!(db.get_or_create_account("debtor").await.unwrap(), before);

    assert!(db.subtract_balance("debtor", 5).await.unwrap().is_applied());
    let after = db.get_or_create_account("debtor").await.unwrap();

    assert_eq!(after.balance, 0);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_user_ids_are_opaque() {
    let db = setup_db().await;

    let id = "discord:1234/ü ser";

    assert_eq!(db.add_balance(id, 12).await.unwrap(), 12);
    assert_eq!(db.get_or_create_account(id).await.unwrap().user_id, id);
}

// Mentions.

#[tokio::test]
async fn test_mention_gets_a_reply_in_thread() {
    let mut chat = get_mock_chat();

    chat.expect_send_message()
        .withf(|channel_id, thread_ts, text| channel_id == "C01TEST" && thread_ts == "1234567890.000001" && text == MENTION_REPLY)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_test_environment(chat).await;

    let message = message("U54321", "<@U12345> hello there", Some("1234567890.000001"));

    handle_inbound_message_internal(&message, &runtime.chat).await.expect("Failed to handle mention");
}

#[tokio::test]
async fn test_top_level_mention_starts_a_thread() {
    let mut chat = get_mock_chat();

    chat.expect_send_message()
        .withf(|_, thread_ts, _| thread_ts == "1234567890.123456")
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_test_environment(chat).await;

    handle_inbound_message_internal(&message("U54321", "hey <@U12345|ledger>", None), &runtime.chat)
        .await
        .expect("Failed to handle mention");
}

#[tokio::test]
async fn test_messages_without_bot_mention_are_ignored() {
    let mut chat = get_mock_chat();

    chat.expect_send_message().never();

    let runtime = setup_test_environment(chat).await;

    handle_inbound_message_internal(&message("U54321", "hello <@U99999>", None), &runtime.chat).await.unwrap();
    handle_inbound_message_internal(&message("U12345", "talking to myself <@U12345>", None), &runtime.chat).await.unwrap();
}

#[tokio::test]
async fn test_reply_failures_surface_as_errors() {
    let mut chat = get_mock_chat();

    chat.expect_send_message().returning(|_, _, _| Err(anyhow::anyhow!("connection lost")));

    let runtime = setup_test_environment(chat).await;

    let result: Res<()> = handle_inbound_message_internal(&message("U54321", "<@U12345>", None), &runtime.chat).await;

    assert!(result.is_err());
}
