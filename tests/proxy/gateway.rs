//! Gateway dispatch tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use proxy_bot::application::services::{AbortReason, ProxyService, ProxyStage};
use proxy_bot::domain::Permissions;
use proxy_bot::presentation::gateway::{EventDispatcher, GatewayEvent};

use crate::common::*;

fn dispatcher(harness: &Harness) -> EventDispatcher {
    dispatcher_for(harness.service())
}

fn dispatcher_for(service: ProxyService) -> EventDispatcher {
    let cache = FakeChannelCache {
        channels: HashMap::from([(CHANNEL, text_channel(Permissions::PROXY_REQUIRED))]),
    };
    EventDispatcher::new(
        service,
        Arc::new(cache),
        Arc::new(FakeContexts { context: context() }),
    )
}

fn create(id: i64, channel_id: i64, content: &str) -> String {
    serde_json::json!({
        "op": 0,
        "t": "MESSAGE_CREATE",
        "d": {
            "id": id.to_string(),
            "channel_id": channel_id.to_string(),
            "guild_id": GUILD.to_string(),
            "author": {"id": AUTHOR.to_string(), "username": "author"},
            "content": content,
            "type": 0
        }
    })
    .to_string()
}

fn update(id: i64, content: &str) -> String {
    serde_json::json!({
        "op": 0,
        "t": "MESSAGE_UPDATE",
        "d": {
            "id": id.to_string(),
            "channel_id": CHANNEL.to_string(),
            "guild_id": GUILD.to_string(),
            "author": {"id": AUTHOR.to_string()},
            "content": content
        }
    })
    .to_string()
}

async fn dispatch(dispatcher: &EventDispatcher, payload: &str) -> Option<ProxyStage> {
    let event = EventDispatcher::decode(payload)?;
    dispatcher.handle_event(event).await
}

#[tokio::test(start_paused = true)]
async fn message_create_runs_pipeline() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = dispatcher(&harness);

    let stage = dispatch(&dispatcher, &create(100, CHANNEL, "A:hello")).await;

    assert_eq!(stage, Some(ProxyStage::Deleted));
    assert_eq!(harness.webhook_requests()[0].content, "hello");
}

#[tokio::test]
async fn uncached_channel_is_skipped() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = dispatcher(&harness);

    let stage = dispatch(&dispatcher, &create(100, 999, "A:hello")).await;

    assert_eq!(stage, None);
    assert!(harness.webhook_requests().is_empty());
}

#[tokio::test]
async fn bot_author_is_skipped() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = dispatcher(&harness);
    let payload = r#"{"op":0,"t":"MESSAGE_CREATE","d":{"id":"100","channel_id":"10","guild_id":"20","author":{"id":"1","bot":true},"content":"A:hello"}}"#;

    assert_eq!(dispatch(&dispatcher, payload).await, None);
}

#[tokio::test(start_paused = true)]
async fn edit_of_latest_message_proxies_on_tag() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = dispatcher(&harness);

    let first = dispatch(&dispatcher, &create(100, CHANNEL, "hello")).await;
    assert_eq!(first, Some(ProxyStage::Aborted(AbortReason::NoMatch)));
    assert_eq!(dispatcher.tracked_channels(), 1);

    let edited = dispatch(&dispatcher, &update(100, "A:hello")).await;
    assert_eq!(edited, Some(ProxyStage::Deleted));
    assert_eq!(harness.deleted(), vec![(CHANNEL, 100)]);
}

#[tokio::test]
async fn edit_of_older_message_is_ignored() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = dispatcher(&harness);

    dispatch(&dispatcher, &create(100, CHANNEL, "hello")).await;
    dispatch(&dispatcher, &create(101, CHANNEL, "again")).await;

    assert_eq!(dispatch(&dispatcher, &update(100, "A:hello")).await, None);
    assert!(harness.webhook_requests().is_empty());
}

#[test]
fn unknown_and_malformed_payloads_decode_to_nothing() {
    assert_eq!(
        EventDispatcher::decode(r#"{"op":0,"t":"TYPING_START","d":{}}"#),
        None
    );
    assert_eq!(EventDispatcher::decode("not json"), None);
    assert!(matches!(
        EventDispatcher::decode(&create(1, CHANNEL, "x")),
        Some(GatewayEvent::MessageCreate(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn run_drains_in_flight_work_when_source_closes() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = Arc::new(dispatcher(&harness));
    let (tx, rx) = mpsc::channel(8);

    tx.send(create(100, CHANNEL, "A:one")).await.unwrap();
    tx.send("garbage".to_string()).await.unwrap();
    tx.send(create(101, CHANNEL, "A:two")).await.unwrap();
    drop(tx);

    dispatcher.run(rx, Duration::from_secs(30)).await;

    let mut deleted = harness.deleted();
    deleted.sort();
    assert_eq!(deleted, vec![(CHANNEL, 100), (CHANNEL, 101)]);
    assert_eq!(harness.records().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn proxied_message_is_no_longer_tracked_for_edits() {
    let harness = Harness::new(vec![alice()]);
    let dispatcher = dispatcher(&harness);

    let stage = dispatch(&dispatcher, &create(100, CHANNEL, "A:hello")).await;
    assert_eq!(stage, Some(ProxyStage::Deleted));
    assert_eq!(dispatcher.tracked_channels(), 0);

    assert_eq!(dispatch(&dispatcher, &update(100, "A:hello again")).await, None);
    assert_eq!(harness.webhook_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sent_proxies_finish_after_drain_times_out() {
    let harness = Harness::new(vec![alice()]);
    let service = harness.service();
    let dispatcher = Arc::new(dispatcher_for(service.clone()));
    let (tx, rx) = mpsc::channel(8);

    tx.send(create(100, CHANNEL, "A:hello")).await.unwrap();
    drop(tx);

    // Shorter than the deletion delay, so the caller is cut off after sending
    dispatcher.run(rx, Duration::from_millis(100)).await;
    assert_eq!(harness.webhook_requests().len(), 1);

    service.wait_for_completions().await;

    assert_eq!(service.pending_completions(), 0);
    assert_eq!(harness.deleted(), vec![(CHANNEL, 100)]);
    assert_eq!(harness.records().len(), 1);
}
