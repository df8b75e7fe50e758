//! Proxy pipeline tests against recording fakes.

use chrono::Utc;
use pretty_assertions::assert_eq;
use test_case::test_case;

use proxy_bot::application::services::{AbortReason, ProxyStage};
use proxy_bot::domain::services::{
    Ineligible, MatchSource, NameError, PermissionDenial, ProxyMatcher,
};
use proxy_bot::domain::{
    AutoproxyMode, Attachment, LastMessage, MessageType, Permissions, ProxiedMessage, Snowflake,
};

use crate::common::*;

const ALL: u64 = Permissions::PROXY_REQUIRED;

#[tokio::test(start_paused = true)]
async fn tagged_message_is_replaced_by_member() {
    let harness = Harness::new(vec![alice()]);

    let stage = harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(stage, ProxyStage::Deleted);

    let requests = harness.webhook_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].channel_id, CHANNEL);
    assert_eq!(requests[0].name, "Alice");
    assert_eq!(requests[0].content, "hello");

    assert_eq!(
        harness.records(),
        vec![ProxiedMessage {
            author_id: AUTHOR,
            guild_id: Some(GUILD),
            channel_id: CHANNEL,
            proxy_message_id: 9001,
            trigger_message_id: 100,
            member_id: ALICE,
        }]
    );
    assert_eq!(harness.logged(), vec![(ALICE, 9001)]);
    assert_eq!(harness.deleted(), vec![(CHANNEL, 100)]);
    assert!(harness.sent_messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn handle_incoming_message_reports_proxy() {
    let harness = Harness::new(vec![alice()]);
    let service = harness.service();

    assert!(
        service
            .handle_incoming_message(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
            .await
    );
    assert!(
        !service
            .handle_incoming_message(trigger(101, "hello"), &text_channel(ALL), &context(), true)
            .await
    );
}

#[tokio::test]
async fn missing_manage_webhooks_posts_one_diagnostic() {
    let harness = Harness::new(vec![alice()]);
    let bits = ALL & !Permissions::MANAGE_WEBHOOKS;

    let stage = harness
        .service()
        .run(trigger(100, "A:hi"), &text_channel(bits), &context(), true)
        .await;

    assert_eq!(
        stage,
        ProxyStage::Aborted(AbortReason::PermissionDenied(PermissionDenial::ManageWebhooks))
    );
    let sent = harness.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, CHANNEL);
    assert!(sent[0].1.content.as_deref().unwrap_or_default().contains("Manage Webhooks"));
    assert!(harness.webhook_requests().is_empty());
    assert!(harness.deleted().is_empty());
    assert!(harness.records().is_empty());
}

#[tokio::test]
async fn missing_send_messages_is_silent() {
    let harness = Harness::new(vec![alice()]);
    let bits = ALL & !Permissions::SEND_MESSAGES;

    let stage = harness
        .service()
        .run(trigger(100, "A:hi"), &text_channel(bits), &context(), true)
        .await;

    assert_eq!(
        stage,
        ProxyStage::Aborted(AbortReason::PermissionDenied(PermissionDenial::SendMessages))
    );
    assert!(harness.sent_messages().is_empty());
    assert!(harness.webhook_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn administrator_overrides_missing_permissions() {
    let harness = Harness::new(vec![alice()]);

    let stage = harness
        .service()
        .run(
            trigger(100, "A:hi"),
            &text_channel(Permissions::ADMINISTRATOR),
            &context(),
            true,
        )
        .await;

    assert_eq!(stage, ProxyStage::Deleted);
}

#[tokio::test(start_paused = true)]
async fn latch_reuses_previous_member() {
    let harness = Harness::new(vec![alice()]);
    let recent = Snowflake::from_timestamp(Utc::now().timestamp_millis() as u64);
    let ctx = proxy_bot::domain::MessageContext {
        autoproxy_mode: AutoproxyMode::Latch,
        last_message: Some(LastMessage {
            message_id: recent.as_i64(),
            member_id: ALICE,
        }),
        ..context()
    };

    let stage = harness
        .service()
        .run(trigger(100, "plain words"), &text_channel(ALL), &ctx, true)
        .await;

    assert_eq!(stage, ProxyStage::Deleted);
    let requests = harness.webhook_requests();
    assert_eq!(requests[0].name, "Alice");
    assert_eq!(requests[0].content, "plain words");
}

#[tokio::test]
async fn latch_without_previous_message_does_not_proxy() {
    let harness = Harness::new(vec![alice()]);
    let ctx = proxy_bot::domain::MessageContext {
        autoproxy_mode: AutoproxyMode::Latch,
        ..context()
    };

    let stage = harness
        .service()
        .run(trigger(100, "plain words"), &text_channel(ALL), &ctx, true)
        .await;

    assert_eq!(stage, ProxyStage::Aborted(AbortReason::NoMatch));
    assert!(harness.webhook_requests().is_empty());
    assert!(harness.records().is_empty());
}

#[tokio::test]
async fn latch_does_not_apply_to_edits() {
    let harness = Harness::new(vec![alice()]);
    let recent = Snowflake::from_timestamp(Utc::now().timestamp_millis() as u64);
    let ctx = proxy_bot::domain::MessageContext {
        autoproxy_mode: AutoproxyMode::Latch,
        last_message: Some(LastMessage {
            message_id: recent.as_i64(),
            member_id: ALICE,
        }),
        ..context()
    };

    let stage = harness
        .service()
        .run(trigger(100, "plain words"), &text_channel(ALL), &ctx, false)
        .await;

    assert_eq!(stage, ProxyStage::Aborted(AbortReason::NoMatch));
    assert!(harness.webhook_requests().is_empty());
}

#[tokio::test]
async fn expired_latch_does_not_proxy() {
    let harness = Harness::new(vec![alice()]);
    let old = Snowflake::from_timestamp((Utc::now().timestamp_millis() - 7 * 3600 * 1000) as u64);
    let ctx = proxy_bot::domain::MessageContext {
        autoproxy_mode: AutoproxyMode::Latch,
        last_message: Some(LastMessage {
            message_id: old.as_i64(),
            member_id: ALICE,
        }),
        ..context()
    };

    let stage = harness
        .service()
        .run(trigger(100, "plain words"), &text_channel(ALL), &ctx, true)
        .await;

    assert_eq!(stage, ProxyStage::Aborted(AbortReason::NoMatch));
}

#[tokio::test(start_paused = true)]
async fn already_deleted_trigger_still_completes() {
    let harness = Harness::new(vec![alice()]).with_channels(FakeChannels {
        delete_behaviour: DeleteBehaviour::AlreadyGone,
        ..Default::default()
    });

    let stage = harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(stage, ProxyStage::Deleted);
    assert!(stage.is_proxied());
    assert_eq!(harness.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_delete_is_still_a_proxy() {
    let harness = Harness::new(vec![alice()]).with_channels(FakeChannels {
        delete_behaviour: DeleteBehaviour::Forbidden,
        ..Default::default()
    });

    let stage = harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(stage, ProxyStage::DeleteScheduled);
    assert!(stage.is_proxied());
}

#[tokio::test(start_paused = true)]
async fn cleanup_survives_cancelled_caller() {
    let harness = Harness::new(vec![alice()]);
    let service = harness.service();

    let caller = tokio::spawn({
        let service = service.clone();
        async move {
            service
                .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
                .await
        }
    });
    while harness.webhook_requests().is_empty() {
        tokio::task::yield_now().await;
    }
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    service.wait_for_completions().await;

    assert_eq!(harness.records().len(), 1);
    assert_eq!(harness.deleted(), vec![(CHANNEL, 100)]);
}

#[tokio::test(start_paused = true)]
async fn record_and_log_failures_do_not_stop_deletion() {
    let harness = Harness::new(vec![alice()])
        .with_store(FakeMessageStore {
            fail: true,
            ..Default::default()
        })
        .with_audit(FakeAudit {
            fail: true,
            ..Default::default()
        });

    let stage = harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(stage, ProxyStage::Deleted);
    assert_eq!(harness.deleted(), vec![(CHANNEL, 100)]);
}

#[tokio::test]
async fn send_failure_leaves_trigger_in_place() {
    let harness = Harness::new(vec![alice()]).with_webhooks(FakeWebhooks {
        fail: true,
        ..Default::default()
    });

    let stage = harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(stage, ProxyStage::Aborted(AbortReason::SendFailed));
    assert!(harness.records().is_empty());
    assert!(harness.deleted().is_empty());
}

#[tokio::test]
async fn blank_message_without_attachment_is_ineligible() {
    let harness = Harness::new(vec![member(ALICE, "Alice", vec![tag("A:", "")])]);

    let stage = harness
        .service()
        .run(trigger(100, "   "), &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(
        stage,
        ProxyStage::Aborted(AbortReason::Ineligible(Ineligible::Blank))
    );
    assert!(harness.webhook_requests().is_empty());
    assert!(harness.sent_messages().is_empty());
}

#[tokio::test]
async fn reply_is_ineligible() {
    let harness = Harness::new(vec![alice()]);
    let mut message = trigger(100, "A:hello");
    message.message_type = MessageType::Reply;

    let stage = harness
        .service()
        .run(message, &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(
        stage,
        ProxyStage::Aborted(AbortReason::Ineligible(Ineligible::NonDefaultMessage))
    );
}

#[tokio::test(start_paused = true)]
async fn spaced_tag_with_attachment_sends_image_only() {
    let harness = Harness::new(vec![member(ALICE, "Alice", vec![tag("A: ", "")])]);
    let mut message = trigger(100, "A:");
    message.attachments.push(Attachment {
        id: 55,
        filename: "cat.png".into(),
        url: "https://cdn.example/cat.png".into(),
        proxy_url: None,
        size: 1024,
        content_type: Some("image/png".into()),
    });

    let stage = harness
        .service()
        .run(message, &text_channel(ALL), &context(), true)
        .await;

    assert_eq!(stage, ProxyStage::Deleted);
    let requests = harness.webhook_requests();
    assert_eq!(requests[0].content, "");
    assert_eq!(requests[0].attachments.len(), 1);
}

#[tokio::test]
async fn overlong_name_is_rejected_with_diagnostic() {
    let harness = Harness::new(vec![member(ALICE, &"x".repeat(81), vec![tag("A:", "")])]);

    let stage = harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &context(), true)
        .await;

    assert!(matches!(
        stage,
        ProxyStage::Aborted(AbortReason::InvalidName(NameError::TooLong { length: 81, max: 80, .. }))
    ));
    assert_eq!(harness.sent_messages().len(), 1);
    assert!(harness.webhook_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn system_tag_is_appended_to_name() {
    let harness = Harness::new(vec![alice()]);
    let ctx = proxy_bot::domain::MessageContext {
        system_tag: Some("| Sys".into()),
        tag_enabled: true,
        ..context()
    };

    harness
        .service()
        .run(trigger(100, "A:hello"), &text_channel(ALL), &ctx, true)
        .await;

    assert_eq!(harness.webhook_requests()[0].name, "Alice | Sys");
}

#[tokio::test(start_paused = true)]
async fn longest_tag_wins_regardless_of_member_order() {
    let bob = member(BOB, "Bob", vec![tag("[", "]")]);
    let alice = member(ALICE, "Alice", vec![tag("[[", "]]")]);

    for members in [vec![bob.clone(), alice.clone()], vec![alice.clone(), bob.clone()]] {
        let harness = Harness::new(members);
        harness
            .service()
            .run(trigger(100, "[[hi]]"), &text_channel(ALL), &context(), true)
            .await;

        let requests = harness.webhook_requests();
        assert_eq!(requests[0].name, "Alice");
        assert_eq!(requests[0].content, "hi");
    }
}

#[test_case("A:", ""; "prefix only")]
#[test_case("", "-a"; "suffix only")]
#[test_case("[", "]"; "brackets")]
#[test_case("{{", "}}"; "double braces")]
#[test_case("\u{1F31F}", "\u{1F31F}"; "emoji")]
fn wrapped_text_matches_its_tag(prefix: &str, suffix: &str) {
    let members = vec![member(ALICE, "Alice", vec![tag(prefix, suffix)])];
    let content = format!("{}some text{}", prefix, suffix);

    let found = ProxyMatcher::default()
        .try_match(&context(), &members, &content, false, true, Utc::now())
        .expect("tag should match");

    assert_eq!(found.member.id, ALICE);
    assert_eq!(found.content, "some text");
    assert!(matches!(found.source, MatchSource::Tag(_)));
}

#[test]
fn equal_length_tags_prefer_earlier_member() {
    let members = vec![
        member(BOB, "Bob", vec![tag("x", "")]),
        member(ALICE, "Alice", vec![tag("", "y")]),
    ];

    let found = ProxyMatcher::default()
        .try_match(&context(), &members, "x hello y", false, true, Utc::now())
        .expect("tag should match");

    assert_eq!(found.member.id, BOB);
}
