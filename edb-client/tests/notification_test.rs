//! Unsolicited frames pushed by the node

mod common;

use common::{notification_frame, MockNode};
use edb_client::{create_instance, Notification};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("edb_client=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_notification_reaches_handler() {
    init_tracing();

    let node = MockNode::with_session(|mut session| async move {
        while let Some(request) = session.next_request().await {
            session
                .send_text(notification_frame("NewBlock", json!({"height": 5})))
                .await;
            session.reply_from_fixtures(&request).await;
        }
    })
    .await;
    let client = create_instance(node.url(), false).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .on_notification("NewBlock", move |notification: Notification| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(notification);
            }
        })
        .await;

    client.start().await.unwrap();
    let height = client.blockchain().get_latest_block_height().await.unwrap();
    assert_eq!(height.height, 0);

    let notification = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notification.method, "NewBlock");
    assert_eq!(notification.params, Some(json!({"height": 5})));

    client.close().await;
}

#[tokio::test]
async fn test_unhandled_notification_is_ignored() {
    init_tracing();

    let node = MockNode::with_session(|mut session| async move {
        while let Some(request) = session.next_request().await {
            session
                .send_text(notification_frame("Unknown", json!(null)))
                .await;
            session.reply_from_fixtures(&request).await;
        }
    })
    .await;
    let client = create_instance(node.url(), false).unwrap();
    client.start().await.unwrap();

    let moniker = client.network().get_moniker().await.unwrap();
    assert_eq!(moniker.moniker, "anothertester");
    assert!(client.is_open());
    assert_eq!(client.pending_count().await, 0);

    client.close().await;
}
