//! Integration tests for [`handler_chain::HandlerChain`].
//!
//! Covers: before/after run once around handle, before returning false stopping the chain,
//! Reply stopping the handle phase and reaching every after(), Ignore/Continue passing on,
//! and before/after ordering across several handlers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use dbot_core::{Chat, Handler, HandlerResponse, Message, MessageChain, MessageKind, User};
use handler_chain::HandlerChain;

fn create_test_message(content: &str) -> Message {
    Message {
        id: "test_message_id".to_string(),
        user: User {
            id: 123,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        chat: Chat {
            id: 456,
            kind: MessageKind::Private,
        },
        session_id: "456".to_string(),
        content: content.to_string(),
        created_at: Utc::now(),
    }
}

/// Counts calls to each phase.
#[derive(Default)]
struct CountingHandler {
    before: AtomicUsize,
    handle: AtomicUsize,
    after: AtomicUsize,
}

#[async_trait::async_trait]
impl Handler for CountingHandler {
    async fn before(&self, _message: &Message) -> dbot_core::Result<bool> {
        self.before.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn handle(&self, _message: &Message) -> dbot_core::Result<HandlerResponse> {
        self.handle.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerResponse::Continue)
    }

    async fn after(&self, _message: &Message, _response: &HandlerResponse) -> dbot_core::Result<()> {
        self.after.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ReplyHandler(&'static str);

#[async_trait::async_trait]
impl Handler for ReplyHandler {
    async fn handle(&self, _message: &Message) -> dbot_core::Result<HandlerResponse> {
        Ok(HandlerResponse::Reply(MessageChain::text(self.0)))
    }
}

/// **Test: each phase runs once for a single handler; an all-Continue chain returns Continue.**
#[tokio::test]
async fn test_handler_chain_with_handler() {
    let counting = Arc::new(CountingHandler::default());
    let chain = HandlerChain::new().add_handler(counting.clone());

    let result = chain.handle(&create_test_message("test")).await.unwrap();

    assert_eq!(result, HandlerResponse::Continue);
    assert_eq!(counting.before.load(Ordering::SeqCst), 1);
    assert_eq!(counting.handle.load(Ordering::SeqCst), 1);
    assert_eq!(counting.after.load(Ordering::SeqCst), 1);
}

/// **Test: before returning false stops the chain; no handle runs.**
#[tokio::test]
async fn test_handler_stops_chain() {
    struct BlockingHandler;

    #[async_trait::async_trait]
    impl Handler for BlockingHandler {
        async fn before(&self, _message: &Message) -> dbot_core::Result<bool> {
            Ok(false)
        }
    }

    let counting = Arc::new(CountingHandler::default());
    let chain = HandlerChain::new()
        .add_handler(Arc::new(BlockingHandler))
        .add_handler(counting.clone());

    let result = chain.handle(&create_test_message("test")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(counting.handle.load(Ordering::SeqCst), 0);
}

/// **Test: Reply ends the handle phase; later handlers are skipped and after() sees the reply.**
#[tokio::test]
async fn test_reply_stops_chain_and_passes_to_after() {
    struct CaptureResponse {
        seen: Mutex<Option<HandlerResponse>>,
    }

    #[async_trait::async_trait]
    impl Handler for CaptureResponse {
        async fn after(&self, _message: &Message, response: &HandlerResponse) -> dbot_core::Result<()> {
            *self.seen.lock().unwrap() = Some(response.clone());
            Ok(())
        }
    }

    let capture = Arc::new(CaptureResponse {
        seen: Mutex::new(None),
    });
    let skipped = Arc::new(CountingHandler::default());
    let chain = HandlerChain::new()
        .add_handler(capture.clone())
        .add_handler(Arc::new(ReplyHandler("pong")))
        .add_handler(skipped.clone());

    let result = chain.handle(&create_test_message("ping")).await.unwrap();

    let expected = HandlerResponse::Reply(MessageChain::text("pong"));
    assert_eq!(result, expected);
    assert_eq!(*capture.seen.lock().unwrap(), Some(expected));
    assert_eq!(skipped.handle.load(Ordering::SeqCst), 0);
    assert_eq!(skipped.after.load(Ordering::SeqCst), 1);
}

/// **Test: Ignore passes control to the next handler.**
#[tokio::test]
async fn test_ignore_tries_next_handler() {
    struct IgnoreHandler;

    #[async_trait::async_trait]
    impl Handler for IgnoreHandler {
        async fn handle(&self, _message: &Message) -> dbot_core::Result<HandlerResponse> {
            Ok(HandlerResponse::Ignore)
        }
    }

    let chain = HandlerChain::new()
        .add_handler(Arc::new(IgnoreHandler))
        .add_handler(Arc::new(ReplyHandler("second")));

    let result = chain.handle(&create_test_message("x")).await.unwrap();
    assert_eq!(result, HandlerResponse::Reply(MessageChain::text("second")));
}

/// **Test: before runs first→last, after runs last→first.**
#[tokio::test]
async fn test_multiple_handlers_executed_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    struct OrderHandler {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Handler for OrderHandler {
        async fn before(&self, _message: &Message) -> dbot_core::Result<bool> {
            self.order.lock().unwrap().push(format!("before_{}", self.name));
            Ok(true)
        }

        async fn after(&self, _message: &Message, _response: &HandlerResponse) -> dbot_core::Result<()> {
            self.order.lock().unwrap().push(format!("after_{}", self.name));
            Ok(())
        }
    }

    let chain = HandlerChain::new()
        .add_handler(Arc::new(OrderHandler {
            name: "first",
            order: order.clone(),
        }))
        .add_handler(Arc::new(OrderHandler {
            name: "second",
            order: order.clone(),
        }));

    chain.handle(&create_test_message("test")).await.unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["before_first", "before_second", "after_second", "after_first"]
    );
}

/// **Test: a handler error propagates to the caller.**
#[tokio::test]
async fn test_handler_error_propagates() {
    struct FailingHandler;

    #[async_trait::async_trait]
    impl Handler for FailingHandler {
        async fn handle(&self, _message: &Message) -> dbot_core::Result<HandlerResponse> {
            Err(dbot_core::DbotError::Handler("empty content".to_string()))
        }
    }

    let chain = HandlerChain::new().add_handler(Arc::new(FailingHandler));
    let result = chain.handle(&create_test_message("")).await;
    assert!(matches!(
        result,
        Err(dbot_core::DbotError::Handler(ref reason)) if reason == "empty content"
    ));
}
