//! # Integration Test Flows
//!
//! Drives units from a simulated routing engine through a [`Bridge`] built
//! from JSON configuration onto the in-memory bus, with real consumers on
//! the other side.
//!
//! ## Flows Tested:
//!
//! 1. **Publish**: every consumer at the address receives the unit
//! 2. **Point-to-point**: one consumer per unit, round-robin
//! 3. **Request-reply**: the reply lands in the unit's response slot
//! 4. **Failures**: recipient failure, missing handler, reply timeout and a
//!    closed bus all end up on the unit

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tracing::Instrument;

    use bridge_telemetry::{bridge_span, init_logging, TelemetryConfig};
    use bus_bridge::{
        AsyncProcessor, Bridge, BridgeConfig, BridgeError, Exchange, Processor, RouteMessage,
    };
    use serde_json::json;
    use shared_bus::{Body, BusError, InMemoryMessageBus, MultiMap};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CONFIG: &str = r#"{
        "send_timeout_ms": 2000,
        "inbound": [
            { "uri": "direct:orders", "address": "events.orders", "publish": true },
            { "uri": "direct:jobs", "address": "jobs" },
            { "uri": "direct:pricing", "address": "svc.pricing", "body_type": "json" },
            { "uri": "direct:quiet", "address": "svc.quiet", "headers_copy": false }
        ]
    }"#;

    fn setup() -> (Arc<InMemoryMessageBus>, Bridge<Arc<InMemoryMessageBus>>) {
        let _ = init_logging(&TelemetryConfig::from_env());

        let bus = Arc::new(InMemoryMessageBus::new());
        let config = BridgeConfig::from_json_str(CONFIG).expect("valid config");
        let bridge = Bridge::from_config(bus.clone(), &config).expect("bridge");
        (bus, bridge)
    }

    /// Run one unit through `uri` and wait for the completion callback
    async fn complete(
        bridge: &Bridge<Arc<InMemoryMessageBus>>,
        uri: &str,
        exchange: Exchange,
    ) -> (bool, Exchange, bool) {
        let processor = bridge.processor(uri).expect("uri bound");
        let (tx, rx) = oneshot::channel();
        let returned = processor.process_async(exchange, move |unit, sync| {
            let _ = tx.send((unit, sync));
        });
        let (unit, sync) = timeout(Duration::from_secs(5), rx)
            .await
            .expect("completion in time")
            .expect("completion delivered");
        (returned, unit, sync)
    }

    // =============================================================================
    // PUBLISH / POINT-TO-POINT
    // =============================================================================

    #[tokio::test]
    async fn test_publish_reaches_every_consumer() {
        let (bus, bridge) = setup();
        let mut first = bus.consumer("events.orders").expect("consumer");
        let mut second = bus.consumer("events.orders").expect("consumer");

        let exchange = Exchange::in_out(
            RouteMessage::new(json!({"order": 7}))
                .with_header("tenant", "acme")
                .with_header("tags", json!(["new", "priority"])),
        );
        let (returned, unit, sync) = complete(&bridge, "direct:orders", exchange).await;

        assert!(returned && sync);
        assert!(unit.out_message().is_none());
        assert!(!unit.is_failed());

        for consumer in [&mut first, &mut second] {
            let delivery = consumer.try_recv().expect("open").expect("delivered");
            assert_eq!(delivery.body(), &Body::from(json!({"order": 7})));
            assert_eq!(delivery.headers().get("tenant"), Some("acme"));
            assert_eq!(delivery.headers().get_all("tags"), vec!["new", "priority"]);
            assert!(!delivery.expects_reply());
        }
        assert_eq!(bridge.metrics().snapshot().published, 1);
    }

    #[tokio::test]
    async fn test_point_to_point_round_robin() {
        let (bus, bridge) = setup();
        let mut first = bus.consumer("jobs").expect("consumer");
        let mut second = bus.consumer("jobs").expect("consumer");

        for job in ["a", "b"] {
            let (returned, unit, sync) =
                complete(&bridge, "direct:jobs", Exchange::in_only(RouteMessage::new(job))).await;
            assert!(returned && sync);
            assert!(!unit.is_failed());
        }

        let got_first = first.try_recv().expect("open").expect("one job");
        let got_second = second.try_recv().expect("open").expect("one job");
        assert_ne!(got_first.body(), got_second.body());
        assert!(first.try_recv().expect("open").is_none());
        assert!(second.try_recv().expect("open").is_none());
    }

    #[tokio::test]
    async fn test_headers_copy_disabled() {
        let (bus, bridge) = setup();
        let mut consumer = bus.consumer("svc.quiet").expect("consumer");

        let exchange = Exchange::in_only(RouteMessage::new("x").with_header("secret", "s3cr3t"));
        complete(&bridge, "direct:quiet", exchange).await;

        let delivery = consumer.try_recv().expect("open").expect("delivered");
        assert!(delivery.headers().is_empty());
    }

    // =============================================================================
    // REQUEST-REPLY
    // =============================================================================

    #[tokio::test]
    async fn test_request_reply_round_trip() {
        let (bus, bridge) = setup();
        let mut consumer = bus.consumer("svc.pricing").expect("consumer");
        tokio::spawn(async move {
            while let Some(delivery) = consumer.recv().await {
                let sku = delivery
                    .body()
                    .as_json()
                    .and_then(|v| v["sku"].as_str())
                    .unwrap_or_default()
                    .to_string();
                delivery.reply(
                    json!({"sku": sku, "price": 42}),
                    MultiMap::new().with("via", "edge").with("via", "core"),
                );
            }
        });

        let exchange = Exchange::in_out(RouteMessage::new(r#"{"sku":"a"}"#));
        let (returned, unit, sync) = complete(&bridge, "direct:pricing", exchange)
            .instrument(bridge_span!("price_lookup", sku = "a"))
            .await;

        assert!(!returned);
        assert!(!sync);
        let out = unit.out_message().expect("reply written");
        assert_eq!(out.body, Body::from(json!({"sku": "a", "price": 42})));
        assert_eq!(out.headers.get("via"), Some(&json!(["edge", "core"])));
        assert!(!unit.is_failed());
    }

    #[tokio::test]
    async fn test_recipient_failure_recorded_on_unit() {
        let (bus, bridge) = setup();
        let mut consumer = bus.consumer("svc.pricing").expect("consumer");
        tokio::spawn(async move {
            if let Some(delivery) = consumer.recv().await {
                delivery.fail(404, "unknown sku");
            }
        });

        let exchange = Exchange::in_out(RouteMessage::new(json!({"sku": "zz"})));
        let (returned, unit, sync) = complete(&bridge, "direct:pricing", exchange).await;

        assert!(!returned && !sync);
        assert!(unit.out_message().is_none());
        assert_eq!(
            unit.failure(),
            Some(&BridgeError::Bus(BusError::RecipientFailure {
                code: 404,
                message: "unknown sku".into()
            }))
        );
        assert_eq!(bridge.metrics().snapshot().reply_failures, 1);
    }

    #[tokio::test]
    async fn test_request_without_handler_fails_asynchronously() {
        let (_bus, bridge) = setup();

        let exchange = Exchange::in_out(RouteMessage::new(json!({})));
        let (returned, unit, sync) = complete(&bridge, "direct:pricing", exchange).await;

        assert!(!returned && !sync);
        assert!(matches!(
            unit.failure(),
            Some(BridgeError::Bus(BusError::NoHandlers { address })) if address == "svc.pricing"
        ));
    }

    #[tokio::test]
    async fn test_reply_timeout_from_config() {
        let _ = init_logging(&TelemetryConfig::from_env());
        let bus = Arc::new(InMemoryMessageBus::new());
        let _silent = bus.consumer("svc.slow").expect("consumer");
        let config = BridgeConfig::from_json_str(
            r#"{ "send_timeout_ms": 25, "inbound": [ { "uri": "direct:slow", "address": "svc.slow" } ] }"#,
        )
        .expect("valid config");
        let bridge = Bridge::from_config(bus, &config).expect("bridge");

        let (returned, unit, sync) =
            complete(&bridge, "direct:slow", Exchange::in_out(RouteMessage::new("q"))).await;

        assert!(!returned && !sync);
        assert_eq!(
            unit.failure(),
            Some(&BridgeError::Bus(BusError::Timeout {
                address: "svc.slow".into(),
                timeout_ms: 25
            }))
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_each_complete_once() {
        let (bus, bridge) = setup();
        for _ in 0..3 {
            let mut consumer = bus.consumer("svc.pricing").expect("consumer");
            tokio::spawn(async move {
                while let Some(delivery) = consumer.recv().await {
                    let body = delivery.body().clone();
                    delivery.reply(body, MultiMap::new());
                }
            });
        }

        let processor = bridge.processor("direct:pricing").expect("bound");
        let units = (0..50).map(|i| {
            processor.process(Exchange::in_out(RouteMessage::new(json!({ "n": i }))))
        });
        let results = futures::future::join_all(units).await;

        for (i, result) in results.into_iter().enumerate() {
            let unit = result.expect("completion");
            let out = unit.out_message().expect("reply");
            assert_eq!(out.body, Body::from(json!({ "n": i })));
        }
        let snapshot = bridge.metrics().snapshot();
        assert_eq!(snapshot.requested, 50);
        assert_eq!(snapshot.replies_received, 50);
        assert_eq!(bridge.metrics().in_flight(), 0);
    }

    // =============================================================================
    // SYNCHRONOUS FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_closed_bus_fails_synchronously() {
        let (bus, bridge) = setup();
        bus.close();

        for uri in ["direct:orders", "direct:jobs", "direct:pricing"] {
            let exchange = Exchange::in_out(RouteMessage::new(json!({})));
            let (returned, unit, sync) = complete(&bridge, uri, exchange).await;
            assert!(returned && sync, "{uri} should complete synchronously");
            assert_eq!(unit.failure(), Some(&BridgeError::Bus(BusError::Closed)));
        }
        assert_eq!(bridge.metrics().snapshot().sync_failures, 3);
    }

    #[tokio::test]
    async fn test_invalid_json_body_never_reaches_bus() {
        let (bus, bridge) = setup();
        let mut consumer = bus.consumer("svc.pricing").expect("consumer");

        let exchange = Exchange::in_out(RouteMessage::new("not json"));
        let (returned, unit, sync) = complete(&bridge, "direct:pricing", exchange).await;

        assert!(returned && sync);
        assert!(matches!(unit.failure(), Some(BridgeError::Conversion(_))));
        assert!(consumer.try_recv().expect("open").is_none());
        assert_eq!(bus.requests_issued(), 0);
    }

    // =============================================================================
    // CONFIGURATION
    // =============================================================================

    #[tokio::test]
    async fn test_bridge_from_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(CONFIG.as_bytes()).expect("write config");

        let config = BridgeConfig::from_path(file.path()).expect("valid config");
        let bridge = Bridge::from_config(Arc::new(InMemoryMessageBus::new()), &config)
            .expect("bridge");

        assert_eq!(bridge.len(), 4);
        assert_eq!(bridge.settings().send_timeout(), Duration::from_millis(2000));
    }
}
