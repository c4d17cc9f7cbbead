//! Integration tests for alert fan-out and the domination pathway

mod common;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{domination, smartvol, CountingDomination, FailingStrategy, PanickingStrategy, RecordingStrategy, SYMBOL};
use signal_router::adapters::{MemoryNotifier, PaperExchange};
use signal_router::router::LoggingDominationHandler;
use signal_router::{
    AlertRouter, Bot, BotConfig, BotRegistry, DispatchReport, DominationType, SharedStrategy, SmartVolType,
    StrategyTag,
};

fn idle(config: BotConfig) -> Bot {
    Bot::new(
        config,
        Arc::new(PaperExchange::new()),
        Arc::new(MemoryNotifier::new()),
    )
}

fn bot(config: BotConfig, strategy: SharedStrategy) -> Bot {
    idle(config).with_strategy(strategy)
}

fn domination_bot(name: &str) -> Bot {
    idle(BotConfig::new(name, "100", "50").with_strategy(StrategyTag::Domination))
}

fn router(bots: Vec<Bot>, handler: Arc<CountingDomination>) -> AlertRouter {
    AlertRouter::new(Arc::new(bots.into_iter().collect::<BotRegistry>()), handler)
}

// ============================================================================
// SmartVol fan-out
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_fan_out_skips_bots_filtered_by_symbol() {
    let recorder = Arc::new(RecordingStrategy::default());
    let bots = vec![
        bot(
            BotConfig::new("btc_only", "100", "50").with_symbols([SYMBOL]),
            recorder.clone(),
        ),
        bot(
            BotConfig::new("eth_only", "100", "50").with_symbols(["ETHUSDT"]),
            recorder.clone(),
        ),
        bot(BotConfig::new("any", "100", "50"), recorder.clone()),
    ];
    let router = router(bots, Arc::new(CountingDomination::default()));

    let report = router
        .dispatch(&smartvol(SmartVolType::SmartOpen, "1h", dec!(100)))
        .await;

    assert_eq!(recorder.bots_seen().await, vec!["btc_only", "any"]);
    assert_eq!(report.delivered, vec!["btc_only", "any"]);
    assert_eq!(report.skipped, vec!["eth_only"]);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_failing_bot_does_not_stop_later_bots() {
    let recorder = Arc::new(RecordingStrategy::default());
    let bots = vec![
        bot(BotConfig::new("broken", "100", "50"), Arc::new(FailingStrategy)),
        bot(BotConfig::new("healthy", "100", "50"), recorder.clone()),
    ];
    let router = router(bots, Arc::new(CountingDomination::default()));

    let report = router
        .dispatch(&smartvol(SmartVolType::SmartClose, "1h", dec!(100)))
        .await;

    assert_eq!(recorder.bots_seen().await, vec!["healthy"]);
    assert_eq!(report.delivered, vec!["healthy"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].bot, "broken");
    assert!(report.failed[0].reason.contains("exchange unavailable"));
}

#[tokio::test]
async fn test_panicking_bot_is_isolated() {
    let recorder = Arc::new(RecordingStrategy::default());
    let bots = vec![
        bot(BotConfig::new("first", "100", "50"), recorder.clone()),
        bot(BotConfig::new("buggy", "100", "50"), Arc::new(PanickingStrategy)),
        bot(BotConfig::new("last", "100", "50"), recorder.clone()),
    ];
    let router = router(bots, Arc::new(CountingDomination::default()));

    let report = router
        .dispatch(&smartvol(SmartVolType::SmartBigClose, "4h", dec!(100)))
        .await;

    assert_eq!(recorder.bots_seen().await, vec!["first", "last"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].bot, "buggy");
    assert!(report.failed[0].reason.contains("strategy bug"));
}

#[tokio::test]
async fn test_bot_without_strategy_counts_as_delivered() {
    let router = router(
        vec![idle(BotConfig::new("idle", "100", "50"))],
        Arc::new(CountingDomination::default()),
    );

    let report = router
        .dispatch(&smartvol(SmartVolType::VolumeUp, "1h", dec!(100)).with_volume(dec!(5)))
        .await;

    assert_eq!(report.delivered, vec!["idle"]);
}

#[tokio::test]
async fn test_smartvol_never_reaches_domination_handler() {
    let handler = Arc::new(CountingDomination::default());
    let router = router(vec![domination_bot("dom")], handler.clone());

    router
        .dispatch(&smartvol(SmartVolType::SmartOpen, "1h", dec!(100)))
        .await;

    assert_eq!(handler.total(), 0);
}

// ============================================================================
// Domination
// ============================================================================

#[tokio::test]
async fn test_domination_with_no_domination_bots_is_noop() {
    let recorder = Arc::new(RecordingStrategy::default());
    let handler = Arc::new(CountingDomination::default());
    let router = router(
        vec![bot(BotConfig::new("smart", "100", "50"), recorder.clone())],
        handler.clone(),
    );

    let report = router
        .dispatch(&domination(DominationType::BuyerDomination, SYMBOL))
        .await;

    assert_eq!(report, DispatchReport::default());
    assert_eq!(handler.total(), 0);
    assert!(recorder.bots_seen().await.is_empty());
}

#[tokio::test]
async fn test_domination_types_map_to_entry_points() {
    let handler = Arc::new(CountingDomination::default());
    let router = router(vec![domination_bot("dom")], handler.clone());

    for kind in DominationType::ALL {
        router.dispatch(&domination(kind, SYMBOL)).await;
    }
    router
        .dispatch(&domination(DominationType::SellerDomination, SYMBOL))
        .await;

    assert_eq!(handler.buyer.load(Ordering::SeqCst), 1);
    assert_eq!(handler.seller.load(Ordering::SeqCst), 2);
    assert_eq!(handler.buyer_continuation.load(Ordering::SeqCst), 1);
    assert_eq!(handler.seller_continuation.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_domination_only_reaches_tagged_bots() {
    let recorder = Arc::new(RecordingStrategy::default());
    let handler = Arc::new(CountingDomination::default());
    let bots = vec![
        bot(BotConfig::new("smart", "100", "50"), recorder.clone()),
        domination_bot("dom_a"),
        idle(
            BotConfig::new("dom_eth", "100", "50")
                .with_strategy(StrategyTag::Domination)
                .with_symbols(["ETHUSDT"]),
        ),
        domination_bot("dom_b"),
    ];
    let router = router(bots, handler.clone());

    let report = router
        .dispatch(&domination(DominationType::BuyerContinuation, SYMBOL))
        .await;

    assert_eq!(*handler.calls.lock().await, vec!["dom_a", "dom_b"]);
    assert_eq!(report.delivered, vec!["dom_a", "dom_b"]);
    assert_eq!(report.skipped, vec!["dom_eth"]);
    assert!(recorder.bots_seen().await.is_empty());
}

#[tokio::test]
async fn test_domination_failure_is_per_bot() {
    let handler = Arc::new(CountingDomination::failing_for(&["dom_a"]));
    let router = router(
        vec![domination_bot("dom_a"), domination_bot("dom_b")],
        handler.clone(),
    );

    let report = router
        .dispatch(&domination(DominationType::SellerContinuation, SYMBOL))
        .await;

    assert_eq!(handler.seller_continuation.load(Ordering::SeqCst), 2);
    assert_eq!(report.delivered, vec!["dom_b"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].bot, "dom_a");
}

#[tokio::test]
async fn test_logging_handler_notifies_bot() {
    let notifier = Arc::new(MemoryNotifier::new());
    let dom = Bot::new(
        BotConfig::new("dom", "100", "50").with_strategy(StrategyTag::Domination),
        Arc::new(PaperExchange::new()),
        notifier.clone(),
    );
    let router = AlertRouter::new(
        Arc::new(std::iter::once(dom).collect::<BotRegistry>()),
        Arc::new(LoggingDominationHandler),
    );

    let report = router
        .dispatch(&domination(DominationType::BuyerDomination, SYMBOL))
        .await;

    assert_eq!(report.delivered, vec!["dom"]);
    let messages = notifier.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains(SYMBOL));
}
