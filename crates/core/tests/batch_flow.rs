use std::sync::Arc;

use serde_json::json;
use tabsum_core::confirm::{ConfirmChoice, ConfirmationPrompt, confirmation_url};
use tabsum_core::pending::pending_batch_key;
use tabsum_core::testing::{
    MemoryRecordStore, RecordingOpener, RecordingPresenter, StaticTabSource, eligible_window, tab,
};
use tabsum_core::{BatchOpener, DecisionResponse, Ports, Scope, Tab, TriggerOutcome};
use tabsum_runtime_config::{BatchSettings, DEFAULT_CONFIRM_PAGE};

struct World {
    source: Arc<StaticTabSource>,
    records: Arc<MemoryRecordStore>,
    opener: Arc<RecordingOpener>,
    presenter: Arc<RecordingPresenter>,
    batch: BatchOpener,
}

fn world(tabs: Vec<Tab>) -> World {
    let source = Arc::new(StaticTabSource::new(tabs));
    let records = Arc::new(MemoryRecordStore::new());
    let opener = Arc::new(RecordingOpener::new());
    let presenter = Arc::new(RecordingPresenter::new());
    let batch = BatchOpener::new(
        Ports {
            tabs: source.clone(),
            opener: opener.clone(),
            store: records.clone(),
            presenter: presenter.clone(),
        },
        &BatchSettings::default(),
    );
    World {
        source,
        records,
        opener,
        presenter,
        batch,
    }
}

#[tokio::test]
async fn large_window_is_staged_confirmed_and_refiltered() {
    let w = world(eligible_window(20));
    let trigger = tab(0, 0, "https://example.com/page/0");

    let outcome = w.batch.trigger(&trigger, Scope::All).await.expect("trigger");
    let TriggerOutcome::AwaitingConfirmation(token) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert!(w.opener.opened().is_empty());
    assert_eq!(w.presenter.requests(), vec![(token.clone(), 20, Scope::All)]);
    let staged = w
        .batch
        .pending()
        .consume(&token)
        .await
        .expect("consume")
        .expect("staged batch");
    assert_eq!(staged.len(), 20);

    // The user closes a tab while the dialog is open.
    w.source.close(7);

    let prompt = ConfirmationPrompt::from_query(&confirmation_url(
        DEFAULT_CONFIRM_PAGE,
        &token,
        20,
        Scope::All,
    ));
    assert!(prompt.message().contains("open 20 Open+Summarize tabs for all tabs"));
    let signal = prompt
        .signal_for(ConfirmChoice::Continue)
        .expect("run signal");

    let response = w
        .batch
        .handler()
        .handle_message(&signal.to_message())
        .await
        .expect("response");
    assert_eq!(response, DecisionResponse::ok());

    let expected: Vec<i64> = (0..20).rev().filter(|id| *id != 7).collect();
    assert_eq!(w.opener.opened_ids(), expected);
    assert!(!w.records.snapshot().contains_key(&pending_batch_key(&token)));

    let replay = w.batch.handler().handle_message(&signal.to_message()).await;
    assert_eq!(
        replay,
        Some(DecisionResponse::failed("no pending batch found"))
    );
    assert_eq!(w.opener.opened().len(), 19);
}

#[tokio::test]
async fn selected_scope_opens_only_eligible_highlighted_tabs() {
    let mut tabs = vec![
        tab(1, 0, "https://a.example"),
        tab(2, 1, "https://b.example"),
        tab(3, 2, "chrome://settings"),
        tab(4, 3, "https://d.example"),
        tab(5, 4, "about:blank"),
        tab(6, 5, "https://not-selected.example"),
    ];
    for t in tabs.iter_mut().take(5) {
        t.highlighted = true;
    }
    let w = world(tabs);

    let outcome = w
        .batch
        .trigger(&tab(2, 1, "https://b.example"), Scope::Selected)
        .await
        .expect("trigger");
    let TriggerOutcome::Opened(report) = outcome else {
        panic!("expected immediate open, got {outcome:?}");
    };
    assert_eq!(report.opened_ids(), vec![4, 2, 1]);
    assert_eq!(w.opener.opened(), vec![(4, Some(3)), (2, Some(1)), (1, Some(0))]);
    assert_eq!(w.records.writes(), 0);
    assert!(w.presenter.requests().is_empty());
}

#[tokio::test]
async fn cancel_discards_the_staged_batch() {
    let w = world(eligible_window(40));
    let outcome = w
        .batch
        .trigger(&tab(0, 0, "https://example.com"), Scope::All)
        .await
        .expect("trigger");
    let TriggerOutcome::AwaitingConfirmation(token) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };

    let cancel = json!({ "action": "CANCEL_OPEN_SUMMARIZE_BATCH", "token": token });
    assert_eq!(
        w.batch.handler().handle_message(&cancel).await,
        Some(DecisionResponse::ok())
    );
    assert!(w.records.snapshot().is_empty());

    let run = json!({ "action": "RUN_OPEN_SUMMARIZE_BATCH", "token": token });
    let response = w.batch.handler().handle_message(&run).await.expect("response");
    assert!(!response.ok);
    assert!(w.opener.opened().is_empty());
}

#[tokio::test]
async fn two_windows_stage_independent_batches() {
    let mut tabs = eligible_window(16);
    tabs.extend((100..130).map(|i| {
        let mut t = tab(i, i - 100, "https://other.example");
        t.window_id = Some(2);
        t
    }));
    let w = world(tabs);

    let mut other_trigger = tab(100, 0, "https://other.example");
    other_trigger.window_id = Some(2);

    let first = w
        .batch
        .trigger(&tab(0, 0, "https://example.com"), Scope::All)
        .await
        .expect("trigger first");
    let second = w
        .batch
        .trigger(&other_trigger, Scope::All)
        .await
        .expect("trigger second");
    let (TriggerOutcome::AwaitingConfirmation(a), TriggerOutcome::AwaitingConfirmation(b)) =
        (first, second)
    else {
        panic!("both windows should need confirmation");
    };
    assert_ne!(a, b);
    assert_eq!(w.records.snapshot().len(), 2);

    let response = w
        .batch
        .handler()
        .handle(tabsum_core::ConfirmationSignal::Run(b.clone()))
        .await;
    assert!(response.ok);
    assert_eq!(w.opener.opened().len(), 30);
    assert!(w.opener.opened_ids().iter().all(|id| *id >= 100));

    let remaining = w.batch.pending().list().await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token, a);
}
