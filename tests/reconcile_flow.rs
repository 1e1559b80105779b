//! Reconciliation workflow tests against synthetic collaborators.
//!
//! The store and the operator surface are replaced with scripted
//! implementations so every path of the workflow can be driven without
//! a database or a UI.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

use stockscan::error::{Error, Result};
use stockscan::interaction::{InteractionSurface, PromptResponse};
use stockscan::record_store::{
    CollectKind, InventoryRecord, ItemRow, ItemWrite, NewItemInput, RecordStore,
};
use stockscan::scan_log::ScanLog;
use stockscan::scan_workflow::{DecodedScan, ScanOrigin, ScanOutcome, ScanPhase, ScanWorkflow};

/// In-memory record store with scriptable failures
struct MemoryStore {
    items: Mutex<HashMap<String, ItemWrite>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
}

impl MemoryStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(HashMap::new()),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            fail_get: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
        })
    }

    async fn preload(&self, barcode: &str, item: ItemWrite) {
        self.items
            .lock()
            .await
            .insert(barcode.to_string(), item);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, barcode: &str) -> Result<Option<ItemRow>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Error::Internal("store offline".to_string()));
        }

        let items = self.items.lock().await;
        Ok(items.get(barcode).map(|item| ItemRow {
            barcode: barcode.to_string(),
            name: Some(item.name.clone()),
            sku: item.sku.clone(),
            description: item.description.clone(),
            total_stock: item.total_stock,
            on_floor: item.on_floor,
            in_back: item.in_back,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    }

    async fn set(&self, barcode: &str, item: &ItemWrite) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Error::Internal("write denied".to_string()));
        }

        self.items
            .lock()
            .await
            .insert(barcode.to_string(), item.clone());
        Ok(())
    }
}

enum Reply {
    Submit(NewItemInput),
    Cancel,
}

/// Operator surface with scripted replies. With a gate set, collect
/// parks until the test releases it, to hold the workflow mid-prompt.
struct ScriptedSurface {
    replies: Mutex<VecDeque<Reply>>,
    collected: Mutex<Vec<(String, CollectKind)>>,
    displayed: Mutex<Vec<(InventoryRecord, bool)>>,
    errors: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSurface {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            collected: Mutex::new(Vec::new()),
            displayed: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    fn gated(replies: Vec<Reply>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            collected: Mutex::new(Vec::new()),
            displayed: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            gate: Some(gate),
        })
    }
}

#[async_trait]
impl InteractionSurface for ScriptedSurface {
    async fn display(&self, record: &InventoryRecord, created: bool) {
        self.displayed.lock().await.push((record.clone(), created));
    }

    async fn collect(&self, barcode: &str, kind: CollectKind) -> Result<PromptResponse> {
        self.collected
            .lock()
            .await
            .push((barcode.to_string(), kind));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .expect("no scripted reply left");
        Ok(match reply {
            Reply::Submit(input) => PromptResponse::Submitted(input),
            Reply::Cancel => PromptResponse::Cancelled,
        })
    }

    async fn report_error(&self, barcode: &str, message: &str) {
        self.errors
            .lock()
            .await
            .push(format!("{}: {}", barcode, message));
    }
}

fn workflow(store: Arc<MemoryStore>, surface: Arc<ScriptedSurface>) -> Arc<ScanWorkflow> {
    Arc::new(ScanWorkflow::new(
        store,
        surface,
        Arc::new(ScanLog::new(100)),
    ))
}

fn scan(barcode: &str) -> DecodedScan {
    DecodedScan {
        barcode: barcode.to_string(),
        origin: ScanOrigin::Scan,
    }
}

fn detail_scan(barcode: &str) -> DecodedScan {
    DecodedScan {
        barcode: barcode.to_string(),
        origin: ScanOrigin::Detail,
    }
}

fn named(name: &str) -> NewItemInput {
    NewItemInput {
        name: name.to_string(),
        ..Default::default()
    }
}

async fn wait_for_phase(workflow: &ScanWorkflow, phase: ScanPhase) {
    for _ in 0..200 {
        if workflow.phase().await == phase {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("workflow never reached {:?}", phase);
}

#[tokio::test]
async fn unknown_barcode_prompts_and_never_displays() {
    let store = MemoryStore::new();
    let surface = ScriptedSurface::new(vec![Reply::Cancel]);
    let workflow = workflow(store.clone(), surface.clone());

    let outcome = workflow.process(scan("012345")).await;
    assert!(matches!(outcome, ScanOutcome::Cancelled));

    let collected = surface.collected.lock().await;
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0], ("012345".to_string(), CollectKind::Minimal));
    assert!(surface.displayed.lock().await.is_empty());
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
    assert_eq!(workflow.phase().await, ScanPhase::Idle);
}

#[tokio::test]
async fn known_barcode_displays_exact_record_without_write() {
    let store = MemoryStore::new();
    store
        .preload(
            "099999",
            ItemWrite {
                name: "Bolt".to_string(),
                sku: None,
                description: None,
                total_stock: Some(50),
                on_floor: Some(10),
                in_back: Some(40),
            },
        )
        .await;
    let surface = ScriptedSurface::new(vec![]);
    let workflow = workflow(store.clone(), surface.clone());

    let outcome = workflow.process(scan("099999")).await;
    let record = match outcome {
        ScanOutcome::Displayed(record) => record,
        other => panic!("expected display, got {:?}", other),
    };

    assert_eq!(record.barcode, "099999");
    assert_eq!(record.name, "Bolt");
    assert_eq!(record.total_stock, 50);
    assert_eq!(record.on_floor, 10);
    assert_eq!(record.in_back, 40);

    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
    assert!(surface.collected.lock().await.is_empty());

    let displayed = surface.displayed.lock().await;
    assert_eq!(displayed.len(), 1);
    assert!(!displayed[0].1);
}

#[tokio::test]
async fn overlapping_scans_drop_until_guard_clears() {
    let store = MemoryStore::new();
    let gate = Arc::new(Notify::new());
    let surface = ScriptedSurface::gated(vec![Reply::Submit(named("Widget"))], gate.clone());
    let workflow = workflow(store.clone(), surface.clone());

    let first = {
        let workflow = workflow.clone();
        tokio::spawn(async move { workflow.process(scan("012345")).await })
    };

    wait_for_phase(&workflow, ScanPhase::AwaitingInput).await;

    // Same key and a different key both drop while the prompt is open
    assert!(matches!(
        workflow.process(scan("012345")).await,
        ScanOutcome::Dropped
    ));
    assert!(matches!(
        workflow.process(scan("555555")).await,
        ScanOutcome::Dropped
    ));
    assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);

    gate.notify_one();
    let outcome = first.await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Created(_)));
    assert_eq!(workflow.phase().await, ScanPhase::Idle);
    assert_eq!(store.sets.load(Ordering::SeqCst), 1);

    let stats = workflow.stats_snapshot();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.created, 1);
}

#[tokio::test]
async fn lookup_failure_reports_and_releases_guard() {
    let store = MemoryStore::new();
    let surface = ScriptedSurface::new(vec![Reply::Cancel]);
    let workflow = workflow(store.clone(), surface.clone());

    store.fail_get.store(true, Ordering::SeqCst);
    let outcome = workflow.process(scan("000111")).await;
    assert!(matches!(outcome, ScanOutcome::Failed(_)));
    assert_eq!(surface.errors.lock().await.len(), 1);
    assert_eq!(workflow.phase().await, ScanPhase::Idle);

    // A later scan of the same key triggers a fresh lookup
    store.fail_get.store(false, Ordering::SeqCst);
    let outcome = workflow.process(scan("000111")).await;
    assert!(matches!(outcome, ScanOutcome::Cancelled));
    assert_eq!(store.gets.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn persist_failure_reports_and_releases_guard() {
    let store = MemoryStore::new();
    let surface = ScriptedSurface::new(vec![Reply::Submit(named("Widget")), Reply::Cancel]);
    let workflow = workflow(store.clone(), surface.clone());

    store.fail_set.store(true, Ordering::SeqCst);
    let outcome = workflow.process(scan("012345")).await;
    assert!(matches!(outcome, ScanOutcome::Failed(_)));
    assert_eq!(surface.errors.lock().await.len(), 1);
    assert!(store.items.lock().await.is_empty());
    assert_eq!(workflow.phase().await, ScanPhase::Idle);

    // Workflow stays usable after the failed write
    let outcome = workflow.process(scan("012345")).await;
    assert!(matches!(outcome, ScanOutcome::Cancelled));
}

#[tokio::test]
async fn empty_name_is_rejected_without_write() {
    let store = MemoryStore::new();
    let surface = ScriptedSurface::new(vec![Reply::Submit(named("   "))]);
    let workflow = workflow(store.clone(), surface.clone());

    let outcome = workflow.process(scan("012345")).await;
    assert!(matches!(outcome, ScanOutcome::Rejected(_)));
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
    assert_eq!(surface.errors.lock().await.len(), 1);
    assert_eq!(workflow.phase().await, ScanPhase::Idle);
}

#[tokio::test]
async fn minimal_prompt_creates_and_then_finds_the_record() {
    let store = MemoryStore::new();
    let surface = ScriptedSurface::new(vec![Reply::Submit(named("Widget"))]);
    let workflow = workflow(store.clone(), surface.clone());

    let outcome = workflow.process(scan("012345")).await;
    let record = match outcome {
        ScanOutcome::Created(record) => record,
        other => panic!("expected creation, got {:?}", other),
    };
    assert_eq!(record.name, "Widget");

    // Minimal kind persisted the name only
    let items = store.items.lock().await;
    let stored = items.get("012345").unwrap();
    assert_eq!(stored.name, "Widget");
    assert_eq!(stored.sku, None);
    assert_eq!(stored.total_stock, None);
    drop(items);

    {
        let displayed = surface.displayed.lock().await;
        assert_eq!(displayed.len(), 1);
        assert!(displayed[0].1);
    }

    // Re-scan resolves without prompting again
    let outcome = workflow.process(scan("012345")).await;
    assert!(matches!(outcome, ScanOutcome::Displayed(_)));
    assert_eq!(surface.collected.lock().await.len(), 1);
}

#[tokio::test]
async fn full_form_coerces_bad_counts_to_zero() {
    let store = MemoryStore::new();
    let surface = ScriptedSurface::new(vec![Reply::Submit(NewItemInput {
        name: "Gadget".to_string(),
        sku: Some("G-1".to_string()),
        description: Some("demo unit".to_string()),
        total_stock: Some("abc".to_string()),
        on_floor: Some("7".to_string()),
        in_back: Some("-2".to_string()),
    })]);
    let workflow = workflow(store.clone(), surface.clone());

    let outcome = workflow.process(detail_scan("424242")).await;
    let record = match outcome {
        ScanOutcome::Created(record) => record,
        other => panic!("expected creation, got {:?}", other),
    };

    assert_eq!(record.total_stock, 0);
    assert_eq!(record.on_floor, 7);
    assert_eq!(record.in_back, 0);

    let collected = surface.collected.lock().await;
    assert_eq!(collected[0].1, CollectKind::Full);

    let items = store.items.lock().await;
    let stored = items.get("424242").unwrap();
    assert_eq!(stored.total_stock, Some(0));
    assert_eq!(stored.on_floor, Some(7));
}
