//! Resource hook behaviour against the in-memory data service.

use async_trait::async_trait;
use oficina_sdk::config::ACTIVE_COLUMN;
use oficina_sdk::models::{MechanicPatch, Mechanics, NewMechanic, NewProduct, Products};
use oficina_sdk::{
    AppError, Filter, MemoryDataService, NotificationLevel, NotificationLog, RemoteDataService, RemoteError,
    RemoteErrorKind, Reply, Resource, ResourceHook, ResourceStore, Row, TableSpec,
};
use rstest::{fixture, rstest};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

const SCHEMA: &str = "public";

struct Fixture {
    service: Arc<MemoryDataService>,
    log: Arc<NotificationLog>,
    hook: ResourceHook<Mechanics>,
}

#[fixture]
fn shop() -> Fixture {
    let service = Arc::new(MemoryDataService::new());
    let log = Arc::new(NotificationLog::new());
    let hook = ResourceHook::new(ResourceStore::new(service.clone(), SCHEMA), log.clone());
    Fixture { service, log, hook }
}

fn mechanic(name: &str) -> NewMechanic {
    NewMechanic {
        name: Some(name.into()),
        phone: Some("(11) 98888-7777".into()),
        specialty: Some("injeção eletrônica".into()),
        ..NewMechanic::default()
    }
}

#[rstest]
#[tokio::test]
async fn created_record_shows_up_active(shop: Fixture) {
    let created = shop.hook.create(mechanic("João")).await.expect("create");
    assert!(created.is_active);

    let records = shop.hook.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, created.id);
    assert!(records[0].is_active);
    assert!(!shop.hook.is_loading());

    let last = shop.log.last().expect("notification");
    assert_eq!(last.level, NotificationLevel::Success);
    assert_eq!(last.message, Mechanics::MESSAGES.created);
}

#[rstest]
#[tokio::test]
async fn created_record_round_trips_by_id(shop: Fixture) {
    let new = NewMechanic {
        email: Some("joao@oficina.test".into()),
        ..mechanic("João")
    };
    let created = shop.hook.create(new.clone()).await.expect("create");
    let fetched = shop.hook.store().fetch(created.id).await.expect("fetch").expect("present");
    assert_eq!(Some(fetched.name), new.name);
    assert_eq!(Some(fetched.phone), new.phone);
    assert_eq!(fetched.email, new.email);
    assert_eq!(fetched.specialty, new.specialty);
}

#[rstest]
#[tokio::test]
async fn removed_record_leaves_list_but_not_table(shop: Fixture) {
    let keep = shop.hook.create(mechanic("Ana")).await.expect("create");
    let gone = shop.hook.create(mechanic("Bruno")).await.expect("create");

    shop.hook.remove(gone.id).await.expect("remove");
    let ids: Vec<_> = shop.hook.records().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![keep.id]);

    let table = Mechanics::table_spec(SCHEMA);
    let stored = shop.service.rows(&table);
    assert_eq!(stored.len(), 2);
    let removed_row = stored
        .iter()
        .find(|r| r.get("id").and_then(Value::as_str) == Some(gone.id.to_string().as_str()))
        .expect("row kept");
    assert_eq!(removed_row.get(ACTIVE_COLUMN), Some(&Value::Bool(false)));
}

#[rstest]
#[tokio::test]
async fn removing_twice_is_not_an_error(shop: Fixture) {
    let m = shop.hook.create(mechanic("Carlos")).await.expect("create");
    shop.hook.remove(m.id).await.expect("first remove");
    shop.hook.remove(m.id).await.expect("second remove");

    let fetched = shop.hook.store().fetch(m.id).await.expect("fetch").expect("present");
    assert!(!fetched.is_active);
    assert!(shop.hook.records().is_empty());
}

#[rstest]
#[tokio::test]
async fn update_applies_patch_and_keeps_other_fields(shop: Fixture) {
    let m = shop.hook.create(mechanic("Diego")).await.expect("create");
    let patch = MechanicPatch {
        specialty: Some(Some("suspensão".into())),
        ..MechanicPatch::default()
    };
    shop.hook.update(m.id, patch).await.expect("update");

    let records = shop.hook.records();
    let updated = records.iter().find(|r| r.id == m.id).expect("listed");
    assert_eq!(updated.specialty.as_deref(), Some("suspensão"));
    assert_eq!(updated.name, m.name);
    assert_eq!(updated.phone, m.phone);
    assert!(updated.updated_at >= m.updated_at);
    assert_eq!(shop.log.last().map(|n| n.message), Some(Mechanics::MESSAGES.updated.to_string()));
}

#[rstest]
#[tokio::test]
async fn update_with_null_clears_nullable_fields(shop: Fixture) {
    let m = shop
        .hook
        .create(NewMechanic {
            email: Some("joao@oficina.test".into()),
            ..mechanic("João")
        })
        .await
        .expect("create");
    let patch = MechanicPatch {
        email: Some(None),
        ..MechanicPatch::default()
    };
    shop.hook.update(m.id, patch).await.expect("update");

    let fetched = shop.hook.store().fetch(m.id).await.expect("fetch").expect("present");
    assert_eq!(fetched.email, None);
    assert_eq!(fetched.specialty, m.specialty);
    let listed = shop.hook.records();
    assert_eq!(listed.iter().find(|r| r.id == m.id).map(|r| r.email.clone()), Some(None));
}

#[rstest]
#[tokio::test]
async fn missing_required_field_is_rejected_by_the_service(shop: Fixture) {
    shop.hook.create(mechanic("Ana")).await.expect("create");
    let before = shop.hook.records();
    shop.log.take();

    let err = shop
        .hook
        .create(NewMechanic {
            name: Some("João".into()),
            ..NewMechanic::default()
        })
        .await
        .unwrap_err();

    match &err {
        AppError::Remote(e) => assert_eq!(e.kind, RemoteErrorKind::Constraint),
        other => panic!("unexpected error: {other:?}"),
    }
    let notes = shop.log.take();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert!(notes[0].message.contains("telefone"));
    assert_eq!(shop.hook.records(), before);
}

#[rstest]
#[tokio::test]
async fn failure_without_service_message_uses_fallback(shop: Fixture) {
    let m = shop.hook.create(mechanic("Eva")).await.expect("create");
    shop.service.fail_next(RemoteError::network(""));
    let err = shop.hook.update(m.id, MechanicPatch::default()).await.unwrap_err();
    assert!(matches!(err, AppError::Remote(_)));
    assert_eq!(
        shop.log.last().map(|n| n.message),
        Some(Mechanics::MESSAGES.update_failed.to_string())
    );
}

#[rstest]
#[tokio::test]
async fn list_failure_keeps_previous_collection(shop: Fixture) {
    shop.hook.create(mechanic("Fábio")).await.expect("create");
    let before = shop.hook.records();

    shop.service.fail_next(RemoteError::network("connection reset by peer"));
    shop.hook.list().await;

    assert_eq!(shop.hook.records(), before);
    assert!(!shop.hook.is_loading());
    let last = shop.log.last().expect("notification");
    assert_eq!(last.level, NotificationLevel::Error);
    assert_eq!(last.message, Mechanics::MESSAGES.load_failed);
}

#[rstest]
#[tokio::test]
async fn list_of_empty_table_is_empty(shop: Fixture) {
    shop.hook.list().await;
    assert!(shop.hook.records().is_empty());
    assert!(shop.log.entries().is_empty());
}

#[tokio::test]
async fn product_lookups_by_code_and_restock() {
    let service = Arc::new(MemoryDataService::new());
    let store: ResourceStore<Products> = ResourceStore::new(service, SCHEMA);
    store
        .insert(&NewProduct {
            code: Some("OL-20W50".into()),
            name: Some("Óleo 20W50".into()),
            price_cents: Some(3990),
            stock: Some(2),
            min_stock: Some(5),
            ..NewProduct::default()
        })
        .await
        .expect("insert oil");
    store
        .insert(&NewProduct {
            code: Some("VL-NGK".into()),
            name: Some("Vela NGK".into()),
            stock: Some(30),
            min_stock: Some(10),
            ..NewProduct::default()
        })
        .await
        .expect("insert plug");

    let oil = store.find_by_code("OL-20W50").await.expect("lookup").expect("found");
    assert_eq!(oil.price_cents, 3990);
    assert!(store.find_by_code("XX").await.expect("lookup").is_none());

    let restock: Vec<_> = store.restock_list().await.expect("restock").into_iter().map(|p| p.code).collect();
    assert_eq!(restock, vec!["OL-20W50".to_string()]);

    let dup = store
        .insert(&NewProduct {
            code: Some("VL-NGK".into()),
            name: Some("Outra vela".into()),
            ..NewProduct::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(dup, AppError::Remote(ref e) if e.kind == RemoteErrorKind::Conflict));
}

/// Holds selects until released, so tests can order overlapping responses.
struct GatedService {
    inner: MemoryDataService,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    started: mpsc::UnboundedSender<()>,
}

impl GatedService {
    fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            GatedService {
                inner: MemoryDataService::new(),
                gates: Mutex::new(VecDeque::new()),
                started: tx,
            },
            rx,
        )
    }

    fn hold_next_select(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl RemoteDataService for GatedService {
    async fn select(&self, table: &TableSpec, filter: &Filter) -> Reply<Vec<Row>> {
        let reply = self.inner.select(table, filter).await;
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = self.started.send(());
            let _ = gate.await;
        }
        reply
    }

    async fn insert(&self, table: &TableSpec, record: Row) -> Reply<Row> {
        self.inner.insert(table, record).await
    }

    async fn update(&self, table: &TableSpec, filter: &Filter, patch: Row) -> Reply<()> {
        self.inner.update(table, filter, patch).await
    }

    async fn ping(&self) -> Reply<()> {
        self.inner.ping().await
    }
}

#[tokio::test]
async fn overlapping_lists_keep_the_last_response_to_arrive() {
    let (service, mut started) = GatedService::new();
    let service = Arc::new(service);
    let store: ResourceStore<Mechanics> = ResourceStore::new(service.clone(), SCHEMA);
    let hook = ResourceHook::new(store.clone(), Arc::new(NotificationLog::new()));

    let ana = store.insert(&mechanic("Ana")).await.expect("insert");

    let release_first = service.hold_next_select();
    let slow = {
        let hook = hook.clone();
        tokio::spawn(async move { hook.list().await })
    };
    started.recv().await.expect("first select started");
    assert!(hook.is_loading());

    let bruno = store.insert(&mechanic("Bruno")).await.expect("insert");
    hook.list().await;
    let ids: Vec<_> = hook.records().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![ana.id, bruno.id]);

    release_first.send(()).expect("release");
    slow.await.expect("slow list");

    let ids: Vec<_> = hook.records().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![ana.id], "stale response resolved last and wins");
    assert!(!hook.is_loading());
}

#[tokio::test]
async fn pending_list_keeps_loading_flag_set() {
    let (service, mut started) = GatedService::new();
    let service = Arc::new(service);
    let hook: ResourceHook<Mechanics> =
        ResourceHook::new(ResourceStore::new(service.clone(), SCHEMA), Arc::new(NotificationLog::new()));

    let release = service.hold_next_select();
    let pending = {
        let hook = hook.clone();
        tokio::spawn(async move { hook.list().await })
    };
    started.recv().await.expect("select started");
    assert!(hook.is_loading());

    release.send(()).expect("release");
    pending.await.expect("list");
    assert!(!hook.is_loading());
}
