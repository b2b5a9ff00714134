//! End-to-end tests binding entities as actors into schedulers.
//!
//! Entity ownership and action scheduling are orthogonal: these tests
//! exercise both halves of the kernel together, the way surrounding code
//! uses them.

use actions::{
    Action, ActionContext, ContextState, DefaultActionScheduler, NoopActionEngine, Result,
    TokioActionEngine,
};
use assert_matches::assert_matches;
use async_trait::async_trait;
use config::EngineSettings;
use entities::{DefaultEntity, DefaultEntityContainer, EntityError, EntityEvent, EntityListener};
use pulse_e2e_tests::{attr_int, init_tracing};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Periodic action bumping a counter attribute on its entity
struct TickAttribute;

#[async_trait]
impl Action<DefaultEntity> for TickAttribute {
    async fn perform(
        &self,
        actor: &Arc<DefaultEntity>,
        _ctx: &ActionContext<DefaultEntity>,
    ) -> Result<()> {
        let ticks = match actor.attributes().get("ticks") {
            Some(entities::AttributeValue::Int(value)) => value,
            _ => 0,
        };
        actor.attributes().set("ticks", ticks + 1);
        Ok(())
    }
}

#[derive(Default)]
struct CountingListener {
    created: AtomicUsize,
    killed: AtomicUsize,
    received: AtomicUsize,
    transferred: AtomicUsize,
}

impl EntityListener for CountingListener {
    fn entity_created(&self, _event: &EntityEvent) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    fn entity_killed(&self, _event: &EntityEvent) {
        self.killed.fetch_add(1, Ordering::SeqCst);
    }

    fn entity_received(&self, _event: &EntityEvent) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }

    fn entity_transferred(&self, _event: &EntityEvent) {
        self.transferred.fetch_add(1, Ordering::SeqCst);
    }
}

async fn wait_for_ticks(entity: &Arc<DefaultEntity>, at_least: i64) {
    while attr_int(entity, "ticks").unwrap_or(0) < at_least {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

#[tokio::test]
async fn entity_lifecycle_with_scheduled_work() {
    init_tracing();

    let container = DefaultEntityContainer::new();
    let listener = Arc::new(CountingListener::default());
    container.add_listener(listener.clone());

    let entity = container.new_entity().unwrap();
    assert_eq!(container.entity_count(), 1);
    assert_eq!(listener.created.load(Ordering::SeqCst), 1);

    let engine = Arc::new(TokioActionEngine::new());
    let scheduler = DefaultActionScheduler::with_engine(entity.clone(), engine.clone());

    let ctx = scheduler.schedule_for_actor(
        Arc::new(TickAttribute),
        Duration::ZERO,
        Duration::from_millis(5),
    );
    wait_for_ticks(&entity, 3).await;

    ctx.cancel();
    ctx.wait_done().await;
    assert_eq!(ctx.state(), ContextState::Cancelled);

    // Killing the entity is independent of its scheduled work
    assert!(container.kill_entity(entity.id()));
    assert!(!container.kill_entity(entity.id()));
    assert_eq!(listener.killed.load(Ordering::SeqCst), 1);
    assert_eq!(container.entity_count(), 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn transfer_does_not_disturb_scheduled_work() {
    init_tracing();

    let source = DefaultEntityContainer::new();
    let target = DefaultEntityContainer::new();
    let entity = source.new_entity().unwrap();

    let engine = Arc::new(TokioActionEngine::new());
    let scheduler = DefaultActionScheduler::with_engine(entity.clone(), engine.clone());
    let ctx = scheduler.schedule_for_actor(
        Arc::new(TickAttribute),
        Duration::ZERO,
        Duration::from_millis(3),
    );
    wait_for_ticks(&entity, 1).await;

    source.transfer_entity(entity.id(), &target).unwrap();
    assert!(!source.has_entity(entity.id()));
    assert!(target.has_entity(entity.id()));
    assert!(Arc::ptr_eq(&entity.owner().unwrap(), &target));

    // The periodic action keeps running under its engine after the move
    let before = attr_int(&entity, "ticks").unwrap();
    wait_for_ticks(&entity, before + 2).await;

    // A second transfer from the old owner must fail cleanly
    let err = source.transfer_entity(entity.id(), &target).unwrap_err();
    assert_matches!(err, EntityError::NotOwned { .. });

    ctx.cancel();
    ctx.wait_done().await;
    engine.shutdown().await;
}

#[tokio::test]
async fn engine_shutdown_drains_all_actors() {
    init_tracing();

    let container = DefaultEntityContainer::new();
    let engine = Arc::new(TokioActionEngine::with_settings(EngineSettings {
        name: "e2e".to_string(),
        ..EngineSettings::default()
    }));

    let mut contexts = Vec::new();
    let mut entities = Vec::new();
    for _ in 0..4 {
        let entity = container.new_entity().unwrap();
        let scheduler = DefaultActionScheduler::with_engine(entity.clone(), engine.clone());
        contexts.push(scheduler.schedule_for_actor(
            Arc::new(TickAttribute),
            Duration::ZERO,
            Duration::from_millis(3),
        ));
        entities.push(entity);
    }

    for entity in &entities {
        wait_for_ticks(entity, 1).await;
    }

    engine.shutdown().await;
    info!("engine drained");

    for ctx in &contexts {
        assert_eq!(ctx.state(), ContextState::Done);
    }
    assert_eq!(engine.active_contexts(), 0);

    // The container still owns every entity; only execution stopped
    assert_eq!(container.entity_count(), 4);

    // And a stopped engine only hands out inert contexts
    let scheduler = DefaultActionScheduler::with_engine(entities[0].clone(), engine);
    let inert = scheduler.new_context_for_actor(Arc::new(TickAttribute));
    assert!(inert.is_done());
}

#[tokio::test]
async fn noop_engine_never_touches_the_entity() {
    init_tracing();

    let container = DefaultEntityContainer::new();
    let entity = container.new_entity().unwrap();

    let scheduler =
        DefaultActionScheduler::with_engine(entity.clone(), Arc::new(NoopActionEngine::new()));
    let ctx = scheduler.schedule_for_actor(
        Arc::new(TickAttribute),
        Duration::ZERO,
        Duration::from_millis(1),
    );

    assert!(ctx.is_done());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(entity.attributes().get("ticks").is_none());
}

#[tokio::test]
async fn bulk_cancel_spans_only_the_current_engine() {
    init_tracing();

    let container = DefaultEntityContainer::new();
    let entity = container.new_entity().unwrap();

    let old_engine = Arc::new(TokioActionEngine::new());
    let scheduler = DefaultActionScheduler::with_engine(entity.clone(), old_engine.clone());
    let survivor = scheduler.schedule_for_actor(
        Arc::new(TickAttribute),
        Duration::ZERO,
        Duration::from_millis(3),
    );
    wait_for_ticks(&entity, 1).await;

    // Swap engines: the old context is abandoned for bulk-cancel purposes
    scheduler.set_engine(Arc::new(TokioActionEngine::new()));
    scheduler.cancel_all_scheduled_for_actor();

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!survivor.is_done());

    old_engine.shutdown().await;
    survivor.wait_done().await;
    assert_eq!(survivor.state(), ContextState::Done);
}
