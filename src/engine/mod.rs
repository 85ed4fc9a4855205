// =============================================================================
// Recompute Controller — the serialized mutation entry point
// =============================================================================
//
// One task owns the whole engine state: the candle store, the active
// indicator instances, and their computed output channels.  Every mutation —
// stream ingest, indicator add/remove, visibility or parameter change,
// subscription switch — arrives as a command on a single queue and is handled
// to completion before the next one.  No locks guard the state because no one
// else can touch it.
//
// Each mutation triggers a full recompute of every active instance over the
// entire timeline (confirmed history + the forming candle as the provisional
// last element) and republishes an immutable snapshot for the read side.
// Identical candle sequence + parameters always yields bit-identical output;
// nothing in the compute path reads the wall clock.
// =============================================================================

pub mod channels;
pub mod instance;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::indicators;
use crate::market_data::{BarEventKind, CandleStore, StreamMessage};
use crate::registry::{self, IndicatorKind, ParamType};

pub use channels::{align, Channel, ChannelSet, DataPoint, Series};
pub use instance::{IndicatorInstance, IndicatorParams};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Every mutation the engine accepts.  All state changes funnel through here.
#[derive(Debug)]
pub enum EngineCommand {
    /// A normalized stream message (forming / confirmed / historical /
    /// subscription ack).
    Ingest(StreamMessage),
    /// Add an indicator instance; replies with its opaque handle.
    AddIndicator {
        kind: IndicatorKind,
        params: IndicatorParams,
        reply: oneshot::Sender<Result<Uuid>>,
    },
    /// Remove an instance.  Unknown ids are logged and ignored.
    RemoveIndicator { id: Uuid },
    /// Toggle visibility; triggers a recompute like any other mutation.
    SetVisible { id: Uuid, visible: bool },
    /// Replace an instance's parameters wholesale.
    UpdateParams {
        id: Uuid,
        params: IndicatorParams,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Add every indicator of a named preset atomically.
    ApplyPreset {
        name: String,
        reply: oneshot::Sender<Result<Vec<Uuid>>>,
    },
    /// Change the subscription: clears all candles and all outputs.
    SwitchSubscription { symbol: String, timeframe: String },
}

// ---------------------------------------------------------------------------
// Published snapshot
// ---------------------------------------------------------------------------

/// Computed output for one instance, as published to consumers.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorOutput {
    pub id: Uuid,
    pub kind: IndicatorKind,
    pub visible: bool,
    pub channels: ChannelSet,
}

/// Immutable view of the engine state after a recompute pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineSnapshot {
    pub symbol: String,
    pub timeframe: String,
    pub state_version: u64,
    /// Timeline length: confirmed candles plus the forming tail.
    pub candle_count: usize,
    pub confirmed_count: usize,
    /// Outputs in instance-insertion order.
    pub outputs: Vec<IndicatorOutput>,
}

/// Shared read side: the latest snapshot plus a monotonically increasing
/// version counter bumped on every republish.
struct Published {
    snapshot: RwLock<Arc<EngineSnapshot>>,
    version: AtomicU64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The engine state machine.  Owned by exactly one task; see [`spawn`].
pub struct ChartEngine {
    symbol: String,
    timeframe: String,
    store: CandleStore,
    instances: Vec<IndicatorInstance>,
    outputs: HashMap<Uuid, ChannelSet>,
    published: Arc<Published>,
}

impl ChartEngine {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>, max_candles: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            store: CandleStore::new(max_candles),
            instances: Vec::new(),
            outputs: HashMap::new(),
            published: Arc::new(Published {
                snapshot: RwLock::new(Arc::new(EngineSnapshot::default())),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Spawn the engine task and return a cloneable command handle.
    pub fn spawn(
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        max_candles: usize,
    ) -> (EngineHandle, tokio::task::JoinHandle<()>) {
        let mut engine = Self::new(symbol, timeframe, max_candles);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = EngineHandle {
            tx,
            published: engine.published.clone(),
        };

        let task = tokio::spawn(async move {
            // Commands queue while a recompute runs; each one is handled to
            // completion before the next is drained.
            while let Some(cmd) = rx.recv().await {
                engine.apply(cmd);
            }
            info!("engine command channel closed — controller exiting");
        });

        (handle, task)
    }

    /// Handle one command to completion, recomputing and republishing when
    /// the command mutated anything.
    pub fn apply(&mut self, cmd: EngineCommand) {
        let changed = match cmd {
            EngineCommand::Ingest(msg) => self.ingest(msg),
            EngineCommand::AddIndicator { kind, params, reply } => {
                let result = self.add_indicator(kind, params);
                let changed = result.is_ok();
                let _ = reply.send(result);
                changed
            }
            EngineCommand::RemoveIndicator { id } => self.remove_indicator(id),
            EngineCommand::SetVisible { id, visible } => self.set_visible(id, visible),
            EngineCommand::UpdateParams { id, params, reply } => {
                let result = self.update_params(id, params);
                let changed = result.is_ok();
                let _ = reply.send(result);
                changed
            }
            EngineCommand::ApplyPreset { name, reply } => {
                let result = self.apply_preset(&name);
                let changed = result.is_ok();
                let _ = reply.send(result);
                changed
            }
            EngineCommand::SwitchSubscription { symbol, timeframe } => {
                self.switch_subscription(symbol, timeframe);
                true
            }
        };

        if changed {
            self.recompute_and_publish();
        }
    }

    // ── Ingest ──────────────────────────────────────────────────────────

    /// Classify and apply one stream message.  Returns `true` when the
    /// candle series changed.
    fn ingest(&mut self, msg: StreamMessage) -> bool {
        match msg.kind {
            BarEventKind::Subscribed => {
                if msg.symbol != self.symbol {
                    // The echoed symbol disagrees with what we asked for.
                    // Not corrected automatically; the log line is the only
                    // trace of the mismatch.
                    warn!(
                        requested = %self.symbol,
                        echoed = %msg.symbol,
                        "subscription ack symbol mismatch"
                    );
                } else {
                    info!(symbol = %self.symbol, timeframe = %self.timeframe, "subscription acknowledged");
                }
                false
            }
            BarEventKind::Forming => {
                if msg.symbol != self.symbol {
                    debug!(symbol = %msg.symbol, "forming bar for other symbol dropped");
                    return false;
                }
                self.store.apply_forming(msg.candle())
            }
            BarEventKind::Confirmed | BarEventKind::Historical => {
                if msg.symbol != self.symbol {
                    debug!(symbol = %msg.symbol, "bar for other symbol dropped");
                    return false;
                }
                self.store.apply_confirmed(msg.candle())
            }
        }
    }

    // ── Instance management ─────────────────────────────────────────────

    fn add_indicator(&mut self, kind: IndicatorKind, params: IndicatorParams) -> Result<Uuid> {
        let instance = IndicatorInstance::new(kind, params);
        validate_params(kind, &instance.params)?;

        let id = instance.id;
        info!(kind = %kind, id = %id, "indicator added");
        self.instances.push(instance);
        Ok(id)
    }

    fn remove_indicator(&mut self, id: Uuid) -> bool {
        match self.instances.iter().position(|i| i.id == id) {
            Some(pos) => {
                let removed = self.instances.remove(pos);
                self.outputs.remove(&id);
                info!(kind = %removed.kind, id = %id, "indicator removed");
                true
            }
            None => {
                warn!(id = %id, "remove requested for unknown indicator");
                false
            }
        }
    }

    fn set_visible(&mut self, id: Uuid, visible: bool) -> bool {
        match self.instances.iter_mut().find(|i| i.id == id) {
            Some(instance) => {
                instance.visible = visible;
                true
            }
            None => {
                warn!(id = %id, "visibility change for unknown indicator");
                false
            }
        }
    }

    fn update_params(&mut self, id: Uuid, params: IndicatorParams) -> Result<()> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown indicator instance {id}"))?;

        let completed = params.complete_for(instance.kind);
        validate_params(instance.kind, &completed)?;
        instance.params = completed;
        Ok(())
    }

    /// Apply a named preset atomically: every entry is validated before any
    /// instance is created, so a bad entry adds nothing.
    fn apply_preset(&mut self, name: &str) -> Result<Vec<Uuid>> {
        let preset =
            registry::preset(name).ok_or_else(|| anyhow::anyhow!("unknown preset '{name}'"))?;

        let mut pending = Vec::with_capacity(preset.entries.len());
        for entry in &preset.entries {
            let params = IndicatorParams::from_period_color(entry.period, Some(entry.color));
            let instance = IndicatorInstance::new(entry.kind, params);
            validate_params(entry.kind, &instance.params)?;
            pending.push(instance);
        }

        let ids: Vec<Uuid> = pending.iter().map(|i| i.id).collect();
        info!(preset = name, count = ids.len(), "preset applied");
        self.instances.extend(pending);
        Ok(ids)
    }

    // ── Subscription switch ─────────────────────────────────────────────

    /// Discard all candles and computed outputs and adopt the new
    /// subscription.  The caller is responsible for tearing down the old
    /// stream (with reconnect disabled) and dialing the new one.
    fn switch_subscription(&mut self, symbol: String, timeframe: String) {
        info!(
            from_symbol = %self.symbol,
            from_timeframe = %self.timeframe,
            to_symbol = %symbol,
            to_timeframe = %timeframe,
            "switching subscription — clearing state"
        );
        self.symbol = symbol;
        self.timeframe = timeframe;
        self.store.clear();
        self.outputs.clear();
    }

    // ── Recompute ───────────────────────────────────────────────────────

    /// Re-run every active instance against the full timeline and publish a
    /// fresh snapshot.  Prior results are replaced wholesale, never patched.
    fn recompute_and_publish(&mut self) {
        let timeline = self.store.timeline();

        self.outputs.clear();
        for instance in &self.instances {
            let channels = indicators::compute(instance.kind, &timeline, &instance.params);
            debug_assert!(channels.is_aligned(timeline.len()));
            self.outputs.insert(instance.id, channels);
        }

        let version = self.published.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = EngineSnapshot {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            state_version: version,
            candle_count: self.store.len(),
            confirmed_count: self.store.confirmed_len(),
            outputs: self
                .instances
                .iter()
                .map(|i| IndicatorOutput {
                    id: i.id,
                    kind: i.kind,
                    visible: i.visible,
                    channels: self.outputs.get(&i.id).cloned().unwrap_or_default(),
                })
                .collect(),
        };

        *self.published.snapshot.write() = Arc::new(snapshot);
        debug!(version, candles = self.store.len(), "snapshot published");
    }

    // Test accessors.
    #[cfg(test)]
    fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.published.snapshot.read().clone()
    }
}

/// Reject degenerate window parameters at the boundary instead of letting
/// them silently degrade to empty output.  Calculators stay total either
/// way: any period paired with any history length yields a full-length,
/// warmup-padded channel.
fn validate_params(kind: IndicatorKind, params: &IndicatorParams) -> Result<()> {
    for spec in registry::descriptor(kind).params {
        if spec.kind != ParamType::Number {
            continue;
        }
        let is_window =
            spec.name == "period" || spec.name.ends_with("_period") || spec.name == "rows";
        if !is_window {
            continue;
        }
        let value = params.number(spec.name).unwrap_or(f64::NAN);
        if !value.is_finite() || value < 1.0 {
            anyhow::bail!(
                "{} requires {} >= 1, got {}",
                registry::descriptor(kind).display_name,
                spec.name,
                value
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to a spawned engine: the public surface for the UI /
/// session layer and the stream feed.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
    published: Arc<Published>,
}

impl EngineHandle {
    /// Forward one stream message into the command queue.
    pub fn ingest(&self, msg: StreamMessage) {
        let _ = self.tx.send(EngineCommand::Ingest(msg));
    }

    /// Add an indicator with the common (kind, period, color) surface.
    pub async fn add_indicator(
        &self,
        kind: IndicatorKind,
        period: Option<u32>,
        color: Option<&str>,
    ) -> Result<Uuid> {
        let params = IndicatorParams::from_period_color(period, color);
        self.add_indicator_with(kind, params).await
    }

    /// Add an indicator with a full parameter map.
    pub async fn add_indicator_with(
        &self,
        kind: IndicatorKind,
        params: IndicatorParams,
    ) -> Result<Uuid> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::AddIndicator { kind, params, reply })
            .map_err(|_| anyhow::anyhow!("engine is not running"))?;
        rx.await.map_err(|_| anyhow::anyhow!("engine dropped the reply"))?
    }

    pub fn remove_indicator(&self, id: Uuid) {
        let _ = self.tx.send(EngineCommand::RemoveIndicator { id });
    }

    pub fn set_visible(&self, id: Uuid, visible: bool) {
        let _ = self.tx.send(EngineCommand::SetVisible { id, visible });
    }

    pub async fn update_params(&self, id: Uuid, params: IndicatorParams) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::UpdateParams { id, params, reply })
            .map_err(|_| anyhow::anyhow!("engine is not running"))?;
        rx.await.map_err(|_| anyhow::anyhow!("engine dropped the reply"))?
    }

    pub async fn apply_preset(&self, name: &str) -> Result<Vec<Uuid>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::ApplyPreset {
                name: name.to_string(),
                reply,
            })
            .map_err(|_| anyhow::anyhow!("engine is not running"))?;
        rx.await.map_err(|_| anyhow::anyhow!("engine dropped the reply"))?
    }

    pub fn switch_subscription(&self, symbol: impl Into<String>, timeframe: impl Into<String>) {
        let _ = self.tx.send(EngineCommand::SwitchSubscription {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        });
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.published.snapshot.read().clone()
    }

    /// The current publish version.
    pub fn state_version(&self) -> u64 {
        self.published.version.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(kind: BarEventKind, time: i64, close: f64) -> StreamMessage {
        StreamMessage {
            kind,
            symbol: "BTCUSDT".to_string(),
            ts_start_ms: time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    fn engine() -> ChartEngine {
        ChartEngine::new("BTCUSDT", "1m", 500)
    }

    fn add(engine: &mut ChartEngine, kind: IndicatorKind, period: Option<u32>) -> Uuid {
        engine
            .add_indicator(kind, IndicatorParams::from_period_color(period, None))
            .expect("add should succeed")
    }

    #[test]
    fn confirmed_duplicates_are_idempotent() {
        let mut eng = engine();
        eng.apply(EngineCommand::Ingest(bar(BarEventKind::Confirmed, 0, 10.0)));
        eng.apply(EngineCommand::Ingest(bar(BarEventKind::Confirmed, 0, 10.0)));
        assert_eq!(eng.snapshot().confirmed_count, 1);
    }

    #[test]
    fn forming_is_provisional_tail() {
        let mut eng = engine();
        let id = add(&mut eng, IndicatorKind::Sma, Some(3));
        eng.apply(EngineCommand::Ingest(bar(BarEventKind::Confirmed, 0, 10.0)));
        eng.apply(EngineCommand::Ingest(bar(
            BarEventKind::Forming,
            60_000,
            11.0,
        )));

        let snap = eng.snapshot();
        assert_eq!(snap.confirmed_count, 1);
        assert_eq!(snap.candle_count, 2);

        let out = snap.outputs.iter().find(|o| o.id == id).unwrap();
        // Channels track the timeline including the forming tail.
        assert_eq!(out.channels.primary.len(), 2);
    }

    #[test]
    fn outputs_align_with_timeline() {
        let mut eng = engine();
        let id = add(&mut eng, IndicatorKind::Sma, Some(3));
        for i in 0..5 {
            eng.apply(EngineCommand::Ingest(bar(
                BarEventKind::Confirmed,
                i * 60_000,
                10.0 + i as f64,
            )));
        }
        let snap = eng.snapshot();
        let out = snap.outputs.iter().find(|o| o.id == id).unwrap();
        assert!(out.channels.is_aligned(5));
        // First period-1 points are warmup.
        assert_eq!(out.channels.primary[0].value, None);
        assert_eq!(out.channels.primary[1].value, None);
        assert!(out.channels.primary[2].value.is_some());
    }

    #[test]
    fn zero_period_rejected_at_boundary() {
        let mut eng = engine();
        let result =
            eng.add_indicator(IndicatorKind::Rsi, IndicatorParams::from_period_color(Some(0), None));
        assert!(result.is_err());
        assert!(eng.instances.is_empty());
    }

    #[test]
    fn remove_unknown_is_a_noop() {
        let mut eng = engine();
        assert!(!eng.remove_indicator(Uuid::new_v4()));
    }

    #[test]
    fn remove_drops_outputs() {
        let mut eng = engine();
        let id = add(&mut eng, IndicatorKind::Ema, Some(5));
        eng.apply(EngineCommand::Ingest(bar(BarEventKind::Confirmed, 0, 10.0)));
        assert!(eng.outputs.contains_key(&id));
        eng.apply(EngineCommand::RemoveIndicator { id });
        assert!(!eng.outputs.contains_key(&id));
        assert!(eng.snapshot().outputs.is_empty());
    }

    #[test]
    fn switch_subscription_resets_everything() {
        let mut eng = engine();
        add(&mut eng, IndicatorKind::Rsi, Some(14));
        for i in 0..10 {
            eng.apply(EngineCommand::Ingest(bar(
                BarEventKind::Confirmed,
                i * 60_000,
                10.0 + i as f64,
            )));
        }
        assert_eq!(eng.snapshot().confirmed_count, 10);

        eng.apply(EngineCommand::SwitchSubscription {
            symbol: "ETHUSDT".to_string(),
            timeframe: "5m".to_string(),
        });

        let snap = eng.snapshot();
        assert_eq!(snap.symbol, "ETHUSDT");
        assert_eq!(snap.candle_count, 0);
        // Instances survive the switch but their outputs are recomputed
        // against the empty timeline.
        assert_eq!(snap.outputs.len(), 1);
        assert!(snap.outputs[0].channels.primary.is_empty());
    }

    #[test]
    fn bars_for_other_symbols_are_dropped() {
        let mut eng = engine();
        let mut msg = bar(BarEventKind::Confirmed, 0, 10.0);
        msg.symbol = "DOGEUSDT".to_string();
        eng.apply(EngineCommand::Ingest(msg));
        assert_eq!(eng.store.confirmed_len(), 0);
    }

    #[test]
    fn subscription_ack_mismatch_is_not_corrected() {
        let mut eng = engine();
        let mut ack = bar(BarEventKind::Subscribed, 0, 0.0);
        ack.symbol = "ETHUSDT".to_string();
        eng.apply(EngineCommand::Ingest(ack));
        // The local subscription stays as requested.
        assert_eq!(eng.symbol, "BTCUSDT");
    }

    #[test]
    fn visibility_flag_round_trips_to_snapshot() {
        let mut eng = engine();
        let id = add(&mut eng, IndicatorKind::Sma, Some(3));
        eng.apply(EngineCommand::SetVisible { id, visible: false });
        let snap = eng.snapshot();
        assert!(!snap.outputs[0].visible);
    }

    #[test]
    fn update_params_triggers_recompute() {
        let mut eng = engine();
        let id = add(&mut eng, IndicatorKind::Sma, Some(2));
        for i in 0..4 {
            eng.apply(EngineCommand::Ingest(bar(
                BarEventKind::Confirmed,
                i * 60_000,
                10.0,
            )));
        }
        // Period 2: warmup ends at index 1.
        assert!(eng.snapshot().outputs[0].channels.primary[1].value.is_some());

        let result = eng.update_params(id, IndicatorParams::from_period_color(Some(4), None));
        assert!(result.is_ok());
        eng.recompute_and_publish();
        let snap = eng.snapshot();
        assert_eq!(snap.outputs[0].channels.primary[2].value, None);
        assert!(snap.outputs[0].channels.primary[3].value.is_some());
    }

    #[test]
    fn update_params_rejects_zero_period() {
        let mut eng = engine();
        let id = add(&mut eng, IndicatorKind::Sma, Some(2));
        assert!(eng
            .update_params(id, IndicatorParams::from_period_color(Some(0), None))
            .is_err());
        // Original params untouched.
        let inst = eng.instances.iter().find(|i| i.id == id).unwrap();
        assert_eq!(inst.params.window("period"), 2);
    }

    #[test]
    fn preset_applies_atomically() {
        let mut eng = engine();
        let ids = eng.apply_preset("momentum-suite").expect("preset exists");
        assert_eq!(ids.len(), 3);
        assert_eq!(eng.instances.len(), 3);
        assert!(eng.apply_preset("does-not-exist").is_err());
        assert_eq!(eng.instances.len(), 3);
    }

    #[test]
    fn version_bumps_on_every_mutation() {
        let mut eng = engine();
        let v0 = eng.published.version.load(Ordering::SeqCst);
        eng.apply(EngineCommand::Ingest(bar(BarEventKind::Confirmed, 0, 10.0)));
        let v1 = eng.published.version.load(Ordering::SeqCst);
        assert!(v1 > v0);
        // An ack mutates nothing and publishes nothing.
        eng.apply(EngineCommand::Ingest(bar(BarEventKind::Subscribed, 0, 0.0)));
        assert_eq!(eng.published.version.load(Ordering::SeqCst), v1);
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let run = || {
            let mut eng = engine();
            let id = add(&mut eng, IndicatorKind::Rsi, Some(5));
            for i in 0..30 {
                let close = 100.0 + ((i * 7) % 13) as f64;
                eng.apply(EngineCommand::Ingest(bar(
                    BarEventKind::Confirmed,
                    i * 60_000,
                    close,
                )));
            }
            let snap = eng.snapshot();
            let out = snap.outputs.iter().find(|o| o.id == id).unwrap();
            out.channels
                .primary
                .iter()
                .map(|p| p.value)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
