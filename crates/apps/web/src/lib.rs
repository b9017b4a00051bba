//! Browser binding for the explorer: JSON in, JSON out.
//!
//! The page hands over the two catalog trees once via [`init`], then forwards
//! every DOM event as a JSON [`Input`] through [`dispatch`]. Outputs reach the
//! page through the listener installed with [`set_listener`], one JSON
//! envelope per event.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use explorer::{Explorer, ExplorerConfig, ExplorerEvent, Input};
use persist::{InMemoryStateStore, LocalStorageStateStore, StateStore};
use runtime::{Event, ReentryLatch};
use serde::Serialize;
use tree::TreeSpec;
use wasm_bindgen::prelude::*;

// Guard to prevent double-initialization of global state (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

const STORAGE_PREFIX: &str = "moqua.state";

thread_local! {
    static EXPLORER: RefCell<Option<Explorer>> = const { RefCell::new(None) };
    static PENDING: RefCell<VecDeque<Step>> = const { RefCell::new(VecDeque::new()) };
    static DISPATCH_LATCH: ReentryLatch = ReentryLatch::new();
    static LISTENER: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
}

/// Unit of work queued for the dispatch loop.
#[derive(Debug)]
enum Step {
    Enable,
    Input(Input),
}

/// What the page's listener receives for each event.
#[derive(Serialize)]
struct Envelope<'a> {
    seq: u64,
    #[serde(flatten)]
    event: &'a ExplorerEvent,
    /// Ready-made query string for requests the page has to send.
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
}

impl<'a> Envelope<'a> {
    fn new(event: &'a Event<ExplorerEvent>) -> Self {
        let query = match &event.payload {
            ExplorerEvent::OverlayRefresh(req) => Some(req.to_query()),
            ExplorerEvent::ViewsQuery(q) => Some(q.to_query()),
            _ => None,
        };
        Envelope {
            seq: event.seq,
            event: &event.payload,
            query,
        }
    }
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

/// Browser storage when available, process memory otherwise.
fn state_store() -> Box<dyn StateStore> {
    match LocalStorageStateStore::new(STORAGE_PREFIX) {
        Ok(s) => Box::new(s),
        Err(e) => {
            tracing::warn!(error = %e, "localStorage unavailable, tree state will not survive reloads");
            Box::new(InMemoryStateStore::new())
        }
    }
}

fn page_identity() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

fn install(explorer: Explorer) {
    EXPLORER.with(|slot| *slot.borrow_mut() = Some(explorer));
    PENDING.with(|q| q.borrow_mut().clear());
}

/// Queues `step` and, unless a dispatch is already running further up the
/// stack, works the queue off. `deliver` runs after the explorer borrow is
/// released and may queue more work by re-entering.
fn pump(step: Step, deliver: &mut dyn FnMut(&Event<ExplorerEvent>)) -> Result<(), String> {
    PENDING.with(|q| q.borrow_mut().push_back(step));
    DISPATCH_LATCH.with(|latch| {
        let Some(_guard) = latch.try_enter() else {
            return Ok(());
        };
        while let Some(step) = PENDING.with(|q| q.borrow_mut().pop_front()) {
            let events = EXPLORER.with(|slot| {
                let mut slot = slot.borrow_mut();
                let Some(explorer) = slot.as_mut() else {
                    return Err("explorer not initialized".to_string());
                };
                match step {
                    Step::Enable => explorer.enable(),
                    Step::Input(input) => explorer.dispatch(input),
                }
                Ok(explorer.drain_events())
            });
            let events = match events {
                Ok(events) => events,
                Err(e) => {
                    PENDING.with(|q| q.borrow_mut().clear());
                    return Err(e);
                }
            };
            for event in &events {
                deliver(event);
            }
        }
        Ok(())
    })
}

fn notify_listener(event: &Event<ExplorerEvent>) {
    let json = match serde_json::to_string(&Envelope::new(event)) {
        Ok(json) => json,
        Err(e) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("event encode error: {e}")));
            return;
        }
    };
    let listener = LISTENER.with(|l| l.borrow().clone());
    if let Some(f) = listener {
        if let Err(err) = f.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            web_sys::console::error_2(&JsValue::from_str("explorer listener failed"), &err);
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Avoid double-initialization (can happen during hot-reload edge cases).
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    init_panic_hook();
    Ok(())
}

/// Builds the explorer from JSON. An empty `config_json` selects the
/// defaults. Persisted tree state for the current page is restored; call
/// [`enable`] afterwards to switch coordination on.
#[wasm_bindgen]
pub fn init(config_json: &str, variables_json: &str, datasets_json: &str) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        ExplorerConfig::default()
    } else {
        ExplorerConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let variables = TreeSpec::from_json(variables_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let datasets = TreeSpec::from_json(datasets_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let explorer = Explorer::new(config, &variables, &datasets, state_store(), page_identity())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    install(explorer);
    Ok(())
}

#[wasm_bindgen]
pub fn set_listener(listener: js_sys::Function) {
    LISTENER.with(|l| *l.borrow_mut() = Some(listener));
}

#[wasm_bindgen]
pub fn enable() -> Result<(), JsValue> {
    pump(Step::Enable, &mut notify_listener).map_err(|e| JsValue::from_str(&e))
}

/// Forwards one tagged JSON input, e.g.
/// `{"type": "toggle_check", "side": "datasets", "id": 12}`.
#[wasm_bindgen]
pub fn dispatch(input_json: &str) -> Result<(), JsValue> {
    let input: Input = serde_json::from_str(input_json)
        .map_err(|e| JsValue::from_str(&format!("bad input: {e}")))?;
    pump(Step::Input(input), &mut notify_listener).map_err(|e| JsValue::from_str(&e))
}

/// Full render state as JSON.
#[wasm_bindgen]
pub fn snapshot() -> Result<String, JsValue> {
    EXPLORER.with(|slot| {
        let slot = slot.borrow();
        let explorer = slot
            .as_ref()
            .ok_or_else(|| JsValue::from_str("explorer not initialized"))?;
        serde_json::to_string(&explorer.snapshot()).map_err(|e| JsValue::from_str(&e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use explorer::TreeSide;
    use pretty_assertions::assert_eq;

    fn explorer() -> Explorer {
        let vars = TreeSpec::from_json(
            r#"{"id": 0, "name": "Variables", "children": [
                {"id": 1, "name": "temperature", "varName": "temp", "datasets": [{"id": 11}]}
            ]}"#,
        )
        .unwrap();
        let dsets = TreeSpec::from_json(
            r#"{"id": 10, "name": "Datasets", "children": [
                {"id": 11, "name": "M1", "dsetName": "m1", "yLo": 36.7, "yHi": 36.8, "xLo": -122.1, "xHi": -122.0}
            ]}"#,
        )
        .unwrap();
        Explorer::new(
            ExplorerConfig::default(),
            &vars,
            &dsets,
            Box::new(InMemoryStateStore::new()),
            "/explorer.html",
        )
        .unwrap()
    }

    #[test]
    fn nested_dispatch_is_queued_not_reentered() {
        install(explorer());
        let mut seen = Vec::new();
        let mut reentered = false;
        pump(Step::Enable, &mut |event| {
            seen.push(event.seq);
            if !reentered && matches!(event.payload, ExplorerEvent::OverlayRefresh(_)) {
                reentered = true;
                // An overlay image served from cache reports back synchronously.
                pump(Step::Input(Input::OverlayLoaded), &mut |_| panic!("ran nested"))
                    .unwrap();
            }
        })
        .unwrap();
        assert!(reentered);
        let sorted = {
            let mut s = seen.clone();
            s.sort();
            s
        };
        assert_eq!(seen, sorted);
        let busy = EXPLORER.with(|slot| slot.borrow().as_ref().map(|e| e.map().overlay_busy()));
        assert_eq!(busy, Some(false));
    }

    #[test]
    fn envelope_carries_query() {
        install(explorer());
        let mut out = Vec::new();
        pump(
            Step::Input(Input::ToggleCheck {
                side: TreeSide::Datasets,
                id: 11u64.into(),
            }),
            &mut |_| {},
        )
        .unwrap();
        pump(Step::Enable, &mut |event| {
            out.push(serde_json::to_value(Envelope::new(event)).unwrap());
        })
        .unwrap();
        let refresh = out
            .iter()
            .find(|v| v["type"] == "overlay_refresh")
            .expect("overlay refresh envelope");
        let query = refresh["query"].as_str().unwrap();
        assert!(query.starts_with("get=trajectory&contentType=image/gif&datasets=m1&"));
        assert_eq!(refresh["datasets"][0], "m1");
    }

    #[test]
    fn uninitialized_dispatch_fails_cleanly() {
        EXPLORER.with(|slot| *slot.borrow_mut() = None);
        assert!(pump(Step::Input(Input::ZoomInMap), &mut |_| {}).is_err());
        assert!(PENDING.with(|q| q.borrow().is_empty()));
    }
}
