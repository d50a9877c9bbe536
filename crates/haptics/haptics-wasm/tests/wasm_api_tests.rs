#![cfg(target_arch = "wasm32")]
use js_sys::{Function, Object, Reflect, JSON};
use serde_wasm_bindgen as swb;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use haptics_wasm::{abi_version, HapticsBridge};
use serde_json::json;

wasm_bindgen_test_configure!(run_in_browser);

fn to_js(v: &serde_json::Value) -> JsValue {
    JSON::parse(&v.to_string()).unwrap()
}

/// JS backend that counts every callback invocation on itself.
fn counting_backend(device_id: &str, caps: serde_json::Value) -> Object {
    let obj = Object::new();
    let set = |k: &str, v: &JsValue| {
        Reflect::set(&obj, &JsValue::from_str(k), v).unwrap();
    };
    set("deviceId", &JsValue::from_str(device_id));
    set("capabilities", &to_js(&caps));
    for name in [
        "acquire",
        "release",
        "perform",
        "startPattern",
        "restartPattern",
        "stopPattern",
    ] {
        let body = format!("this.{name} = (this.{name} || 0) + 1; this.last = arg;");
        let f = Function::new_with_args("arg", &body);
        set(name, &f);
    }
    obj
}

fn ios_caps() -> serde_json::Value {
    json!({
        "vibration": true,
        "hapticPatterns": true,
        "impactStyles": true,
        "notifications": true,
        "selection": true,
        "amplitudeControl": true
    })
}

fn counter(obj: &Object, name: &str) -> f64 {
    Reflect::get(obj, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn haptic_with_pattern_starts_and_loops_are_ticked() {
    let backend = counting_backend("wasm-pattern", ios_caps());
    let mut bridge = HapticsBridge::new(JsValue::UNDEFINED, backend.clone().into()).unwrap();

    let pattern = swb::to_value(&vec![".", "o", "-"]).unwrap();
    bridge.haptic_with_pattern(pattern, Some(50.0)).unwrap();
    assert_eq!(bridge.state(), "playing");
    assert_eq!(counter(&backend, "acquire"), 1.0);
    assert_eq!(counter(&backend, "startPattern"), 1.0);

    bridge.stop();
    assert_eq!(bridge.state(), "stopped");
    assert!(!bridge.tick(5.0));
}

#[wasm_bindgen_test]
fn looping_ahap_retriggers_on_tick() {
    let backend = counting_backend("wasm-ahap", ios_caps());
    let mut bridge = HapticsBridge::new(JsValue::NULL, backend.clone().into()).unwrap();
    let ahap = json!({
        "Version": 1.0,
        "Pattern": [
            { "Event": { "Time": 0.0, "EventType": "HapticContinuous", "EventDuration": 0.25 } }
        ]
    });
    bridge
        .load_pattern("hum".into(), to_js(&ahap))
        .unwrap();
    bridge.play("hum".into(), Some(true)).unwrap();
    assert!(!bridge.tick(0.1));
    assert!(bridge.tick(0.2));
    assert_eq!(counter(&backend, "restartPattern"), 1.0);
}

#[wasm_bindgen_test]
fn missing_pattern_rejects_without_state_change() {
    let backend = counting_backend("wasm-missing", ios_caps());
    let mut bridge = HapticsBridge::new(JsValue::UNDEFINED, backend.clone().into()).unwrap();
    assert!(bridge.play("missingFile".into(), Some(true)).is_err());
    assert_eq!(bridge.state(), "uninitialized");
    assert_eq!(counter(&backend, "acquire"), 0.0);
}

#[wasm_bindgen_test]
fn unsupported_backend_rejects_haptics() {
    let backend = counting_backend("wasm-none", json!({}));
    let mut bridge = HapticsBridge::new(JsValue::UNDEFINED, backend.into()).unwrap();
    assert!(bridge.haptic(Some("light".into())).is_err());
    assert!(!bridge.supports_haptics());
}

#[wasm_bindgen_test]
fn reset_signal_reacquires() {
    let backend = counting_backend("wasm-reset", ios_caps());
    let mut bridge = HapticsBridge::new(JsValue::UNDEFINED, backend.clone().into()).unwrap();
    bridge.prepare();
    bridge.notify_reset();
    assert_eq!(bridge.state(), "ready");
    assert_eq!(counter(&backend, "acquire"), 2.0);

    bridge.notify_stopped(Some("applicationSuspended".into()));
    assert_eq!(bridge.state(), "stopped");
}

#[wasm_bindgen_test]
fn second_bridge_on_same_device_is_rejected() {
    let first = HapticsBridge::new(
        JsValue::UNDEFINED,
        counting_backend("wasm-shared", ios_caps()).into(),
    )
    .unwrap();
    assert!(HapticsBridge::new(
        JsValue::UNDEFINED,
        counting_backend("wasm-shared", ios_caps()).into()
    )
    .is_err());
    drop(first);
}
