use std::time::Duration;

use js_sys::{Function, Object, Reflect, JSON};
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use haptics_core::{
    Capabilities, Config, EventKind, FeedbackEffect, HapticBackend, HapticPattern, HapticType,
    Haptics, HapticsError, HardwareSignal, StopReason, VibrationFrequency,
};

const DEFAULT_DEVICE_ID: &str = "js-default";

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Seconds from JS; anything negative or non-finite is zero.
fn duration_from_secs(v: f64) -> Duration {
    if v.is_finite() && v > 0.0 {
        Duration::from_secs_f64(v)
    } else {
        Duration::ZERO
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload {
    kind: &'static str,
    time_ms: f64,
    strength: f32,
    sharpness: f32,
    duration_ms: Option<f64>,
}

/// What `startPattern` receives: the timed events for engines that can render
/// them, plus the equivalent on/off waveform for plain vibrators.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatternPayload {
    events: Vec<EventPayload>,
    duration_ms: f64,
    timings_ms: Vec<u64>,
    amplitudes: Vec<u8>,
}

impl From<&HapticPattern> for PatternPayload {
    fn from(p: &HapticPattern) -> Self {
        let events = p
            .events()
            .iter()
            .map(|e| EventPayload {
                kind: match e.kind {
                    EventKind::Impact => "impact",
                    EventKind::Continuous => "continuous",
                },
                time_ms: e.relative_time.as_secs_f64() * 1000.0,
                strength: e.strength,
                sharpness: e.sharpness,
                duration_ms: e.duration.map(|d| d.as_secs_f64() * 1000.0),
            })
            .collect();
        let wave = p.waveform();
        PatternPayload {
            events,
            duration_ms: p.duration().as_secs_f64() * 1000.0,
            timings_ms: wave.timings_ms,
            amplitudes: wave.amplitudes,
        }
    }
}

/// Backend over a JS object of callbacks:
/// `{ deviceId, capabilities, acquire(), release(), perform(effect),
///    startPattern(pattern), restartPattern(), stopPattern() }`.
/// Missing callbacks are treated as successful no-ops; a callback that throws
/// is reported as a backend error.
struct JsBackend {
    obj: Object,
    device_id: String,
    caps: Capabilities,
}

impl JsBackend {
    fn new(value: JsValue) -> Result<Self, JsError> {
        let obj: Object = value
            .dyn_into()
            .map_err(|_| JsError::new("backend must be an object of callbacks"))?;
        let device_id = Reflect::get(&obj, &JsValue::from_str("deviceId"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string());
        let caps_value = Reflect::get(&obj, &JsValue::from_str("capabilities"))
            .map_err(|e| JsError::new(&format!("backend capabilities error: {e:?}")))?;
        let caps = if jsvalue_is_undefined_or_null(&caps_value) {
            Capabilities::none()
        } else {
            swb::from_value(caps_value)
                .map_err(|e| JsError::new(&format!("backend capabilities error: {e}")))?
        };
        Ok(Self {
            obj,
            device_id,
            caps,
        })
    }

    fn callback(&self, name: &str) -> Result<Option<Function>, HapticsError> {
        let v = Reflect::get(&self.obj, &JsValue::from_str(name))
            .map_err(|e| HapticsError::backend(format!("{name}: {e:?}")))?;
        if jsvalue_is_undefined_or_null(&v) {
            return Ok(None);
        }
        v.dyn_into::<Function>()
            .map(Some)
            .map_err(|_| HapticsError::backend(format!("{name} is not a function")))
    }

    fn call(&self, name: &str, arg: Option<&JsValue>) -> Result<(), HapticsError> {
        let Some(f) = self.callback(name)? else {
            return Ok(());
        };
        let res = match arg {
            Some(a) => f.call1(&self.obj, a),
            None => f.call0(&self.obj),
        };
        res.map(|_| ())
            .map_err(|e| HapticsError::backend(format!("{name} threw: {e:?}")))
    }

    fn encode<T: Serialize>(name: &str, value: &T) -> Result<JsValue, HapticsError> {
        swb::to_value(value).map_err(|e| HapticsError::backend(format!("{name} encode error: {e}")))
    }
}

impl HapticBackend for JsBackend {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn acquire(&mut self) -> Result<(), HapticsError> {
        self.call("acquire", None)
    }

    fn release(&mut self) {
        // release cannot fail from the engine's point of view
        let _ = self.call("release", None);
    }

    fn perform(&mut self, effect: &FeedbackEffect) -> Result<(), HapticsError> {
        let arg = Self::encode("perform", effect)?;
        self.call("perform", Some(&arg))
    }

    fn start_pattern(&mut self, pattern: &HapticPattern) -> Result<(), HapticsError> {
        let arg = Self::encode("startPattern", &PatternPayload::from(pattern))?;
        self.call("startPattern", Some(&arg))
    }

    fn restart_pattern(&mut self) -> Result<(), HapticsError> {
        self.call("restartPattern", None)
    }

    fn stop_pattern(&mut self) -> Result<(), HapticsError> {
        self.call("stopPattern", None)
    }
}

#[wasm_bindgen]
pub struct HapticsBridge {
    core: Haptics<JsBackend>,
}

#[wasm_bindgen]
impl HapticsBridge {
    /// Create a bridge over a JS backend object. Pass a JSON config object or
    /// undefined/null for defaults.
    /// Example:
    ///   new HapticsBridge({ max_recovery_attempts: 5 }, { deviceId: "taptic", capabilities, perform })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, backend: JsValue) -> Result<HapticsBridge, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        let backend = JsBackend::new(backend)?;
        let core = Haptics::new(backend, cfg)?;
        Ok(HapticsBridge { core })
    }

    /// Fire a canned feedback by name (`"light"`, `"success"`, ...). Without a
    /// name the configured default plays; unknown names play the default impact.
    #[wasm_bindgen]
    pub fn haptic(&mut self, kind: Option<String>) -> Result<(), JsError> {
        match kind {
            Some(name) => self.core.haptic_named(&name)?,
            None => self.core.haptic_default()?,
        }
        Ok(())
    }

    /// Play an array of one-character symbols, e.g. `[".", "o", "-", "O"]`,
    /// after an optional delay in milliseconds.
    #[wasm_bindgen(js_name = hapticWithPattern)]
    pub fn haptic_with_pattern(
        &mut self,
        pattern: JsValue,
        delay_ms: Option<f64>,
    ) -> Result<(), JsError> {
        let symbols: Vec<String> = swb::from_value(pattern)
            .map_err(|e| JsError::new(&format!("pattern error: {e}")))?;
        let delay = duration_from_secs(delay_ms.unwrap_or(0.0) / 1000.0);
        self.core.haptic_with_pattern(symbols.as_slice(), delay)?;
        Ok(())
    }

    /// Play a pattern previously registered with `loadPattern`.
    #[wasm_bindgen]
    pub fn play(&mut self, file_name: String, looping: Option<bool>) -> Result<(), JsError> {
        self.core.play(&file_name, looping.unwrap_or(false))?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn stop(&mut self) {
        self.core.stop();
    }

    /// System vibration; `frequency` is `"high"` or `"low"` (default).
    #[wasm_bindgen]
    pub fn vibrate(&mut self, frequency: JsValue, looping: bool) -> Result<(), JsError> {
        let frequency: VibrationFrequency = if jsvalue_is_undefined_or_null(&frequency) {
            VibrationFrequency::default()
        } else {
            swb::from_value(frequency)
                .map_err(|e| JsError::new(&format!("frequency error: {e}")))?
        };
        self.core.vibrate(frequency, looping)?;
        Ok(())
    }

    /// Register an AHAP document (JSON string or object) under `name`.
    #[wasm_bindgen(js_name = loadPattern)]
    pub fn load_pattern(&mut self, name: String, ahap: JsValue) -> Result<(), JsError> {
        if jsvalue_is_undefined_or_null(&ahap) {
            return Err(JsError::new("loadPattern: ahap is null/undefined"));
        }
        let text = match ahap.as_string() {
            Some(s) => s,
            None => JSON::stringify(&ahap)
                .map_err(|e| JsError::new(&format!("loadPattern stringify error: {e:?}")))?
                .as_string()
                .ok_or_else(|| JsError::new("loadPattern: stringify produced non-string"))?,
        };
        self.core.library_mut().insert_json(&name, &text)?;
        Ok(())
    }

    /// Registered pattern names, sorted.
    #[wasm_bindgen(js_name = patternNames)]
    pub fn pattern_names(&self) -> Result<JsValue, JsError> {
        swb::to_value(&self.core.library().names())
            .map_err(|e| JsError::new(&format!("patternNames error: {e}")))
    }

    /// Advance host time by `dt` seconds. Returns true when a loop re-triggered.
    #[wasm_bindgen]
    pub fn tick(&mut self, dt: f64) -> bool {
        self.core.advance(duration_from_secs(dt))
    }

    /// Acquire the hardware ahead of the first playback.
    #[wasm_bindgen]
    pub fn prepare(&mut self) {
        self.core.prepare();
    }

    #[wasm_bindgen(js_name = notifyReset)]
    pub fn notify_reset(&mut self) {
        self.core.notify(HardwareSignal::Reset);
    }

    /// The system stopped the engine; `reason` uses the camelCase stop reason
    /// names (`"applicationSuspended"`, ...).
    #[wasm_bindgen(js_name = notifyStopped)]
    pub fn notify_stopped(&mut self, reason: Option<String>) {
        let reason = reason
            .as_deref()
            .map(StopReason::from)
            .unwrap_or(StopReason::Unknown);
        self.core.notify(HardwareSignal::Stopped(reason));
    }

    #[wasm_bindgen(js_name = notifyFinished)]
    pub fn notify_finished(&mut self, error: Option<String>) {
        self.core.notify(HardwareSignal::PlayersFinished { error });
    }

    #[wasm_bindgen(js_name = notifyFault)]
    pub fn notify_fault(&mut self, reason: String) {
        self.core.notify(HardwareSignal::Fault { reason });
    }

    /// Engine lifecycle state name.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.core.state().name().to_string()
    }

    #[wasm_bindgen(js_name = supportsHaptics)]
    pub fn supports_haptics(&self) -> bool {
        self.core.supports_haptics()
    }

    /// Every canned feedback name accepted by `haptic`.
    #[wasm_bindgen(js_name = hapticTypes)]
    pub fn haptic_types() -> Vec<String> {
        HapticType::ALL.iter().map(|t| t.name().to_string()).collect()
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
