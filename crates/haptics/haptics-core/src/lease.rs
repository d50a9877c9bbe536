//! Process-wide exclusive claims on hardware devices.
//!
//! An engine claims its backend's device id on construction and releases it
//! on drop, so two engines can never drive the same hardware at once.

use std::sync::Mutex;

use hashbrown::HashSet;
use once_cell::sync::Lazy;

use crate::error::HapticsError;

static CLAIMED: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn with_claimed<R>(f: impl FnOnce(&mut HashSet<String>) -> R) -> R {
    // a poisoned set is still consistent: every mutation is a single insert/remove
    let mut guard = CLAIMED.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

#[derive(Debug)]
pub struct DeviceLease {
    device_id: String,
}

impl DeviceLease {
    pub fn claim(device_id: &str) -> Result<Self, HapticsError> {
        let inserted = with_claimed(|set| set.insert(device_id.to_string()));
        if !inserted {
            return Err(HapticsError::engine_unavailable(format!(
                "device '{device_id}' is already owned by another engine"
            )));
        }
        Ok(Self {
            device_id: device_id.to_string(),
        })
    }

    pub fn is_claimed(device_id: &str) -> bool {
        with_claimed(|set| set.contains(device_id))
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        with_claimed(|set| set.remove(&self.device_id));
    }
}
