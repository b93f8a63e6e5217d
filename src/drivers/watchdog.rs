//! Task watchdog feed.
//!
//! The main thread subscribes itself to the ESP-IDF task watchdog and
//! feeds it every status-log iteration; a wedged main loop resets the
//! chip instead of cooking unattended forever. No-op on the host.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{esp_task_wdt_add, esp_task_wdt_reset};

pub struct Watchdog;

impl Watchdog {
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        // SAFETY: registers the calling task with the TWDT; called once
        // from main before the loop starts.
        unsafe {
            esp_task_wdt_add(core::ptr::null_mut());
        }
        Self
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        // SAFETY: resets the TWDT counter for the calling task.
        unsafe {
            esp_task_wdt_reset();
        }
    }
}
