//! Hardware adapter bundle.
//!
//! Groups construction of the physical-port implementations so `main()`
//! has one place that knows which concrete drivers satisfy which ports.

use crate::config::SystemConfig;
use crate::drivers::hw_init::HwInitReport;
use crate::drivers::relay::RelayDriver;
use crate::error::{ActuatorError, Error, Result};
use crate::sensors::thermocouple::Max31855;

/// Concrete sensor + relay drivers for this board.
pub struct HardwareAdapter {
    pub sensor: Max31855,
    pub relay: RelayDriver,
}

impl HardwareAdapter {
    /// Build the drivers after peripheral bring-up.
    ///
    /// A dead SPI bus only degrades the sensor (readings stay invalid); a
    /// relay that cannot be driven OFF is fatal — the caller must not start
    /// serving control requests.
    pub fn new(config: &SystemConfig, report: HwInitReport) -> Result<Self> {
        let relay = RelayDriver::new(config.relay_active_high)
            .map_err(|_: ActuatorError| Error::Init("relay driver"))?;
        let sensor = Max31855::new(report.spi_ok);
        Ok(Self { sensor, relay })
    }
}
