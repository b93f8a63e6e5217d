//! One-shot hardware peripheral initialization.
//!
//! Configures the relay GPIO, button inputs, and the MAX31855 SPI bus
//! using raw ESP-IDF sys calls. Called once from `main()` before any task
//! starts; the relay pin is driven to its de-energised level as part of
//! GPIO setup so the heater never starts in an undefined state.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    SpiBusInitFailed(i32),
    SpiAddDeviceFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::SpiBusInitFailed(rc) => write!(f, "SPI bus init failed (rc={rc})"),
            Self::SpiAddDeviceFailed(rc) => write!(f, "SPI add device failed (rc={rc})"),
        }
    }
}

/// Outcome of peripheral bring-up. The relay GPIO is required; the SPI bus
/// is allowed to fail (the pot still cooks, blind).
#[derive(Debug, Clone, Copy)]
pub struct HwInitReport {
    pub spi_ok: bool,
}

// ── Entry points ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals(relay_active_high: bool) -> Result<HwInitReport, HwInitError> {
    // SAFETY: Called once from main() before any other task starts;
    // single-threaded at this point.
    unsafe {
        init_gpio_outputs(relay_active_high)?;
        init_gpio_inputs()?;
    }
    let spi_ok = match unsafe { init_spi() } {
        Ok(()) => true,
        Err(e) => {
            log::warn!("hw_init: MAX31855 SPI unavailable ({e}), continuing without sensor");
            false
        }
    };
    info!("hw_init: peripherals configured (spi_ok={spi_ok})");
    Ok(HwInitReport { spi_ok })
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_relay_active_high: bool) -> Result<HwInitReport, HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(HwInitReport { spi_ok: true })
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(relay_active_high: bool) -> Result<(), HwInitError> {
    let io_conf = gpio_config_t {
        pin_bit_mask: 1u64 << pins::RELAY_MAIN_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: plain register configuration before the scheduler has tasks.
    let ret = unsafe { gpio_config(&io_conf) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    // Drive the relay to its de-energised level immediately: low for an
    // active-high board, high for an active-low one.
    let idle_level = i32::from(!relay_active_high);
    // SAFETY: pin was just configured as output.
    unsafe { gpio_set_level(pins::RELAY_MAIN_GPIO as gpio_num_t, idle_level as u32) };
    info!("hw_init: relay GPIO {} configured, driven idle", pins::RELAY_MAIN_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let mask = (1u64 << pins::BUTTON_UP_GPIO)
        | (1u64 << pins::BUTTON_DOWN_GPIO)
        | (1u64 << pins::BUTTON_POWER_GPIO);
    let io_conf = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: see init_gpio_outputs.
    let ret = unsafe { gpio_config(&io_conf) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

// ── SPI (MAX31855, read-only device) ──────────────────────────

#[cfg(target_os = "espidf")]
static mut SPI_HANDLE: spi_device_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_spi() -> Result<(), HwInitError> {
    let bus_cfg = spi_bus_config_t {
        __bindgen_anon_1: spi_bus_config_t__bindgen_ty_1 {
            miso_io_num: pins::MAX31855_MISO_GPIO,
        },
        __bindgen_anon_2: spi_bus_config_t__bindgen_ty_2 { mosi_io_num: -1 },
        sclk_io_num: pins::MAX31855_CLK_GPIO,
        __bindgen_anon_3: spi_bus_config_t__bindgen_ty_3 { quadwp_io_num: -1 },
        __bindgen_anon_4: spi_bus_config_t__bindgen_ty_4 { quadhd_io_num: -1 },
        max_transfer_sz: 4,
        ..Default::default()
    };
    // SAFETY: one-shot bus init before any reader exists.
    let ret = unsafe {
        spi_bus_initialize(
            spi_host_device_t_SPI2_HOST,
            &bus_cfg,
            spi_common_dma_t_SPI_DMA_DISABLED,
        )
    };
    if ret != ESP_OK {
        return Err(HwInitError::SpiBusInitFailed(ret));
    }

    let dev_cfg = spi_device_interface_config_t {
        clock_speed_hz: pins::MAX31855_SPI_HZ as i32,
        mode: 0, // CPOL=0, CPHA=0
        spics_io_num: pins::MAX31855_CS_GPIO,
        queue_size: 1,
        ..Default::default()
    };
    // SAFETY: SPI_HANDLE is only written here, once at boot.
    let ret = unsafe {
        spi_bus_add_device(spi_host_device_t_SPI2_HOST, &dev_cfg, &raw mut SPI_HANDLE)
    };
    if ret != ESP_OK {
        // SAFETY: tearing down the bus we just brought up.
        unsafe { spi_bus_free(spi_host_device_t_SPI2_HOST) };
        return Err(HwInitError::SpiAddDeviceFailed(ret));
    }
    info!(
        "hw_init: MAX31855 on SPI (CS={}, CLK={}, MISO={})",
        pins::MAX31855_CS_GPIO,
        pins::MAX31855_CLK_GPIO,
        pins::MAX31855_MISO_GPIO
    );
    Ok(())
}

// ── Runtime accessors ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> bool {
    // SAFETY: pins are configured once during init; level writes are atomic
    // at the register level.
    let ret = unsafe { gpio_set_level(pin as gpio_num_t, u32::from(high)) };
    ret == ESP_OK
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: input pins configured during init.
    unsafe { gpio_get_level(pin as gpio_num_t) != 0 }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

/// Clock one 32-bit frame out of the MAX31855. `None` on transport error.
#[cfg(target_os = "espidf")]
pub fn spi_read_raw32() -> Option<u32> {
    let mut rx = [0u8; 4];
    let mut trans = spi_transaction_t {
        length: 32,
        ..Default::default()
    };
    trans.__bindgen_anon_2.rx_buffer = rx.as_mut_ptr().cast();

    // SAFETY: SPI_HANDLE is written once during init_spi() before the
    // control task starts; only the control task calls this afterwards.
    let handle = unsafe { SPI_HANDLE };
    if handle.is_null() {
        return None;
    }
    // SAFETY: trans points at a live stack buffer for the call duration.
    let ret = unsafe { spi_device_transmit(handle, &mut trans) };
    if ret != ESP_OK {
        return None;
    }
    Some(u32::from_be_bytes(rx))
}
