//! Firmware entry point (`spec.md` §5): a bare `cortex_m_rt::entry` function
//! containing one polling loop, no RTOS and no RTIC app (`SPEC_FULL.md` §5
//! departs from the flight-controller firmware's RTIC-based `main.rs` on
//! purpose -- see `DESIGN.md`). Each iteration: poll the USB device and
//! drain/dispatch any complete command line, poll the glitch controller for
//! auto-disarm completion, and service the target UART's receive buffer.
#![no_std]
#![no_main]

mod glitch;
mod padshare;
mod setup;
mod target;
mod usbio;

use cortex_m_rt::entry;
#[allow(unused_imports)]
use defmt_rtt as _;
#[allow(unused_imports)]
use panic_probe as _;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

use raiden_glitch::command::Dispatcher;
use raiden_glitch::control::GlitchControl;

/// Second-stage bootloader, required by every RP2040 image
/// (`rp2040-boot2`).
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

/// Fault-injection tooling vendor/product IDs used by host automation to
/// find this device among other USB CDC-ACM ports (`spec.md` §6.1).
const USB_VID: u16 = 0x16c0;
const USB_PID: u16 = 0x27dd;

#[entry]
fn main() -> ! {
    let pac = rp2040_hal::pac::Peripherals::take().unwrap();
    let core = rp2040_hal::pac::CorePeripherals::take().unwrap();

    let setup::Resources {
        mut controller,
        usb_bus,
    } = setup::init(pac, core);

    cfg_if::cfg_if! {
        if #[cfg(feature = "voltage-crowbar")] {
            defmt::info!("glitch output wired for voltage-crowbar injection");
        } else if #[cfg(feature = "emfi")] {
            defmt::info!("glitch output wired for EMFI trigger injection");
        } else if #[cfg(feature = "chipshouter")] {
            defmt::info!("glitch output wired for ChipSHOUTER trigger injection");
        }
    }

    let mut serial = SerialPort::new(&usb_bus);
    let mut usb_dev = UsbDeviceBuilder::new(&usb_bus, UsbVidPid(USB_VID, USB_PID))
        .manufacturer("Fault Injection Tools")
        .product("raiden-glitch")
        .serial_number("1")
        .device_class(usbd_serial::USB_CLASS_CDC)
        .build();

    let mut dispatcher = Dispatcher::new();
    let mut line_reader = usbio::LineReader::new();

    defmt::info!("raiden-glitch ready");

    loop {
        if usb_dev.poll(&mut [&mut serial]) {
            line_reader.service(&mut serial, &mut dispatcher, &mut controller);
        }

        // Auto-disarm detection (`spec.md` §4.3, §9): explicit per-iteration
        // poll rather than inferring completion from an incidental getter.
        controller.tick();

        // Target bytes can arrive whether or not anything is armed.
        controller.service_target_uart();

        #[cfg(feature = "print-status")]
        {
            defmt::info!(
                "state={=?} fired={=u32}",
                controller.arm_state(),
                controller.fired_count()
            );
        }

        if let Some(bootloader) = controller.pending_reboot() {
            // The only abrupt recoveries this firmware performs on its own
            // are disarm and the host-requested REBOOT (`spec.md` §7). Flush
            // is best-effort: the host already has its `OK:`/`+` in the USB
            // endpoint buffer by the time this verb executes.
            if bootloader {
                rp2040_hal::rom_data::reset_to_usb_boot(0, 0);
            } else {
                cortex_m::peripheral::SCB::sys_reset();
            }
        }
    }
}
