//! Pin resource manager
//!
//! Validates, requests, configures, exports and releases pins on top of a
//! [`GpioPlatform`], and mirrors every output level it writes so the
//! software view always equals the last value driven to hardware.

use heapless::Vec;
use ledgate_hal::{GpioError, GpioPlatform, PinId, Role};

use super::input::InputConfig;
use crate::error::PinError;

/// Maximum pins held at once
pub const MAX_PINS: usize = 8;

/// Reference to an acquired pin
///
/// Handles are plain values; using one after [`PinManager::release`]
/// yields [`PinError::NotAcquired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinHandle {
    pin: PinId,
}

impl PinHandle {
    /// Pin this handle refers to
    pub fn pin(&self) -> PinId {
        self.pin
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct PinSlot {
    pub(super) pin: PinId,
    pub(super) role: Role,
    /// Last level written (outputs only)
    pub(super) level: bool,
    pub(super) exported: bool,
    pub(super) input: Option<InputConfig>,
}

/// Owner of every pin the controller uses
pub struct PinManager<P> {
    pub(super) platform: P,
    /// In acquisition order; released in reverse
    pub(super) slots: Vec<PinSlot, MAX_PINS>,
}

impl<P: GpioPlatform> PinManager<P> {
    /// Create a manager holding no pins
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            slots: Vec::new(),
        }
    }

    /// Access the underlying platform
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Mutable access to the underlying platform
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Give up the platform; pins still held are not released
    pub fn into_platform(self) -> P {
        self.platform
    }

    pub(super) fn index_of(&self, handle: PinHandle) -> Result<usize, PinError> {
        self.slots
            .iter()
            .position(|s| s.pin == handle.pin)
            .ok_or(PinError::NotAcquired(handle.pin))
    }

    fn apply_direction(&mut self, pin: PinId, role: Role) -> Result<(), GpioError> {
        match role {
            // Outputs always start at the safe (off) level
            Role::Output => self.platform.set_output(pin, false),
            Role::Input => self.platform.set_input(pin),
        }
    }

    /// Validate, request and set the direction of a pin
    ///
    /// Nothing is left requested on the platform if any step fails.
    pub fn acquire(&mut self, pin: PinId, role: Role) -> Result<PinHandle, PinError> {
        if !self.platform.is_valid(pin) {
            return Err(PinError::InvalidPin(pin));
        }
        if self.is_acquired(pin) {
            return Err(PinError::AlreadyAcquired(pin));
        }
        if self.slots.is_full() {
            return Err(PinError::NoFreeSlot(pin));
        }

        self.platform
            .request(pin)
            .map_err(|error| PinError::Platform { pin, error })?;

        if let Err(error) = self.apply_direction(pin, role) {
            self.platform.free(pin);
            return Err(PinError::Platform { pin, error });
        }

        let slot = PinSlot {
            pin,
            role,
            level: false,
            exported: false,
            input: None,
        };
        if self.slots.push(slot).is_err() {
            self.platform.free(pin);
            return Err(PinError::NoFreeSlot(pin));
        }

        trace!("acquired {} as {}", pin, role);
        Ok(PinHandle { pin })
    }

    /// Change the direction of an acquired pin
    ///
    /// Switching to output drives the safe (low) level; switching to input
    /// drops any debounce/edge configuration.
    pub fn set_direction(&mut self, handle: PinHandle, role: Role) -> Result<(), PinError> {
        let idx = self.index_of(handle)?;
        self.apply_direction(handle.pin, role)
            .map_err(|error| PinError::Platform {
                pin: handle.pin,
                error,
            })?;

        let slot = &mut self.slots[idx];
        slot.role = role;
        slot.level = false;
        slot.input = None;
        Ok(())
    }

    /// Drive an output pin
    pub fn write(&mut self, handle: PinHandle, high: bool) -> Result<(), PinError> {
        let idx = self.index_of(handle)?;
        if self.slots[idx].role != Role::Output {
            return Err(PinError::Platform {
                pin: handle.pin,
                error: GpioError::WrongDirection,
            });
        }

        self.platform
            .write(handle.pin, high)
            .map_err(|error| PinError::Platform {
                pin: handle.pin,
                error,
            })?;

        self.slots[idx].level = high;
        Ok(())
    }

    /// Current level of a pin
    ///
    /// Inputs are sampled from hardware; outputs report the last level
    /// written, which by construction equals the hardware level.
    pub fn read(&mut self, handle: PinHandle) -> Result<bool, PinError> {
        let idx = self.index_of(handle)?;
        let slot = self.slots[idx];
        match slot.role {
            Role::Output => Ok(slot.level),
            Role::Input => self
                .platform
                .read(handle.pin)
                .map_err(|error| PinError::Platform {
                    pin: handle.pin,
                    error,
                }),
        }
    }

    /// Last level written to an output, without touching hardware
    pub fn level(&self, handle: PinHandle) -> Option<bool> {
        let idx = self.index_of(handle).ok()?;
        let slot = &self.slots[idx];
        (slot.role == Role::Output).then_some(slot.level)
    }

    /// Direction of an acquired pin
    pub fn role(&self, handle: PinHandle) -> Option<Role> {
        let idx = self.index_of(handle).ok()?;
        Some(self.slots[idx].role)
    }

    /// Make a pin externally visible; repeated calls are no-ops
    pub fn export(&mut self, handle: PinHandle) -> Result<(), PinError> {
        let idx = self.index_of(handle)?;
        if self.slots[idx].exported {
            return Ok(());
        }

        self.platform
            .export(handle.pin)
            .map_err(|error| PinError::Platform {
                pin: handle.pin,
                error,
            })?;

        self.slots[idx].exported = true;
        Ok(())
    }

    /// Check if a pin is exported
    pub fn is_exported(&self, handle: PinHandle) -> bool {
        self.index_of(handle)
            .map(|idx| self.slots[idx].exported)
            .unwrap_or(false)
    }

    fn release_slot(&mut self, slot: PinSlot) {
        if slot.exported {
            self.platform.unexport(slot.pin);
        }
        self.platform.free(slot.pin);
        trace!("released {}", slot.pin);
    }

    /// Unexport and free a pin
    ///
    /// Releasing a pin that is not held is a no-op, so rollback paths can
    /// call this without tracking how far setup got.
    pub fn release(&mut self, handle: PinHandle) {
        if let Ok(idx) = self.index_of(handle) {
            let slot = self.slots.remove(idx);
            self.release_slot(slot);
        }
    }

    /// Release every held pin, most recently acquired first
    pub fn release_all(&mut self) {
        while let Some(slot) = self.slots.pop() {
            self.release_slot(slot);
        }
    }

    /// Check if a pin is held by this manager
    pub fn is_acquired(&self, pin: PinId) -> bool {
        self.slots.iter().any(|s| s.pin == pin)
    }

    /// Number of pins held
    pub fn acquired_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgate_hal::sim::SimBoard;

    #[test]
    fn test_acquire_output_starts_low() {
        let mut pins = PinManager::new(SimBoard::new());
        let led = pins.acquire(PinId(16), Role::Output).unwrap();

        assert_eq!(pins.level(led), Some(false));
        assert_eq!(pins.platform().output_level(PinId(16)), Some(false));
        assert!(pins.platform().is_requested(PinId(16)));
    }

    #[test]
    fn test_invalid_pin_never_reaches_platform() {
        let mut pins = PinManager::new(SimBoard::new());

        assert_eq!(
            pins.acquire(PinId(-1), Role::Output),
            Err(PinError::InvalidPin(PinId(-1)))
        );
        assert_eq!(
            pins.acquire(PinId(54), Role::Input),
            Err(PinError::InvalidPin(PinId(54)))
        );
        assert_eq!(pins.platform().requested_count(), 0);
    }

    #[test]
    fn test_double_acquire_rejected() {
        let mut pins = PinManager::new(SimBoard::new());
        pins.acquire(PinId(26), Role::Input).unwrap();

        assert_eq!(
            pins.acquire(PinId(26), Role::Output),
            Err(PinError::AlreadyAcquired(PinId(26)))
        );
        assert_eq!(pins.platform().role(PinId(26)), Some(Role::Input));
    }

    #[test]
    fn test_write_mirrors_level() {
        let mut pins = PinManager::new(SimBoard::new());
        let led = pins.acquire(PinId(20), Role::Output).unwrap();

        pins.write(led, true).unwrap();
        assert_eq!(pins.read(led), Ok(true));
        assert_eq!(pins.platform().output_level(PinId(20)), Some(true));

        pins.write(led, false).unwrap();
        assert_eq!(pins.level(led), Some(false));
        assert_eq!(pins.platform().output_level(PinId(20)), Some(false));
    }

    #[test]
    fn test_failed_write_keeps_mirror() {
        let mut pins = PinManager::new(SimBoard::new());
        let led = pins.acquire(PinId(20), Role::Output).unwrap();
        pins.platform_mut().fail_writes(PinId(20));

        assert!(pins.write(led, true).is_err());
        assert_eq!(pins.level(led), Some(false));
    }

    #[test]
    fn test_write_to_input_rejected() {
        let mut pins = PinManager::new(SimBoard::new());
        let button = pins.acquire(PinId(26), Role::Input).unwrap();

        assert_eq!(
            pins.write(button, true),
            Err(PinError::Platform {
                pin: PinId(26),
                error: GpioError::WrongDirection
            })
        );
    }

    #[test]
    fn test_read_input_from_hardware() {
        let mut pins = PinManager::new(SimBoard::new());
        let button = pins.acquire(PinId(26), Role::Input).unwrap();

        assert_eq!(pins.read(button), Ok(false));
        pins.platform_mut().set_input_level(PinId(26), true);
        assert_eq!(pins.read(button), Ok(true));
    }

    #[test]
    fn test_set_direction() {
        let mut pins = PinManager::new(SimBoard::new());
        let pin = pins.acquire(PinId(5), Role::Input).unwrap();

        pins.set_direction(pin, Role::Output).unwrap();
        assert_eq!(pins.role(pin), Some(Role::Output));
        assert_eq!(pins.platform().output_level(PinId(5)), Some(false));
    }

    #[test]
    fn test_export_is_idempotent() {
        let mut pins = PinManager::new(SimBoard::new());
        let led = pins.acquire(PinId(16), Role::Output).unwrap();

        pins.export(led).unwrap();
        pins.export(led).unwrap();
        assert!(pins.is_exported(led));
        assert!(pins.platform().is_exported(PinId(16)));
    }

    #[test]
    fn test_release_unexports_and_frees() {
        let mut pins = PinManager::new(SimBoard::new());
        let led = pins.acquire(PinId(16), Role::Output).unwrap();
        pins.export(led).unwrap();

        pins.release(led);
        assert!(!pins.is_acquired(PinId(16)));
        assert!(!pins.platform().is_exported(PinId(16)));
        assert!(!pins.platform().is_requested(PinId(16)));

        // Stale handle
        assert_eq!(pins.write(led, true), Err(PinError::NotAcquired(PinId(16))));
        // Releasing twice is harmless
        pins.release(led);
    }

    #[test]
    fn test_release_all() {
        let mut pins = PinManager::new(SimBoard::new());
        for n in [16, 20, 26, 19] {
            let role = if n < 21 { Role::Output } else { Role::Input };
            let handle = pins.acquire(PinId(n), role).unwrap();
            pins.export(handle).unwrap();
        }

        pins.release_all();
        assert_eq!(pins.acquired_count(), 0);
        assert_eq!(pins.platform().requested_count(), 0);
    }

    #[test]
    fn test_slot_exhaustion_leaves_platform_clean() {
        let mut pins = PinManager::new(SimBoard::new());
        for n in 0..MAX_PINS as i32 {
            pins.acquire(PinId(n), Role::Input).unwrap();
        }

        assert_eq!(
            pins.acquire(PinId(40), Role::Input),
            Err(PinError::NoFreeSlot(PinId(40)))
        );
        assert!(!pins.platform().is_requested(PinId(40)));
    }
}
