//! Controller — the single owner of actuator state.
//!
//! [`ActuatorState`] and [`ManualOverride`] live behind one mutex shared by
//! the control loop, the command path and the buzzer-off timers, so a
//! read-modify-write of the fan never interleaves with a manual command.
//!
//! The controller also owns the hardware: [`Controller::cleanup`] switches
//! everything off, and dropping the last handle without calling it does the
//! same after logging a warning.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thermotrack_domain::actuator::{ActuatorState, HardwareStatus, Preset};
use thermotrack_domain::command::Command;
use thermotrack_domain::manual_override::ManualOverride;

use crate::ports::Actuators;

#[derive(Debug)]
struct ControllerState {
    actuators: ActuatorState,
    manual_override: ManualOverride,
    preset: Option<Preset>,
    led_on: bool,
    // Bumped on every buzzer write so stale timers know to stand down.
    buzzer_generation: u64,
    released: bool,
}

struct Shared<A: Actuators> {
    actuators: A,
    state: Mutex<ControllerState>,
}

/// Cloneable handle to the shared actuator state.
pub struct Controller<A: Actuators> {
    shared: Arc<Shared<A>>,
}

impl<A: Actuators> Clone for Controller<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: Actuators> Controller<A> {
    /// Take ownership of `actuators` with everything off.
    pub fn new(actuators: A, initial: ActuatorState, override_timeout: Duration) -> Self {
        let state = ControllerState {
            actuators: ActuatorState {
                fan_on: false,
                buzzer_on: false,
                ..initial
            },
            manual_override: ManualOverride::new(override_timeout),
            preset: None,
            led_on: false,
            buzzer_generation: 0,
            released: false,
        };
        Self {
            shared: Arc::new(Shared {
                actuators,
                state: Mutex::new(state),
            }),
        }
    }

    /// Borrow the underlying actuators.
    #[must_use]
    pub fn actuators(&self) -> &A {
        &self.shared.actuators
    }

    #[must_use]
    pub fn actuator_state(&self) -> ActuatorState {
        self.shared.lock().actuators
    }

    #[must_use]
    pub fn status(&self) -> HardwareStatus {
        self.shared.lock().status()
    }

    #[must_use]
    pub fn override_active(&self) -> bool {
        self.shared.lock().manual_override.is_active()
    }

    #[must_use]
    pub fn led_on(&self) -> bool {
        self.shared.lock().led_on
    }

    /// Apply a validated operator command and drive the outputs right away.
    ///
    /// Returns the status after the command, for publication.
    pub fn apply_command(&self, command: Command, now: Instant) -> HardwareStatus {
        let mut state = self.shared.lock();
        match command {
            Command::FanOn => {
                self.shared.write_fan(&mut state, true);
            }
            Command::FanOff => {
                self.shared.write_fan(&mut state, false);
            }
            Command::BuzzerOn => self.write_buzzer(&mut state, true, None),
            Command::BuzzerOff => self.write_buzzer(&mut state, false, None),
            Command::AutoOn => {
                state.actuators.fan_auto_mode = true;
                state.manual_override.clear();
            }
            Command::AutoOff => state.actuators.fan_auto_mode = false,
            Command::SetThreshold(threshold) => {
                state.actuators.temperature_threshold_celsius = threshold;
            }
            Command::ApplyPreset(preset) => {
                let mut target = state.actuators;
                preset.apply(&mut target);
                let fan_target = target.fan_on;
                target.fan_on = state.actuators.fan_on;
                state.actuators = target;
                if fan_target != state.actuators.fan_on {
                    self.shared.write_fan(&mut state, fan_target);
                }
                state.preset = Some(preset);
            }
        }
        if command.starts_override() {
            state.manual_override.engage(now);
        }
        tracing::info!(
            %command,
            fan_on = state.actuators.fan_on,
            auto_mode = state.actuators.fan_auto_mode,
            manual_override = state.manual_override.is_active(),
            "manual command applied"
        );
        state.status()
    }

    /// Expire the manual override if its window has passed.
    ///
    /// Returns `true` on the call that performs the expiry.
    pub fn expire_override(&self, now: Instant) -> bool {
        let mut state = self.shared.lock();
        Self::expire_locked(&mut state, now)
    }

    /// Run the automatic fan policy for one reading.
    ///
    /// Expires the override first. Does nothing while the override is active,
    /// while auto mode is off, or when the temperature is absent. The fan is
    /// only written when the desired state differs from the current one.
    /// Returns the new fan state when it changed.
    pub fn apply_automatic_fan(&self, temperature_celsius: Option<f64>, now: Instant) -> Option<bool> {
        let mut state = self.shared.lock();
        Self::expire_locked(&mut state, now);
        if state.manual_override.is_active() || !state.actuators.fan_auto_mode {
            return None;
        }
        let temperature = temperature_celsius?;
        let desired = state.actuators.desired_fan(temperature);
        if desired == state.actuators.fan_on {
            return None;
        }
        if !self.shared.write_fan(&mut state, desired) {
            return None;
        }
        tracing::info!(
            temperature,
            threshold = state.actuators.temperature_threshold_celsius,
            fan_on = desired,
            "automatic fan change"
        );
        Some(desired)
    }

    /// Drive the buzzer. With a duration, it is switched off again by a
    /// background timer once the duration elapses.
    pub fn set_buzzer(&self, on: bool, duration: Option<Duration>) {
        let mut state = self.shared.lock();
        self.write_buzzer(&mut state, on, duration);
    }

    /// Short beep unless the buzzer is already sounding.
    ///
    /// Returns `true` if a beep was started.
    pub fn beep(&self, duration: Duration) -> bool {
        let mut state = self.shared.lock();
        if state.actuators.buzzer_on {
            return false;
        }
        self.write_buzzer(&mut state, true, Some(duration));
        state.actuators.buzzer_on
    }

    pub fn set_led(&self, on: bool) {
        let mut state = self.shared.lock();
        match self.shared.actuators.set_led(on) {
            Ok(()) => state.led_on = on,
            Err(err) => tracing::warn!(error = %err, on, "failed to drive LED"),
        }
    }

    /// Switch every output off and release the hardware. Idempotent.
    pub fn cleanup(&self) {
        let mut state = self.shared.lock();
        self.shared.release(&mut state);
    }

    fn expire_locked(state: &mut ControllerState, now: Instant) -> bool {
        let expired = state.manual_override.expire_if_elapsed(now);
        if expired {
            tracing::info!("manual override expired, automatic control resumed");
        }
        expired
    }

    fn write_buzzer(&self, state: &mut ControllerState, on: bool, duration: Option<Duration>) {
        state.buzzer_generation = state.buzzer_generation.wrapping_add(1);
        if let Err(err) = self.shared.actuators.set_buzzer(on) {
            tracing::warn!(error = %err, on, "failed to drive buzzer");
            return;
        }
        state.actuators.buzzer_on = on;
        if let (true, Some(duration)) = (on, duration) {
            self.schedule_buzzer_off(state.buzzer_generation, duration);
        }
    }

    fn schedule_buzzer_off(&self, generation: u64, duration: Duration) {
        let shared = Arc::clone(&self.shared);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tokio::time::sleep(duration).await;
                shared.finish_beep(generation);
            });
        } else {
            std::thread::spawn(move || {
                std::thread::sleep(duration);
                shared.finish_beep(generation);
            });
        }
    }
}

impl<A: Actuators> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_fan(&self, state: &mut ControllerState, on: bool) -> bool {
        match self.actuators.set_fan(on) {
            Ok(()) => {
                state.actuators.fan_on = on;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, on, "failed to drive fan");
                false
            }
        }
    }

    fn finish_beep(&self, generation: u64) {
        let mut state = self.lock();
        if state.buzzer_generation != generation || !state.actuators.buzzer_on {
            return;
        }
        match self.actuators.set_buzzer(false) {
            Ok(()) => {
                state.actuators.buzzer_on = false;
                tracing::debug!("timed buzzer off");
            }
            Err(err) => tracing::warn!(error = %err, "failed to switch timed buzzer off"),
        }
    }

    fn release(&self, state: &mut ControllerState) {
        state.buzzer_generation = state.buzzer_generation.wrapping_add(1);
        if let Err(err) = self.actuators.cleanup() {
            tracing::warn!(error = %err, "hardware cleanup reported an error");
        }
        state.actuators.fan_on = false;
        state.actuators.buzzer_on = false;
        state.led_on = false;
        if state.released {
            tracing::debug!("hardware already released");
        } else {
            tracing::info!("hardware released, all outputs off");
            state.released = true;
        }
    }
}

impl<A: Actuators> Drop for Shared<A> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.released {
            return;
        }
        tracing::warn!("controller dropped without cleanup, switching outputs off");
        if let Err(err) = self.actuators.cleanup() {
            tracing::warn!(error = %err, "hardware cleanup reported an error");
        }
        state.released = true;
    }
}

impl ControllerState {
    fn status(&self) -> HardwareStatus {
        HardwareStatus {
            actuators: self.actuators,
            manual_override: self.manual_override.is_active(),
            preset: self.preset,
        }
    }
}
