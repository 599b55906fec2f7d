//! Command dispatch.
//!
//! Applies the current command to the board, the state or the link.
//! Three families, by what happens to the current command afterwards:
//!
//! - read-style (pin read, sensor selection, sensor reads): stays
//!   current, so it repeats on every poll with no new input
//! - write-style (pin writes, LED plot, calibration, range): settles to
//!   idle, so the write happens once
//! - selector-style (sync, hold, release, step, toggle, variable push,
//!   name enumeration): restores the command that was current before

use super::state::{PendingUpdate, SensorSelector};
use super::Session;
use crate::config::DISPLAY_SIZE;
use crate::hal::{Board, Link};
use crate::log_globals::SESSION_LOG;
use crate::protocol::{telemetry, Command, PinKind};
use crate::watch::Watch;
use crate::{probe_debug, probe_info, probe_warn};

impl<L: Link, B: Board> Session<L, B> {
    /// Dispatch the current command. `label` names the stop point for sync.
    pub(super) fn dispatch(&mut self, label: &str, watch: &mut dyn Watch) {
        let cmd = self.state.last_command().clone();
        let now = self.now_ms;

        match cmd {
            Command::Idle | Command::Ignored => {}

            Command::Sync => {
                let result = telemetry::breakpoint(&mut self.link, label);
                self.stats.track_record(result);
                self.send_snapshot();
                self.report_variables(watch);
                self.enumerate_sensors(watch);
                self.state.restore_previous();
            }

            Command::ReadPin { kind, pin } => {
                if self.pin_in_range(kind, pin) {
                    let value = match kind {
                        PinKind::Digital => self.board.digital_read(pin) as u16,
                        PinKind::Analog => self.board.analog_read(pin),
                    };
                    let result = telemetry::pin(&mut self.link, kind, pin, value);
                    self.stats.track_record(result);
                } else {
                    probe_warn!(SESSION_LOG, now, "read: pin {} out of range", pin);
                    self.state.settle();
                }
            }

            Command::WriteDigital { pin, high } => {
                if self.pin_in_range(PinKind::Digital, pin) {
                    self.board.digital_write(pin, high);
                    probe_debug!(SESSION_LOG, now, "digital pin {} = {}", pin, high as u8);
                } else {
                    probe_warn!(SESSION_LOG, now, "write: pin {} out of range", pin);
                }
                self.state.settle();
            }

            Command::WritePwm { pin, duty } => {
                if self.pin_in_range(PinKind::Analog, pin) {
                    self.board.analog_write(pin, duty);
                    probe_debug!(SESSION_LOG, now, "pwm pin {} = {}", pin, duty);
                } else {
                    probe_warn!(SESSION_LOG, now, "pwm: pin {} out of range", pin);
                }
                self.state.settle();
            }

            Command::Hold => {
                if !self.state.is_held() {
                    probe_info!(SESSION_LOG, now, "hold");
                }
                self.state.set_held(true);
                self.state.restore_previous();
            }

            Command::Release => {
                if self.state.is_held() {
                    probe_info!(SESSION_LOG, now, "release");
                }
                self.state.set_held(false);
                self.state.restore_previous();
            }

            Command::Step => {
                probe_info!(SESSION_LOG, now, "step");
                self.state.request_step();
                self.state.restore_previous();
            }

            Command::ToggleBreakpoints => {
                self.state.toggle_breakpoints();
                // releases a breakpoint currently waiting either way
                self.state.request_step();
                probe_info!(
                    SESSION_LOG,
                    now,
                    "breakpoints {}",
                    if self.state.breakpoints_enabled() { "on" } else { "off" }
                );
                self.state.restore_previous();
            }

            Command::UpdateVariable { name, value, declared } => {
                probe_debug!(SESSION_LOG, now, "update {} = {}", name.as_str(), value.as_str());
                self.state.set_pending(PendingUpdate { name, value, declared });
                self.report_variables(watch);
                self.state.restore_previous();
            }

            Command::EnumerateSensors => {
                self.enumerate_sensors(watch);
                self.state.restore_previous();
            }

            Command::SelectSensor(name) => {
                self.state.set_selector(SensorSelector::Named(name));
                self.report_sensors(watch);
            }

            Command::Plot { x, y } | Command::Unplot { x, y } => {
                if (x as usize) < DISPLAY_SIZE && (y as usize) < DISPLAY_SIZE {
                    if matches!(cmd, Command::Plot { .. }) {
                        self.board.plot(x, y);
                    } else {
                        self.board.unplot(x, y);
                    }
                    probe_debug!(SESSION_LOG, now, "led {},{} {:?}", x, y, cmd.opcode());
                } else {
                    probe_warn!(SESSION_LOG, now, "led {},{} out of range", x, y);
                }
                self.state.settle();
            }

            Command::CalibrateCompass => {
                self.board.calibrate_compass();
                self.state.settle();
            }

            Command::SetAccelRange(g) => {
                self.board.set_accel_range(g);
                self.state.settle();
            }

            Command::Heading => {
                let result = telemetry::heading(&mut self.link, self.board.heading());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::MagneticField => {
                let result = telemetry::magnetic_field(&mut self.link, self.board.magnetic_field());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::Acceleration => {
                let result = telemetry::acceleration(&mut self.link, self.board.acceleration());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::Tilt => {
                let result = telemetry::tilt(&mut self.link, self.board.tilt());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::Gesture => {
                let result = telemetry::gesture(&mut self.link, self.board.gesture());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::Light => {
                let result = telemetry::light(&mut self.link, self.board.light_level());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::Temperature => {
                let result = telemetry::temperature(&mut self.link, self.board.temperature());
                self.stats.track_record(result);
                self.slow_down();
            }

            Command::Sound => {
                let result = telemetry::sound(&mut self.link, self.board.sound_level());
                self.stats.track_record(result);
                // full rate while running, the hold loop has nothing else to do
                if self.state.is_held() {
                    self.slow_down();
                } else {
                    self.set_interval(0);
                }
            }
        }
    }

    /// One catalogue pass, then back to the sensor that was selected.
    fn enumerate_sensors(&mut self, watch: &mut dyn Watch) {
        let selected = self.state.selector().clone();
        self.state.set_selector(SensorSelector::EnumerateNames);
        self.report_sensors(watch);
        self.state.set_selector(selected);
    }

    fn pin_in_range(&self, kind: PinKind, pin: u8) -> bool {
        match kind {
            PinKind::Digital => pin < self.config.digital_pins,
            PinKind::Analog => pin < self.config.analog_pins,
        }
    }

    fn slow_down(&mut self) {
        self.set_interval(self.config.slow_poll_interval_ms);
    }

    fn set_interval(&mut self, ms: u32) {
        if self.state.poll_interval_ms() != ms {
            probe_debug!(SESSION_LOG, self.now_ms, "poll interval {} ms", ms);
            self.state.set_poll_interval(ms);
        }
    }
}
