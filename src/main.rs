//! RustLiveProbe - Main entry point
//!
//! Runs a small demo program under a debug session.
//!
//! - Device build: protocol on UART0, diagnostics TX-only on UART1 (GPIO6)
//! - Host build: protocol on stdin/stdout against a simulated board,
//!   diagnostics on stderr
//!
//! The log drain runs on its own thread in both builds; the session and
//! the demo share the main thread.

use std::thread;
use std::time::{Duration, Instant};

use rust_live_probe::hal::sim::BUTTON_A_PIN;
use rust_live_probe::hal::{Board, Link};
use rust_live_probe::log_drain::LogDrain;
use rust_live_probe::watch::{Reporter, Watch};
use rust_live_probe::{probe_info, Session, SESSION_LOG, VERSION};

/// Drain period for the diagnostic thread.
const LOG_DRAIN_PERIOD: Duration = Duration::from_millis(20);

/// Demo program: counts, blinks the centre pixel, stops every
/// `threshold` counts.
struct Demo {
    count: i32,
    threshold: i32,
    blink: bool,
    light: u8,
    button_a: bool,
}

impl Demo {
    fn new() -> Self {
        Self {
            count: 0,
            threshold: 10,
            blink: true,
            light: 0,
            button_a: false,
        }
    }
}

impl Watch for Demo {
    fn variables(&mut self, report: &mut Reporter<'_>) {
        self.count = report.variable("count", self.count);
        self.threshold = report.variable("threshold", self.threshold);
        self.blink = report.variable("blink", self.blink);
    }

    fn sensors(&mut self, report: &mut Reporter<'_>) {
        report.sensor("light", self.light);
        report.sensor("button_a", self.button_a);
    }
}

/// One iteration of the demo program.
fn demo_step<L: Link, B: Board>(session: &mut Session<L, B>, demo: &mut Demo) {
    demo.count = demo.count.wrapping_add(1);

    let board = session.board_mut();
    demo.light = board.light_level();
    demo.button_a = board.digital_read(BUTTON_A_PIN) == 1;
    if demo.blink && demo.count % 2 == 0 {
        board.plot(2, 2);
    } else {
        board.unplot(2, 2);
    }

    let stop = demo.button_a || (demo.threshold > 0 && demo.count % demo.threshold == 0);
    session.conditional_breakpoint(stop, "count threshold", demo);

    session.yield_for(500, demo);
}

fn run<L: Link, B: Board>(mut session: Session<L, B>) -> ! {
    let mut demo = Demo::new();
    probe_info!(SESSION_LOG, 0, "{} ready", VERSION);
    session.run_supervised(&mut demo, demo_step::<L, B>)
}

/// Spawn the diagnostic drain on its own thread.
fn spawn_log_drain<S>(mut sink: S) -> std::io::Result<()>
where
    S: core::fmt::Write + Send + 'static,
{
    let start = Instant::now();
    thread::Builder::new()
        .name("log-drain".into())
        .stack_size(4096)
        .spawn(move || {
            let mut drain = LogDrain::new();
            loop {
                let now_ms = start.elapsed().as_millis() as u32;
                drain.drain(&SESSION_LOG, &mut sink, now_ms);
                thread::sleep(LOG_DRAIN_PERIOD);
            }
        })?;
    Ok(())
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    use esp_idf_svc::hal::peripherals::Peripherals;
    use rust_live_probe::config::LinkConfig;
    use rust_live_probe::hal::esp::{init_log_uart, EspBoard, UartLink};

    esp_idf_svc::sys::link_patches();

    let peripherals = Peripherals::take()?;
    let config = LinkConfig::default();

    let log_uart = init_log_uart(peripherals.uart1, peripherals.pins.gpio6, &config)?;
    if spawn_log_drain(log_uart).is_err() {
        // keep debugging without diagnostics
        rust_live_probe::probe_error!(SESSION_LOG, 0, "log drain not started");
    }

    let link = UartLink::new(
        peripherals.uart0,
        peripherals.pins.gpio43,
        peripherals.pins.gpio44,
        &config,
    )?;
    let board = EspBoard::new()?;

    run(Session::new(link, board))
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    let (link, board) = host::setup();
    if let Err(e) = spawn_log_drain(host::StderrSink) {
        eprintln!("log drain not started: {}", e);
    }
    run(Session::new(link, board))
}

#[cfg(not(target_os = "espidf"))]
mod host {
    //! Host simulator plumbing.

    use std::fmt;
    use std::io::{self, BufRead, Write};
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use std::time::Instant;

    use rust_live_probe::hal::sim::SimBoard;
    use rust_live_probe::hal::{Axes, Clock, Display, Gesture, Link, Pins, SensorHub, Tilt};
    use rust_live_probe::protocol::LineBuffer;

    /// Protocol link over stdin/stdout. A reader thread feeds lines so
    /// polling never blocks.
    pub struct StdioLink {
        lines: Receiver<String>,
        out: io::Stdout,
    }

    impl fmt::Write for StdioLink {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.out.write_all(s.as_bytes()).map_err(|_| fmt::Error)?;
            if s.ends_with('\n') {
                self.out.flush().map_err(|_| fmt::Error)?;
            }
            Ok(())
        }
    }

    impl Link for StdioLink {
        fn read_line(&mut self, line: &mut LineBuffer) -> bool {
            match self.lines.try_recv() {
                Ok(next) => {
                    line.set(&next);
                    true
                }
                Err(_) => false,
            }
        }
    }

    /// Simulated board on the wall clock.
    pub struct HostBoard {
        sim: SimBoard,
        start: Instant,
    }

    impl Pins for HostBoard {
        fn digital_read(&mut self, pin: u8) -> u8 {
            self.sim.digital_read(pin)
        }

        fn digital_write(&mut self, pin: u8, high: bool) {
            self.sim.digital_write(pin, high)
        }

        fn analog_read(&mut self, pin: u8) -> u16 {
            self.sim.analog_read(pin)
        }

        fn analog_write(&mut self, pin: u8, duty: u16) {
            self.sim.analog_write(pin, duty)
        }
    }

    impl Display for HostBoard {
        fn point(&self, x: u8, y: u8) -> bool {
            self.sim.point(x, y)
        }

        fn plot(&mut self, x: u8, y: u8) {
            self.sim.plot(x, y)
        }

        fn unplot(&mut self, x: u8, y: u8) {
            self.sim.unplot(x, y)
        }
    }

    impl Clock for HostBoard {
        fn now_ms(&mut self) -> u32 {
            self.start.elapsed().as_millis() as u32
        }
    }

    impl SensorHub for HostBoard {
        fn calibrate_compass(&mut self) {
            self.sim.calibrate_compass()
        }

        fn heading(&mut self) -> i32 {
            self.sim.heading()
        }

        fn magnetic_field(&mut self) -> Axes {
            self.sim.magnetic_field()
        }

        fn set_accel_range(&mut self, g: u8) {
            self.sim.set_accel_range(g)
        }

        fn acceleration(&mut self) -> Axes {
            self.sim.acceleration()
        }

        fn tilt(&mut self) -> Tilt {
            self.sim.tilt()
        }

        fn gesture(&mut self) -> Option<Gesture> {
            self.sim.gesture()
        }

        fn light_level(&mut self) -> u8 {
            // slow triangle wave so the host has something to plot
            let t = (self.start.elapsed().as_millis() / 20 % 510) as u32;
            (if t > 255 { 510 - t } else { t }) as u8
        }

        fn temperature(&mut self) -> i32 {
            self.sim.temperature()
        }

        fn sound_level(&mut self) -> u8 {
            self.sim.sound_level()
        }
    }

    /// Diagnostic sink on stderr.
    pub struct StderrSink;

    impl fmt::Write for StderrSink {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            io::stderr().write_all(s.as_bytes()).map_err(|_| fmt::Error)
        }
    }

    pub fn setup() -> (StdioLink, HostBoard) {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut sim = SimBoard::new();
        sim.temperature = 21;

        let link = StdioLink {
            lines: rx,
            out: io::stdout(),
        };
        let board = HostBoard {
            sim,
            start: Instant::now(),
        };
        (link, board)
    }
}
