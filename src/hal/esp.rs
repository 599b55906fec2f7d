//! ESP-IDF board.
//!
//! - [`UartLink`]: protocol link on UART0, non-blocking reads
//! - [`EspBoard`]: pin table over raw GPIO, LEDC PWM and ADC1
//! - [`init_log_uart`]: TX-only UART1 for the diagnostic drain
//!
//! The LED matrix is kept in a [`FrameBuffer`]; boards without a matrix
//! still answer snapshot requests from it.

use core::fmt;

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver, UartTxDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{self, EspError};

use super::{Clock, Display, FrameBuffer, Link, Pins, SensorHub};
use crate::config::LinkConfig;
use crate::protocol::LineBuffer;

/// Logical digital index to GPIO number. `-1` marks an unwired index.
const DIGITAL_GPIO: [i32; 21] = [
    1, 2, 3, 4, 5, 0, 7, 8, 9, 10, 11, 14, 12, 13, 15, 16, 17, 18, 21, 38, 39,
];

/// Logical analog index to (GPIO number, ADC1 channel).
const ANALOG_GPIO: [(i32, sys::adc1_channel_t); 3] = [
    (1, sys::adc1_channel_t_ADC1_CHANNEL_0),
    (2, sys::adc1_channel_t_ADC1_CHANNEL_1),
    (3, sys::adc1_channel_t_ADC1_CHANNEL_2),
];

/// LEDC duty resolution; matches the 10-bit range the host sends.
const PWM_RESOLUTION: sys::ledc_timer_bit_t = sys::ledc_timer_bit_t_LEDC_TIMER_10_BIT;
const PWM_FREQUENCY_HZ: u32 = 1000;

/// Protocol link over a full-duplex UART.
pub struct UartLink<'d> {
    uart: UartDriver<'d>,
    pending: LineBuffer,
}

impl<'d> UartLink<'d> {
    /// Open UART0 on the given pins.
    pub fn new(
        uart: impl Peripheral<P = uart::UART0> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
        rx_pin: impl Peripheral<P = impl gpio::InputPin> + 'd,
        config: &LinkConfig,
    ) -> Result<Self, EspError> {
        let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));

        let uart = UartDriver::new(
            uart,
            tx_pin,
            rx_pin,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &uart_config,
        )?;

        Ok(Self {
            uart,
            pending: LineBuffer::new(),
        })
    }
}

impl fmt::Write for UartLink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            let n = self.uart.write(bytes).map_err(|_| fmt::Error)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

impl Link for UartLink<'_> {
    fn read_line(&mut self, line: &mut LineBuffer) -> bool {
        let mut byte = [0u8; 1];
        loop {
            match self.uart.read(&mut byte, NON_BLOCK) {
                Ok(1) => {}
                _ => return false,
            }

            if byte[0] == b'\n' {
                line.set(self.pending.as_str());
                self.pending.clear();
                return true;
            }
            // an overlong line is cut, the rest arrives as the next line
            if !self.pending.push(byte[0]) {
                line.set(self.pending.as_str());
                self.pending.clear();
                let _ = self.pending.push(byte[0]);
                return true;
            }
        }
    }
}

/// Initialize UART1 TX-only for log output.
pub fn init_log_uart<'d>(
    uart: impl Peripheral<P = uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &LinkConfig,
) -> Result<LogUart<'d>, EspError> {
    let uart_config = uart::config::Config::default().baudrate(Hertz(config.log_baud_rate));

    let tx = UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )?;
    Ok(LogUart { tx })
}

/// Diagnostic sink for [`LogDrain`](crate::log_drain::LogDrain).
pub struct LogUart<'d> {
    tx: UartTxDriver<'d>,
}

impl fmt::Write for LogUart<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // best effort, a lost log line is acceptable
        let _ = self.tx.write(s.as_bytes());
        Ok(())
    }
}

/// Board backed by ESP-IDF drivers.
pub struct EspBoard {
    frame: FrameBuffer,
    /// Bit `n` set once analog index `n` is attached to LEDC channel `n`.
    pwm_attached: u8,
}

impl EspBoard {
    /// Configure every wired pin as input/output and the ADC/LEDC units.
    pub fn new() -> Result<Self, EspError> {
        for &gpio in DIGITAL_GPIO.iter().filter(|&&g| g >= 0) {
            // SAFETY: plain IDF driver calls on pins listed in the table.
            unsafe {
                sys::esp!(sys::gpio_reset_pin(gpio))?;
                sys::esp!(sys::gpio_set_direction(
                    gpio,
                    sys::gpio_mode_t_GPIO_MODE_INPUT_OUTPUT
                ))?;
            }
        }

        let timer = sys::ledc_timer_config_t {
            speed_mode: sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            duty_resolution: PWM_RESOLUTION,
            timer_num: sys::ledc_timer_t_LEDC_TIMER_0,
            freq_hz: PWM_FREQUENCY_HZ,
            clk_cfg: sys::soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };

        // SAFETY: config structs live for the duration of the calls.
        unsafe {
            sys::esp!(sys::ledc_timer_config(&timer))?;
            sys::esp!(sys::adc1_config_width(sys::adc_bits_width_t_ADC_WIDTH_BIT_12))?;
            for &(_, channel) in ANALOG_GPIO.iter() {
                sys::esp!(sys::adc1_config_channel_atten(
                    channel,
                    sys::adc_atten_t_ADC_ATTEN_DB_12
                ))?;
            }
        }

        Ok(Self {
            frame: FrameBuffer::new(),
            pwm_attached: 0,
        })
    }

    fn attach_pwm(&mut self, channel: u8, gpio: i32) -> Result<(), EspError> {
        let config = sys::ledc_channel_config_t {
            gpio_num: gpio,
            speed_mode: sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: channel as sys::ledc_channel_t,
            timer_sel: sys::ledc_timer_t_LEDC_TIMER_0,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        // SAFETY: config lives for the duration of the call.
        unsafe { sys::esp!(sys::ledc_channel_config(&config)) }
    }
}

impl Pins for EspBoard {
    fn digital_read(&mut self, pin: u8) -> u8 {
        match DIGITAL_GPIO.get(pin as usize) {
            // SAFETY: pin configured in `new`.
            Some(&gpio) if gpio >= 0 => unsafe { sys::gpio_get_level(gpio) as u8 },
            _ => 0,
        }
    }

    fn digital_write(&mut self, pin: u8, high: bool) {
        if let Some(&gpio) = DIGITAL_GPIO.get(pin as usize) {
            if gpio >= 0 {
                // SAFETY: pin configured in `new`.
                unsafe {
                    sys::gpio_set_level(gpio, high as u32);
                }
            }
        }
    }

    fn analog_read(&mut self, pin: u8) -> u16 {
        match ANALOG_GPIO.get(pin as usize) {
            // 12-bit ADC scaled to the 10-bit range the host expects
            // SAFETY: channel configured in `new`.
            Some(&(_, channel)) => unsafe { (sys::adc1_get_raw(channel).max(0) >> 2) as u16 },
            None => 0,
        }
    }

    fn analog_write(&mut self, pin: u8, duty: u16) {
        let Some(&(gpio, _)) = ANALOG_GPIO.get(pin as usize) else {
            return;
        };
        let channel = pin;
        if self.pwm_attached & (1 << channel) == 0 {
            if self.attach_pwm(channel, gpio).is_err() {
                return;
            }
            self.pwm_attached |= 1 << channel;
        }
        // SAFETY: channel attached above.
        unsafe {
            let mode = sys::ledc_mode_t_LEDC_LOW_SPEED_MODE;
            sys::ledc_set_duty(mode, channel as sys::ledc_channel_t, duty.min(1023) as u32);
            sys::ledc_update_duty(mode, channel as sys::ledc_channel_t);
        }
    }
}

impl Display for EspBoard {
    fn point(&self, x: u8, y: u8) -> bool {
        self.frame.point(x, y)
    }

    fn plot(&mut self, x: u8, y: u8) {
        self.frame.plot(x, y);
    }

    fn unplot(&mut self, x: u8, y: u8) {
        self.frame.unplot(x, y);
    }
}

impl Clock for EspBoard {
    fn now_ms(&mut self) -> u32 {
        // SAFETY: esp_timer is started by the IDF before main.
        (unsafe { sys::esp_timer_get_time() } / 1000) as u32
    }
}

/// No sensors wired: every reading is the neutral default.
impl SensorHub for EspBoard {}
