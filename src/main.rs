//! Leonardo demo: 25kHz fan drive on D9, 490Hz LED fade on D5
#![no_std]
#![no_main]

use panic_halt as _;

use avr_timer_pwm::board;
use avr_timer_pwm::config::CPU_FREQ_HZ;
use avr_timer_pwm::hal::{Mmio, Pwm};
use embedded_hal::PwmPin;

const FAN_PIN: u8 = 9;
const LED_PIN: u8 = 5;

#[avr_device::entry]
fn main() -> ! {
    let pwm = Pwm::new(Mmio::new());

    // Timer 0 stays with the system clock
    pwm.init_timers_safe(100).unwrap();

    let fan_channel = board::digital_pin_to_timer(FAN_PIN);
    let led_channel = board::digital_pin_to_timer(LED_PIN);
    pwm.set_pin_frequency_safe(fan_channel, 25_000).unwrap();
    pwm.set_pin_frequency_safe(led_channel, 490).unwrap();

    let fan_pin = board::pin(Mmio::new(), FAN_PIN).unwrap().into_output();
    let mut led = board::pin(Mmio::new(), LED_PIN).unwrap().into_output();

    let mut fan = pwm.bind(fan_pin, fan_channel);
    fan.set_duty(fan.get_max_duty() / 2);
    fan.enable();

    let mut fan_duty = fan.get_duty();

    loop {
        for duty in (0..=255u8).chain((0..=254).rev()) {
            pwm.write_duty(&mut led, led_channel, duty).ok();
            delay_ms(4);
        }

        // slow ramp on the fan, wraps back to 25%
        fan_duty = fan_duty.saturating_add(1024);
        if fan_duty == u16::MAX {
            fan_duty = u16::MAX / 4;
        }
        fan.set_duty(fan_duty);
    }
}

fn delay_ms(ms: u16) {
    // roughly four cycles per iteration
    let per_ms = CPU_FREQ_HZ / 4_000;
    for _ in 0..ms {
        for _ in 0..per_ms {
            avr_device::asm::nop();
        }
    }
}
