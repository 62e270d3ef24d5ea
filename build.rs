use std::env;

const DEFAULT_CPU_FREQUENCY_HZ: &str = "16000000";

fn main() {
    println!("cargo:rerun-if-env-changed=AVR_CPU_FREQUENCY_HZ");

    // Reference clock for the frequency calculations, overridable per board
    let freq = env::var("AVR_CPU_FREQUENCY_HZ")
        .unwrap_or_else(|_| DEFAULT_CPU_FREQUENCY_HZ.to_string());
    if freq.parse::<u32>().map_or(true, |hz| hz == 0) {
        panic!("AVR_CPU_FREQUENCY_HZ must be a non-zero integer, got {:?}", freq);
    }
    println!("cargo:rustc-env=AVR_CPU_FREQUENCY_HZ={}", freq);

    // Host builds are used for the test suite, only AVR builds get the mcu flags
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega32u4");
        println!("cargo:warning=Building for ATmega32U4 at {}Hz", freq);
    }
}
