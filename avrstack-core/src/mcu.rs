//! A small static lookup of per-microcontroller RAM properties, used to
//! turn a raw worst-case byte count into a headroom figure and percentage
//! in the final report.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct McuProperties {
    pub ram_size: u32,
    pub ram_start: u32,
    pub stack_top: u32,
}

const KNOWN_MCUS: &[(&str, McuProperties)] = &[
    (
        "atmega328p",
        McuProperties {
            ram_size: 2048,
            ram_start: 0x100,
            stack_top: 0x08FF,
        },
    ),
    (
        "atmega2560",
        McuProperties {
            ram_size: 8192,
            ram_start: 0x200,
            stack_top: 0x21FF,
        },
    ),
    (
        "attiny85",
        McuProperties {
            ram_size: 512,
            ram_start: 0x60,
            stack_top: 0x025F,
        },
    ),
];

pub const DEFAULT_MCU: &str = "atmega328p";

/// Looks up RAM properties for `mcu_type`, falling back to
/// [`DEFAULT_MCU`] (and reporting that fallback) for unknown types.
pub fn ram_properties(mcu_type: &str) -> (McuProperties, bool) {
    for (name, props) in KNOWN_MCUS {
        if *name == mcu_type {
            return (*props, false);
        }
    }
    let (_, default_props) = KNOWN_MCUS
        .iter()
        .find(|(name, _)| *name == DEFAULT_MCU)
        .expect("DEFAULT_MCU must be present in KNOWN_MCUS");
    (*default_props, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_mcu_resolves_exactly() {
        let (props, fell_back) = ram_properties("atmega2560");
        assert!(!fell_back);
        assert_eq!(props.ram_size, 8192);
    }

    #[test]
    fn unknown_mcu_falls_back_to_default() {
        let (props, fell_back) = ram_properties("attiny13");
        assert!(fell_back);
        assert_eq!(props.ram_size, 2048);
    }
}
