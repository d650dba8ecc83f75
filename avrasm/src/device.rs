use std::fmt;

/// The instruction-set level a part implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Core {
    /// the classic core
    #[default]
    Avr,
    /// enhanced core: adds `mul`, `movw`, long jumps and friends
    AvrE,
}

impl fmt::Display for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Core::Avr => "AVR",
            Core::AvrE => "AVRe",
        })
    }
}

/// Memory sizes are in bytes except `flash_size`, which is in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub name: &'static str,
    pub core: Core,
    pub ram_start: u32,
    pub ram_size: u32,
    pub eeprom_size: u32,
    pub flash_size: u32,
}

const fn part(
    name: &'static str,
    core: Core,
    ram_start: u32,
    ram_size: u32,
    eeprom_size: u32,
    flash_size: u32,
) -> Device {
    Device {
        name,
        core,
        ram_start,
        ram_size,
        eeprom_size,
        flash_size,
    }
}

/// Used until a `.device` directive selects something else.
pub const DEFAULT: Device = part("", Core::Avr, 0x60, 128, 128, 2048);

const DEVICES: &[Device] = &[
    DEFAULT,
    part("attiny25", Core::Avr, 0x60, 128, 128, 1024),
    part("at90s8515", Core::Avr, 0x60, 512, 512, 4096),
    part("at90usb82", Core::AvrE, 0x100, 512, 512, 4096),
    part("at90usb162", Core::AvrE, 0x100, 512, 512, 8192),
    part("atmega8", Core::AvrE, 0x60, 1024, 512, 4096),
    part("atmega328p", Core::AvrE, 0x100, 2048, 1024, 16384),
];

impl Default for Device {
    fn default() -> Self {
        DEFAULT
    }
}

impl Device {
    /// Names are matched after lowercasing, mirroring the lexer.
    pub fn lookup(name: &str) -> Option<Device> {
        let name = name.to_lowercase();
        DEVICES.iter().find(|d| d.name == name).copied()
    }
}
