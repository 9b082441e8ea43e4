//! Laser identification from model and serial numbers
use core::fmt::{self, Write};
use heapless::String;
use serde::{Deserialize, Serialize};

/// Laser family, decides which modulation commands are available
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum LaserKind {
    Generic,
    /// 06-01 series diode laser
    Mld06,
    /// 06-01 series modulated DPSS laser
    Dpl06,
}

const DPL_WAVELENGTHS: [u16; 3] = [532, 553, 561];

impl LaserKind {
    pub fn classify(model_number: &str) -> Self {
        if !model_number.contains("-06-") {
            return LaserKind::Generic;
        }
        let dpl_wavelength =
            wavelength_nm(model_number).map_or(false, |nm| DPL_WAVELENGTHS.contains(&nm));
        let dpl_segment = model_number.contains("-91-") || model_number.contains("-93-");
        if !model_number.contains("-71-") && (dpl_wavelength || dpl_segment) {
            LaserKind::Dpl06
        } else {
            LaserKind::Mld06
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LaserKind::Generic => "CoboltLaser",
            LaserKind::Mld06 => "Cobolt06MLD",
            LaserKind::Dpl06 => "Cobolt06DPL",
        }
    }
}

impl fmt::Display for LaserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wavelength encoded in the first four characters of a model number.
pub fn wavelength_nm(model_number: &str) -> Option<u16> {
    model_number.get(0..4)?.parse().ok()
}

/// Splits the serial number reported by firmware without a dotted version.
///
/// Such lasers encode the wavelength in front of the first `0`, the real
/// serial number follows with its leading zeros.
pub fn legacy_identity(serial_number: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = serial_number.split_once('0')?;
    Some((prefix, rest.trim_start_matches('0')))
}

/// Model number placeholder for a legacy laser with the given prefix.
pub fn legacy_model_number(prefix: &str) -> Option<String<32>> {
    let mut model = String::new();
    write!(model, "0{}-04-XX-XXXX-XXX", prefix).ok()?;
    Some(model)
}

/// Whether `slc` takes mA for this model, otherwise it takes A.
pub fn current_in_milliamps(model_number: &str) -> bool {
    model_number.contains("-08-") && model_number.contains("-06-")
}
