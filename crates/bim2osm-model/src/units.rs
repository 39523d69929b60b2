// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit catalog
//!
//! Length values are converted to meters and plane angles to radians.

use serde::{Deserialize, Serialize};

/// Length units recognized in `IFCUNITASSIGNMENT`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    M,
    CM,
    MM,
}

impl LengthUnit {
    /// Factor from this unit to meters
    pub const fn to_meters(self) -> f64 {
        match self {
            LengthUnit::M => 1.0,
            LengthUnit::CM => 0.01,
            LengthUnit::MM => 0.001,
        }
    }

    /// Map an `IFCSIUNIT` prefix (`None` for no prefix) to a length unit
    pub fn from_si_prefix(prefix: Option<&str>) -> Option<Self> {
        match prefix {
            None => Some(LengthUnit::M),
            Some("CENTI") => Some(LengthUnit::CM),
            Some("MILLI") => Some(LengthUnit::MM),
            Some(_) => None,
        }
    }
}

/// Plane angle units recognized in `IFCUNITASSIGNMENT`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaneAngleUnit {
    #[default]
    RAD,
    DEG,
}

impl PlaneAngleUnit {
    /// Factor from this unit to radians
    pub const fn to_radians(self) -> f64 {
        match self {
            PlaneAngleUnit::RAD => 1.0,
            PlaneAngleUnit::DEG => std::f64::consts::PI / 180.0,
        }
    }
}

/// Units in effect for one model
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitContext {
    pub length: LengthUnit,
    pub angle: PlaneAngleUnit,
}

impl UnitContext {
    pub fn new(length: LengthUnit, angle: PlaneAngleUnit) -> Self {
        Self { length, angle }
    }

    /// Convert a raw length to meters
    #[inline]
    pub fn length(&self, raw: f64) -> f64 {
        raw * self.length.to_meters()
    }

    /// Convert a raw plane angle to radians
    #[inline]
    pub fn angle(&self, raw: f64) -> f64 {
        raw * self.angle.to_radians()
    }
}
