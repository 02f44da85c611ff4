//! Synthetic motion profiles.
//!
//! Each profile is a periodic body motion (step cadence, pedalling, engine
//! vibration) with an amplitude on the linear accelerometer and the gyroscope.
//! Gravity stays near 9.81 m/s² and tilts with the motion.

/// Standard gravity in m/s².
pub const G: f32 = 9.806_65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
    Still,
    #[default]
    Walking,
    Running,
    Cycling,
    Vehicle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    /// Dominant frequency of the motion in Hz.
    pub cadence_hz: f32,
    /// Peak linear acceleration in m/s².
    pub linear_amp: f32,
    /// Peak angular rate in rad/s.
    pub gyro_amp: f32,
    /// Peak tilt of the gravity vector in radians.
    pub tilt: f32,
}

impl Motion {
    pub const ALL: [Motion; 5] = [
        Motion::Still,
        Motion::Walking,
        Motion::Running,
        Motion::Cycling,
        Motion::Vehicle,
    ];

    pub const fn profile(self) -> Profile {
        match self {
            Motion::Still => Profile {
                cadence_hz: 0.0,
                linear_amp: 0.0,
                gyro_amp: 0.0,
                tilt: 0.0,
            },
            Motion::Walking => Profile {
                cadence_hz: 1.8,
                linear_amp: 1.5,
                gyro_amp: 0.6,
                tilt: 0.08,
            },
            Motion::Running => Profile {
                cadence_hz: 2.8,
                linear_amp: 5.0,
                gyro_amp: 1.5,
                tilt: 0.2,
            },
            Motion::Cycling => Profile {
                cadence_hz: 1.2,
                linear_amp: 0.8,
                gyro_amp: 0.3,
                tilt: 0.3,
            },
            Motion::Vehicle => Profile {
                cadence_hz: 12.0,
                linear_amp: 0.3,
                gyro_amp: 0.05,
                tilt: 0.02,
            },
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Motion::Still => "still",
            Motion::Walking => "walking",
            Motion::Running => "running",
            Motion::Cycling => "cycling",
            Motion::Vehicle => "vehicle",
        }
    }
}

impl core::str::FromStr for Motion {
    type Err = crate::error::SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Motion::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(crate::error::SensorError::Invalid("unknown motion"))
    }
}

impl core::fmt::Display for Motion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
