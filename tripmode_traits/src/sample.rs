//! Raw inertial samples and the closed set of sensor channels.

/// Number of sensor channels.
pub const CHANNEL_COUNT: usize = 3;

/// Feature vector length: channels x {mean, entropy} x {x, y, z}.
pub const FEATURE_LEN: usize = CHANNEL_COUNT * 2 * 3;

/// Sensor source. Declaration order is the feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    LinearAcceleration,
    Gravity,
    Gyroscope,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::LinearAcceleration,
        Channel::Gravity,
        Channel::Gyroscope,
    ];

    /// Dense index used for per-channel arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::LinearAcceleration => 0,
            Channel::Gravity => 1,
            Channel::Gyroscope => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::LinearAcceleration => "linear",
            Channel::Gravity => "gravity",
            Channel::Gyroscope => "gyroscope",
        }
    }

    /// File name of this channel inside a recording directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Channel::LinearAcceleration => "linear.csv",
            Channel::Gravity => "gravity.csv",
            Channel::Gyroscope => "gyro.csv",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One 3-axis reading. `timestamp_us` counts microseconds from an arbitrary
/// monotonic epoch shared by producer and consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_us: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    #[inline]
    pub const fn new(timestamp_us: u64, x: f32, y: f32, z: f32) -> Self {
        Self {
            timestamp_us,
            x,
            y,
            z,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A sample tagged with the channel it was delivered on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub channel: Channel,
    pub sample: Sample,
}

impl SensorEvent {
    #[inline]
    pub const fn new(channel: Channel, sample: Sample) -> Self {
        Self { channel, sample }
    }
}
