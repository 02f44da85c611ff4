//! Activity labels produced by the classifier.

/// Classification outcome. `None` is the distinguished "no classification"
/// value used whenever the window holds too little data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivityLabel {
    #[default]
    None,
    Still,
    Walking,
    Running,
    Cycling,
    Vehicle,
}

impl ActivityLabel {
    pub const ALL: [ActivityLabel; 6] = [
        ActivityLabel::None,
        ActivityLabel::Still,
        ActivityLabel::Walking,
        ActivityLabel::Running,
        ActivityLabel::Cycling,
        ActivityLabel::Vehicle,
    ];

    /// Class number used in recordings and training files.
    pub const fn class_no(self) -> i32 {
        match self {
            ActivityLabel::None => 0,
            ActivityLabel::Still => 1,
            ActivityLabel::Walking => 2,
            ActivityLabel::Running => 3,
            ActivityLabel::Cycling => 4,
            ActivityLabel::Vehicle => 5,
        }
    }

    /// Map a classifier output code. `None` is never a valid model output,
    /// so code 0 is rejected here along with anything out of range.
    pub fn from_code(code: i32) -> Option<Self> {
        match Self::from_class_no(code) {
            Some(ActivityLabel::None) | None => None,
            some => some,
        }
    }

    /// Map a recording class number, where 0 means unlabelled.
    pub fn from_class_no(n: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.class_no() == n)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ActivityLabel::None => "NONE",
            ActivityLabel::Still => "STILL",
            ActivityLabel::Walking => "WALKING",
            ActivityLabel::Running => "RUNNING",
            ActivityLabel::Cycling => "CYCLING",
            ActivityLabel::Vehicle => "VEHICLE",
        }
    }
}

impl core::fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
