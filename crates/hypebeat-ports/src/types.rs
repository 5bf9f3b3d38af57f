use serde::{Deserialize, Serialize};
use std::fmt;

pub type AudioTime = f64; // seconds on the audio clock, monotonic while the clock runs
pub type TargetId = u64;

/// Horizontal third of the play field. The only spatial axis used for judging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Half {
    Upper,
    Lower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    UpperLeft,
    UpperCenter,
    UpperRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::UpperLeft,
        Zone::UpperCenter,
        Zone::UpperRight,
        Zone::LowerLeft,
        Zone::LowerCenter,
        Zone::LowerRight,
    ];

    pub fn new(column: Column, half: Half) -> Self {
        match (half, column) {
            (Half::Upper, Column::Left) => Zone::UpperLeft,
            (Half::Upper, Column::Center) => Zone::UpperCenter,
            (Half::Upper, Column::Right) => Zone::UpperRight,
            (Half::Lower, Column::Left) => Zone::LowerLeft,
            (Half::Lower, Column::Center) => Zone::LowerCenter,
            (Half::Lower, Column::Right) => Zone::LowerRight,
        }
    }

    pub fn column(self) -> Column {
        match self {
            Zone::UpperLeft | Zone::LowerLeft => Column::Left,
            Zone::UpperCenter | Zone::LowerCenter => Column::Center,
            Zone::UpperRight | Zone::LowerRight => Column::Right,
        }
    }

    /// Cosmetic only; the character rig uses it to pick a reaction.
    pub fn half(self) -> Half {
        match self {
            Zone::UpperLeft | Zone::UpperCenter | Zone::UpperRight => Half::Upper,
            Zone::LowerLeft | Zone::LowerCenter | Zone::LowerRight => Half::Lower,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::UpperLeft => "upper-left",
            Zone::UpperCenter => "upper-center",
            Zone::UpperRight => "upper-right",
            Zone::LowerLeft => "lower-left",
            Zone::LowerCenter => "lower-center",
            Zone::LowerRight => "lower-right",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Perfect,
    Good,
    Miss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    S,
    A,
    B,
    C,
    D,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LetterGrade::S => "S",
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn guest() -> Self {
        Self("guest".to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
