//! The classifier's output vocabulary.
//!
//! Index `i` of the model's output distribution means `LABELS[i]`. The order below
//! is the order the classifier was trained with; changing it silently corrupts every
//! prediction, so bump [`LABEL_TABLE_VERSION`] alongside any edit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bumped whenever `LABELS` changes order or membership.
pub const LABEL_TABLE_VERSION: u32 = 1;

pub const LABEL_COUNT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GestureLabel {
    Dad,
    GoodMorning,
    Hello,
    Help,
    I,
    LoveYou,
    Me,
    Mom,
    Need,
    No,
    Pineapple,
    Sorry,
    Want,
    Yes,
    Your,
}

pub const LABELS: [GestureLabel; LABEL_COUNT] = [
    GestureLabel::Dad,
    GestureLabel::GoodMorning,
    GestureLabel::Hello,
    GestureLabel::Help,
    GestureLabel::I,
    GestureLabel::LoveYou,
    GestureLabel::Me,
    GestureLabel::Mom,
    GestureLabel::Need,
    GestureLabel::No,
    GestureLabel::Pineapple,
    GestureLabel::Sorry,
    GestureLabel::Want,
    GestureLabel::Yes,
    GestureLabel::Your,
];

impl GestureLabel {
    /// Positional lookup into the model's output vector.
    pub fn from_index(index: usize) -> Option<Self> {
        LABELS.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dad => "dad",
            Self::GoodMorning => "good morning",
            Self::Hello => "hello",
            Self::Help => "help",
            Self::I => "i",
            Self::LoveYou => "love you",
            Self::Me => "me",
            Self::Mom => "mom",
            Self::Need => "need",
            Self::No => "no",
            Self::Pineapple => "pineapple",
            Self::Sorry => "sorry",
            Self::Want => "want",
            Self::Yes => "yes",
            Self::Your => "your",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown gesture label '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for GestureLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LABELS
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

impl From<GestureLabel> for String {
    fn from(label: GestureLabel) -> Self {
        label.as_str().to_string()
    }
}

impl TryFrom<String> for GestureLabel {
    type Error = UnknownLabel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
