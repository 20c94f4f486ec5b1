//! Connection points and what clicking them means.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named connection point on a person node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortGroup {
    /// Above the node
    Top,
    /// Right of the node
    Right,
    /// Below the node
    Bottom,
    /// Left of the node
    Left,
}

impl PortGroup {
    /// The four ports attached to every person node, in attachment order
    pub const ALL: [PortGroup; 4] = [
        PortGroup::Top,
        PortGroup::Right,
        PortGroup::Bottom,
        PortGroup::Left,
    ];

    /// Group name as stored on the substrate's ports
    pub fn as_str(self) -> &'static str {
        match self {
            PortGroup::Top => "top",
            PortGroup::Right => "right",
            PortGroup::Bottom => "bottom",
            PortGroup::Left => "left",
        }
    }

    /// Parse a substrate group name; anything outside the four groups yields `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "top" => Some(PortGroup::Top),
            "right" => Some(PortGroup::Right),
            "bottom" => Some(PortGroup::Bottom),
            "left" => Some(PortGroup::Left),
            _ => None,
        }
    }
}

impl fmt::Display for PortGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Genealogical meaning of a port click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Add two parents above
    Ancestors,
    /// Add a sibling to the right plus a shared child below
    SiblingRight,
    /// Add a sibling to the left plus a shared child below
    SiblingLeft,
    /// Add one child below
    Descendant,
}

impl Direction {
    /// Stable name used in logs and metrics labels
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ancestors => "ancestors",
            Direction::SiblingRight => "sibling_right",
            Direction::SiblingLeft => "sibling_left",
            Direction::Descendant => "descendant",
        }
    }
}

/// Fixed convention mapping ports to expansion directions
pub struct PortSemantics;

impl PortSemantics {
    /// Classify a port group
    pub fn classify(group: PortGroup) -> Direction {
        match group {
            PortGroup::Top => Direction::Ancestors,
            PortGroup::Right => Direction::SiblingRight,
            PortGroup::Left => Direction::SiblingLeft,
            PortGroup::Bottom => Direction::Descendant,
        }
    }

    /// Classify a raw group name as found on the substrate
    pub fn classify_name(name: &str) -> Option<Direction> {
        PortGroup::parse(name).map(Self::classify)
    }
}
