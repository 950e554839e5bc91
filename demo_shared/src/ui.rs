//! Renderable UI fragments.
//!
//! A fragment is a small retained widget tree that a scene hands to the
//! shell's side panel. It carries no behavior: interactive widgets only name
//! an action id, and the shell routes the resulting [`UiAction`] back to the
//! scene that is mounted at the time.

use serde::{Deserialize, Serialize};

/// One widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiNode {
    Heading(String),
    Text(String),
    Button {
        id: String,
        label: String,
    },
    Toggle {
        id: String,
        label: String,
        on: bool,
    },
    Slider {
        id: String,
        label: String,
        min: f32,
        max: f32,
        value: f32,
    },
    /// Read-only meter, e.g. a speedometer.
    Gauge {
        label: String,
        value: f32,
        max: f32,
        unit: String,
    },
    Row(Vec<UiNode>),
    Column(Vec<UiNode>),
}

impl UiNode {
    pub fn text(s: impl Into<String>) -> Self {
        UiNode::Text(s.into())
    }

    pub fn heading(s: impl Into<String>) -> Self {
        UiNode::Heading(s.into())
    }

    pub fn button(id: impl Into<String>, label: impl Into<String>) -> Self {
        UiNode::Button {
            id: id.into(),
            label: label.into(),
        }
    }

    fn collect_actions<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            UiNode::Button { id, .. } | UiNode::Toggle { id, .. } | UiNode::Slider { id, .. } => {
                out.push(id)
            }
            UiNode::Row(children) | UiNode::Column(children) => {
                for child in children {
                    child.collect_actions(out);
                }
            }
            UiNode::Heading(_) | UiNode::Text(_) | UiNode::Gauge { .. } => {}
        }
    }

    fn write_lines(&self, depth: usize, out: &mut Vec<String>) {
        let pad = "  ".repeat(depth);
        match self {
            UiNode::Heading(s) => out.push(format!("{pad}# {s}")),
            UiNode::Text(s) => out.push(format!("{pad}{s}")),
            UiNode::Button { id, label } => out.push(format!("{pad}[{label}] ({id})")),
            UiNode::Toggle { id, label, on } => {
                let mark = if *on { "x" } else { " " };
                out.push(format!("{pad}[{mark}] {label} ({id})"))
            }
            UiNode::Slider {
                id,
                label,
                min,
                max,
                value,
            } => out.push(format!("{pad}{label}: {value:.2} in [{min}, {max}] ({id})")),
            UiNode::Gauge {
                label,
                value,
                max,
                unit,
            } => {
                const WIDTH: usize = 20;
                let filled = if *max > 0.0 {
                    ((value / max).clamp(0.0, 1.0) * WIDTH as f32).round() as usize
                } else {
                    0
                };
                out.push(format!(
                    "{pad}{label}: {value:.1} {unit} |{}{}|",
                    "=".repeat(filled),
                    " ".repeat(WIDTH - filled)
                ))
            }
            UiNode::Row(children) => {
                let mut parts = Vec::new();
                for child in children {
                    let mut lines = Vec::new();
                    child.write_lines(0, &mut lines);
                    parts.push(lines.join(" "));
                }
                out.push(format!("{pad}{}", parts.join("  ")));
            }
            UiNode::Column(children) => {
                for child in children {
                    child.write_lines(depth, out);
                }
            }
        }
    }
}

/// A scene's published side-panel content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiFragment {
    pub root: UiNode,
}

impl UiFragment {
    pub fn new(root: UiNode) -> Self {
        Self { root }
    }

    pub fn column(children: Vec<UiNode>) -> Self {
        Self::new(UiNode::Column(children))
    }

    /// Action ids of every interactive widget, in tree order.
    pub fn actions(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.collect_actions(&mut out);
        out
    }

    pub fn has_action(&self, id: &str) -> bool {
        self.actions().contains(&id)
    }

    /// Plain-text rendering, one widget per line.
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.write_lines(0, &mut out);
        out
    }
}

/// An interaction with a panel widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAction {
    pub id: String,
    /// New value for sliders and toggles (`0.0`/`1.0`).
    pub value: Option<f32>,
}

impl UiAction {
    pub fn click(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
        }
    }

    pub fn set(id: impl Into<String>, value: f32) -> Self {
        Self {
            id: id.into(),
            value: Some(value),
        }
    }
}

/// One entry of the navigation strip as handed to the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub path: String,
    pub active: bool,
}
