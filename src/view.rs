//! Where the controller draws. Regions are shown, hidden and filled with text.
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Loading,
    Messages,
    /// Shown on the first page
    Closest,
    ClosestStop,
    /// Shown on every other page
    NotClosest,
    NotClosestStop,
    /// Every route row at once
    Routes,
    Route(String),
    RouteMinutes(String),
    Notice,
}

pub trait ViewSink {
    fn show(&mut self, region: &Region);
    fn hide(&mut self, region: &Region);
    fn set_text(&mut self, region: &Region, text: &str);

    /// Marks the end of a batch of updates
    fn present(&mut self) {}
}

/// Draws a plain text frame on every [`ViewSink::present`]
pub struct TerminalView<W> {
    out: W,
    visible: BTreeSet<Region>,
    texts: BTreeMap<Region, String>,
    updated_at: Option<DateTime<Local>>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        TerminalView {
            out,
            visible: BTreeSet::new(),
            texts: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn is_visible(&self, region: &Region) -> bool {
        self.visible.contains(region)
    }

    pub fn text(&self, region: &Region) -> Option<&str> {
        self.texts.get(region).map(String::as_str)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn frame(&self) -> String {
        let mut lines = vec![];
        let text = |region: &Region| self.text(region).unwrap_or_default();

        if self.is_visible(&Region::Loading) {
            lines.push("Loading...".to_string());
        }

        if self.is_visible(&Region::Notice) {
            lines.push(format!("! {}", text(&Region::Notice)));
        }

        if self.is_visible(&Region::Messages) {
            if self.is_visible(&Region::Closest) {
                lines.push(format!("Closest stop: {}", text(&Region::ClosestStop)));
            }
            if self.is_visible(&Region::NotClosest) {
                lines.push(format!("Next closest stop: {}", text(&Region::NotClosestStop)));
            }

            for region in &self.visible {
                if let Region::Route(route_id) = region {
                    let minutes = text(&Region::RouteMinutes(route_id.clone()));
                    if minutes.is_empty() {
                        lines.push(format!("  {route_id}: no predictions"));
                    } else {
                        lines.push(format!("  {route_id}: {minutes} min"));
                    }
                }
            }

            if let Some(updated_at) = self.updated_at {
                lines.push(format!("Updated at {}", updated_at.format("%H:%M:%S")));
            }
        }

        lines.join("\n")
    }
}

impl<W: Write> ViewSink for TerminalView<W> {
    fn show(&mut self, region: &Region) {
        if *region == Region::Messages {
            self.updated_at = Some(Local::now());
        }

        self.visible.insert(region.clone());
    }

    fn hide(&mut self, region: &Region) {
        match region {
            Region::Routes => self.visible.retain(|r| !matches!(r, Region::Route(_))),
            region => {
                self.visible.remove(region);
            }
        }
    }

    fn set_text(&mut self, region: &Region, text: &str) {
        self.texts.insert(region.clone(), text.to_string());
    }

    fn present(&mut self) {
        let frame = self.frame();

        if let Err(err) = writeln!(self.out, "{frame}\n").and_then(|_| self.out.flush()) {
            warn!("couldn't draw the view: {err}");
        }
    }
}
