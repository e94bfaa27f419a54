//! Two-line terminal rendering of listed notifications.
//!
//! ```text
//! ▬ octo/hello #42
//!   Fix the flaky test ( https://github.com/octo/hello/pull/42 )
//! ```
//!
//! The glyph is colored by lifecycle, the location is gray and the title is
//! bold white. When the terminal supports OSC 8 hyperlinks the second line is
//! just the title, linked to the URL.

use crate::notification::NotificationRef;
use crate::resolver::Resolved;
use crossterm::style::{style, Color, Stylize};
use std::io::{self, Write};

const MARK: &str = "▬";

const OPEN: Color = Color::Rgb { r: 31, g: 136, b: 61 };
const CLOSED: Color = Color::Rgb { r: 207, g: 34, b: 46 };
const MERGED: Color = Color::Rgb { r: 130, g: 80, b: 223 };
const LOCATION: Color = Color::Rgb { r: 64, g: 64, b: 64 };

/// Lifecycle shown by the glyph color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Open,
    Closed,
    Merged,
    /// Releases, or states GitHub adds later. Rendered uncolored.
    Other,
}

impl Lifecycle {
    pub fn from_state(state: &str, merged: bool) -> Self {
        if merged {
            return Lifecycle::Merged;
        }
        match state {
            "open" => Lifecycle::Open,
            "closed" => Lifecycle::Closed,
            "merged" => Lifecycle::Merged,
            _ => Lifecycle::Other,
        }
    }

    fn color(self) -> Option<Color> {
        match self {
            Lifecycle::Open => Some(OPEN),
            Lifecycle::Closed => Some(CLOSED),
            Lifecycle::Merged => Some(MERGED),
            Lifecycle::Other => None,
        }
    }
}

/// One notification selected by the `list` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub lifecycle: Lifecycle,
    pub owner: String,
    pub repo: String,
    /// `None` for releases.
    pub number: Option<u64>,
    pub title: String,
    pub url: String,
}

impl Listing {
    pub fn new(n: &NotificationRef, resolved: &Resolved) -> Self {
        let a = &resolved.attributes;
        Self {
            lifecycle: Lifecycle::from_state(&a.state, a.merged),
            owner: n.owner.clone(),
            repo: n.repo.clone(),
            number: u64::try_from(a.number).ok(),
            title: n.title.clone(),
            url: resolved.display_url.clone(),
        }
    }

    fn location(&self) -> String {
        match self.number {
            Some(number) => format!("{}/{} #{number}", self.owner, self.repo),
            None => format!("{}/{}", self.owner, self.repo),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Renderer {
    /// Emit ANSI colors and bold.
    pub color: bool,
    /// Link the title with OSC 8 instead of printing the URL.
    pub hyperlinks: bool,
}

impl Renderer {
    pub fn new(color: bool, hyperlinks: bool) -> Self {
        Self { color, hyperlinks }
    }

    /// No escapes at all.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn write(&self, w: &mut dyn Write, listing: &Listing) -> io::Result<()> {
        writeln!(w, "{} {}", self.mark(listing.lifecycle), self.location(listing))?;
        let title = self.title(&listing.title);
        if self.hyperlinks && !listing.url.is_empty() {
            writeln!(w, "  {}", hyperlink(&listing.url, &title))
        } else {
            writeln!(w, "  {title} ( {} )", listing.url)
        }
    }

    fn mark(&self, lifecycle: Lifecycle) -> String {
        match lifecycle.color() {
            Some(c) if self.color => style(MARK).with(c).to_string(),
            _ => MARK.to_string(),
        }
    }

    fn location(&self, listing: &Listing) -> String {
        let location = listing.location();
        if self.color {
            style(location).with(LOCATION).to_string()
        } else {
            location
        }
    }

    fn title(&self, title: &str) -> String {
        if self.color {
            style(title).with(Color::White).bold().to_string()
        } else {
            title.to_string()
        }
    }
}

fn hyperlink(url: &str, text: &str) -> String {
    format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
}
