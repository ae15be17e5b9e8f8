//! `TerminalStage`: draws lanes into an area of the terminal.
//!
//! Stage units are terminal cells: the container is `area.width` columns by
//! `area.height` rows and element widths are Unicode display widths. Each
//! lane is a band of rows; its text sits on the band's middle row.
//!
//! Elements partially outside the area are clipped at grapheme boundaries,
//! and a wide grapheme straddling an edge is dropped rather than split.

use super::{Anchor, Content, ElementId, OutputBuffer, Rgb, Stage, Transition};
use crate::layout::Rect;
use std::collections::BTreeMap;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
struct TermElement {
    text: String,
    width: f64,
    anchor: Option<Anchor>,
    transition: Option<Transition>,
    raised: bool,
}

/// A terminal-backed stage.
#[derive(Debug, Clone)]
pub struct TerminalStage {
    area: Rect,
    default_fg: Rgb,
    elements: BTreeMap<ElementId, TermElement>,
}

impl TerminalStage {
    /// Create a stage over `area`.
    pub const fn new(area: Rect) -> Self {
        Self {
            area,
            default_fg: Rgb::new(220, 220, 220),
            elements: BTreeMap::new(),
        }
    }

    /// Set the color used for uncolored messages.
    #[must_use]
    pub const fn with_default_fg(mut self, fg: Rgb) -> Self {
        self.default_fg = fg;
        self
    }

    /// The area being drawn into.
    pub const fn area(&self) -> Rect {
        self.area
    }

    /// Number of attached elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Absolute row an anchor's text is drawn on.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn text_row(&self, top: f64, line_height: f64) -> Option<u16> {
        let row = (top + (line_height - 1.0).max(0.0) / 2.0).floor();
        if row < 0.0 || row >= f64::from(self.area.bottom() - self.area.y) {
            return None;
        }
        Some(self.area.y.saturating_add(row as u16))
    }

    /// Left edge (area-relative column) and absolute row of an element at `now`.
    #[allow(clippy::cast_possible_truncation)]
    fn position(&self, element: &TermElement, now: Duration) -> Option<(i64, u16)> {
        let anchor = element.anchor?;
        let (x, top, line_height) = match anchor {
            Anchor::Scrolling {
                top,
                line_height,
                start_x,
                ..
            } => {
                let offset = element
                    .transition
                    .map_or(0.0, |motion| motion.offset_at(now));
                (start_x + offset, top, line_height)
            }
            Anchor::Centered {
                top, line_height, ..
            } => (
                (f64::from(self.area.width) - element.width) / 2.0,
                top,
                line_height,
            ),
        };
        let row = self.text_row(top, line_height)?;
        Some((x.round() as i64, row))
    }

    /// Topmost element covering the absolute cell (`column`, `row`) at `now`.
    ///
    /// Used to turn terminal mouse positions into pointer enter/leave.
    #[allow(clippy::cast_possible_truncation)]
    pub fn element_at(&self, now: Duration, column: u16, row: u16) -> Option<ElementId> {
        if !self.area.contains(column, row) {
            return None;
        }
        let rel = i64::from(column - self.area.x);
        let hit = |(_, element): &(&ElementId, &TermElement)| {
            self.position(element, now).is_some_and(|(left, at_row)| {
                at_row == row && rel >= left && rel < left + element.width.ceil() as i64
            })
        };
        // Raised elements are drawn last, so they win.
        self.elements
            .iter()
            .filter(|(_, element)| element.raised)
            .rev()
            .find(&hit)
            .or_else(|| {
                self.elements
                    .iter()
                    .filter(|(_, element)| !element.raised)
                    .rev()
                    .find(&hit)
            })
            .map(|(id, _)| *id)
    }

    /// Draw the whole area as it looks at clock time `now`.
    pub fn render(&self, now: Duration, out: &mut OutputBuffer) {
        if self.area.is_empty() {
            return;
        }
        out.reset_attrs();
        for row in self.area.y..self.area.bottom() {
            out.cursor_move(self.area.x, row);
            out.write_blank(self.area.right() - self.area.x);
        }

        let ordered = self
            .elements
            .values()
            .filter(|element| !element.raised)
            .chain(self.elements.values().filter(|element| element.raised));
        for element in ordered {
            if let Some((left, row)) = self.position(element, now) {
                let fg = match element.anchor {
                    Some(Anchor::Scrolling {
                        color: Some(color), ..
                    }) => color,
                    _ => self.default_fg,
                };
                self.draw_text(out, left, row, &element.text, fg);
            }
        }
        out.reset_attrs();
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw_text(&self, out: &mut OutputBuffer, left: i64, row: u16, text: &str, fg: Rgb) {
        // Columns past u16::MAX cannot be addressed.
        let limit = i64::from(self.area.right() - self.area.x);
        let mut col = left;
        let mut cursor_placed = false;

        for grapheme in text.graphemes(true) {
            let width = grapheme.width() as i64;
            if col >= limit {
                break;
            }
            if col >= 0 && col + width <= limit && width > 0 {
                if !cursor_placed {
                    out.cursor_move(self.area.x.saturating_add(col as u16), row);
                    out.set_fg(fg);
                    cursor_placed = true;
                }
                out.write_str(grapheme);
            } else if cursor_placed {
                break;
            }
            col += width;
        }
    }
}

impl Stage for TerminalStage {
    fn width(&self) -> f64 {
        f64::from(self.area.width)
    }

    fn height(&self) -> f64 {
        f64::from(self.area.height)
    }

    #[allow(clippy::cast_precision_loss)]
    fn attach(&mut self, id: ElementId, content: &Content<'_>) -> f64 {
        // Control characters would move the cursor mid-frame.
        let text: String = content
            .body
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        let width = text.width() as f64;
        self.elements.insert(
            id,
            TermElement {
                text,
                width,
                anchor: None,
                transition: None,
                raised: false,
            },
        );
        width
    }

    fn anchor(&mut self, id: ElementId, anchor: Anchor) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.anchor = Some(anchor);
        }
    }

    fn transition(&mut self, id: ElementId, transition: Transition) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.transition = Some(transition);
        }
    }

    fn raise(&mut self, id: ElementId, raised: bool) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.raised = raised;
        }
    }

    fn remove(&mut self, id: ElementId) {
        self.elements.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(stage: &TerminalStage, now: Duration, cols: u16, rows: u16) -> vt100::Parser {
        let mut out = OutputBuffer::new();
        stage.render(now, &mut out);
        let mut parser = vt100::Parser::new(rows, cols, 0);
        parser.process(out.as_bytes());
        parser
    }

    fn scrolling(lane: usize, start_x: f64) -> Anchor {
        Anchor::Scrolling {
            lane,
            top: lane as f64,
            line_height: 1.0,
            start_x,
            color: None,
        }
    }

    #[test]
    fn test_scrolling_text_moves_left() {
        let mut stage = TerminalStage::new(Rect::from_size(20, 3));
        let id = ElementId(0);
        let width = stage.attach(id, &Content { body: "hello", class: None });
        assert!((width - 5.0).abs() < f64::EPSILON);

        // Start just past the right edge, travel 25 columns in 25 seconds.
        stage.anchor(id, scrolling(1, 20.0));
        stage.transition(
            id,
            Transition::new(0.0, -25.0, Duration::ZERO, Duration::from_secs(25)),
        );

        let parser = screen(&stage, Duration::ZERO, 20, 3);
        assert_eq!(parser.screen().contents().trim(), "");

        let parser = screen(&stage, Duration::from_secs(10), 20, 3);
        assert_eq!(parser.screen().cell(1, 10).unwrap().contents(), "h");
        assert_eq!(parser.screen().cell(1, 14).unwrap().contents(), "o");
    }

    #[test]
    fn test_clips_at_left_edge() {
        let mut stage = TerminalStage::new(Rect::from_size(10, 1));
        let id = ElementId(3);
        stage.attach(id, &Content { body: "abcdef", class: None });
        stage.anchor(id, scrolling(0, 0.0));
        stage.transition(id, Transition::hold(-2.0, Duration::ZERO));

        let parser = screen(&stage, Duration::ZERO, 10, 1);
        assert_eq!(parser.screen().cell(0, 0).unwrap().contents(), "c");
        assert_eq!(parser.screen().cell(0, 3).unwrap().contents(), "f");
    }

    #[test]
    fn test_centered_and_hit_testing() {
        let mut stage = TerminalStage::new(Rect::new(0, 0, 20, 2));
        let centered = ElementId(1);
        stage.attach(centered, &Content { body: "VIP", class: None });
        stage.anchor(
            centered,
            Anchor::Centered {
                lane: 0,
                top: 0.0,
                line_height: 1.0,
            },
        );

        let parser = screen(&stage, Duration::ZERO, 20, 2);
        assert_eq!(parser.screen().cell(0, 9).unwrap().contents(), "V");

        assert_eq!(stage.element_at(Duration::ZERO, 10, 0), Some(centered));
        assert_eq!(stage.element_at(Duration::ZERO, 2, 0), None);
        assert_eq!(stage.element_at(Duration::ZERO, 10, 1), None);
    }

    #[test]
    fn test_raised_wins_hit_test() {
        let mut stage = TerminalStage::new(Rect::from_size(10, 1));
        let below = ElementId(0);
        let above = ElementId(1);
        for id in [below, above] {
            stage.attach(id, &Content { body: "xxxx", class: None });
            stage.anchor(id, scrolling(0, 0.0));
        }
        assert_eq!(stage.element_at(Duration::ZERO, 1, 0), Some(above));

        stage.raise(below, true);
        assert_eq!(stage.element_at(Duration::ZERO, 1, 0), Some(below));
    }

    #[test]
    fn test_area_at_coordinate_limit() {
        // Only three columns and one row of this area are addressable.
        let mut stage = TerminalStage::new(Rect::new(u16::MAX - 3, u16::MAX - 1, 10, 5));
        let edge = ElementId(0);
        let below = ElementId(1);
        stage.attach(edge, &Content { body: "abcdef", class: None });
        stage.anchor(edge, scrolling(0, 0.0));
        stage.attach(below, &Content { body: "zzz", class: None });
        stage.anchor(below, scrolling(3, 0.0));

        let mut out = OutputBuffer::new();
        stage.render(Duration::ZERO, &mut out);
        let drawn = String::from_utf8_lossy(out.as_bytes()).into_owned();
        assert!(drawn.contains("abc"));
        assert!(!drawn.contains("abcd"));
        assert!(!drawn.contains("zzz"));

        assert_eq!(stage.element_at(Duration::ZERO, u16::MAX - 3, u16::MAX - 1), Some(edge));
        assert_eq!(stage.element_at(Duration::ZERO, u16::MAX - 1, u16::MAX - 1), Some(edge));
        assert_eq!(stage.element_at(Duration::ZERO, u16::MAX, u16::MAX), None);
    }

    #[test]
    fn test_remove_clears_cells() {
        let mut stage = TerminalStage::new(Rect::from_size(10, 1));
        let id = ElementId(0);
        stage.attach(id, &Content { body: "gone", class: None });
        stage.anchor(id, scrolling(0, 2.0));
        stage.remove(id);

        assert!(stage.is_empty());
        let parser = screen(&stage, Duration::ZERO, 10, 1);
        assert_eq!(parser.screen().contents().trim(), "");
    }
}
