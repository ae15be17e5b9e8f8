//! `MemoryStage`: a headless stage that records what it is told.

use super::{Anchor, Content, ElementId, Stage, Transition};
use std::collections::BTreeMap;
use unicode_width::UnicodeWidthStr;

/// Removed ids kept by a [`MemoryStage`]; older ones are forgotten.
pub const REMOVED_HISTORY: usize = 256;

/// Motions kept per [`StagedElement`]; older ones are forgotten.
pub const TRANSITION_HISTORY: usize = 16;

/// Width oracle for a [`MemoryStage`].
pub type Measure = Box<dyn Fn(&str) -> f64 + Send>;

/// One attached element as the stage last saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedElement {
    /// Body text.
    pub body: String,
    /// Style class, if any.
    pub class: Option<String>,
    /// Measured width.
    pub width: f64,
    /// Resting position (None until anchored).
    pub anchor: Option<Anchor>,
    /// Most recent motions applied, oldest first.
    pub transitions: Vec<Transition>,
    /// Whether the element is drawn above its neighbors.
    pub raised: bool,
}

impl StagedElement {
    /// The motion currently applied.
    pub fn transition(&self) -> Option<&Transition> {
        self.transitions.last()
    }
}

/// A stage that keeps everything in memory.
///
/// Widths default to the Unicode display width of the body; tests usually
/// install a fixed oracle with [`with_measure`](Self::with_measure).
///
/// History is bounded: only the last [`REMOVED_HISTORY`] removals and the
/// last [`TRANSITION_HISTORY`] motions per element are kept, so a stage can
/// sit behind a long-running scheduler.
pub struct MemoryStage {
    width: f64,
    height: f64,
    measure: Measure,
    elements: BTreeMap<ElementId, StagedElement>,
    removed: Vec<ElementId>,
}

impl MemoryStage {
    /// Create a stage of the given size.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            measure: Box::new(|body: &str| body.width() as f64),
            elements: BTreeMap::new(),
            removed: Vec::new(),
        }
    }

    /// Replace the width oracle.
    #[must_use]
    pub fn with_measure(mut self, measure: impl Fn(&str) -> f64 + Send + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    /// Look up an attached element.
    pub fn element(&self, id: ElementId) -> Option<&StagedElement> {
        self.elements.get(&id)
    }

    /// All attached elements in attach order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &StagedElement)> {
        self.elements.iter().map(|(id, element)| (*id, element))
    }

    /// Number of attached elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Most recently removed ids, in removal order.
    pub fn removed(&self) -> &[ElementId] {
        &self.removed
    }

    /// Find an attached element by body.
    pub fn find(&self, body: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|(_, element)| element.body == body)
            .map(|(id, _)| *id)
    }
}

impl std::fmt::Debug for MemoryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("elements", &self.elements.len())
            .field("removed", &self.removed.len())
            .finish_non_exhaustive()
    }
}

impl Stage for MemoryStage {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn attach(&mut self, id: ElementId, content: &Content<'_>) -> f64 {
        let width = (self.measure)(content.body);
        self.elements.insert(
            id,
            StagedElement {
                body: content.body.to_string(),
                class: content.class.map(str::to_string),
                width,
                anchor: None,
                transitions: Vec::new(),
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
            if element.transitions.len() == TRANSITION_HISTORY {
                element.transitions.remove(0);
            }
            element.transitions.push(transition);
        }
    }

    fn raise(&mut self, id: ElementId, raised: bool) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.raised = raised;
        }
    }

    fn remove(&mut self, id: ElementId) {
        if self.elements.remove(&id).is_some() {
            if self.removed.len() == REMOVED_HISTORY {
                self.removed.remove(0);
            }
            self.removed.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_memory_stage_records_lifecycle() {
        let mut stage = MemoryStage::new(800.0, 400.0).with_measure(|_| 120.0);
        let id = ElementId(0);

        let width = stage.attach(
            id,
            &Content {
                body: "hello",
                class: Some("loud"),
            },
        );
        assert!((width - 120.0).abs() < f64::EPSILON);
        assert_eq!(stage.find("hello"), Some(id));

        stage.transition(id, Transition::hold(0.0, Duration::ZERO));
        stage.raise(id, true);
        let element = stage.element(id).unwrap();
        assert_eq!(element.class.as_deref(), Some("loud"));
        assert_eq!(element.transitions.len(), 1);
        assert!(element.raised);

        stage.remove(id);
        stage.remove(id);
        assert!(stage.is_empty());
        assert_eq!(stage.removed(), &[id]);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut stage = MemoryStage::new(800.0, 400.0);
        let content = Content {
            body: "x",
            class: None,
        };

        stage.attach(ElementId(0), &content);
        for i in 0..40 {
            stage.transition(ElementId(0), Transition::hold(f64::from(i), Duration::ZERO));
        }
        let element = stage.element(ElementId(0)).unwrap();
        assert_eq!(element.transitions.len(), TRANSITION_HISTORY);
        assert!((element.transition().unwrap().to - 39.0).abs() < f64::EPSILON);

        let total = REMOVED_HISTORY as u64 + 10;
        for n in 0..total {
            stage.attach(ElementId(n), &content);
            stage.remove(ElementId(n));
        }
        assert_eq!(stage.removed().len(), REMOVED_HISTORY);
        assert_eq!(stage.removed().first(), Some(&ElementId(10)));
        assert_eq!(stage.removed().last(), Some(&ElementId(total - 1)));
    }

    #[test]
    fn test_default_measure_is_display_width() {
        let mut stage = MemoryStage::new(80.0, 24.0);
        let width = stage.attach(
            ElementId(1),
            &Content {
                body: "日本",
                class: None,
            },
        );
        assert!((width - 4.0).abs() < f64::EPSILON);
    }
}
