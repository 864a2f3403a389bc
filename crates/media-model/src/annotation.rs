//! Page annotations and per-page undo/redo history.
//!
//! Every page of a document owns its own [`PageHistory`]. Histories never
//! share stacks, so undoing on one page cannot disturb another. Each
//! operation returns the page's new [`Snapshot`], an immutable list that
//! callers can hold on to for rendering while editing continues.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A pixel-space point `[x, y]`.
pub type StrokePoint = [f64; 2];

/// Immutable annotation list for one page at one point in its history.
pub type Snapshot = Arc<[Annotation]>;

/// A single annotation drawn on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum Annotation {
    Pen {
        points: Vec<StrokePoint>,
        color: String,
        width: f64,
    },
    /// Translucent marker stroke, multiplied over the page.
    Highlight {
        points: Vec<StrokePoint>,
        color: String,
        width: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: String,
        #[serde(rename = "fontSize")]
        font_size: f64,
    },
    /// Removes annotation ink only, never the page underneath.
    Eraser { points: Vec<StrokePoint>, width: f64 },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
        #[serde(rename = "lineWidth")]
        line_width: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        color: String,
        #[serde(rename = "lineWidth")]
        line_width: f64,
    },
    Arrow {
        #[serde(rename = "startX")]
        start_x: f64,
        #[serde(rename = "startY")]
        start_y: f64,
        #[serde(rename = "endX")]
        end_x: f64,
        #[serde(rename = "endY")]
        end_y: f64,
        color: String,
        #[serde(rename = "lineWidth")]
        line_width: f64,
    },
    Line {
        #[serde(rename = "startX")]
        start_x: f64,
        #[serde(rename = "startY")]
        start_y: f64,
        #[serde(rename = "endX")]
        end_x: f64,
        #[serde(rename = "endY")]
        end_y: f64,
        color: String,
        #[serde(rename = "lineWidth")]
        line_width: f64,
    },
}

impl Annotation {
    /// Short tool name, matching the serialized `tool` tag.
    pub fn tool(&self) -> &'static str {
        match self {
            Annotation::Pen { .. } => "pen",
            Annotation::Highlight { .. } => "highlight",
            Annotation::Text { .. } => "text",
            Annotation::Eraser { .. } => "eraser",
            Annotation::Rect { .. } => "rect",
            Annotation::Circle { .. } => "circle",
            Annotation::Arrow { .. } => "arrow",
            Annotation::Line { .. } => "line",
        }
    }
}

/// Undo/redo history for a single page.
#[derive(Debug, Clone)]
pub struct PageHistory {
    current: Snapshot,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl Default for PageHistory {
    fn default() -> Self {
        Self {
            current: empty_snapshot(),
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }
}

impl PageHistory {
    pub fn current(&self) -> Snapshot {
        Arc::clone(&self.current)
    }

    /// Replace the page contents, recording the previous state for undo.
    /// Any pending redo states are discarded.
    pub fn commit(&mut self, annotations: Vec<Annotation>) -> Snapshot {
        let next: Snapshot = annotations.into();
        let previous = std::mem::replace(&mut self.current, next);
        self.undo.push(previous);
        self.redo.clear();
        self.current()
    }

    /// Append one annotation to the current contents.
    pub fn push(&mut self, annotation: Annotation) -> Snapshot {
        let mut next = self.current.to_vec();
        next.push(annotation);
        self.commit(next)
    }

    /// Step back one state. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let previous = self.undo.pop()?;
        let current = std::mem::replace(&mut self.current, previous);
        self.redo.push(current);
        Some(self.current())
    }

    /// Re-apply the most recently undone state.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        let current = std::mem::replace(&mut self.current, next);
        self.undo.push(current);
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

/// Annotation state for a whole document, keyed by 1-based page number.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSession {
    pages: BTreeMap<u32, PageHistory>,
}

impl AnnotationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current annotations of a page (empty for untouched pages).
    pub fn annotations(&self, page: u32) -> Snapshot {
        self.pages
            .get(&page)
            .map(PageHistory::current)
            .unwrap_or_else(empty_snapshot)
    }

    pub fn commit(&mut self, page: u32, annotations: Vec<Annotation>) -> Snapshot {
        self.pages.entry(page).or_default().commit(annotations)
    }

    pub fn push(&mut self, page: u32, annotation: Annotation) -> Snapshot {
        self.pages.entry(page).or_default().push(annotation)
    }

    pub fn undo(&mut self, page: u32) -> Option<Snapshot> {
        self.pages.get_mut(&page)?.undo()
    }

    pub fn redo(&mut self, page: u32) -> Option<Snapshot> {
        self.pages.get_mut(&page)?.redo()
    }

    pub fn can_undo(&self, page: u32) -> bool {
        self.pages.get(&page).is_some_and(PageHistory::can_undo)
    }

    pub fn can_redo(&self, page: u32) -> bool {
        self.pages.get(&page).is_some_and(PageHistory::can_redo)
    }

    /// Pages that currently carry at least one annotation, in page order.
    pub fn annotated_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|(_, history)| !history.current.is_empty())
            .map(|(page, _)| *page)
            .collect()
    }

    /// Drop all pages and history, e.g. when a new document is loaded.
    pub fn reset(&mut self) {
        self.pages.clear();
    }
}

fn empty_snapshot() -> Snapshot {
    Arc::from(Vec::new())
}
