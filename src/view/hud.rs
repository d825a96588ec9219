use std::cell::RefCell;
use std::rc::Rc;

use crate::model::Orientation;

const AXIS_LABELS: [&str; 3] = ["X", "Y", "Z"];

/// A text-capable display widget
pub trait TextSink {
    fn set_text(&mut self, text: &str);

    fn set_visible(&mut self, _visible: bool) {}
}

/// Text cell shared between the writer and whoever displays it
#[derive(Debug, Clone, Default)]
pub struct SharedText(Rc<RefCell<String>>);

impl SharedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.0.borrow().clone()
    }
}

impl TextSink for SharedText {
    fn set_text(&mut self, text: &str) {
        let mut inner = self.0.borrow_mut();
        inner.clear();
        inner.push_str(text);
    }
}

/// Format one axis for display. Negative values read as 0.
pub fn format_axis(label: &str, degrees: f32) -> String {
    // `<=` also folds -0.0, which would otherwise print as "-0"
    let shown = if degrees <= 0.0 { 0.0 } else { degrees };
    format!("{label}: {shown}")
}

/// The three axis strings shown on screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayBuffer {
    lines: [String; 3],
}

impl DisplayBuffer {
    pub fn from_orientation(orientation: &Orientation) -> Self {
        let axes = orientation.axes();
        Self {
            lines: std::array::from_fn(|i| format_axis(AXIS_LABELS[i], axes[i])),
        }
    }

    pub fn lines(&self) -> &[String; 3] {
        &self.lines
    }
}

/// Ordered widget slots; empty slots are skipped on every write
#[derive(Default)]
pub struct AxisDisplay {
    widgets: Vec<Option<Box<dyn TextSink>>>,
}

impl AxisDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_widgets(widgets: Vec<Option<Box<dyn TextSink>>>) -> Self {
        Self { widgets }
    }

    pub fn push(&mut self, widget: Option<Box<dyn TextSink>>) {
        self.widgets.push(widget);
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn show_all(&mut self) {
        for widget in self.widgets.iter_mut().flatten() {
            widget.set_visible(true);
        }
    }

    /// Slots beyond the third have no line and are left untouched
    pub fn write(&mut self, buffer: &DisplayBuffer) {
        for (slot, line) in self.widgets.iter_mut().zip(buffer.lines()) {
            if let Some(widget) = slot {
                widget.set_text(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(text: &SharedText) -> Option<Box<dyn TextSink>> {
        Some(Box::new(text.clone()))
    }

    #[test]
    fn negative_axis_is_clamped_for_display() {
        let buffer = DisplayBuffer::from_orientation(&Orientation::new(12.5, -10.0, -0.0));
        assert_eq!(buffer.lines()[0], "X: 12.5");
        assert_eq!(buffer.lines()[1], "Y: 0");
        assert_eq!(buffer.lines()[2], "Z: 0");
    }

    #[test]
    fn whole_degrees_have_no_fraction() {
        assert_eq!(format_axis("Y", 90.0), "Y: 90");
        assert_eq!(format_axis("X", 370.0), "X: 370");
    }

    #[test]
    fn missing_widgets_are_skipped() {
        let x = SharedText::new();
        let z = SharedText::new();
        let mut display = AxisDisplay::with_widgets(vec![widget(&x), None, widget(&z)]);

        display.write(&DisplayBuffer::from_orientation(&Orientation::new(5.0, 6.0, 7.0)));
        assert_eq!(x.get(), "X: 5");
        assert_eq!(z.get(), "Z: 7");
    }

    #[test]
    fn extra_widgets_are_left_alone() {
        let mut extra = SharedText::new();
        extra.set_text("untouched");
        let mut display = AxisDisplay::new();
        for _ in 0..3 {
            display.push(None);
        }
        display.push(widget(&extra));

        display.write(&DisplayBuffer::default());
        assert_eq!(display.len(), 4);
        assert_eq!(extra.get(), "untouched");
    }
}
