use serde::Serialize;

/// A vertically scrollable container.
pub trait ScrollPanel {
    fn scroll_top(&self) -> f64;
    fn set_scroll_top(&mut self, top: f64);
    /// Total content height in pixels.
    fn scroll_height(&self) -> f64;
    /// Visible viewport height in pixels.
    fn client_height(&self) -> f64;

    /// Largest reachable `scroll_top`; zero when the content fits the viewport.
    fn max_scroll(&self) -> f64 {
        let max = self.scroll_height() - self.client_height();
        if max.is_finite() { max.max(0.0) } else { 0.0 }
    }

    /// Scroll position as 0..=100. Degenerate ranges report 0 instead of dividing by zero.
    fn scroll_percentage(&self) -> f64 {
        let max = self.max_scroll();
        if max <= 0.0 {
            return 0.0;
        }
        (self.scroll_top() / max * 100.0).clamp(0.0, 100.0)
    }
}

/// The source editor: fixed line height, so line `n` sits at a computable offset.
pub trait EditorPanel: ScrollPanel {
    fn line_height(&self) -> f64;
    fn padding_top(&self) -> f64;
}

/// The rendered preview: descendants carry the source line they came from.
pub trait PreviewPanel: ScrollPanel {
    /// Every source-line tagged element, with its top relative to the content origin.
    fn line_anchors(&self) -> Vec<LineAnchor>;
    /// Content-relative top of the element with the given id.
    fn element_top(&self, id: &str) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineAnchor {
    pub source_line: usize,
    pub top: f64,
}

/// Layout-free panel whose geometry is supplied by the host.
///
/// Writes are clamped to the scrollable range the way a browser clamps
/// `scrollTop`, and counted so callers can observe programmatic scrolling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticPanel {
    scroll_top: f64,
    scroll_height: f64,
    client_height: f64,
    line_height: f64,
    padding_top: f64,
    anchors: Vec<LineAnchor>,
    elements: Vec<(String, f64)>,
    writes: usize,
}

impl StaticPanel {
    pub fn new(scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_height,
            client_height,
            ..Self::default()
        }
    }

    pub fn with_line_metrics(mut self, line_height: f64, padding_top: f64) -> Self {
        self.line_height = line_height;
        self.padding_top = padding_top;
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<LineAnchor>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn with_element(mut self, id: impl Into<String>, top: f64) -> Self {
        self.elements.push((id.into(), top));
        self
    }

    pub fn set_layout(&mut self, scroll_height: f64, client_height: f64) {
        self.scroll_height = scroll_height;
        self.client_height = client_height;
        self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll());
    }

    pub fn set_anchors(&mut self, anchors: Vec<LineAnchor>) {
        self.anchors = anchors;
    }

    pub fn set_elements(&mut self, elements: Vec<(String, f64)>) {
        self.elements = elements;
    }

    /// Number of `set_scroll_top` calls since creation.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ScrollPanel for StaticPanel {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.writes += 1;
        self.scroll_top = if top.is_finite() {
            top.clamp(0.0, self.max_scroll())
        } else {
            0.0
        };
    }

    fn scroll_height(&self) -> f64 {
        self.scroll_height
    }

    fn client_height(&self) -> f64 {
        self.client_height
    }
}

impl EditorPanel for StaticPanel {
    fn line_height(&self) -> f64 {
        self.line_height
    }

    fn padding_top(&self) -> f64 {
        self.padding_top
    }
}

impl PreviewPanel for StaticPanel {
    fn line_anchors(&self) -> Vec<LineAnchor> {
        self.anchors.clone()
    }

    fn element_top(&self, id: &str) -> Option<f64> {
        self.elements
            .iter()
            .find(|(element_id, _)| element_id == id)
            .map(|(_, top)| *top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_range_reports_zero_percent() {
        let mut panel = StaticPanel::new(300.0, 500.0);
        assert_eq!(panel.max_scroll(), 0.0);
        panel.set_scroll_top(120.0);
        assert_eq!(panel.scroll_top(), 0.0);
        assert_eq!(panel.scroll_percentage(), 0.0);
    }

    #[test]
    fn writes_are_clamped_and_counted() {
        let mut panel = StaticPanel::new(1_000.0, 200.0);
        panel.set_scroll_top(5_000.0);
        assert_eq!(panel.scroll_top(), 800.0);
        panel.set_scroll_top(f64::NAN);
        assert_eq!(panel.scroll_top(), 0.0);
        panel.set_scroll_top(400.0);
        assert_eq!(panel.scroll_percentage(), 50.0);
        assert_eq!(panel.writes(), 3);
    }
}
