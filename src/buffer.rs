//! Buffer access abstraction.
//!
//! The alignment engine never touches the host editor directly; it works
//! against the [`Buffer`] trait, which exposes exactly the operations the
//! engine needs: line access, selection ranges, a scope token per position,
//! tab settings and whole-line replacement.
//!
//! [`TextBuffer`] is the in-memory implementation used by the command-line
//! driver and by tests.

/// A row/column position in a buffer (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[must_use]
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

/// One selection span; a caret is a selection with `start == end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Caret selection at the start of `row`
    #[must_use]
    pub fn caret(row: usize) -> Self {
        Selection {
            start: Position::new(row, 0),
            end: Position::new(row, 0),
        }
    }
}

/// Operations the alignment engine requires from the host buffer
///
/// Row indices are 0-based. Accessing a row outside `0..line_count()` is a
/// programming error; implementations may panic.
pub trait Buffer {
    /// Text of line `row`, without the trailing newline
    fn line(&self, row: usize) -> &str;

    /// Total number of lines
    fn line_count(&self) -> usize;

    /// Current selection spans, in document order
    fn selections(&self) -> Vec<Selection>;

    /// Scope/language classification token at a position (e.g. `source.python`)
    fn scope_at(&self, pos: Position) -> String;

    /// Number of columns a tab occupies
    fn tab_size(&self) -> usize;

    /// Whether the editor counts indentation in tab stops
    fn translate_tabs_to_spaces(&self) -> bool;

    /// Replace the full text of line `row`
    fn replace_line(&mut self, row: usize, text: String);
}

/// In-memory line buffer
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    selections: Vec<Selection>,
    scope: String,
    tab_size: usize,
    translate_tabs_to_spaces: bool,
}

impl TextBuffer {
    /// Build a buffer from text, splitting on `\n`
    #[must_use]
    pub fn new(text: &str) -> Self {
        TextBuffer {
            lines: text.split('\n').map(str::to_string).collect(),
            selections: Vec::new(),
            scope: "text.plain".to_string(),
            tab_size: 4,
            translate_tabs_to_spaces: false,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    #[must_use]
    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size;
        self
    }

    #[must_use]
    pub fn with_translate_tabs(mut self, translate: bool) -> Self {
        self.translate_tabs_to_spaces = translate;
        self
    }

    /// Replace all selections with a single caret at the start of `row`
    pub fn select_row(&mut self, row: usize) {
        self.selections = vec![Selection::caret(row)];
    }

    /// Add a caret at the start of `row`, keeping existing selections
    pub fn add_selection(&mut self, row: usize) {
        self.selections.push(Selection::caret(row));
    }

    /// Buffer contents joined with `\n`
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Buffer for TextBuffer {
    fn line(&self, row: usize) -> &str {
        &self.lines[row]
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn selections(&self) -> Vec<Selection> {
        self.selections.clone()
    }

    fn scope_at(&self, _pos: Position) -> String {
        self.scope.clone()
    }

    fn tab_size(&self) -> usize {
        self.tab_size
    }

    fn translate_tabs_to_spaces(&self) -> bool {
        self.translate_tabs_to_spaces
    }

    fn replace_line(&mut self, row: usize, text: String) {
        self.lines[row] = text;
    }
}
