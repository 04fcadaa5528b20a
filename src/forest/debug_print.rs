//! Debug printer.

use core::fmt::{self, Write as _};

use crate::forest::Forest;

/// State for an indent level.
#[derive(Clone, Copy)]
struct IndentLevel {
    /// Whether this is the last item.
    is_last_item: bool,
    /// Whether the line is the first line.
    is_first_line: bool,
}

impl IndentLevel {
    /// Returns the indent string for the indent type.
    fn as_str(self) -> &'static str {
        match (self.is_last_item, self.is_first_line) {
            (false, true) => "|-- ",
            (false, false) => "|   ",
            (true, true) => "`-- ",
            (true, false) => "    ",
        }
    }

    /// Returns the leading part of the indent string.
    fn as_str_leading(self) -> &'static str {
        match (self.is_last_item, self.is_first_line) {
            (false, true) => "|--",
            (false, false) => "|",
            (true, true) => "`--",
            (true, false) => "",
        }
    }

    /// Returns the trailing whitespaces part of the indent string.
    fn as_str_trailing_spaces(self) -> &'static str {
        match (self.is_last_item, self.is_first_line) {
            (_, true) => " ",
            (false, false) => "   ",
            (true, false) => "    ",
        }
    }

    /// Returns whether the indent string consists of only whitespaces.
    #[inline]
    #[must_use]
    fn is_all_whitespace(&self) -> bool {
        self.is_last_item && !self.is_first_line
    }
}

/// State of the line writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Before any character of the indent is written to the current line.
    BeforeIndent,
    /// Indents are partially written.
    ///
    /// More precisely, trailing whitespaces are not yet written.
    PartialIndent,
    /// Writing content.
    Content,
}

/// Indent writer for the debug printer.
struct IndentWriter<'a, 'b> {
    /// Backend formatter.
    fmt: &'b mut fmt::Formatter<'a>,
    /// State of the line writing.
    line_state: LineState,
    /// Indents, one for each depth below the roots.
    indents: Vec<IndentLevel>,
}

impl<'a, 'b> IndentWriter<'a, 'b> {
    /// Creates a new indent writer.
    fn new(fmt: &'b mut fmt::Formatter<'a>) -> Self {
        Self {
            fmt,
            line_state: LineState::BeforeIndent,
            indents: Vec::new(),
        }
    }

    /// Opens the next item at the given depth.
    ///
    /// Closes the items deeper than or as deep as the new one, writes a
    /// newline if necessary, and prepares to write the next item.
    fn open_item(&mut self, depth: usize, is_last_item: bool) -> fmt::Result {
        // Items at depth `d` (> 0) are written under `d` indent levels.
        self.indents.truncate(depth.saturating_sub(1));
        if self.line_state != LineState::BeforeIndent {
            self.fmt.write_char('\n')?;
            self.line_state = LineState::BeforeIndent;
        }
        if depth == 0 {
            return Ok(());
        }
        if let Some(indent) = self.indents.last_mut() {
            indent.is_first_line = false;
        }
        self.indents.push(IndentLevel {
            is_last_item,
            is_first_line: true,
        });

        Ok(())
    }

    /// Writes the indent except for the trailing whitespaces.
    fn write_indent_partial(&mut self) -> fmt::Result {
        let mut indents = &self.indents[..];
        while indents.last().map_or(false, |i| i.is_all_whitespace()) {
            indents = &indents[..(indents.len() - 1)];
        }
        if let Some(last) = indents.last() {
            for indent in &indents[..(indents.len() - 1)] {
                self.fmt.write_str(indent.as_str())?;
            }
            self.fmt.write_str(last.as_str_leading())?;
        }

        Ok(())
    }

    /// Writes the rest of the indents which are partially written.
    fn complete_partial_indent(&mut self) -> fmt::Result {
        debug_assert_eq!(self.line_state, LineState::PartialIndent);
        if let Some(indent) = self.indents.last() {
            self.fmt.write_str(indent.as_str_trailing_spaces())?;
        }

        Ok(())
    }
}

impl fmt::Write for IndentWriter<'_, '_> {
    fn write_str(&mut self, mut s: &str) -> fmt::Result {
        while !s.is_empty() {
            // There remains something to print.

            if self.line_state == LineState::BeforeIndent {
                self.write_indent_partial()?;
                self.line_state = LineState::PartialIndent;
            }

            let (line_end, ends_with_newline) = match s.find('\n') {
                Some(pos) => {
                    if let Some(level) = self.indents.last_mut() {
                        level.is_first_line = false;
                    }
                    (pos + 1, true)
                }
                None => (s.len(), false),
            };
            let content = &s[..line_end];
            if !content.is_empty() {
                debug_assert_ne!(
                    self.line_state,
                    LineState::BeforeIndent,
                    "[consistency] indent must be written since there are something to write"
                );
                if self.line_state == LineState::PartialIndent {
                    self.complete_partial_indent()?;
                }
                self.fmt.write_str(content)?;

                self.line_state = if ends_with_newline {
                    LineState::BeforeIndent
                } else {
                    LineState::Content
                };
            }
            s = &s[line_end..];
        }

        Ok(())
    }
}

/// Forest printer for debugging.
///
/// This is provided mainly for debugging purpose. Note that the output format
/// is not guaranteed to be stable, and any format changes won't be considered
/// as breaking changes.
///
/// `Display` prints the payloads, and `Debug` prints `key: payload` pairs.
#[cfg_attr(feature = "docsrs", doc(cfg(feature = "debug-print")))]
pub struct DebugPrint<'a, K, T> {
    /// Forest to print.
    forest: &'a Forest<K, T>,
}

impl<'a, K, T> DebugPrint<'a, K, T> {
    /// Creates a new `DebugPrint` object for the forest.
    pub(crate) fn new(forest: &'a Forest<K, T>) -> Self {
        Self { forest }
    }

    /// Writes all nodes in pre-order, each one by the given function.
    fn write_nodes<F>(&self, f: &mut fmt::Formatter<'_>, mut write_node: F) -> fmt::Result
    where
        F: FnMut(&mut IndentWriter<'_, '_>, &K, &T) -> fmt::Result,
    {
        let mut writer = IndentWriter::new(f);
        for (id, depth) in self.forest.pre_order() {
            let node = self
                .forest
                .node(id)
                .expect("[consistency] the node must be the part of the forest");
            let is_last_sibling = self.forest.group(node.parent()).members().last() == Some(&id);
            writer.open_item(depth, is_last_sibling)?;
            write_node(&mut writer, node.key(), node.data())?;
        }

        Ok(())
    }
}

impl<K, T: fmt::Display> fmt::Display for DebugPrint<'_, K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_nodes(f, |writer, _key, data| write!(writer, "{}", data))
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for DebugPrint<'_, K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_nodes(f, |writer, key, data| write!(writer, "{:?}: {:?}", key, data))
    }
}
