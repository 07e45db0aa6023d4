use std::io::BufRead;

use super::BoxedBufReader;

/// One physical line of text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number in the decompressed stream.
    pub number: usize,
    pub text: String,
}
impl Line {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Numbered line reader shared by the text format plugins.
///
/// Once the underlying reader is exhausted `next_line` keeps returning
/// `Ok(None)`, so callers may poll past the end indefinitely.
pub struct LineSource {
    inner: BoxedBufReader,
    buffer: String,
    number: usize,
    pushed_back: Option<Line>,
    eof: bool,
}
impl LineSource {
    pub fn new(inner: BoxedBufReader) -> Self {
        Self {
            inner,
            buffer: String::new(),
            number: 0,
            pushed_back: None,
            eof: false,
        }
    }

    /// Reads the next line with its terminator stripped.
    pub fn next_line(&mut self) -> crate::Result<Option<Line>> {
        if let Some(line) = self.pushed_back.take() {
            return Ok(Some(line));
        }
        if self.eof {
            return Ok(None);
        }
        self.buffer.clear();
        if self.inner.read_line(&mut self.buffer)? == 0 {
            self.eof = true;
            return Ok(None);
        }
        self.number += 1;
        let text = self.buffer.trim_end_matches(['\n', '\r']);
        Ok(Some(Line::new(self.number, text)))
    }

    /// Reads the next line that is not blank.
    pub fn next_nonblank(&mut self) -> crate::Result<Option<Line>> {
        while let Some(line) = self.next_line()? {
            if !line.is_blank() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Returns `line` to the front of the stream.
    ///
    /// Only one line of push-back is held; pushing twice replaces the first.
    pub fn push_back(&mut self, line: Line) {
        self.pushed_back = Some(line);
    }

    /// Marks the stream finished without reading further.
    pub fn finish(&mut self) {
        self.pushed_back = None;
        self.eof = true;
    }

    pub fn lines_read(&self) -> usize {
        self.number
    }
}
