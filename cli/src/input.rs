//! Token and line reading over standard input.

use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Splits input into whitespace-separated tokens while still allowing a
/// free-text field to take the rest of a line.
pub struct TokenReader<R> {
    inner: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Next whitespace-separated token, or `None` at end of input.
    pub fn next_token(&mut self) -> io::Result<Option<String>> {
        while self.pending.is_empty() {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }

    /// The remaining tokens of the current line joined by single spaces, or
    /// the next non-empty line if nothing is left.
    pub fn next_text(&mut self) -> io::Result<Option<String>> {
        if !self.pending.is_empty() {
            let rest: Vec<String> = self.pending.drain(..).collect();
            return Ok(Some(rest.join(" ")));
        }
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let text = line.trim();
            if !text.is_empty() {
                return Ok(Some(text.to_string()));
            }
        }
    }
}
