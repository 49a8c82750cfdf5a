// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

/// A forward-only view over the tokens of a rule.
#[derive(Debug)]
pub struct Cursor<'a, S> {
    tokens: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> Cursor<'a, S> {
    pub fn new(tokens: &'a [S]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The token under the cursor, if any remain.
    pub fn current(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(|t| t.as_ref())
    }

    /// Step past the current token. Does nothing once exhausted.
    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Consume and return the current token.
    pub fn next_token(&mut self) -> Option<&'a str> {
        let tok = self.current()?;
        self.advance();
        Some(tok)
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn walk() {
        let toks = ["protocol", "ip", "flower"];
        let mut c = Cursor::new(&toks[..]);
        assert_eq!(c.remaining(), 3);
        assert_eq!(c.current(), Some("protocol"));
        assert_eq!(c.current(), Some("protocol"));
        c.advance();
        assert_eq!(c.next_token(), Some("ip"));
        assert_eq!(c.remaining(), 1);
        c.advance();
        assert_eq!(c.current(), None);
        assert_eq!(c.remaining(), 0);
        c.advance();
        assert_eq!(c.remaining(), 0);
        assert_eq!(c.next_token(), None);
    }
}
