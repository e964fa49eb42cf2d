//! Splits a single command line into an argument vector.
//!
//! The rules are deliberately small: whitespace separates words, and a pair of
//! double quotes groups whitespace into one word. There are no escapes, no single
//! quotes and no substitutions. Malformed input never fails; an unterminated
//! quote simply runs to the end of the line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    /// Raw span of the current word, quotes included.
    buffer: String,
}

impl LexingFSM {
    /// Creates a new instance of the lexical analysis Finite State Machine.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Walks the whole input once and returns the words in order.
    fn make_tokens(&mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        // Unterminated quotes end up here too.
        self.flush_word(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => {}
            '"' => {
                self.buffer.push('"');
                self.state = LexingState::ReadingDoubleQuote;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            c if c.is_whitespace() => {
                self.flush_word(out);
                self.state = LexingState::Start;
            }
            '"' => {
                self.buffer.push('"');
                self.state = LexingState::ReadingDoubleQuote;
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        self.buffer.push(ch);
        if ch == '"' {
            self.state = LexingState::ReadingWord;
        }
    }

    /// Emits the pending word, stripping one pair of enclosing quotes.
    ///
    /// Quotes anywhere else in the word are kept verbatim, so `--name="a b"`
    /// stays `--name="a b"` while `"a b"` becomes `a b`.
    fn flush_word(&mut self, out: &mut Vec<String>) {
        if self.buffer.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.buffer);
        let word = match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(inner) => inner.to_string(),
            None => raw,
        };
        out.push(word);
    }
}

/// Splits `line` into the words that make up an argument vector.
///
/// Returns an empty vector for an empty or all-whitespace line; callers treat
/// that as "nothing to execute".
///
/// ```
/// use shell_capture::split_into_tokens;
/// assert_eq!(split_into_tokens(r#"ls -l "my file.txt""#), ["ls", "-l", "my file.txt"]);
/// ```
pub fn split_into_tokens(line: &str) -> Vec<String> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
