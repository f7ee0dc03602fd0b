//! Lexical analysis (tokenization) of a raw command line.

use crate::error::ShellError;

/// A single word of the command line, with quotes already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Text of the word after quote removal and escape processing.
    pub text: String,
    /// True when any part of the word was quoted or escaped.
    ///
    /// Quoted words are never interpreted as operators, so `echo ">"` prints `>`.
    pub quoted: bool,
}

impl Token {
    /// Creates an unquoted token.
    pub fn bare(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            quoted: false,
        }
    }

    /// Creates a token that came from a quoted span.
    pub fn quoted(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            quoted: true,
        }
    }

    /// Returns true if this token is the unquoted operator `op`.
    pub fn is_operator(&self, op: &str) -> bool {
        !self.quoted && self.text == op
    }

    /// Returns true if this token is an unquoted pipe.
    pub fn is_pipe(&self) -> bool {
        self.is_operator("|")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    quoted: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            quoted: false,
        }
    }

    /// Runs the state machine over the whole line.
    ///
    /// Returns `ShellError::Syntax` if the line ends inside a quoted span.
    fn make_tokens(&mut self) -> Result<Vec<Token>, ShellError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start | LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                Err(ShellError::Syntax("unterminated quote"))
            }
            _ => {
                self.finish_word(&mut out);
                Ok(out)
            }
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => self.finish_word(out),
            '|' => {
                self.finish_word(out);
                out.push(Token::bare("|"));
            }
            '\'' => {
                self.quoted = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => {
                // A trailing backslash is kept literally.
                let escaped = self.read_char().unwrap_or('\\');
                self.buffer.push(escaped);
                self.quoted = true;
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.peek_char() {
                Some(next @ ('"' | '\\' | '$' | '`' | '\n')) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                // Other escape markers (\n, \t, ...) are left for the consumer.
                _ => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        if self.state == LexingState::ReadingWord {
            out.push(Token {
                text: std::mem::take(&mut self.buffer),
                quoted: self.quoted,
            });
        }
        self.quoted = false;
        self.state = LexingState::Start;
    }
}

/// Splits a raw command line into tokens.
///
/// Whitespace outside of quotes separates words, single quotes keep their content
/// verbatim and double quotes honour the usual backslash escapes. An unquoted `|`
/// is always a token of its own. A blank line yields no tokens.
///
/// # Errors
/// `ShellError::Syntax("unterminated quote")` when a quote is never closed.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, ShellError> {
    LexingFSM::new(line).make_tokens()
}

/// Translates escape markers the way `echo -e` does.
///
/// Recognizes `\n`, `\t`, `\r`, `\\`, `\a`, `\b`, `\e` and `\0`; any other backslash
/// sequence is left untouched.
pub fn interpret_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let replacement = match chars.peek() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('\\') => '\\',
            Some('a') => '\x07',
            Some('b') => '\x08',
            Some('e') => '\x1b',
            Some('0') => '\0',
            _ => {
                out.push('\\');
                continue;
            }
        };
        chars.next();
        out.push(replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        split_into_tokens(line)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_quoted_whitespace_is_one_token() {
        assert_eq!(texts(r#"echo "a b" c"#), vec!["echo", "a b", "c"]);
    }

    #[test]
    fn test_blank_line_has_no_tokens() {
        assert!(split_into_tokens("").unwrap().is_empty());
        assert!(split_into_tokens("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_single_quotes_are_literal() {
        assert_eq!(texts(r#"echo 'a\n "b"'"#), vec!["echo", r#"a\n "b""#]);
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(texts(r#"echo "say \"hi\" \\ \$x""#), vec!["echo", r#"say "hi" \ $x"#]);
        // \n survives for echo -e
        assert_eq!(texts(r#"echo "apple\nbanana""#), vec!["echo", r"apple\nbanana"]);
    }

    #[test]
    fn test_adjacent_spans_join() {
        assert_eq!(texts(r#"a"b c"'d'e"#), vec!["ab cde"]);
        assert_eq!(texts(r#""""#), vec![""]);
    }

    #[test]
    fn test_backslash_outside_quotes() {
        assert_eq!(texts(r"one\ two three"), vec!["one two", "three"]);
        let tokens = split_into_tokens(r"\|").unwrap();
        assert_eq!(tokens, vec![Token::quoted("|")]);
    }

    #[test]
    fn test_pipe_splits_without_spaces() {
        let tokens = split_into_tokens("ls|wc -l").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::bare("ls"),
                Token::bare("|"),
                Token::bare("wc"),
                Token::bare("-l"),
            ]
        );
        assert!(tokens[1].is_pipe());
    }

    #[test]
    fn test_quoted_operators_are_not_operators() {
        let tokens = split_into_tokens(r#"echo "|" '>'"#).unwrap();
        assert!(!tokens[1].is_pipe());
        assert!(!tokens[2].is_operator(">"));
    }

    #[test]
    fn test_unterminated_quote() {
        for line in [r#"echo "abc"#, "echo 'abc", r#"echo "a\""#] {
            match split_into_tokens(line) {
                Err(ShellError::Syntax(msg)) => assert_eq!(msg, "unterminated quote"),
                other => panic!("expected syntax error for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_interpret_escapes() {
        assert_eq!(interpret_escapes(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(interpret_escapes(r"back\\slash"), r"back\slash");
        assert_eq!(interpret_escapes(r"keep \q and trailing \"), r"keep \q and trailing \");
    }
}
