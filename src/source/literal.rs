//! Permissive parser for Python literal syntax.
//!
//! Accepts what a Python `repr` dump of the export looks like: single,
//! double and triple quoted strings (with `r`/`u`/`b` prefixes), adjacent
//! string concatenation, `True`/`False`/`None`, ints in any base, floats,
//! lists, tuples, sets and dicts, trailing commas and `#` comments. JSON is a
//! subset, so `true`/`false`/`null` are accepted too.
//!
//! Tuples and sets become arrays; non-string dict keys are stringified.

use serde_json::{Map, Number, Value};

/// Same container nesting limit serde_json applies.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralError {
    pub message: String,
    /// 1-based line and column.
    pub position: (usize, usize),
}

pub fn parse(text: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(text);
    parser.skip_trivia();
    let value = parser.value()?;
    parser.skip_trivia();
    if parser.peek().is_some() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> LiteralError {
        let consumed = &self.chars[..self.pos.min(self.chars.len())];
        let line = consumed.iter().filter(|c| **c == '\n').count() + 1;
        let column = consumed.iter().rev().take_while(|c| **c != '\n').count() + 1;
        LiteralError {
            message: message.to_string(),
            position: (line, column),
        }
    }

    /// Whitespace, `#` comments and backslash line continuations.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c == '\\' && matches!(self.peek_at(1), Some('\n') | Some('\r')) {
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(open @ ('{' | '[' | '(')) => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                let result = match open {
                    '{' => self.dict_or_set(),
                    '[' => {
                        self.pos += 1;
                        self.sequence(']').map(Value::Array)
                    }
                    _ => self.tuple_or_group(),
                };
                self.depth -= 1;
                result
            }
            Some('\'') | Some('"') => self.strings(),
            Some(c) if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                if self.at_string_prefix() {
                    self.strings()
                } else {
                    self.name()
                }
            }
            Some(c) => Err(self.error(&format!("unexpected character '{}'", c))),
        }
    }

    /// Comma separated values up to `close`; the opener is already consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                return Ok(items);
            }
            return Err(self.error(&format!("expected ',' or '{}'", close)));
        }
    }

    fn tuple_or_group(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        self.skip_trivia();
        if self.eat(')') {
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value()?;
        self.skip_trivia();
        if self.eat(')') {
            // parenthesized expression, not a tuple
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.error("expected ',' or ')'"));
        }
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Ok(Value::Array(items))
    }

    fn dict_or_set(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        self.skip_trivia();
        if self.eat('}') {
            return Ok(Value::Object(Map::new()));
        }
        let first = self.value()?;
        self.skip_trivia();
        if !self.eat(':') {
            // set display
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Value::Array(vec![first]));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',', ':' or '}'"));
            }
            let mut items = vec![first];
            items.extend(self.sequence('}')?);
            return Ok(Value::Array(items));
        }

        let mut map = Map::new();
        let mut key = self.key_string(first)?;
        loop {
            self.skip_trivia();
            let value = self.value()?;
            map.insert(key, value);
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}'"));
            }
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            let next = self.value()?;
            key = self.key_string(next)?;
            self.skip_trivia();
            if !self.eat(':') {
                return Err(self.error("expected ':'"));
            }
        }
    }

    fn key_string(&self, key: Value) -> Result<String, LiteralError> {
        match key {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Null => Ok("None".to_string()),
            Value::Array(_) | Value::Object(_) => Err(self.error("unhashable dict key")),
        }
    }

    fn name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.error(&format!("unknown name '{}'", word)))
            }
        }
    }

    fn at_string_prefix(&self) -> bool {
        let mut offset = 0;
        while offset < 2 {
            match self.peek_at(offset) {
                Some(c) if matches!(c.to_ascii_lowercase(), 'r' | 'u' | 'b') => offset += 1,
                Some('\'') | Some('"') => return offset > 0,
                _ => return false,
            }
        }
        matches!(self.peek_at(offset), Some('\'') | Some('"'))
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            let next_is_string = matches!(self.peek(), Some('\'') | Some('"'))
                || (matches!(self.peek(), Some(c) if c.is_alphabetic()) && self.at_string_prefix());
            if !next_is_string {
                self.pos = save;
                return Ok(Value::String(out));
            }
            out.push_str(&self.string()?);
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        while let Some(c) = self.peek() {
            match c.to_ascii_lowercase() {
                'r' => raw = true,
                'u' | 'b' => {}
                _ => break,
            }
            self.pos += 1;
        }
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected string")),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(self.error("unterminated string")),
            };
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    return Ok(out);
                }
                out.push(c);
            } else if c == '\n' && !triple {
                return Err(self.error("newline in single-quoted string"));
            } else if c == '\\' {
                if raw {
                    // raw strings keep the backslash but it still shields a quote
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.escape(&mut out)?;
                }
            } else {
                out.push(c);
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = match self.bump() {
            Some(c) => c,
            None => return Err(self.error("unterminated escape")),
        };
        match c {
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '/' => out.push('/'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'u' => {
                let code = self.hex_digits(4)?;
                out.push(self.utf16_unit(code)?);
            }
            'U' => {
                let code = self.hex_digits(8)?;
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            other => {
                // unknown escapes are kept verbatim
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, LiteralError> {
        let mut code = 0u32;
        for _ in 0..count {
            match self.peek().and_then(|d| d.to_digit(16)) {
                Some(d) => {
                    code = code.wrapping_mul(16).wrapping_add(d);
                    self.pos += 1;
                }
                None => return Err(self.error("truncated hex escape")),
            }
        }
        Ok(code)
    }

    /// Decode a `\u` escape, joining a surrogate pair when one follows.
    fn utf16_unit(&mut self, code: u32) -> Result<char, LiteralError> {
        if (0xD800..0xDC00).contains(&code)
            && self.peek() == Some('\\')
            && self.peek_at(1) == Some('u')
        {
            let save = self.pos;
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if (0xDC00..0xE000).contains(&low) {
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(combined).unwrap_or('\u{FFFD}'));
            }
            self.pos = save;
        }
        Ok(char::from_u32(code).unwrap_or('\u{FFFD}'))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let mut negative = false;
        while let Some(sign @ ('-' | '+')) = self.peek() {
            if sign == '-' {
                negative = !negative;
            }
            self.pos += 1;
            self.skip_trivia();
        }

        let start = self.pos;
        if self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            let radix = match self.peek_at(1) {
                Some('x' | 'X') => 16,
                Some('o' | 'O') => 8,
                _ => 2,
            };
            self.pos += 2;
            let digits = self.take_while(|c| c.is_ascii_hexdigit() || c == '_');
            let magnitude = i128::from_str_radix(&digits, radix)
                .map_err(|_| self.error("invalid integer literal"))?;
            return self.integer(if negative { -magnitude } else { magnitude });
        }

        let mut is_float = false;
        let mut text = self.take_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.pos += 1;
            text.push('e');
            if let Some(sign @ ('-' | '+')) = self.peek() {
                self.pos += 1;
                text.push(sign);
            }
            text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));
        }
        if matches!(self.peek(), Some('j' | 'J')) {
            return Err(self.error("complex numbers are not supported"));
        }
        if self.pos == start || text == "." {
            return Err(self.error("invalid number"));
        }

        if is_float {
            let mut value: f64 = text.parse().map_err(|_| self.error("invalid float literal"))?;
            if negative {
                value = -value;
            }
            return Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| self.error("float out of range"));
        }
        let magnitude: i128 = text.parse().map_err(|_| self.error("invalid integer literal"))?;
        self.integer(if negative { -magnitude } else { magnitude })
    }

    fn integer(&self, value: i128) -> Result<Value, LiteralError> {
        if let Ok(n) = i64::try_from(value) {
            return Ok(Value::Number(n.into()));
        }
        if let Ok(n) = u64::try_from(value) {
            return Ok(Value::Number(n.into()));
        }
        Number::from_f64(value as f64)
            .map(Value::Number)
            .ok_or_else(|| self.error("integer out of range"))
    }

    /// Consume matching characters, dropping `_` digit separators.
    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            if c != '_' {
                out.push(c);
            }
            self.pos += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_python_dict_list() {
        let value = parse("[{'title': 'A', 'allow_comments': 1, 'draft': True, 'x': None}]").unwrap();
        assert_eq!(
            value,
            json!([{"title": "A", "allow_comments": 1, "draft": true, "x": null}])
        );
    }

    #[test]
    fn test_plain_json_is_accepted() {
        let text = r#"{"a": [1, 2.5, -3], "b": {"c": "d\u00e9"}, "e": true, "f": null}"#;
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parse(text).unwrap(), expected);
    }

    #[test]
    fn test_trailing_commas_and_comments() {
        let text = "[\n  {'a': 1,},  # first\n  {'b': 2},\n]";
        assert_eq!(parse(text).unwrap(), json!([{"a": 1}, {"b": 2}]));
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(parse(r#"'it\'s'"#).unwrap(), json!("it's"));
        assert_eq!(parse(r#""say \"hi\"""#).unwrap(), json!("say \"hi\""));
        assert_eq!(parse("'''multi\nline'''").unwrap(), json!("multi\nline"));
        assert_eq!(parse(r"r'C:\path\n'").unwrap(), json!(r"C:\path\n"));
        assert_eq!(parse("u'caf\\xe9'").unwrap(), json!("café"));
        assert_eq!(parse("b'raw'").unwrap(), json!("raw"));
        assert_eq!(parse("'abc' \"def\"").unwrap(), json!("abcdef"));
        assert_eq!(parse(r"'\U0001F600 \ud83d\ude00'").unwrap(), json!("😀 😀"));
        assert_eq!(parse(r"'\101\q'").unwrap(), json!("A\\q"));
    }

    #[test]
    fn test_newline_in_short_string_fails() {
        let err = parse("'broken\nstring'").unwrap_err();
        assert_eq!(err.position.0, 2);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("[0x1F, 0o17, 0b101, 1_000, -2, +3]").unwrap(), json!([31, 15, 5, 1000, -2, 3]));
        assert_eq!(parse("[1.5, .5, 1e3, -2.5e-1]").unwrap(), json!([1.5, 0.5, 1000.0, -0.25]));
        assert_eq!(parse("18446744073709551615").unwrap(), json!(18446744073709551615u64));
        assert!(parse("1j").is_err());
    }

    #[test]
    fn test_tuples_and_sets() {
        assert_eq!(parse("(1, 2)").unwrap(), json!([1, 2]));
        assert_eq!(parse("(1,)").unwrap(), json!([1]));
        assert_eq!(parse("()").unwrap(), json!([]));
        assert_eq!(parse("(1)").unwrap(), json!(1));
        assert_eq!(parse("{1, 2}").unwrap(), json!([1, 2]));
        assert_eq!(parse("{}").unwrap(), json!({}));
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        assert_eq!(
            parse("{1: 'a', True: 'b', None: 'c'}").unwrap(),
            json!({"1": "a", "True": "b", "None": "c"})
        );
        assert!(parse("{[1]: 'a'}").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&ok).is_ok());

        let too_deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert_eq!(parse(&too_deep).unwrap_err().message, "nesting too deep");

        let err = parse(&"({[".repeat(1_000_000)).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
    }

    #[test]
    fn test_errors_report_position() {
        let err = parse("[1, 2,\n  oops]").unwrap_err();
        assert_eq!(err.position, (2, 3));
        assert!(err.message.contains("oops"));

        assert!(parse("[1, 2").is_err());
        assert!(parse("[1] extra").is_err());
    }
}
