//! Minimal JSON reader producing a generic `Value` tree.
//!
//! Single pass over a byte cursor. Open arrays and objects are kept on an
//! explicit stack, so each one is closed by its own bracket (the `sensors`
//! column inside `states` included) and nesting depth is limited only by
//! memory. No knowledge of the feed schema lives here.

use std::mem;

use crate::types::ParseError;

// ---------------------------------------------------------------------------
// Value model
// ---------------------------------------------------------------------------

/// A JSON number kept as its literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number(String);

impl Number {
    /// The literal as it appeared in the document.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value, if the literal is an integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Non-negative integer value, if it fits in `u64`. `-0` reads as 0.
    pub fn as_u64(&self) -> Option<u64> {
        let digits = match self.0.strip_prefix('-') {
            Some(rest) if rest.bytes().all(|b| b == b'0') => rest,
            Some(_) => return None,
            None => &self.0,
        };
        digits.parse().ok()
    }

    /// Floating point value. Integers and exponent forms are accepted.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// A parsed JSON node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    /// Pairs in document order. Duplicate keys are kept; lookup takes the last.
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Look up an object member. The last occurrence of a duplicated key wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl Drop for Value {
    // Children are moved onto a heap worklist so deep trees drop without
    // recursing.
    fn drop(&mut self) {
        let mut pending = match self {
            Value::Array(items) if !items.is_empty() => mem::take(items),
            Value::Object(pairs) if !pairs.is_empty() => {
                pairs.drain(..).map(|(_, v)| v).collect()
            }
            _ => return,
        };
        while let Some(mut value) = pending.pop() {
            match &mut value {
                Value::Array(items) => pending.append(items),
                Value::Object(pairs) => pending.extend(pairs.drain(..).map(|(_, v)| v)),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a complete document. Trailing whitespace is allowed, anything else
/// after the top-level value is `ParseError::TrailingData`.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    let mut parser = Parser { text, pos: 0 };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < text.len() {
        return Err(ParseError::TrailingData(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

/// A container whose closing bracket has not been seen yet.
enum Frame {
    Array(Vec<Value>),
    /// Members so far, plus the key awaiting its value.
    Object(Vec<(String, Value)>, String),
}

impl Frame {
    fn push(&mut self, value: Value) {
        match self {
            Frame::Array(items) => items.push(value),
            Frame::Object(pairs, key) => pairs.push((mem::take(key), value)),
        }
    }

    fn close(self) -> Value {
        match self {
            Frame::Array(items) => Value::Array(items),
            Frame::Object(pairs, _) => Value::Object(pairs),
        }
    }
}

impl Parser<'_> {
    fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Error for the character at the cursor, or end of input.
    fn unexpected(&self) -> ParseError {
        match self.text[self.pos..].chars().next() {
            Some(c) => ParseError::UnexpectedChar(self.pos, c),
            None => ParseError::UnexpectedEnd(self.pos),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let mut open: Vec<Frame> = Vec::new();

        'value: loop {
            self.skip_whitespace();
            let mut value = match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() != Some(b']') {
                        open.push(Frame::Array(Vec::new()));
                        continue 'value;
                    }
                    self.pos += 1;
                    Value::Array(Vec::new())
                }
                Some(b'{') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() != Some(b'}') {
                        let key = self.parse_key()?;
                        open.push(Frame::Object(Vec::new(), key));
                        continue 'value;
                    }
                    self.pos += 1;
                    Value::Object(Vec::new())
                }
                Some(b'"') => Value::String(self.parse_string()?),
                Some(b't') => self.parse_literal("true", Value::Bool(true))?,
                Some(b'f') => self.parse_literal("false", Value::Bool(false))?,
                Some(b'n') => self.parse_literal("null", Value::Null)?,
                Some(b'-' | b'0'..=b'9') => self.parse_number()?,
                _ => return Err(self.unexpected()),
            };

            // Hand the finished value to its container, closing every
            // container whose closer follows.
            loop {
                let Some(mut frame) = open.pop() else {
                    return Ok(value);
                };
                frame.push(value);

                let closer = match frame {
                    Frame::Array(_) => b']',
                    Frame::Object(..) => b'}',
                };
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        if let Frame::Object(_, key) = &mut frame {
                            *key = self.parse_key()?;
                        }
                        open.push(frame);
                        continue 'value;
                    }
                    Some(b) if b == closer => {
                        self.pos += 1;
                        value = frame.close();
                    }
                    _ => return Err(self.unexpected()),
                }
            }
        }
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Result<Value, ParseError> {
        for &expected in word.as_bytes() {
            if self.peek() != Some(expected) {
                return Err(self.unexpected());
            }
            self.pos += 1;
        }
        Ok(value)
    }

    /// `"key" :` inside an object; the cursor ends after the colon.
    fn parse_key(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        if self.peek() != Some(b'"') {
            return Err(self.unexpected());
        }
        let key = self.parse_string()?;

        self.skip_whitespace();
        if self.peek() != Some(b':') {
            return Err(self.unexpected());
        }
        self.pos += 1;
        Ok(key)
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut out = String::new();
        let mut run_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(ParseError::InvalidString(start)),
                Some(b'"') => {
                    out.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    let c = self.parse_escape().ok_or(ParseError::InvalidString(start))?;
                    out.push(c);
                    run_start = self.pos;
                }
                Some(b) if b < 0x20 => return Err(ParseError::InvalidString(start)),
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Decode the escape after a backslash; the cursor sits on the escape letter.
    fn parse_escape(&mut self) -> Option<char> {
        let c = match self.peek()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'b' => '\u{08}',
            b'f' => '\u{0C}',
            b'u' => {
                self.pos += 1;
                return self.parse_unicode_escape();
            }
            _ => return None,
        };
        self.pos += 1;
        Some(c)
    }

    /// `XXXX` of a `\uXXXX` escape, joining a following low surrogate if needed.
    fn parse_unicode_escape(&mut self) -> Option<char> {
        let high = self.parse_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high);
        }

        if self.bytes().get(self.pos..self.pos + 2) != Some(b"\\u") {
            return None;
        }
        self.pos += 2;
        let low = self.parse_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
    }

    fn parse_hex4(&mut self) -> Option<u32> {
        let digits = self.bytes().get(self.pos..self.pos + 4)?;
        let mut val = 0u32;
        for &d in digits {
            val = (val << 4) | (d as char).to_digit(16)?;
        }
        self.pos += 4;
        Some(val)
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let invalid = ParseError::InvalidNumber(start);

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    return Err(invalid);
                }
            }
            Some(b'1'..=b'9') => {
                self.skip_digits();
            }
            _ => return Err(invalid),
        }

        if self.peek() == Some(b'.') {
            self.pos += 1;
            if self.skip_digits() == 0 {
                return Err(invalid);
            }
        }

        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if self.skip_digits() == 0 {
                return Err(invalid);
            }
        }

        Ok(Value::Number(Number(self.text[start..self.pos].to_string())))
    }

    /// Advance over ASCII digits, returning how many were consumed.
    fn skip_digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        self.pos - start
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn num(text: &str) -> Number {
        let value = parse(text).unwrap();
        match value.as_number() {
            Some(n) => n.clone(),
            None => panic!("expected number, got {value:?}"),
        }
    }

    // -- Scalars --

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("false").unwrap(), Value::Bool(false));
        assert_eq!(parse(" null ").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_bad_literal() {
        assert_eq!(parse("tru"), Err(ParseError::UnexpectedEnd(3)));
        assert_eq!(parse("nul!"), Err(ParseError::UnexpectedChar(3, '!')));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(num("0").as_i64(), Some(0));
        assert_eq!(num("-42").as_i64(), Some(-42));
        assert_eq!(num("1700000000").as_u64(), Some(1_700_000_000));
        assert_eq!(num("1.5e3").as_f64(), Some(1500.0));
        assert_eq!(num("-0.25").as_f64(), Some(-0.25));
        assert_eq!(num("2E-2").as_f64(), Some(0.02));
        assert_eq!(num("1.5").as_str(), "1.5");
    }

    #[test]
    fn test_number_accessor_limits() {
        assert_eq!(num("1.5").as_i64(), None);
        assert_eq!(num("1e3").as_i64(), None);
        assert_eq!(num("-1").as_u64(), None);
        assert_eq!(num("-0").as_u64(), Some(0));
        assert_eq!(num("-0").as_i64(), Some(0));
        assert_eq!(num("-0.0").as_u64(), None);
        assert_eq!(num("1e400").as_f64(), None);
        assert_eq!(num("3").as_f64(), Some(3.0));
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(parse("01"), Err(ParseError::InvalidNumber(0)));
        assert_eq!(parse("-"), Err(ParseError::InvalidNumber(0)));
        assert_eq!(parse("[1.]"), Err(ParseError::InvalidNumber(1)));
        assert_eq!(parse("1e"), Err(ParseError::InvalidNumber(0)));
        assert_eq!(parse("-x"), Err(ParseError::InvalidNumber(0)));
    }

    // -- Strings --

    #[test]
    fn test_parse_string_escapes() {
        let v = parse(r#""AB\"C""#).unwrap();
        assert_eq!(v.as_str(), Some("AB\"C"));
        assert_eq!(v.as_str().unwrap().chars().count(), 4);

        let v = parse(r#""a\\b\/c\n\t\r\b\f""#).unwrap();
        assert_eq!(v.as_str(), Some("a\\b/c\n\t\r\u{08}\u{0C}"));
    }

    #[test]
    fn test_parse_unicode_escapes() {
        assert_eq!(parse(r#""Bj\u00e4rred""#).unwrap().as_str(), Some("Bjärred"));
        assert_eq!(parse(r#""\ud83d\ude80""#).unwrap().as_str(), Some("\u{1F680}"));
        assert_eq!(parse("\"Zürich\"").unwrap().as_str(), Some("Zürich"));
    }

    #[test]
    fn test_invalid_strings() {
        assert_eq!(parse(r#""abc"#), Err(ParseError::InvalidString(0)));
        assert_eq!(parse(r#"["\x"]"#), Err(ParseError::InvalidString(1)));
        assert_eq!(parse(r#""\u12G4""#), Err(ParseError::InvalidString(0)));
        assert_eq!(parse(r#""\ud83d""#), Err(ParseError::InvalidString(0)));
        assert_eq!(parse("\"a\nb\""), Err(ParseError::InvalidString(0)));
    }

    #[test]
    fn test_empty_string_is_valid() {
        assert_eq!(parse(r#""""#).unwrap(), Value::String(String::new()));
    }

    // -- Containers --

    #[test]
    fn test_nested_arrays() {
        let v = parse("[[1,[100,200]],[]]").unwrap();
        let outer = v.as_array().unwrap();
        assert_eq!(outer.len(), 2);
        let inner = outer[0].as_array().unwrap();
        let sensors = inner[1].as_array().unwrap();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[1].as_number().unwrap().as_i64(), Some(200));
        assert_eq!(outer[1], Value::Array(vec![]));
    }

    #[test]
    fn test_object_lookup_last_wins() {
        let v = parse(r#"{ "a": 1, "b": true, "a": 2 }"#).unwrap();
        assert_eq!(v.get("a").and_then(Value::as_number).and_then(Number::as_i64), Some(2));
        assert_eq!(v.get("b").and_then(Value::as_bool), Some(true));
        assert!(v.get("c").is_none());
        assert_eq!(v.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 20_000;
        let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let value = parse(&text).unwrap();

        let mut levels = 1;
        let mut node = &value;
        while let Some([inner]) = node.as_array() {
            node = inner;
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(node.as_array().map(<[Value]>::len), Some(0));
    }

    #[test]
    fn test_deep_nesting_unterminated() {
        let depth = 20_000;
        let text = format!(r#"{}{{"a":1"#, "[".repeat(depth));
        assert_eq!(parse(&text), Err(ParseError::UnexpectedEnd(text.len())));
    }

    #[test]
    fn test_mismatched_closer() {
        assert_eq!(parse("[1}"), Err(ParseError::UnexpectedChar(2, '}')));
        assert_eq!(parse(r#"{"a":[1]]"#), Err(ParseError::UnexpectedChar(8, ']')));
    }

    #[test]
    fn test_whitespace_everywhere() {
        let v = parse(" \n{\t\"k\" :\r\n [ 1 , 2 ] } \n").unwrap();
        assert_eq!(v.get("k").and_then(Value::as_array).map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd(0)));
        assert_eq!(parse("[1,]"), Err(ParseError::UnexpectedChar(3, ']')));
        assert_eq!(parse("[1 2]"), Err(ParseError::UnexpectedChar(3, '2')));
        assert_eq!(parse("{1:2}"), Err(ParseError::UnexpectedChar(1, '1')));
        assert_eq!(parse(r#"{"a" 1}"#), Err(ParseError::UnexpectedChar(5, '1')));
        assert_eq!(parse("[1,2"), Err(ParseError::UnexpectedEnd(4)));
        assert_eq!(parse("@"), Err(ParseError::UnexpectedChar(0, '@')));
        assert_eq!(parse("é"), Err(ParseError::UnexpectedChar(0, 'é')));
    }

    #[test]
    fn test_trailing_data() {
        assert_eq!(
            parse(r#"{"time":1,"states":[]} garbage"#),
            Err(ParseError::TrailingData(23))
        );
        assert!(parse("[]  \n").is_ok());
    }

    // -- Differential check against serde_json --

    fn same_tree(ours: &Value, theirs: &serde_json::Value) -> bool {
        match (ours, theirs) {
            (Value::Null, serde_json::Value::Null) => true,
            (Value::Bool(a), serde_json::Value::Bool(b)) => a == b,
            (Value::Number(a), serde_json::Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Value::String(a), serde_json::Value::String(b)) => a == b,
            (Value::Array(a), serde_json::Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_tree(x, y))
            }
            (Value::Object(_), serde_json::Value::Object(b)) => b
                .iter()
                .all(|(k, v)| ours.get(k).is_some_and(|mine| same_tree(mine, v))),
            _ => false,
        }
    }

    #[test]
    fn test_matches_serde_json() {
        let docs = [
            r#"{"time":1700000000,"states":[["4b1234","SWR123  ","Switzerland",1700000000,1700000001,8.5,47.4,10972.8,false,230.1,45.0,-1.3,null,11277.6,"1000",false,0,3]]}"#,
            r#"[1, -2.5, 3e2, "x\"y", [true, false, null], {"k": {"n": []}}]"#,
            r#"{"a": "é\n", "b": [[[[0]]]]}"#,
        ];
        for doc in docs {
            let ours = parse(doc).unwrap();
            let theirs: serde_json::Value = serde_json::from_str(doc).unwrap();
            assert!(same_tree(&ours, &theirs), "tree mismatch for {doc}");
        }
    }

    proptest! {
        #[test]
        fn prop_integer_literals_roundtrip(n in any::<i64>()) {
            let text = n.to_string();
            prop_assert_eq!(num(&text).as_i64(), Some(n));
        }

        #[test]
        fn prop_float_literals_roundtrip(x in -1.0e12f64..1.0e12f64) {
            // `{:?}` prints the shortest text that reads back to the same f64.
            let text = format!("{x:?}");
            prop_assert_eq!(num(&text).as_f64(), Some(x));
        }

        #[test]
        fn prop_exponent_literals_roundtrip(m in 1u32..10_000, e in -20i32..20) {
            let text = format!("{m}e{e}");
            let expected: f64 = text.parse().unwrap();
            prop_assert_eq!(num(&text).as_f64(), Some(expected));
        }
    }
}
