//! Reads a model reply as a decision.
//!
//! Two forms are accepted:
//! - JSON: `{"tool": "get_relation", "args": ["D", "acted_in"]}` or `{"final_answer": "#1"}`
//! - call syntax: `get_relation("D", acted_in)`, `#2 = count(#1)`, `final_answer(#2)`
//!
//! Call syntax may be surrounded by free text; the last line that parses wins.

use crate::types::Decision;
use kgagent_core::{Argument, MemoryRef};
use serde_json::Value;

const ANSWER_NAMES: [&str; 2] = ["final_answer", "answer"];

pub fn parse_decision(raw: &str) -> Decision {
    let text = strip_fences(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decision::invalid(raw, "empty reply");
    }

    if trimmed.starts_with('{') {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => from_json(raw, &value),
            Err(e) => Decision::invalid(raw, format!("malformed JSON: {}", e)),
        };
    }

    let mut last_error = None;
    for line in trimmed.lines().rev() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_call(line) {
            Ok((name, args)) => return into_decision(raw, name, args),
            Err(e) => {
                if last_error.is_none() {
                    last_error = Some(e);
                }
            }
        }
    }
    Decision::invalid(
        raw,
        last_error.unwrap_or_else(|| "no tool call found".to_string()),
    )
}

fn strip_fences(raw: &str) -> String {
    raw.lines()
        .filter(|l| !l.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn into_decision(raw: &str, name: String, mut args: Vec<Argument>) -> Decision {
    if ANSWER_NAMES.contains(&name.as_str()) {
        if args.len() != 1 {
            return Decision::invalid(
                raw,
                format!("{} takes exactly 1 argument, got {}", name, args.len()),
            );
        }
        return Decision::FinalAnswer(args.remove(0));
    }
    Decision::Call { tool: name, args }
}

fn from_json(raw: &str, value: &Value) -> Decision {
    let Some(obj) = value.as_object() else {
        return Decision::invalid(raw, "expected a JSON object");
    };

    if let Some(answer) = obj.get("final_answer") {
        return match json_argument(answer) {
            Ok(arg) => Decision::FinalAnswer(arg),
            Err(e) => Decision::invalid(raw, e),
        };
    }

    let Some(name) = obj
        .get("tool")
        .or_else(|| obj.get("name"))
        .and_then(Value::as_str)
    else {
        return Decision::invalid(raw, "missing \"tool\" or \"final_answer\"");
    };

    let args = match obj.get("args").or_else(|| obj.get("arguments")) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => match items.iter().map(json_argument).collect() {
            Ok(args) => args,
            Err(e) => return Decision::invalid(raw, e),
        },
        Some(_) => return Decision::invalid(raw, "\"args\" must be an array"),
    };

    into_decision(raw, name.to_string(), args)
}

fn json_argument(value: &Value) -> Result<Argument, String> {
    match value {
        Value::String(s) => Ok(Argument::from(s.as_str())),
        Value::Number(n) => n
            .as_f64()
            .map(Argument::Number)
            .ok_or_else(|| format!("unsupported number {}", n)),
        Value::Bool(b) => Ok(Argument::Bool(*b)),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(format!("unsupported list element {}", other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Argument::List),
        other => Err(format!("unsupported argument {}", other)),
    }
}

/// Parse `[#k =] name(arg, ...)`.
fn parse_call(line: &str) -> Result<(String, Vec<Argument>), String> {
    let mut line = line.trim().trim_end_matches(';');
    if let Some((lhs, rhs)) = line.split_once('=') {
        if MemoryRef::parse(lhs).is_some() {
            line = rhs.trim();
        }
    }

    let open = line.find('(').ok_or("no '(' in line")?;
    let name = line[..open].trim();
    if !is_identifier(name) {
        return Err(format!("'{}' is not a tool name", name));
    }
    let body = line[open + 1..]
        .trim_end()
        .strip_suffix(')')
        .ok_or("missing closing ')'")?;

    let mut cursor = Cursor::new(body);
    let args = cursor.arguments()?;
    Ok((name.to_string(), args))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn arguments(&mut self) -> Result<Vec<Argument>, String> {
        let mut args = Vec::new();
        self.skip_ws();
        if self.chars.peek().is_none() {
            return Ok(args);
        }
        loop {
            args.push(self.argument()?);
            self.skip_ws();
            match self.chars.next() {
                None => return Ok(args),
                Some(',') => continue,
                Some(c) => return Err(format!("unexpected '{}' after argument", c)),
            }
        }
    }

    fn argument(&mut self) -> Result<Argument, String> {
        self.skip_ws();
        match self.chars.peek() {
            Some('"') | Some('\'') => self.quoted().map(|s| Argument::from(s.as_str())),
            Some('[') => self.list().map(Argument::List),
            Some(_) => {
                let word = self.bare()?;
                Ok(classify(&word))
            }
            None => Err("missing argument".into()),
        }
    }

    fn quoted(&mut self) -> Result<String, String> {
        let quote = self.chars.next().ok_or("missing quote")?;
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err("unterminated string".into())
    }

    fn bare(&mut self) -> Result<String, String> {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == ',' || c == ']' {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        let word = out.trim().to_string();
        if word.is_empty() {
            return Err("empty argument".into());
        }
        Ok(word)
    }

    fn list(&mut self) -> Result<Vec<String>, String> {
        self.chars.next();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some(']') => {
                    self.chars.next();
                    return Ok(items);
                }
                Some('"') | Some('\'') => items.push(self.quoted()?),
                Some(_) => items.push(self.bare()?),
                None => return Err("unterminated list".into()),
            }
            self.skip_ws();
            match self.chars.next() {
                Some(',') => continue,
                Some(']') => return Ok(items),
                Some(c) => return Err(format!("unexpected '{}' in list", c)),
                None => return Err("unterminated list".into()),
            }
        }
    }
}

fn classify(word: &str) -> Argument {
    if let Some(r) = MemoryRef::parse(word) {
        return Argument::Ref(r);
    }
    match word {
        "true" => return Argument::Bool(true),
        "false" => return Argument::Bool(false),
        _ => {}
    }
    match word.parse::<f64>() {
        Ok(n) if n.is_finite() => Argument::Number(n),
        _ => Argument::Text(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_syntax_with_refs_and_strings() {
        let d = parse_decision(r#"get_relation("D", acted_in)"#);
        assert_eq!(d, Decision::call("get_relation", ["D", "acted_in"]));

        let d = parse_decision("#1 = count(#0)");
        assert_eq!(d, Decision::call("count", [MemoryRef::new(0)]));
    }

    #[test]
    fn last_parseable_line_wins() {
        let reply = "Thought: I need the films first.\nget_relation(\"D\", \"acted_in\")\nDone.";
        assert_eq!(
            parse_decision(reply),
            Decision::call("get_relation", ["D", "acted_in"])
        );
    }

    #[test]
    fn final_answer_forms() {
        assert_eq!(parse_decision("final_answer(#1)"), Decision::answer(MemoryRef::new(1)));
        assert_eq!(
            parse_decision(r##"{"final_answer": "#1"}"##),
            Decision::answer(MemoryRef::new(1))
        );
        assert!(matches!(
            parse_decision("final_answer(#1, #2)"),
            Decision::Invalid { .. }
        ));
    }

    #[test]
    fn json_call() {
        let d = parse_decision(r#"{"tool": "get_neighbors", "args": ["Alice", 2]}"#);
        assert_eq!(
            d,
            Decision::Call {
                tool: "get_neighbors".into(),
                args: vec![Argument::text("Alice"), Argument::Number(2.0)],
            }
        );
    }

    #[test]
    fn lists_and_escapes() {
        let d = parse_decision(r#"intersect(["F1", F2], "say \"hi\"")"#);
        assert_eq!(
            d,
            Decision::Call {
                tool: "intersect".into(),
                args: vec![
                    Argument::List(vec!["F1".into(), "F2".into()]),
                    Argument::text("say \"hi\""),
                ],
            }
        );
    }

    #[test]
    fn fenced_reply() {
        let d = parse_decision("```\ncount(#0)\n```");
        assert_eq!(d, Decision::call("count", [MemoryRef::new(0)]));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(parse_decision(""), Decision::Invalid { .. }));
        assert!(matches!(parse_decision("I don't know"), Decision::Invalid { .. }));
        assert!(matches!(parse_decision("{not json"), Decision::Invalid { .. }));
        assert!(matches!(parse_decision("count(#0"), Decision::Invalid { .. }));
    }
}
