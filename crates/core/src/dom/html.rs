//! Markup fragments for `innerHTML` style updates.
//!
//! Handles the subset composers emit: nested elements, unquoted or double-quoted
//! attribute values without spaces, void `<br>` and the common character
//! references. Anything else is rejected before the target is touched.

use super::{Document, NodeId};
use crate::error::{Error, Result};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr"];

#[derive(Debug, PartialEq)]
enum Token {
	Text(String),
	Open {
		tag: String,
		attrs: Vec<(String, String)>,
		self_closing: bool,
	},
	Close(String),
}

impl Document {
	/// Replaces the children of `node` with the parsed `markup`.
	pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<()> {
		let tokens = tokenize(markup)?;
		check_balanced(&tokens)?;

		self.remove_children(node);
		let mut stack = vec![node];
		for token in tokens {
			let parent = stack.last().copied().unwrap_or(node);
			match token {
				Token::Text(text) => {
					self.append_text(parent, &text);
				}
				Token::Open {
					tag,
					attrs,
					self_closing,
				} => {
					let element = self.append_element(parent, &tag);
					for (name, value) in &attrs {
						self.set_attribute(element, name, value);
					}
					if !self_closing && !is_void(&tag) {
						stack.push(element);
					}
				}
				Token::Close(_) => {
					stack.pop();
				}
			}
		}
		Ok(())
	}
}

/// Escapes `text` for use as element content or a quoted attribute value.
pub fn escape_markup(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}

fn is_void(tag: &str) -> bool {
	VOID_TAGS.contains(&tag)
}

fn tokenize(markup: &str) -> Result<Vec<Token>> {
	let mut tokens = Vec::new();
	let mut rest = markup;
	while !rest.is_empty() {
		if let Some(after) = rest.strip_prefix('<') {
			let end = after
				.find('>')
				.ok_or_else(|| Error::Markup("unterminated tag".into()))?;
			let inner = &after[..end];
			rest = &after[end + 1..];
			tokens.push(parse_tag(inner)?);
		} else {
			let end = rest.find('<').unwrap_or(rest.len());
			tokens.push(Token::Text(decode_entities(&rest[..end])?));
			rest = &rest[end..];
		}
	}
	Ok(tokens)
}

fn parse_tag(inner: &str) -> Result<Token> {
	if let Some(name) = inner.strip_prefix('/') {
		let name = name.trim();
		if name.is_empty() {
			return Err(Error::Markup("empty closing tag".into()));
		}
		return Ok(Token::Close(name.to_ascii_lowercase()));
	}

	let (inner, self_closing) = match inner.strip_suffix('/') {
		Some(inner) => (inner, true),
		None => (inner, false),
	};
	let mut parts = inner.split_ascii_whitespace();
	let tag = parts
		.next()
		.ok_or_else(|| Error::Markup("empty tag".into()))?
		.to_ascii_lowercase();
	let attrs = parts
		.map(|part| -> Result<(String, String)> {
			match part.split_once('=') {
				Some((name, value)) => Ok((name.to_string(), decode_entities(value.trim_matches('"'))?)),
				None => Ok((part.to_string(), String::new())),
			}
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(Token::Open {
		tag,
		attrs,
		self_closing,
	})
}

fn check_balanced(tokens: &[Token]) -> Result<()> {
	let mut open: Vec<&str> = Vec::new();
	for token in tokens {
		match token {
			Token::Open {
				tag, self_closing, ..
			} if !self_closing && !is_void(tag) => open.push(tag),
			Token::Close(tag) => match open.pop() {
				Some(expected) if expected == tag.as_str() => {}
				Some(expected) => {
					return Err(Error::Markup(format!("expected </{expected}>, found </{tag}>")));
				}
				None => return Err(Error::Markup(format!("unexpected </{tag}>"))),
			},
			_ => {}
		}
	}
	match open.last() {
		Some(tag) => Err(Error::Markup(format!("unclosed <{tag}>"))),
		None => Ok(()),
	}
}

fn decode_entities(raw: &str) -> Result<String> {
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;
	while let Some(start) = rest.find('&') {
		out.push_str(&rest[..start]);
		let after = &rest[start + 1..];
		let end = after
			.find(';')
			.ok_or_else(|| Error::Markup(format!("unterminated character reference in '{raw}'")))?;
		out.push(decode_reference(&after[..end])?);
		rest = &after[end + 1..];
	}
	out.push_str(rest);
	Ok(out)
}

fn decode_reference(name: &str) -> Result<char> {
	let c = match name {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some('\u{a0}'),
		_ => {
			if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
				u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
			} else if let Some(dec) = name.strip_prefix('#') {
				dec.parse().ok().and_then(char::from_u32)
			} else {
				None
			}
		}
	};
	c.ok_or_else(|| Error::Markup(format!("unknown character reference '&{name};'")))
}
