//! Keyboard shortcut that starts an editing session.
//!
//! A [`KeyChord`] is written the way the browser settings show it, e.g.
//! `Ctrl+Shift+D`. The [`ShortcutDispatcher`] keeps exactly one chord bound
//! through a [`KeyBinder`] and only rebinds when the chord changes or a rebind is
//! forced because the page's frames changed.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
	pub ctrl: bool,
	pub alt: bool,
	pub shift: bool,
	pub meta: bool,
}

impl Modifiers {
	pub const NONE: Self = Self {
		ctrl: false,
		alt: false,
		shift: false,
		meta: false,
	};
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
	modifiers: Modifiers,
	key: String,
}

impl KeyChord {
	pub fn modifiers(&self) -> Modifiers {
		self.modifiers
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn matches(&self, event: &KeyEvent) -> bool {
		self.modifiers == event.modifiers && self.key.eq_ignore_ascii_case(&event.key)
	}
}

fn invalid(chord: &str, reason: impl Into<String>) -> Error {
	Error::InvalidShortcut {
		chord: chord.to_string(),
		reason: reason.into(),
	}
}

fn modifier_slot<'a>(modifiers: &'a mut Modifiers, name: &str) -> Option<&'a mut bool> {
	match name.to_ascii_lowercase().as_str() {
		"ctrl" | "control" | "macctrl" => Some(&mut modifiers.ctrl),
		"alt" | "option" => Some(&mut modifiers.alt),
		"shift" => Some(&mut modifiers.shift),
		"command" | "cmd" | "meta" | "super" => Some(&mut modifiers.meta),
		_ => None,
	}
}

impl FromStr for KeyChord {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let parts: Vec<&str> = s.split('+').map(str::trim).collect();
		let Some((&key, names)) = parts.split_last() else {
			return Err(invalid(s, "empty shortcut"));
		};
		let mut scratch = Modifiers::NONE;
		if key.is_empty() || modifier_slot(&mut scratch, key).is_some() {
			return Err(invalid(s, "missing key"));
		}

		let mut modifiers = Modifiers::NONE;
		for &name in names {
			let slot = modifier_slot(&mut modifiers, name)
				.ok_or_else(|| invalid(s, format!("unknown modifier '{name}'")))?;
			if *slot {
				return Err(invalid(s, format!("repeated modifier '{name}'")));
			}
			*slot = true;
		}

		let key = if key.chars().count() == 1 {
			key.to_uppercase()
		} else {
			key.to_string()
		};
		Ok(Self { modifiers, key })
	}
}

impl fmt::Display for KeyChord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let names = [
			(self.modifiers.ctrl, "Ctrl"),
			(self.modifiers.alt, "Alt"),
			(self.modifiers.shift, "Shift"),
			(self.modifiers.meta, "Command"),
		];
		for (held, name) in names {
			if held {
				write!(f, "{name}+")?;
			}
		}
		f.write_str(&self.key)
	}
}

/// A key press as the page reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
	pub key: String,
	pub modifiers: Modifiers,
}

impl KeyEvent {
	pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
		Self {
			key: key.into(),
			modifiers,
		}
	}
}

/// Installs and removes key listeners.
pub trait KeyBinder {
	fn bind(&mut self, chord: &KeyChord);
	fn unbind(&mut self, chord: &KeyChord);
}

#[derive(Debug)]
pub struct ShortcutDispatcher<B> {
	binder: B,
	current: Option<KeyChord>,
}

impl<B: KeyBinder> ShortcutDispatcher<B> {
	pub fn new(binder: B) -> Self {
		Self {
			binder,
			current: None,
		}
	}

	pub fn current(&self) -> Option<&KeyChord> {
		self.current.as_ref()
	}

	pub fn binder(&self) -> &B {
		&self.binder
	}

	pub fn binder_mut(&mut self) -> &mut B {
		&mut self.binder
	}

	/// Binds `desired`, replacing whatever was bound before.
	///
	/// Returns whether anything was rebound. Without `force` an unchanged chord is
	/// left alone.
	pub fn reconcile(&mut self, desired: KeyChord, force: bool) -> bool {
		if !force && self.current.as_ref() == Some(&desired) {
			return false;
		}
		if let Some(previous) = self.current.take() {
			self.binder.unbind(&previous);
		}
		self.binder.bind(&desired);
		self.current = Some(desired);
		true
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
	Document,
	Frame(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
	pub target: ListenerTarget,
	pub chord: KeyChord,
}

/// Binder that listens on the document and on each same-origin frame.
#[derive(Debug, Default)]
pub struct ListenerBinder {
	frames: usize,
	listeners: Vec<Listener>,
}

impl ListenerBinder {
	pub fn new(frames: usize) -> Self {
		Self {
			frames,
			listeners: Vec::new(),
		}
	}

	pub fn frames(&self) -> usize {
		self.frames
	}

	/// Takes effect on the next bind.
	pub fn set_frames(&mut self, frames: usize) {
		self.frames = frames;
	}

	pub fn listeners(&self) -> &[Listener] {
		&self.listeners
	}

	pub fn handles(&self, event: &KeyEvent) -> bool {
		self.listeners.iter().any(|l| l.chord.matches(event))
	}
}

impl KeyBinder for ListenerBinder {
	fn bind(&mut self, chord: &KeyChord) {
		let targets = std::iter::once(ListenerTarget::Document).chain((0..self.frames).map(ListenerTarget::Frame));
		for target in targets {
			self.listeners.push(Listener {
				target,
				chord: chord.clone(),
			});
		}
	}

	fn unbind(&mut self, chord: &KeyChord) {
		self.listeners.retain(|l| &l.chord != chord);
	}
}
