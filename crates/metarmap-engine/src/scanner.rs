//! Incremental tag scanner for the streaming METAR document.
//!
//! The data server returns one large tag-structured document containing a
//! `<METAR>` block per station. The scanner consumes it one byte at a time
//! with a fixed memory footprint: it never buffers the document, only the
//! name and value of the token currently being read.
//!
//! Callers register the leaf tag names they care about with
//! [`watch`](TagScanner::watch); every completed watched tag produces one
//! [`TagEvent`]. Everything else in the document -- other elements,
//! attributes, declarations, comments -- is scanned past and discarded.
//!
//! # Robustness policy
//!
//! The upstream transport can be cut off mid-document by the idle timeout,
//! so the scanner is strictly best-effort:
//!
//! - a tag left incomplete at stream truncation produces no event;
//! - a byte that violates the tag grammar drops the partial token and
//!   resynchronizes at the next `<` (malformed input is an expected
//!   operating condition, never an error);
//! - a value longer than the internal buffer is truncated and the event
//!   still fires -- station codes and category labels are short, bounded
//!   tokens in practice.
//!
//! There is no end-of-document marker the scanner can rely on;
//! [`reset`](TagScanner::reset) must be called at the start of every fetch
//! cycle.

/// Maximum accumulated length of a tag or attribute name.
const MAX_NAME_LEN: usize = 48;

/// Maximum accumulated length of an element text or attribute value.
/// Longer payloads are silently truncated.
const MAX_VALUE_LEN: usize = 64;

/// One completed watched tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEvent {
    /// Leaf tag (or attribute) name.
    pub name: String,
    /// Text payload, whitespace-trimmed, truncated at the buffer bound.
    pub value: String,
    /// `true` if the value came from an attribute rather than element text.
    pub from_attribute: bool,
}

/// Scanner state. One state per lexical position in the tag grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Between tags, accumulating element text.
    Text,
    /// Just consumed `<`.
    TagOpen,
    /// Reading an opening tag name.
    OpenName,
    /// Inside an opening tag, between attributes.
    Attrs,
    /// Reading an attribute name.
    AttrName,
    /// After an attribute name, waiting for `=` and the opening quote.
    AttrEq,
    /// Inside a quoted attribute value; the byte is the closing quote.
    AttrValue(u8),
    /// Reading a closing tag name (after `</`).
    CloseName,
    /// Whitespace between a closing tag name and `>`.
    CloseGap,
    /// Saw `/` inside an opening tag; expecting `>`.
    SelfClose,
    /// Inside `<!...>` or `<?...?>`; skipping to `>`.
    Special,
}

/// Incremental, fixed-memory scanner over a tag-structured byte stream.
///
/// Feed bytes with [`push`](TagScanner::push) (at most one event per byte)
/// or chunks with [`feed`](TagScanner::feed). The emitted event sequence is
/// identical for any chunking of the same bytes.
#[derive(Debug)]
pub struct TagScanner {
    state: ScanState,
    watched: Vec<String>,
    /// Current opening/closing tag name.
    name: Vec<u8>,
    /// Current attribute name.
    attr_name: Vec<u8>,
    /// Element text accumulator (innermost element only).
    text: Vec<u8>,
    /// Attribute value accumulator.
    attr_value: Vec<u8>,
}

/// Append a byte to a bounded accumulator, silently dropping the byte once
/// the capacity is reached.
fn push_bounded(buf: &mut Vec<u8>, byte: u8, cap: usize) {
    if buf.len() < cap {
        buf.push(byte);
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.')
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

impl TagScanner {
    /// Create a scanner with an empty watch list.
    pub fn new() -> Self {
        TagScanner {
            state: ScanState::Text,
            watched: Vec::new(),
            name: Vec::with_capacity(MAX_NAME_LEN),
            attr_name: Vec::with_capacity(MAX_NAME_LEN),
            text: Vec::with_capacity(MAX_VALUE_LEN),
            attr_value: Vec::with_capacity(MAX_VALUE_LEN),
        }
    }

    /// Register interest in a leaf tag (or attribute) name.
    pub fn watch(&mut self, name: &str) {
        if !self.watched.iter().any(|w| w == name) {
            self.watched.push(name.to_string());
        }
    }

    /// Discard all partial state and return to the initial scan position.
    ///
    /// Must be called at the start of every fetch cycle: the previous
    /// stream may have stopped mid-tag.
    pub fn reset(&mut self) {
        self.state = ScanState::Text;
        self.name.clear();
        self.attr_name.clear();
        self.text.clear();
        self.attr_value.clear();
    }

    /// Feed a chunk, invoking `on_event` for every completed watched tag.
    pub fn feed<F: FnMut(TagEvent)>(&mut self, chunk: &[u8], mut on_event: F) {
        for &b in chunk {
            if let Some(event) = self.push(b) {
                on_event(event);
            }
        }
    }

    /// Process one byte. Returns a completed watched-tag event, if any.
    pub fn push(&mut self, b: u8) -> Option<TagEvent> {
        match self.state {
            ScanState::Text => {
                if b == b'<' {
                    self.state = ScanState::TagOpen;
                } else {
                    push_bounded(&mut self.text, b, MAX_VALUE_LEN);
                }
            }

            ScanState::TagOpen => match b {
                b'/' => {
                    self.name.clear();
                    self.state = ScanState::CloseName;
                }
                b'!' | b'?' => self.state = ScanState::Special,
                b'<' => {} // `<<` -- stay here, the second `<` restarts the tag
                _ if is_name_byte(b) => {
                    self.name.clear();
                    self.name.push(b);
                    self.state = ScanState::OpenName;
                }
                // `< ` and friends: stray angle bracket in text, not a tag.
                _ => self.state = ScanState::Text,
            },

            ScanState::OpenName => match b {
                _ if is_name_byte(b) => push_bounded(&mut self.name, b, MAX_NAME_LEN),
                b'>' => self.element_opened(),
                b'/' => self.state = ScanState::SelfClose,
                b'<' => self.resync(),
                _ if is_space(b) => self.state = ScanState::Attrs,
                _ => self.state = ScanState::Text,
            },

            ScanState::Attrs => match b {
                b'>' => self.element_opened(),
                b'/' => self.state = ScanState::SelfClose,
                b'<' => self.resync(),
                _ if is_space(b) => {}
                _ if is_name_byte(b) => {
                    self.attr_name.clear();
                    self.attr_name.push(b);
                    self.state = ScanState::AttrName;
                }
                // Stray punctuation between attributes: skip it.
                _ => {}
            },

            ScanState::AttrName => match b {
                _ if is_name_byte(b) => push_bounded(&mut self.attr_name, b, MAX_NAME_LEN),
                b'=' => {
                    self.attr_value.clear();
                    self.state = ScanState::AttrEq;
                }
                b'>' => self.element_opened(),
                b'/' => self.state = ScanState::SelfClose,
                b'<' => self.resync(),
                _ if is_space(b) => self.state = ScanState::AttrEq,
                _ => self.state = ScanState::Text,
            },

            ScanState::AttrEq => match b {
                b'"' | b'\'' => {
                    self.attr_value.clear();
                    self.state = ScanState::AttrValue(b);
                }
                b'=' => {}
                b'>' => self.element_opened(),
                b'/' => self.state = ScanState::SelfClose,
                b'<' => self.resync(),
                _ if is_space(b) => {}
                _ if is_name_byte(b) => {
                    // Previous attribute had no value; this starts the next.
                    self.attr_name.clear();
                    self.attr_name.push(b);
                    self.state = ScanState::AttrName;
                }
                _ => self.state = ScanState::Text,
            },

            ScanState::AttrValue(quote) => {
                if b == quote {
                    self.state = ScanState::Attrs;
                    return self.attr_completed();
                }
                push_bounded(&mut self.attr_value, b, MAX_VALUE_LEN);
            }

            ScanState::CloseName => match b {
                _ if is_name_byte(b) => push_bounded(&mut self.name, b, MAX_NAME_LEN),
                b'>' => return self.element_closed(),
                b'<' => self.resync(),
                _ if is_space(b) => self.state = ScanState::CloseGap,
                _ => self.state = ScanState::Text,
            },

            ScanState::CloseGap => match b {
                b'>' => return self.element_closed(),
                b'<' => self.resync(),
                _ if is_space(b) => {}
                _ => self.state = ScanState::Text,
            },

            ScanState::SelfClose => match b {
                // Self-closed element: no text, no event.
                b'>' => {
                    self.text.clear();
                    self.state = ScanState::Text;
                }
                b'<' => self.resync(),
                _ => self.state = ScanState::Text,
            },

            ScanState::Special => {
                if b == b'>' {
                    self.state = ScanState::Text;
                }
            }
        }
        None
    }

    /// A `<` arrived where the grammar did not allow it: drop the partial
    /// token and restart at tag-open.
    fn resync(&mut self) {
        self.state = ScanState::TagOpen;
    }

    /// An opening tag completed: the element's text accumulation starts
    /// fresh. Only the innermost element's text is tracked.
    fn element_opened(&mut self) {
        self.text.clear();
        self.state = ScanState::Text;
    }

    /// A closing tag completed: emit if the leaf name is watched.
    fn element_closed(&mut self) -> Option<TagEvent> {
        self.state = ScanState::Text;
        let event = if self.is_watched(&self.name) {
            Some(TagEvent {
                name: String::from_utf8_lossy(&self.name).into_owned(),
                value: String::from_utf8_lossy(&self.text).trim().to_string(),
                from_attribute: false,
            })
        } else {
            None
        };
        self.text.clear();
        event
    }

    /// A quoted attribute value completed: emit if the attribute name is
    /// watched.
    fn attr_completed(&mut self) -> Option<TagEvent> {
        if self.is_watched(&self.attr_name) {
            Some(TagEvent {
                name: String::from_utf8_lossy(&self.attr_name).into_owned(),
                value: String::from_utf8_lossy(&self.attr_value).trim().to_string(),
                from_attribute: true,
            })
        } else {
            None
        }
    }

    fn is_watched(&self, name: &[u8]) -> bool {
        self.watched.iter().any(|w| w.as_bytes() == name)
    }
}

impl Default for TagScanner {
    fn default() -> Self {
        Self::new()
    }
}
