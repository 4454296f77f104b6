//! Structured log sink contract.
//!
//! # Responsibilities
//! - Define the `LogSink` capability consumed by the supervisor and servers
//! - Define typed attributes (ordered key/value pairs)
//! - Render events into the single-line wire format
//!
//! # Wire Format
//! ```text
//! message=<message>[; error=<error>][; <key>=<value>]...
//! ```
//! Attribute order is insertion order. Integers render as plain decimal.

use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Write as _};

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl Level {
    /// Upper-case label used by structured sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value carried by an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(Cow<'static, str>),
    Int(i64),
    Uint(u64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
        }
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Cow::Owned(s))
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(Cow::Owned(s.clone()))
    }
}

macro_rules! impl_value_from_int {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::$variant(n.into())
                }
            }
        )*
    };
}

impl_value_from_int!(Int: i8, i16, i32, i64);
impl_value_from_int!(Uint: u8, u16, u32, u64);

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Uint(n as u64)
    }
}

/// A single key/value attribute of a log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Shorthand for [`Attr::new`].
pub fn attr(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Attr {
    Attr::new(key, value)
}

/// Build attributes from a flat, alternating key/value list.
///
/// Keys are rendered with their `Display` form. A trailing key without a
/// value is dropped.
pub fn pairs<I>(flat: I) -> Vec<Attr>
where
    I: IntoIterator<Item = Value>,
{
    let mut out = Vec::new();
    let mut iter = flat.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let key = match key {
            Value::Str(s) => s,
            other => Cow::Owned(other.to_string()),
        };
        out.push(Attr { key, value });
    }
    out
}

/// Destination for structured operational messages.
///
/// Implementations must not block beyond formatting and writing one event,
/// and must never panic. Failures to write are swallowed.
pub trait LogSink: Send + Sync {
    fn info(&self, msg: &str, attrs: &[Attr]);

    fn error(&self, err: &(dyn Error + 'static), msg: &str, attrs: &[Attr]);
}

/// Render an event into the single-line wire format.
pub fn render(msg: &str, err: Option<&(dyn Error + 'static)>, attrs: &[Attr]) -> String {
    let err = err.map(|e| e.to_string());
    render_with(msg, err.as_deref(), attrs)
}

pub(crate) fn render_with(msg: &str, err: Option<&str>, attrs: &[Attr]) -> String {
    let mut line = String::with_capacity(msg.len() + 16 * (attrs.len() + 1));
    line.push_str("message=");
    line.push_str(msg);
    if let Some(err) = err {
        line.push_str("; error=");
        line.push_str(err);
    }
    for attr in attrs {
        // Writing into a String cannot fail.
        let _ = write!(line, "; {}={}", attr.key, attr.value);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("error")
        }
    }

    impl Error for Boom {}

    #[test]
    fn test_render_info() {
        let line = render("message", None, &[attr("key", "value")]);
        assert_eq!(line, "message=message; key=value");
    }

    #[test]
    fn test_render_error_puts_error_first() {
        let line = render("message", Some(&Boom as &(dyn Error + 'static)), &[attr("key", "value")]);
        assert_eq!(line, "message=message; error=error; key=value");
    }

    #[test]
    fn test_render_without_attrs() {
        assert_eq!(render("Server started.", None, &[]), "message=Server started.");
    }

    #[test]
    fn test_render_integers_and_order() {
        let attrs = [attr("status", 200u16), attr("path", "/"), attr("delta", -3i32), attr("zero", 0u64)];
        assert_eq!(
            render("Request received.", None, &attrs),
            "message=Request received.; status=200; path=/; delta=-3; zero=0"
        );
    }

    #[test]
    fn test_pairs_drops_incomplete_trailing_key() {
        let attrs = pairs(vec![Value::from("key"), Value::from("value"), Value::from("dangling")]);
        assert_eq!(attrs, vec![attr("key", "value")]);
        assert_eq!(render("message", None, &attrs), "message=message; key=value");
    }

    #[test]
    fn test_pairs_accepts_non_string_keys() {
        let attrs = pairs(vec![Value::from(7i64), Value::from(8i64)]);
        assert_eq!(render("m", None, &attrs), "message=m; 7=8");
    }

    #[test]
    fn test_pairs_empty() {
        assert!(pairs(Vec::new()).is_empty());
        assert!(pairs(vec![Value::from("lonely")]).is_empty());
    }
}
