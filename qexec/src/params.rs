//! Named query parameters

use std::collections::HashSet;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::traits::ToValue;
use crate::value::Value;

/// An ordered set of named parameters for one query.
///
/// Each entry is bound to the `:name` placeholder of the same name. Names are
/// stored without the colon; a leading `:` passed by the caller is ignored,
/// so `bind("id", 1)` and `bind(":id", 1)` are the same binding.
///
/// # Example
///
/// ```ignore
/// use qexec::Params;
///
/// let params = Params::new().bind("id", 42).bind("status", "active");
/// executor
///     .select_all("SELECT * FROM users WHERE id = :id AND status = :status", Some(&params))
///     .await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under `name`, replacing any earlier binding of that name.
    pub fn bind<T: ToValue>(mut self, name: impl AsRef<str>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind a value in place.
    pub fn insert<T: ToValue>(&mut self, name: impl AsRef<str>, value: T) {
        let name = normalize(name.as_ref());
        let value = value.to_value();
        match self.entries.iter_mut().find(|(n, _)| n.as_str() == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Get the value bound under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = normalize(name);
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no values are bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Parameter names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Render an optional parameter set for error messages.
    pub fn describe(params: Option<&Params>) -> String {
        match params {
            Some(params) => params.to_string(),
            None => "(none)".to_string(),
        }
    }
}

fn normalize(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, ":{} => {}", name, value)?;
        }
        f.write_str("]")
    }
}

impl<K: AsRef<str>, V: ToValue> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build a [`Params`] from `name => value` pairs.
///
/// ```ignore
/// let params = qexec::params! { "id" => 7, "email" => "a@example.com" };
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $(params.insert($name, $value);)+
        params
    }};
}

/// Collect the `:name` placeholders of a query, in order of appearance.
///
/// Quoted strings, quoted identifiers and comments are skipped, as is a
/// doubled `::`. Names are ASCII letters, digits and `_`, in any case.
pub fn placeholders(sql: &str) -> Vec<&str> {
    placeholder_spans(sql)
        .into_iter()
        .map(|(start, end)| &sql[start + 1..end])
        .collect()
}

/// Rewrite every `:name` placeholder to a positional `?`.
///
/// Returns the rewritten query and the placeholder names in order, one per
/// `?`, so a name used twice appears twice.
pub fn to_positional(sql: &str) -> (String, Vec<&str>) {
    let spans = placeholder_spans(sql);
    let mut rewritten = String::with_capacity(sql.len());
    let mut names = Vec::with_capacity(spans.len());
    let mut last = 0;

    for (start, end) in spans {
        rewritten.push_str(&sql[last..start]);
        rewritten.push('?');
        names.push(&sql[start + 1..end]);
        last = end;
    }
    rewritten.push_str(&sql[last..]);

    (rewritten, names)
}

/// Byte ranges of each placeholder, colon included.
fn placeholder_spans(sql: &str) -> Vec<(usize, usize)> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i = skip_quoted(bytes, i, quote);
            }
            b'#' => {
                i = skip_line(bytes, i);
            }
            b'-' if bytes.get(i + 1) == Some(&b'-')
                && bytes.get(i + 2).map_or(true, |b| b.is_ascii_whitespace()) =>
            {
                i = skip_line(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match sql[i + 2..].find("*/") {
                    Some(end) => i + 2 + end + 2,
                    None => bytes.len(),
                };
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
            }
            b':' => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && is_name_byte(bytes[end]) {
                    end += 1;
                }
                if end > start {
                    spans.push((i, end));
                }
                i = end.max(i + 1);
            }
            _ => i += 1,
        }
    }

    spans
}

/// Fail unless bound names and `:name` placeholders match up.
///
/// Every bound name needs a placeholder, and every placeholder needs a
/// bound value. A name may appear more than once in the query.
pub(crate) fn check_bindings(sql: &str, params: &Params) -> Result<()> {
    let used = placeholders(sql);
    let known: HashSet<&str> = used.iter().copied().collect();

    if let Some(name) = params.names().find(|name| !known.contains(name)) {
        return Err(QueryError::undefined_parameter(name));
    }
    match used.into_iter().find(|name| params.get(name).is_none()) {
        Some(name) => Err(QueryError::missing_parameter(name)),
        None => Ok(()),
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && quote != b'`' {
            i += 2;
        } else if b == quote {
            // a doubled quote is an escaped quote
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    match bytes[start..].iter().position(|&b| b == b'\n') {
        Some(offset) => start + offset + 1,
        None => bytes.len(),
    }
}
