//! Pattern extraction of candidate phone numbers and `@`-handles.
//!
//! Stateless: two independent regexes, compiled once. Matches are
//! order-preserving and may repeat within a single message — every
//! occurrence is reported and classified separately downstream.

use std::sync::LazyLock;

use regex::Regex;

/// An optional `+`, then a digit run that may be broken up by spaces, dots,
/// hyphens, and parentheses, ending on a digit. Coarse shape only; the
/// normalizer applies the real length rules after separators are stripped.
static PHONE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\+?[0-9][0-9\s().-]{5,}[0-9]").expect("phone regex"));

/// `@` followed by 3–32 alphanumeric or underscore characters.
static HANDLE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]{3,32}").expect("handle regex"));

/// More digits than any one number can carry (ITU E.164 caps at 15). A span
/// above this has bridged the gap between two standalone numbers and must be
/// split back apart at whitespace.
const MAX_SPAN_DIGITS: usize = 15;

fn digit_count(s: &str) -> usize {
  s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Candidate matches pulled out of one message, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
  pub phones:  Vec<String>,
  pub handles: Vec<String>,
}

impl Extraction {
  pub fn is_empty(&self) -> bool {
    self.phones.is_empty() && self.handles.is_empty()
  }
}

/// Pull candidate phone and handle substrings out of `text`.
///
/// Never returns null lists — a message with nothing to track yields two
/// empty vectors.
pub fn extract(text: &str) -> Extraction {
  let mut phones = Vec::new();
  for m in PHONE_RE.find_iter(text) {
    let span = m.as_str();
    if digit_count(span) <= MAX_SPAN_DIGITS {
      phones.push(span.to_owned());
      continue;
    }
    // The span fused adjacent numbers across whitespace. Each piece is
    // re-examined on its own; pieces too short to be a candidate drop out.
    for piece in span.split_whitespace() {
      if let Some(pm) = PHONE_RE.find(piece) {
        phones.push(pm.as_str().to_owned());
      }
    }
  }

  Extraction {
    phones,
    handles: HANDLE_RE
      .find_iter(text)
      .map(|m| m.as_str().to_owned())
      .collect(),
  }
}
