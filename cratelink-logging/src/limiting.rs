use std::fmt::{self, Display};

#[derive(Clone, PartialEq, Eq)]
pub struct Truncated<'a> {
    limit: Option<usize>,
    val: &'a str,
}

impl<'a> Truncated<'a> {
    pub fn new(limit: Option<usize>, val: &'a str) -> Self {
        Self { limit, val }
    }
}

impl<'a> Display for Truncated<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) if self.val.len() > limit => {
                // truncation must not split a multi-byte char
                let mut end = limit;
                while !self.val.is_char_boundary(end) {
                    end -= 1;
                }
                write!(f, "{}...", &self.val[..end])
            }
            _ => write!(f, "{}", self.val),
        }
    }
}
