//! Builder for the backend's query language.
//!
//! Predicates are AND-ed in the order they are added. Values are always
//! double-quoted with embedded quotes and backslashes escaped.

use std::fmt;

/// A single field predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(String, String),
    IsNull(String),
    In(String, Vec<String>),
    Between(String, String, String),
    GtEq(String, String),
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(field, value) => write!(f, "{field} = {}", quote(value)),
            Predicate::IsNull(field) => write!(f, "{field} = null"),
            Predicate::In(field, values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
                write!(f, "{field} IN ({})", quoted.join(", "))
            }
            Predicate::Between(field, low, high) => {
                write!(f, "{field} BETWEEN ({}, {})", quote(low), quote(high))
            }
            Predicate::GtEq(field, value) => write!(f, "{field} >= {}", quote(value)),
        }
    }
}

/// AND-composed query expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KqlQuery {
    predicates: Vec<Predicate>,
}

impl KqlQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<String>) -> Self {
        self.predicates
            .push(Predicate::Eq(field.to_string(), value.into()));
        self
    }

    pub fn is_null(mut self, field: &str) -> Self {
        self.predicates.push(Predicate::IsNull(field.to_string()));
        self
    }

    pub fn in_list<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predicates.push(Predicate::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Equality for a single value, membership for several
    pub fn eq_or_in(self, field: &str, values: Vec<String>) -> Self {
        if values.len() == 1 {
            let value = values.into_iter().next().unwrap_or_default();
            self.eq(field, value)
        } else {
            self.in_list(field, values)
        }
    }

    pub fn between(mut self, field: &str, low: impl Into<String>, high: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Between(
            field.to_string(),
            low.into(),
            high.into(),
        ));
        self
    }

    pub fn gteq(mut self, field: &str, value: impl Into<String>) -> Self {
        self.predicates
            .push(Predicate::GtEq(field.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn build(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}
