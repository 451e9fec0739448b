//! Field-substitution templates
//!
//! Templates are plain text with `{{.Field}}` placeholders. Whitespace inside
//! the braces is allowed (`{{ .Title }}`). Anything else between `{{` and `}}`
//! is rejected when the template is parsed, so a broken template is reported
//! at startup instead of after the first ad has been downloaded.

use chrono::{Datelike, NaiveDate};
use std::borrow::Cow;
use thiserror::Error;

/// Fields available to the ad listing and ad name templates
pub const AD_FIELDS: &[&str] = &[
    "Title",
    "Price",
    "ID",
    "Slug",
    "Category",
    "Condition",
    "Type",
    "Color",
    "Material",
    "Shipping",
    "Created",
    "Expire",
    "Text",
];

/// Fields available to the output directory template
pub const RUN_DATE_FIELDS: &[&str] = &["Year", "Month", "Day"];

/// Errors that can occur while parsing or rendering a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("malformed placeholder near '{0}'")]
    Malformed(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),
}

/// Anything that can supply values for template placeholders
pub trait TemplateFields {
    /// Returns the value for `name`, or None if the field does not exist
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template string
    ///
    /// # Returns
    ///
    /// * `Ok(Template)` - The parsed template
    /// * `Err(TemplateError::Malformed)` - A placeholder is unterminated or
    ///   does not have the `.Field` form
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| TemplateError::Malformed(snippet(&rest[start..])))?;

            let inner = after[..end].trim();
            let name = inner
                .strip_prefix('.')
                .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()))
                .ok_or_else(|| TemplateError::Malformed(format!("{{{{{}}}}}", inner)))?;

            segments.push(Segment::Field(name.to_string()));
            rest = &after[end + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Iterates over the field names referenced by this template
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Ensures every referenced field is in `allowed`
    pub fn check_fields(&self, allowed: &[&str]) -> Result<(), TemplateError> {
        match self.fields().find(|name| !allowed.contains(name)) {
            Some(unknown) => Err(TemplateError::UnknownField(unknown.to_string())),
            None => Ok(()),
        }
    }

    /// Renders the template against a field source
    pub fn render(&self, values: &dyn TemplateFields) -> Result<String, TemplateError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = values
                        .field(name)
                        .ok_or_else(|| TemplateError::UnknownField(name.clone()))?;
                    out.push_str(&value);
                }
            }
        }

        Ok(out)
    }
}

/// Shortens template text for error messages
fn snippet(text: &str) -> String {
    text.chars().take(24).collect()
}

/// The date of the current run, used by the output directory template
#[derive(Debug, Clone, Copy)]
pub struct RunDate(pub NaiveDate);

impl RunDate {
    /// Returns the local date of today
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }
}

impl TemplateFields for RunDate {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "Year" => Some(Cow::Owned(format!("{:04}", self.0.year()))),
            "Month" => Some(Cow::Owned(format!("{:02}", self.0.month()))),
            "Day" => Some(Cow::Owned(format!("{:02}", self.0.day()))),
            _ => None,
        }
    }
}
