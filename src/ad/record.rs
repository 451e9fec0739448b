//! The ad record and its derived fields

use crate::output::TemplateFields;
use chrono::NaiveDate;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Date format used by the marketplace for creation dates
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Number of days an ad stays online after it was created
pub const EXPIRE_DAYS: u64 = 60;

/// Separator placed between breadcrumb entries in `category`
pub const CATEGORY_SEPARATOR: &str = " => ";

/// Prefix the marketplace puts in front of the shipping cost
pub const SHIPPING_PREFIX: &str = "+ Versand ab ";

const CONDITION_KEY: &str = "Zustand";
const COLOR_KEY: &str = "Farbe";
const TYPE_KEY: &str = "Art";
const MATERIAL_KEY: &str = "Material";

/// One scraped advertisement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdRecord {
    /// URL-derived, human readable name of the ad
    pub slug: String,

    /// Marketplace-assigned identifier
    pub id: String,

    pub title: String,

    /// Raw formatted price, empty for gift ads
    pub price: String,

    /// Raw creation date as shown on the page
    pub created: String,

    /// Body text, still containing `<br>` line breaks
    pub text: String,

    /// Breadcrumb entries leading to the ad's category
    pub category_path: Vec<String>,

    /// Breadcrumbs joined with [`CATEGORY_SEPARATOR`]
    pub category: String,

    /// Unstructured key/value detail block
    pub details: String,

    /// Shipping cost, if the ad offers shipping
    pub shipping: String,

    /// Attributes decoded from `details`
    pub attributes: HashMap<String, String>,

    pub condition: String,
    pub color: String,
    pub kind: String,
    pub material: String,

    /// `created` plus [`EXPIRE_DAYS`], empty if `created` could not be parsed
    pub expire: String,

    /// Image source URLs in page order
    pub images: Vec<String>,
}

impl AdRecord {
    /// Creates an empty record for the given identity
    pub fn new(slug: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    /// Returns true if one of the mandatory fields is empty
    ///
    /// Category, creation date and body text are mandatory. Price is not,
    /// there are ads for gifts as well.
    pub fn incomplete(&self) -> bool {
        self.category.is_empty() || self.created.is_empty() || self.text.is_empty()
    }

    /// Joins the breadcrumb path into `category`
    pub fn join_category(&mut self) {
        if !self.category_path.is_empty() {
            self.category = self.category_path.join(CATEGORY_SEPARATOR);
        }
    }

    /// Decodes the detail block and backfills the well-known attributes
    pub fn decode_attributes(&mut self) {
        self.attributes = decode_attributes(self.details.lines());

        if let Some(value) = self.attributes.get(CONDITION_KEY) {
            self.condition = value.clone();
        }
        if let Some(value) = self.attributes.get(COLOR_KEY) {
            self.color = value.clone();
        }
        if let Some(value) = self.attributes.get(TYPE_KEY) {
            self.kind = value.clone();
        }
        if let Some(value) = self.attributes.get(MATERIAL_KEY) {
            self.material = value.clone();
        }

        let shipping = self.shipping.trim();
        self.shipping = shipping
            .strip_prefix(SHIPPING_PREFIX)
            .unwrap_or(shipping)
            .to_string();
    }

    /// Derives `expire` from `created`, leaving it empty on parse failure
    pub fn calculate_expire(&mut self) {
        if let Some(expire) = expire_date(&self.created, EXPIRE_DAYS) {
            self.expire = expire;
        }
    }
}

/// Decodes an alternating key/value line sequence
///
/// Non-blank lines alternate between key and value. Blank lines are skipped
/// and do not count towards the alternation. A trailing key without a value
/// is dropped.
pub fn decode_attributes<'a, I>(lines: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut attributes = HashMap::new();
    let mut key: Option<&str> = None;

    for line in lines.into_iter().map(str::trim).filter(|l| !l.is_empty()) {
        match key.take() {
            None => key = Some(line),
            Some(k) => {
                attributes.insert(k.to_string(), line.to_string());
            }
        }
    }

    if let Some(dangling) = key {
        tracing::debug!(key = dangling, "dropping attribute without value");
    }

    attributes
}

/// Adds `days` to a `DD.MM.YYYY` date
///
/// Returns None if `created` is not a valid date.
pub fn expire_date(created: &str, days: u64) -> Option<String> {
    let date = NaiveDate::parse_from_str(created.trim(), DATE_FORMAT).ok()?;
    let expire = date.checked_add_days(chrono::Days::new(days))?;
    Some(expire.format(DATE_FORMAT).to_string())
}

impl TemplateFields for AdRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "Title" => &self.title,
            "Price" => &self.price,
            "ID" => &self.id,
            "Slug" => &self.slug,
            "Category" => &self.category,
            "Condition" => &self.condition,
            "Type" => &self.kind,
            "Color" => &self.color,
            "Material" => &self.material,
            "Shipping" => &self.shipping,
            "Created" => &self.created,
            "Expire" => &self.expire,
            "Text" => &self.text,
            _ => return None,
        };
        Some(Cow::Borrowed(value.as_str()))
    }
}

impl fmt::Display for AdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id: {}, price: {}, images: {}, body: {} bytes)",
            self.title,
            self.id,
            self.price,
            self.images.len(),
            self.text.len()
        )
    }
}
