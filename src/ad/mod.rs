//! Ad module: the scraped record and how it is extracted
//!
//! # Components
//!
//! - `AdRecord`: one advertisement with its content and derived fields
//! - `extract_ad`: fetches, maps and validates one ad page

mod extract;
mod record;

pub use extract::extract_ad;
pub use record::{
    decode_attributes, expire_date, AdRecord, CATEGORY_SEPARATOR, DATE_FORMAT, EXPIRE_DAYS,
    SHIPPING_PREFIX,
};
