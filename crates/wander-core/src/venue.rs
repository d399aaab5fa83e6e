//! Venue records: immutable identity and location plus lazily derived detail
//! attributes.
//!
//! A [`Venue`] is built from a [`RawVenue`] returned by the search provider.
//! Detail attributes are derived from an attached [`DetailPayload`] on first
//! access and cached per [`DetailKind`]. Once an attribute is cached it is never
//! recomputed, even if it was derived before any payload was attached.

use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::location::Coordinates;

/// Rating value for venues the provider has not rated.
pub const UNKNOWN_RATING: f64 = -1.0;

/// Hours text for venues that publish no opening hours.
pub const HOURS_NOT_LISTED: &str = "Hours not listed";

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

pub const CONTACT_PHONE: &str = "Phone Number";
pub const CONTACT_FACEBOOK: &str = "Facebook";
pub const CONTACT_INSTAGRAM: &str = "Instagram";
pub const CONTACT_TWITTER: &str = "Twitter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub formatted_address: Vec<String>,
}

/// Unprocessed venue as returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVenue {
    pub id: String,
    pub name: String,
    pub location: VenueLocation,
}

// ---------------------------------------------------------------------------
// Detail payload
// ---------------------------------------------------------------------------

/// Extended attributes for one venue, as fetched from the detail provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailPayload {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub formatted_phone: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub facebook_username: Option<String>,
    /// Numeric Facebook page id, used when no username is published.
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    /// Free-text status such as "Open until 8:00 PM".
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timeframes: Vec<Timeframe>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub days: String,
    #[serde(default)]
    pub open: Vec<String>,
}

// ---------------------------------------------------------------------------
// Derived attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Description,
    Url,
    CanonicalUrl,
    Rating,
    Contacts,
    Hours,
}

impl DetailKind {
    pub const ALL: [DetailKind; 6] = [
        DetailKind::Description,
        DetailKind::Url,
        DetailKind::CanonicalUrl,
        DetailKind::Rating,
        DetailKind::Contacts,
        DetailKind::Hours,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Text(String),
    Rating(f64),
    Contacts(BTreeMap<String, String>),
}

impl DetailValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DetailValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_rating(&self) -> Option<f64> {
        match self {
            DetailValue::Rating(r) => Some(*r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_contacts(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            DetailValue::Contacts(c) => Some(c),
            _ => None,
        }
    }
}

/// Derives one attribute from the payload. An absent payload yields the
/// empty or sentinel value for every kind.
fn derive(payload: Option<&DetailPayload>, kind: DetailKind) -> DetailValue {
    match kind {
        DetailKind::Description => {
            DetailValue::Text(payload.and_then(|p| p.description.clone()).unwrap_or_default())
        }
        DetailKind::Url => {
            DetailValue::Text(payload.and_then(|p| p.url.clone()).unwrap_or_default())
        }
        DetailKind::CanonicalUrl => DetailValue::Text(
            payload
                .and_then(|p| p.canonical_url.clone())
                .unwrap_or_default(),
        ),
        DetailKind::Rating => DetailValue::Rating(
            payload
                .and_then(|p| p.rating)
                .filter(|r| r.is_finite())
                .unwrap_or(UNKNOWN_RATING),
        ),
        DetailKind::Contacts => {
            DetailValue::Contacts(payload.map(|p| contacts(&p.contact)).unwrap_or_default())
        }
        DetailKind::Hours => DetailValue::Text(
            payload
                .and_then(|p| p.hours.as_ref())
                .and_then(render_hours)
                .unwrap_or_else(|| HOURS_NOT_LISTED.to_string()),
        ),
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn contacts(contact: &ContactInfo) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if let Some(phone) =
        non_blank(contact.formatted_phone.as_ref()).or(non_blank(contact.phone.as_ref()))
    {
        out.insert(CONTACT_PHONE.to_string(), phone.to_string());
    }
    if let Some(handle) =
        non_blank(contact.facebook_username.as_ref()).or(non_blank(contact.facebook.as_ref()))
    {
        out.insert(
            CONTACT_FACEBOOK.to_string(),
            format!("https://www.facebook.com/{handle}"),
        );
    }
    if let Some(handle) = non_blank(contact.instagram.as_ref()) {
        out.insert(
            CONTACT_INSTAGRAM.to_string(),
            format!("https://www.instagram.com/{handle}"),
        );
    }
    if let Some(handle) = non_blank(contact.twitter.as_ref()) {
        out.insert(
            CONTACT_TWITTER.to_string(),
            format!("https://twitter.com/{handle}"),
        );
    }
    out
}

fn render_hours(hours: &OpeningHours) -> Option<String> {
    let frames: Vec<String> = hours
        .timeframes
        .iter()
        .filter(|t| !t.days.trim().is_empty())
        .map(|t| {
            if t.open.is_empty() {
                t.days.clone()
            } else {
                format!("{}: {}", t.days, t.open.join(", "))
            }
        })
        .collect();
    if frames.is_empty() {
        non_blank(hours.status.as_ref()).map(ToOwned::to_owned)
    } else {
        Some(frames.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Venue
// ---------------------------------------------------------------------------

/// One suggestable venue.
///
/// Equality and hashing use only `id`; the attribute cache never affects
/// identity.
#[derive(Debug, Clone)]
pub struct Venue {
    id: String,
    name: String,
    location: VenueLocation,
    payload: Option<DetailPayload>,
    hydrated: bool,
    cache: HashMap<DetailKind, DetailValue>,
}

impl From<RawVenue> for Venue {
    fn from(raw: RawVenue) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            location: raw.location,
            payload: None,
            hydrated: false,
            cache: HashMap::new(),
        }
    }
}

impl PartialEq for Venue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Venue {}

impl Hash for Venue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Venue(id = {}, address = [{}], name = {})",
            self.id,
            self.location.formatted_address.join(", "),
            self.name
        )
    }
}

impl Venue {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> &VenueLocation {
        &self.location
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.location.lat, self.location.lng)
    }

    #[must_use]
    pub fn address(&self) -> &[String] {
        &self.location.formatted_address
    }

    /// `true` once a detail payload has been attached (or restored from a
    /// hydrated plain record).
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Attaches the detail payload. Only the first call has any effect; the
    /// return value says whether this call attached it.
    ///
    /// No attribute is derived here; derivation happens on first access.
    pub fn hydrate(&mut self, payload: DetailPayload) -> bool {
        if self.hydrated {
            return false;
        }
        self.payload = Some(payload);
        self.hydrated = true;
        true
    }

    /// Derives and caches every attribute not already cached.
    pub fn derive_all(&mut self) {
        for kind in DetailKind::ALL {
            self.detail(kind);
        }
    }

    /// Returns the attribute for `kind`, deriving and caching it on first use.
    pub fn detail(&mut self, kind: DetailKind) -> &DetailValue {
        let payload = self.payload.as_ref();
        self.cache
            .entry(kind)
            .or_insert_with(|| derive(payload, kind))
    }

    /// Returns the attribute only if it has already been derived.
    #[must_use]
    pub fn cached(&self, kind: DetailKind) -> Option<&DetailValue> {
        self.cache.get(&kind)
    }

    pub fn description(&mut self) -> &str {
        self.detail(DetailKind::Description)
            .as_text()
            .unwrap_or_default()
    }

    pub fn url(&mut self) -> &str {
        self.detail(DetailKind::Url).as_text().unwrap_or_default()
    }

    pub fn canonical_url(&mut self) -> &str {
        self.detail(DetailKind::CanonicalUrl)
            .as_text()
            .unwrap_or_default()
    }

    pub fn rating(&mut self) -> f64 {
        self.detail(DetailKind::Rating)
            .as_rating()
            .unwrap_or(UNKNOWN_RATING)
    }

    pub fn contacts(&mut self) -> BTreeMap<String, String> {
        self.detail(DetailKind::Contacts)
            .as_contacts()
            .cloned()
            .unwrap_or_default()
    }

    pub fn hours(&mut self) -> &str {
        self.detail(DetailKind::Hours)
            .as_text()
            .unwrap_or(HOURS_NOT_LISTED)
    }

    /// Map-search link for `name, address`.
    #[must_use]
    pub fn maps_link(&self) -> String {
        let mut target = self.name.clone();
        if !self.location.formatted_address.is_empty() {
            target.push_str(", ");
            target.push_str(&self.location.formatted_address.join(", "));
        }
        format!(
            "{MAPS_SEARCH_URL}{}",
            utf8_percent_encode(&target, NON_ALPHANUMERIC)
        )
    }

    /// Flat representation carrying identity, location, and every cached
    /// detail attribute.
    #[must_use]
    pub fn to_plain_record(&self) -> PlainVenue {
        let text = |kind| {
            self.cached(kind)
                .and_then(DetailValue::as_text)
                .map(ToOwned::to_owned)
        };
        PlainVenue {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            hydrated: self.hydrated,
            description: text(DetailKind::Description),
            url: text(DetailKind::Url),
            canonical_url: text(DetailKind::CanonicalUrl),
            rating: self
                .cached(DetailKind::Rating)
                .and_then(DetailValue::as_rating),
            contacts: self
                .cached(DetailKind::Contacts)
                .and_then(DetailValue::as_contacts)
                .cloned(),
            hours: text(DetailKind::Hours),
        }
    }

    /// Rebuilds a venue from its plain record, restoring the attribute cache.
    #[must_use]
    pub fn from_plain_record(plain: PlainVenue) -> Self {
        let mut cache = HashMap::new();
        let texts = [
            (DetailKind::Description, plain.description),
            (DetailKind::Url, plain.url),
            (DetailKind::CanonicalUrl, plain.canonical_url),
            (DetailKind::Hours, plain.hours),
        ];
        for (kind, value) in texts {
            if let Some(v) = value {
                cache.insert(kind, DetailValue::Text(v));
            }
        }
        if let Some(r) = plain.rating {
            cache.insert(DetailKind::Rating, DetailValue::Rating(r));
        }
        if let Some(c) = plain.contacts {
            cache.insert(DetailKind::Contacts, DetailValue::Contacts(c));
        }
        Self {
            id: plain.id,
            name: plain.name,
            location: plain.location,
            payload: None,
            hydrated: plain.hydrated,
            cache,
        }
    }
}

/// Serializable flat form of a [`Venue`], used for session snapshots and
/// JSON dumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainVenue {
    pub id: String,
    pub name: String,
    pub location: VenueLocation,
    #[serde(default)]
    pub hydrated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
}
