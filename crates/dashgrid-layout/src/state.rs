#![forbid(unsafe_code)]

//! Persisted layout record.
//!
//! # File Format
//!
//! ```json
//! {
//!   "order": ["stats-summary", "card-1x9k2", "card-p0a3"],
//!   "hidden": ["card-p0a3"],
//!   "spans": { "stats-summary": 6, "card-1x9k2": 2 }
//! }
//! ```
//!
//! Every field is optional. A span that is not a valid column count is
//! dropped on load instead of rejecting the whole record, so one bad entry
//! only costs that card its width.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dashgrid_core::CardId;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::width::WidthClass;

/// The persisted customization for one page context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutState {
    /// Card ids in display order. Should be unique; duplicates are tolerated.
    pub order: Vec<CardId>,
    /// Card ids the user has hidden.
    pub hidden: BTreeSet<CardId>,
    /// Explicit width per card.
    #[serde(deserialize_with = "deserialize_spans")]
    pub spans: BTreeMap<CardId, WidthClass>,
}

impl LayoutState {
    /// Whether nothing has been customized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty() && self.hidden.is_empty() && self.spans.is_empty()
    }

    /// Ids referenced anywhere in the record.
    #[must_use]
    pub fn referenced_ids(&self) -> BTreeSet<&CardId> {
        self.order
            .iter()
            .chain(self.hidden.iter())
            .chain(self.spans.keys())
            .collect()
    }
}

struct LenientSpan(Option<WidthClass>);

impl<'de> Deserialize<'de> for LenientSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientSpanVisitor)
    }
}

struct LenientSpanVisitor;

impl<'de> Visitor<'de> for LenientSpanVisitor {
    type Value = LenientSpan;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a grid column count")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(LenientSpan(
            u8::try_from(v).ok().and_then(WidthClass::from_columns),
        ))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(LenientSpan(
            u8::try_from(v).ok().and_then(WidthClass::from_columns),
        ))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.fract() != 0.0 || !(0.0..=255.0).contains(&v) {
            return Ok(LenientSpan(None));
        }
        Ok(LenientSpan(WidthClass::from_columns(v as u8)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(LenientSpan(
            v.trim().parse::<u8>().ok().and_then(WidthClass::from_columns),
        ))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(LenientSpan(None))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LenientSpan(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(LenientSpan(None))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(LenientSpan(None))
    }
}

fn deserialize_spans<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<CardId, WidthClass>, D::Error> {
    let raw = Option::<BTreeMap<CardId, LenientSpan>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, span)| span.0.map(|width| (id, width)))
        .collect())
}
