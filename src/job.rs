//! Job record domain types and lenient deserialization helpers.
//!
//! A [`JobRecord`] is the payload a job sheet is generated from. Upstream services are loose
//! about types (ids arrive as numbers or strings, missing values as `null` or `"NA"`), so every
//! scalar field is read through [`lenient_string`] and modeled as an `Option`. Deciding what
//! counts as "absent" for display is left to [`crate::normalize`]. Builders are derived for
//! constructing records in code.

use derive_builder::Builder;
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

/// Read any JSON scalar as a string. `null` and a missing key both become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Read a non-negative count that may be sent as a number or a numeric string.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Read a nested object that upstream may send as `null`, `"NA"` or some other scalar. Anything
/// but an object becomes `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => T::deserialize(value).map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

/// Read the checklist. A list sent as `null` or a scalar is empty, and entries that are not
/// objects are skipped. Items without an index keep the serial of their original position.
fn lenient_checklist<'de, D>(deserializer: D) -> Result<Vec<ChecklistItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Array(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    let mut items = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            continue;
        }
        let mut item = ChecklistItem::deserialize(entry).map_err(D::Error::custom)?;
        if item.index.is_none() {
            item.index = Some(position as u64 + 1);
        }
        items.push(item);
    }
    Ok(items)
}

/// The recorded result of a checklist activity.
///
/// Upstream distinguishes "never answered" (`null` or missing) from "answered with nothing"
/// (`""`); both render the same way but are kept apart here so the distinction is not lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputValue {
    #[default]
    Missing,
    Empty,
    Value(String),
}

impl InputValue {
    /// Whether this item carries a non-empty answer.
    pub fn is_answered(&self) -> bool {
        matches!(self, InputValue::Value(_))
    }

    /// The answer text, or `""` when there is none.
    pub fn as_str(&self) -> &str {
        match self {
            InputValue::Value(v) => v,
            InputValue::Missing | InputValue::Empty => "",
        }
    }
}

impl From<Option<String>> for InputValue {
    fn from(value: Option<String>) -> Self {
        match value {
            None => InputValue::Missing,
            Some(s) if s.is_empty() => InputValue::Empty,
            Some(s) => InputValue::Value(s),
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::from(Some(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        lenient_string(deserializer).map(InputValue::from)
    }
}

/// One inspection or activity row of the service checklist.
#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[builder(default, setter(strip_option, into), pattern = "owned")]
pub struct ChecklistItem {
    /// 1-based display index. Falls back to the item's position when absent.
    #[serde(default, deserialize_with = "lenient_count")]
    pub index: Option<u64>,
    #[serde(default, alias = "question", deserialize_with = "lenient_string")]
    pub activity: Option<String>,
    #[serde(default)]
    #[builder(setter(into))]
    pub input_value: InputValue,
    #[serde(default, alias = "comment", deserialize_with = "lenient_string")]
    pub comments: Option<String>,
}

/// Where the serviced asset sits. Any level may be absent or carry the `"NA"` sentinel.
#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[builder(default, setter(strip_option, into), pattern = "owned")]
pub struct Location {
    #[serde(default, deserialize_with = "lenient_string")]
    pub site: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub building: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wing: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub floor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub area: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[builder(default, setter(strip_option, into), pattern = "owned")]
pub struct TimeTracking {
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_time: Option<String>,
    #[serde(default, alias = "hours", deserialize_with = "lenient_count")]
    pub duration_hours: Option<u64>,
    #[serde(default, alias = "minutes", deserialize_with = "lenient_count")]
    pub duration_minutes: Option<u64>,
}

#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[builder(default, setter(strip_option, into), pattern = "owned")]
pub struct Personnel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub performed_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub verified_by: Option<String>,
}

/// Job record top level model
#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[builder(default, setter(strip_option, into), pattern = "owned")]
pub struct JobRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(
        default,
        alias = "task_occurrence_id",
        alias = "occurrenceId",
        deserialize_with = "lenient_string"
    )]
    pub occurrence_id: Option<String>,
    #[serde(default, alias = "taskName", deserialize_with = "lenient_string")]
    pub task_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub checklist_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub site_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub asset_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub asset_code: Option<String>,
    #[serde(default, alias = "assetCategory", deserialize_with = "lenient_string")]
    pub asset_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub asset_group: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub scheduled_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub completed_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub supervisor: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: Location,
    #[serde(
        default,
        rename = "checklist_responses",
        alias = "checklist",
        deserialize_with = "lenient_checklist"
    )]
    #[builder(setter(into))]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_tracking: TimeTracking,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personnel: Personnel,
    #[serde(
        default,
        rename = "bef_sub_attachment",
        alias = "before_image",
        deserialize_with = "lenient_string"
    )]
    pub before_image: Option<String>,
    #[serde(
        default,
        rename = "bef_sub_attachment_at",
        alias = "before_image_at",
        deserialize_with = "lenient_string"
    )]
    pub before_image_at: Option<String>,
    #[serde(
        default,
        rename = "aft_sub_attachment",
        alias = "after_image",
        deserialize_with = "lenient_string"
    )]
    pub after_image: Option<String>,
    #[serde(
        default,
        rename = "aft_sub_attachment_at",
        alias = "after_image_at",
        deserialize_with = "lenient_string"
    )]
    pub after_image_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub remarks: Option<String>,
}

impl JobRecordBuilder {
    /// Add a [`ChecklistItem`] to the builder's internal list.
    ///
    /// # Example
    /// ```rust
    /// use jobsheet_pdf::{ChecklistItemBuilder, JobRecordBuilder};
    ///
    /// let record = JobRecordBuilder::default()
    ///     .id("42")
    ///     .add_checklist_item(
    ///         ChecklistItemBuilder::default()
    ///             .activity("Check belt tension")
    ///             .input_value("OK")
    ///             .build()
    ///             .unwrap(),
    ///     )
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(record.checklist.len(), 1);
    /// ```
    pub fn add_checklist_item(self, item: ChecklistItem) -> Self {
        match self.checklist {
            Some(mut l) => {
                l.push(item);
                Self {
                    checklist: Some(l),
                    ..self
                }
            }
            None => Self {
                checklist: Some(vec![item]),
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_and_nulls_are_tolerated() {
        let record: JobRecord = serde_json::from_value(serde_json::json!({
            "id": 42,
            "task_occurrence_id": "occ-7",
            "asset_category": null,
            "checklist_responses": null,
            "bef_sub_attachment": null,
            "location": { "building": "NA", "floor": 3 }
        }))
        .unwrap();
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.occurrence_id.as_deref(), Some("occ-7"));
        assert_eq!(record.asset_category, None);
        assert!(record.checklist.is_empty());
        assert_eq!(record.before_image, None);
        assert_eq!(record.location.building.as_deref(), Some("NA"));
        assert_eq!(record.location.floor.as_deref(), Some("3"));
    }

    #[test]
    fn input_value_keeps_the_three_states_apart() {
        let items: Vec<ChecklistItem> = serde_json::from_value(serde_json::json!([
            { "activity": "a", "input_value": "Yes" },
            { "activity": "b", "input_value": "" },
            { "activity": "c", "input_value": null },
            { "activity": "d" }
        ]))
        .unwrap();
        assert_eq!(items[0].input_value, InputValue::Value("Yes".into()));
        assert_eq!(items[1].input_value, InputValue::Empty);
        assert_eq!(items[2].input_value, InputValue::Missing);
        assert_eq!(items[3].input_value, InputValue::Missing);
        assert!(items[0].input_value.is_answered());
        assert!(!items[1].input_value.is_answered());
    }

    #[test]
    fn nested_objects_sent_as_null_or_sentinel_are_empty() {
        let shapes = [
            serde_json::json!({ "id": 1, "location": null }),
            serde_json::json!({ "id": 1, "personnel": null, "time_tracking": null }),
            serde_json::json!({ "id": 1, "location": "NA", "personnel": 5 }),
            serde_json::json!({ "id": 1, "checklist_responses": "NA" }),
        ];
        for shape in shapes {
            let record: JobRecord = serde_json::from_value(shape.clone())
                .unwrap_or_else(|e| panic!("{shape}: {e}"));
            assert_eq!(record.id.as_deref(), Some("1"));
            assert_eq!(record.location.site, None);
            assert_eq!(record.personnel.performed_by, None);
            assert_eq!(record.time_tracking.duration_hours, None);
            assert!(record.checklist.is_empty());
        }
    }

    #[test]
    fn null_checklist_entries_are_skipped_without_shifting_serials() {
        let record: JobRecord = serde_json::from_value(serde_json::json!({
            "checklist_responses": [
                { "activity": "a" },
                null,
                "NA",
                { "activity": "d", "index": 9 },
                { "activity": "e" }
            ]
        }))
        .unwrap();
        let serials: Vec<_> = record.checklist.iter().map(|i| i.index).collect();
        assert_eq!(serials, [Some(1), Some(9), Some(5)]);
        assert_eq!(record.checklist[2].activity.as_deref(), Some("e"));
    }

    #[test]
    fn counts_accept_numeric_strings() {
        let tracking: TimeTracking = serde_json::from_value(serde_json::json!({
            "duration_hours": "2",
            "duration_minutes": 15
        }))
        .unwrap();
        assert_eq!(tracking.duration_hours, Some(2));
        assert_eq!(tracking.duration_minutes, Some(15));
    }
}
