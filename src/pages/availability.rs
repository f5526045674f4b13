//! Weekly availability: the doctor's slot editor and the flattened
//! `(day, slot)` options patients book against.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{capture, require_confirmation, Confirm, Page};
use crate::api::models::Availability;
use crate::api::ApiClient;
use crate::error::ClientError;

/// Editor order, Monday first
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lowercase weekday name used as the availability key
pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Accepts full names and chrono's short forms, any case
pub fn parse_weekday(input: &str) -> Result<Weekday, ClientError> {
    input
        .trim()
        .parse::<Weekday>()
        .map_err(|_| ClientError::field("day", format!("Unknown weekday '{}'", input.trim())))
}

/// `HH:MM-HH:MM` with the start strictly before the end
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let shape = || format!("'{}' is not a HH:MM-HH:MM slot", s.trim());
        let (start, end) = s.split_once('-').ok_or_else(shape)?;
        let parse = |t: &str| NaiveTime::parse_from_str(t.trim(), "%H:%M").map_err(|_| shape());
        let slot = TimeSlot {
            start: parse(start)?,
            end: parse(end)?,
        };
        if slot.start >= slot.end {
            return Err(format!("Slot {} must start before it ends", slot));
        }
        Ok(slot)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// The next calendar date falling on `day`, strictly after `today`
pub fn next_date_for_day(today: NaiveDate, day: Weekday) -> NaiveDate {
    let ahead = (7 + day.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + Duration::days(ahead)
}

/// One bookable `(day, slot)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOption {
    pub day: Weekday,
    pub slot: TimeSlot,
}

impl SlotOption {
    /// Concrete appointment date and start time relative to `today`
    pub fn schedule(&self, today: NaiveDate) -> (NaiveDate, NaiveTime) {
        (next_date_for_day(today, self.day), self.slot.start)
    }

    pub fn to_json(&self) -> Value {
        json!({ "day": weekday_key(self.day), "slot": self.slot.to_string() })
    }
}

impl fmt::Display for SlotOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", weekday_key(self.day), self.slot)
    }
}

impl FromStr for SlotOption {
    type Err = String;

    /// `monday 09:00-10:00` or `monday/09:00-10:00`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (day, slot) = s
            .split_once(|c: char| c.is_whitespace() || c == '/')
            .ok_or_else(|| format!("'{}' is not '<day> HH:MM-HH:MM'", s))?;
        let day = parse_weekday(day).map_err(|e| e.to_string())?;
        Ok(SlotOption {
            day,
            slot: slot.parse()?,
        })
    }
}

/// Flatten availability into options, Monday first, slots in listed order.
///
/// Unknown day keys and unparsable slots are skipped.
pub fn flatten_slots(availability: &Availability) -> Vec<SlotOption> {
    let mut options = Vec::new();
    for day in WEEKDAYS {
        let Some(slots) = availability.get(weekday_key(day)) else {
            continue;
        };
        for raw in slots {
            match raw.parse::<TimeSlot>() {
                Ok(slot) => options.push(SlotOption { day, slot }),
                Err(e) => warn!(day = weekday_key(day), "Skipping slot: {}", e),
            }
        }
    }
    for key in availability.keys() {
        if parse_weekday(key).is_err() {
            warn!(key = %key, "Skipping unknown availability day");
        }
    }
    options
}

/// Local working copy of a doctor's week; nothing reaches the backend until saved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityEditor {
    days: [Vec<String>; 7],
}

impl AvailabilityEditor {
    pub fn from_availability(availability: &Availability) -> Self {
        let mut editor = Self::default();
        for (key, slots) in availability {
            match parse_weekday(key) {
                Ok(day) => editor.days[Self::index(day)] = slots.clone(),
                Err(_) => warn!(key = %key, "Ignoring unknown availability day"),
            }
        }
        editor
    }

    fn index(day: Weekday) -> usize {
        day.num_days_from_monday() as usize
    }

    fn slot_error(day: Weekday, index: usize, message: impl Into<String>) -> ClientError {
        ClientError::field(format!("{}[{}]", weekday_key(day), index), message)
    }

    pub fn slots(&self, day: Weekday) -> &[String] {
        &self.days[Self::index(day)]
    }

    /// Append an empty slot to be filled in with [`set_slot`](Self::set_slot)
    pub fn add_slot(&mut self, day: Weekday) -> usize {
        let slots = &mut self.days[Self::index(day)];
        slots.push(String::new());
        slots.len() - 1
    }

    pub fn set_slot(&mut self, day: Weekday, index: usize, value: &str) -> Result<(), ClientError> {
        match self.days[Self::index(day)].get_mut(index) {
            Some(slot) => {
                *slot = value.trim().to_string();
                Ok(())
            }
            None => Err(Self::slot_error(day, index, "No such slot")),
        }
    }

    pub fn remove_slot(&mut self, day: Weekday, index: usize) -> Result<String, ClientError> {
        let slots = &mut self.days[Self::index(day)];
        if index >= slots.len() {
            return Err(Self::slot_error(day, index, "No such slot"));
        }
        Ok(slots.remove(index))
    }

    pub fn clear_day(&mut self, day: Weekday) {
        self.days[Self::index(day)].clear();
    }

    /// Validate every slot and build the document to save.
    ///
    /// All seven days are present in the result; slots come out normalized
    /// and sorted by start time. Overlapping slots on one day are rejected.
    pub fn to_availability(&self) -> Result<Availability, ClientError> {
        let mut errors = crate::error::FieldErrors::new();
        let mut availability = Availability::new();

        for day in WEEKDAYS {
            let mut parsed: Vec<(usize, TimeSlot)> = Vec::new();
            for (index, raw) in self.slots(day).iter().enumerate() {
                match raw.parse::<TimeSlot>() {
                    Ok(slot) => parsed.push((index, slot)),
                    Err(message) => {
                        errors.insert(format!("{}[{}]", weekday_key(day), index), message);
                    }
                }
            }
            parsed.sort_by_key(|(_, slot)| *slot);
            // Compare against the latest-ending slot so far, not just the neighbour
            let mut latest: Option<TimeSlot> = None;
            for &(index, slot) in &parsed {
                let previous = latest;
                match previous {
                    Some(earlier) if earlier.overlaps(&slot) => {
                        errors.insert(
                            format!("{}[{}]", weekday_key(day), index),
                            format!("Slot {} overlaps {}", slot, earlier),
                        );
                        if slot.end > earlier.end {
                            latest = Some(slot);
                        }
                    }
                    _ => latest = Some(slot),
                }
            }
            availability.insert(
                weekday_key(day).to_string(),
                parsed.iter().map(|(_, slot)| slot.to_string()).collect(),
            );
        }

        if errors.is_empty() {
            Ok(availability)
        } else {
            Err(ClientError::validation(errors))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorAvailabilityPage {
    editor: AvailabilityEditor,
    error: Option<String>,
    // Saving replaces the whole stored week, so it needs a successful load first
    loaded: bool,
}

impl DoctorAvailabilityPage {
    pub fn editor(&self) -> &AvailabilityEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut AvailabilityEditor {
        &mut self.editor
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn ensure_loaded(&self) -> Result<(), ClientError> {
        if self.loaded {
            return Ok(());
        }
        let reason = self.error.as_deref().unwrap_or("Availability has not been loaded");
        Err(ClientError::field(
            "availability",
            format!("{}; reload before changing availability", reason),
        ))
    }

    /// Validate the working copy, replace the stored week, then reload.
    ///
    /// Refused until the stored week has been loaded.
    pub async fn save(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        self.ensure_loaded()?;
        let availability = self.editor.to_availability()?;
        api.save_my_availability(&availability).await?;
        info!("Saved availability");
        self.mount(api).await;
        Ok(())
    }

    pub async fn delete_day(
        &mut self,
        api: &ApiClient,
        day: Weekday,
        confirm: &dyn Confirm,
    ) -> Result<(), ClientError> {
        self.ensure_loaded()?;
        let prompt = format!("Delete all availability for {}?", weekday_key(day));
        require_confirmation(confirm, &prompt)?;
        api.delete_my_availability_day(weekday_key(day)).await?;
        info!(day = weekday_key(day), "Deleted availability day");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for DoctorAvailabilityPage {
    fn title(&self) -> &str {
        "Availability"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        let availability = capture(api.my_availability().await, &mut self.error, "availability");
        self.loaded = availability.is_some();
        self.editor = AvailabilityEditor::from_availability(&availability.unwrap_or_default());
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        WEEKDAYS
            .iter()
            .map(|&day| {
                let slots = self.editor.slots(day);
                let listed = if slots.is_empty() {
                    "-".to_string()
                } else {
                    slots.join(", ")
                };
                format!("{:<10} {}", weekday_key(day), listed)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> Value {
        let days: Map<String, Value> = WEEKDAYS
            .iter()
            .map(|&day| (weekday_key(day).to_string(), json!(self.editor.slots(day))))
            .collect();
        json!({ "availability": days, "error": self.error })
    }
}
