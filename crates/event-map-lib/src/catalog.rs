//! EventCatalog - the loaded event collection, sorted by date
//!
//! The catalog is built once from the data source and never mutated. Because
//! ISO dates sort chronologically as plain strings, every date query is a
//! binary search over the sorted vector.

use crate::{EventId, EventRecord};

/// Immutable, date-sorted event collection
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: Vec<EventRecord>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl EventCatalog {
    /// Build a catalog, sorting by date.
    ///
    /// The sort is stable: events sharing a date keep their source order.
    pub fn new(mut events: Vec<EventRecord>) -> Self {
        events.sort_by(|a, b| a.date.cmp(&b.date));
        Self { events }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in chronological order
    #[inline]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    #[inline]
    pub fn get(&self, id: EventId) -> Option<&EventRecord> {
        self.events.get(id.0)
    }

    /// Iterate over `(id, event)` pairs in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &EventRecord)> {
        self.events
            .iter()
            .enumerate()
            .map(|(idx, event)| (EventId(idx), event))
    }

    /// Earliest and latest dates, used as the date picker's min/max
    pub fn date_bounds(&self) -> Option<(&str, &str)> {
        let first = self.events.first()?;
        let last = self.events.last()?;
        Some((first.date.as_str(), last.date.as_str()))
    }

    /// Date selected on startup: the earliest date on or after `today`,
    /// or the earliest date overall when everything is in the past.
    pub fn default_date(&self, today: &str) -> Option<&str> {
        let start = self.first_index_on_or_after(today);
        self.events
            .get(start)
            .or_else(|| self.events.first())
            .map(|event| event.date.as_str())
    }

    /// Events whose date equals `date` exactly, in collection order
    pub fn on_date<'a>(
        &'a self,
        date: &'a str,
    ) -> impl Iterator<Item = (EventId, &'a EventRecord)> + 'a {
        let start = self.first_index_on_or_after(date);
        self.events[start..]
            .iter()
            .take_while(move |event| event.date == date)
            .enumerate()
            .map(move |(offset, event)| (EventId(start + offset), event))
    }

    /// Ids of events dated on or after `today`, earliest first, at most `limit`
    pub fn upcoming(&self, today: &str, limit: usize) -> Vec<EventId> {
        let start = self.first_index_on_or_after(today);
        (start..self.events.len())
            .take(limit)
            .map(EventId)
            .collect()
    }

    #[inline]
    fn first_index_on_or_after(&self, date: &str) -> usize {
        self.events.partition_point(|event| event.date.as_str() < date)
    }
}
