use crate::model::{Note, Task};
use chrono::{DateTime, NaiveDate, TimeZone};
use std::collections::HashMap;

/// Records that belong to a single calendar day.
pub trait Dated {
    fn day(&self) -> NaiveDate;
}

impl Dated for Task {
    fn day(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for Note {
    fn day(&self) -> NaiveDate {
        self.date
    }
}

impl<Tz: TimeZone> Dated for DateTime<Tz> {
    fn day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Every record on `date`, in the order they appear in `records`.
pub fn records_on_date<T: Dated>(records: &[T], date: NaiveDate) -> Vec<&T> {
    records.iter().filter(|r| r.day() == date).collect()
}

pub fn first_on_date<T: Dated>(records: &[T], date: NaiveDate) -> Option<&T> {
    records.iter().find(|r| r.day() == date)
}

pub fn counts_by_date<T: Dated>(records: &[T]) -> HashMap<NaiveDate, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.day()).or_insert(0) += 1;
    }
    counts
}
