use chrono::{Datelike, NaiveDate};
use chronoutil::delta::shift_months;
use poise::serenity_prelude::UserId;
use thiserror::Error;

/// Leap year every birthday is anchored to, so Feb 29 always has a home.
const ANCHOR_YEAR: i32 = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("month {0} does not exist, use 1 to 12")]
    InvalidMonth(u32),
    #[error("day {day} does not exist in month {month}")]
    InvalidDay { day: u32, month: u32 },
    #[error("February 29 does not exist in {0}, it is not a leap year")]
    NotALeapYear(i32),
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

/// Checks that a day/month (and year, when not 0) form a real calendar date.
///
/// An unknown year accepts February 29.
pub fn validate(day: u32, month: u32, year: i32) -> Result<(), DateError> {
    if !(1..=12).contains(&month) {
        return Err(DateError::InvalidMonth(month));
    }
    if !(0..=9999).contains(&year) {
        return Err(DateError::InvalidYear(year));
    }
    if NaiveDate::from_ymd_opt(ANCHOR_YEAR, month, day).is_none() {
        return Err(DateError::InvalidDay { day, month });
    }
    if year != 0 && NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(DateError::NotALeapYear(year));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayDate {
    day: u32,
    month: u32,
    year: Option<i32>,
}

impl BirthdayDate {
    /// `year` of 0 means the year is unknown.
    pub fn new(day: u32, month: u32, year: i32) -> Result<Self, DateError> {
        validate(day, month, year)?;
        Ok(Self {
            day,
            month,
            year: (year != 0).then_some(year),
        })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    fn anchor(&self) -> NaiveDate {
        // validate() guarantees the date exists in a leap year
        NaiveDate::from_ymd_opt(ANCHOR_YEAR, self.month, self.day).unwrap_or(NaiveDate::MIN)
    }

    /// "February 29" style month and day.
    pub fn label(&self) -> String {
        self.anchor().format("%B %-d").to_string()
    }

    /// The day the birthday is celebrated in `year`. Feb 29 falls back to Feb 28.
    pub fn occurrence_in(&self, year: i32) -> NaiveDate {
        shift_months(self.anchor(), 12 * (year - ANCHOR_YEAR))
    }

    /// Today counts as the next occurrence, only the date part matters.
    pub fn next_occurrence(&self, today: NaiveDate) -> NaiveDate {
        let this_year = self.occurrence_in(today.year());
        if this_year >= today {
            this_year
        } else {
            self.occurrence_in(today.year() + 1)
        }
    }

    /// Monday is 0, Sunday is 6. `reference_year` is used when the year is unknown.
    pub fn day_of_week(&self, reference_year: i32) -> Result<u32, DateError> {
        let year = self.year.unwrap_or(reference_year);
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .map(|date| date.weekday().num_days_from_monday())
            .ok_or(DateError::NotALeapYear(year))
    }

    /// Completed years on `as_of`, `None` when the birth year is unknown.
    pub fn age(&self, as_of: NaiveDate) -> Option<i32> {
        let year = self.year?;
        let mut age = as_of.year() - year;
        if (as_of.month(), as_of.day()) < (self.month, self.day) {
            age -= 1;
        }
        Some(age)
    }

    /// Age reached on the next occurrence, today included.
    pub fn turning(&self, today: NaiveDate) -> Option<i32> {
        Some(self.next_occurrence(today).year() - self.year?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthdayEntry {
    pub user_id: UserId,
    pub date: BirthdayDate,
    /// Whether the birth year (and so the age) may be shown to others.
    pub visible: bool,
}

impl BirthdayEntry {
    pub fn next_occurrence(&self, today: NaiveDate) -> NaiveDate {
        self.date.next_occurrence(today)
    }

    /// The age turned on the next occurrence, if the year is public.
    pub fn upcoming_age(&self, today: NaiveDate) -> Option<i32> {
        if !self.visible {
            return None;
        }
        self.date.turning(today)
    }
}

/// Entries celebrated on `date`, in the order given.
pub fn celebrating_on(entries: &[BirthdayEntry], date: NaiveDate) -> Vec<&BirthdayEntry> {
    entries
        .iter()
        .filter(|entry| entry.date.occurrence_in(date.year()) == date)
        .collect()
}

/// Entries sorted by how soon their next occurrence comes after `today`.
pub fn upcoming(entries: &mut [BirthdayEntry], today: NaiveDate) {
    entries.sort_by_key(|entry| (entry.next_occurrence(today), entry.user_id));
}
