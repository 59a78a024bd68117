use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// One position in the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Blank,
    Day(NaiveDate),
}

impl WeekStart {
    pub fn toggled(self) -> Self {
        match self {
            WeekStart::Sunday => WeekStart::Monday,
            WeekStart::Monday => WeekStart::Sunday,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeekStart::Sunday => "Sunday",
            WeekStart::Monday => "Monday",
        }
    }

    /// Column index of `date` in a week that starts on `self`.
    pub fn column_of(&self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }

    pub fn headings(&self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }
}

impl Cell {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Blank => None,
            Cell::Day(d) => Some(*d),
        }
    }
}

pub fn first_of_month(reference: NaiveDate) -> NaiveDate {
    reference.with_day(1).unwrap_or(reference)
}

pub fn last_of_month(reference: NaiveDate) -> NaiveDate {
    let first = first_of_month(reference);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

pub fn days_in_month(reference: NaiveDate) -> u32 {
    last_of_month(reference).day()
}

/// First day of the month `delta` months away from `reference`'s month.
///
/// Works from the first of the month so day clamping (Jan 31 -> Feb) can
/// never skip a month, and year boundaries roll over in both directions.
pub fn shift_month(reference: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(reference);
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta as u32))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(first)
}

/// Leading blanks for the first weekday offset, then every day of the month
/// in ascending order.
pub fn month_grid(reference: NaiveDate, week_start: WeekStart) -> Vec<Cell> {
    let first = first_of_month(reference);
    let last = last_of_month(reference);
    let padding = week_start.column_of(first) as usize;
    let mut cells = Vec::with_capacity(padding + last.day() as usize);
    cells.extend(std::iter::repeat(Cell::Blank).take(padding));
    cells.extend(first.iter_days().take_while(|d| *d <= last).map(Cell::Day));
    cells
}

/// Splits a grid into display rows of seven, padding the final row.
pub fn weeks(cells: &[Cell]) -> Vec<[Cell; 7]> {
    cells
        .chunks(7)
        .map(|chunk| {
            let mut row = [Cell::Blank; 7];
            row[..chunk.len()].copy_from_slice(chunk);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grid_length_is_padding_plus_month_days() {
        let mut reference = ymd(2023, 1, 17);
        for _ in 0..36 {
            for week_start in [WeekStart::Sunday, WeekStart::Monday] {
                let cells = month_grid(reference, week_start);
                let blanks = cells.iter().take_while(|c| **c == Cell::Blank).count();
                assert_eq!(blanks as u32, week_start.column_of(first_of_month(reference)));
                assert_eq!(cells.len(), blanks + days_in_month(reference) as usize);
                for cell in &cells[blanks..] {
                    let date = cell.date().expect("day cell");
                    assert_eq!(date.month(), reference.month());
                    assert_eq!(date.year(), reference.year());
                }
            }
            reference = shift_month(reference, 1);
        }
    }

    #[test]
    fn month_starting_on_week_start_has_no_padding() {
        // 2023-10-01 is a Sunday, 2024-01-01 a Monday.
        assert_eq!(month_grid(ymd(2023, 10, 20), WeekStart::Sunday)[0], Cell::Day(ymd(2023, 10, 1)));
        assert_eq!(month_grid(ymd(2024, 1, 9), WeekStart::Monday)[0], Cell::Day(ymd(2024, 1, 1)));
    }

    #[test]
    fn leap_february() {
        assert_eq!(days_in_month(ymd(2024, 2, 10)), 29);
        assert_eq!(days_in_month(ymd(2023, 2, 10)), 28);
        assert_eq!(last_of_month(ymd(2024, 12, 3)), ymd(2024, 12, 31));
    }

    #[test]
    fn next_month_from_december_rolls_year() {
        assert_eq!(shift_month(ymd(2024, 12, 31), 1), ymd(2025, 1, 1));
        let grid = month_grid(shift_month(ymd(2024, 12, 15), 1), WeekStart::Sunday);
        let first_day = grid.iter().find_map(Cell::date).unwrap();
        assert_eq!(first_day, ymd(2025, 1, 1));
    }

    #[test]
    fn previous_month_from_january_rolls_back() {
        assert_eq!(shift_month(ymd(2025, 1, 31), -1), ymd(2024, 12, 1));
        assert_eq!(shift_month(ymd(2025, 3, 31), -1), ymd(2025, 2, 1));
    }

    #[test]
    fn stepping_twelve_months_visits_each_once() {
        let mut month = ymd(2024, 6, 30);
        let mut seen = Vec::new();
        for _ in 0..12 {
            month = shift_month(month, 1);
            seen.push(month.month());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=12).collect::<Vec<_>>());
        assert_eq!(month, ymd(2025, 6, 1));
    }

    #[test]
    fn weeks_pad_last_row() {
        let rows = weeks(&month_grid(ymd(2024, 2, 1), WeekStart::Sunday));
        // Feb 2024: starts Thursday, 4 blanks + 29 days = 33 cells -> 5 rows.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4][5], Cell::Blank);
        assert_eq!(rows[4][4], Cell::Day(ymd(2024, 2, 29)));
    }
}
