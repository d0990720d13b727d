//! Conversion of weekly availability windows into concrete slots.

use chrono::NaiveDate;
use tutorhub_core::models::availability::{Availability, day_of_week};
use tutorhub_core::models::booking::BookingSlot;
use uuid::Uuid;

use crate::error::BookingError;

/// What a client selected in the booking form.
#[derive(Debug, Clone)]
pub struct SlotSelection<'a> {
    pub teacher_id: Uuid,
    pub holiday_mode: bool,
    pub dates: &'a [NaiveDate],
    pub availability_ids: &'a [Uuid],
}

/// Pair every selected date with every selected window on the same
/// weekday.
///
/// `windows` are the stored rows for `availability_ids`; ids missing
/// from it are unknown. Repeated dates or ids are counted once.
/// Overlapping windows are not merged: each matching window yields its
/// own slot.
pub fn resolve_slots(
    selection: &SlotSelection<'_>,
    windows: &[Availability],
    today: NaiveDate,
) -> Result<Vec<BookingSlot>, BookingError> {
    if selection.dates.is_empty() || selection.availability_ids.is_empty() {
        return Err(BookingError::EmptySelection);
    }
    if selection.holiday_mode {
        return Err(BookingError::TeacherUnavailable);
    }

    let mut selected: Vec<&Availability> = Vec::with_capacity(selection.availability_ids.len());
    for id in dedup(selection.availability_ids) {
        let window = windows
            .iter()
            .find(|w| w.id == id && w.teacher_id == selection.teacher_id && w.is_active)
            .ok_or(BookingError::UnknownAvailability(id))?;
        selected.push(window);
    }

    let mut slots = Vec::new();
    for date in dedup(selection.dates) {
        if date < today {
            return Err(BookingError::DateInPast(date));
        }
        let weekday = day_of_week(date);
        let before = slots.len();
        slots.extend(
            selected
                .iter()
                .filter(|w| w.day_of_week == weekday)
                .map(|w| BookingSlot {
                    availability_id: w.id,
                    date,
                    start_time: w.start_time,
                    end_time: w.end_time,
                    duration_minutes: w.duration_minutes(),
                }),
        );
        if slots.len() == before {
            return Err(BookingError::NoMatchingWindow(date));
        }
    }

    Ok(slots)
}

fn dedup<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(item) {
            seen.push(*item);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn window(teacher_id: Uuid, day: u8, from: (u32, u32), to: (u32, u32)) -> Availability {
        Availability {
            id: Uuid::new_v4(),
            teacher_id,
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(from.0, from.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(to.0, to.1, 0).unwrap(),
            is_active: true,
            time_zone: "Africa/Lagos".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2030-03-11 is a Monday.
    fn today() -> NaiveDate {
        date(2030, 3, 1)
    }

    #[test]
    fn monday_window_yields_one_hour_slot() {
        let teacher = Uuid::new_v4();
        let monday = window(teacher, 1, (18, 0), (19, 0));
        let dates = [date(2030, 3, 11)];
        let ids = [monday.id];
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: false,
            dates: &dates,
            availability_ids: &ids,
        };

        let slots = resolve_slots(&selection, std::slice::from_ref(&monday), today()).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].availability_id, monday.id);
        assert_eq!(slots[0].duration_minutes, 60);
        assert_eq!(slots[0].start_time, monday.start_time);
    }

    #[test]
    fn dates_pair_only_with_their_weekday() {
        let teacher = Uuid::new_v4();
        let monday = window(teacher, 1, (9, 0), (10, 30));
        let wednesday = window(teacher, 3, (14, 0), (15, 0));
        let dates = [date(2030, 3, 11), date(2030, 3, 13)];
        let ids = [monday.id, wednesday.id];
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: false,
            dates: &dates,
            availability_ids: &ids,
        };

        let slots = resolve_slots(&selection, &[monday.clone(), wednesday.clone()], today())
            .unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].availability_id, monday.id);
        assert_eq!(slots[0].duration_minutes, 90);
        assert_eq!(slots[1].availability_id, wednesday.id);
        assert_eq!(slots[1].date, date(2030, 3, 13));
    }

    #[test]
    fn overlapping_windows_are_not_merged() {
        let teacher = Uuid::new_v4();
        let a = window(teacher, 1, (9, 0), (10, 0));
        let b = window(teacher, 1, (9, 30), (11, 0));
        let dates = [date(2030, 3, 11)];
        let ids = [a.id, b.id, a.id];
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: false,
            dates: &dates,
            availability_ids: &ids,
        };

        let slots = resolve_slots(&selection, &[a, b], today()).unwrap();
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn empty_selection_fails_first() {
        let teacher = Uuid::new_v4();
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: true,
            dates: &[],
            availability_ids: &[Uuid::new_v4()],
        };
        assert!(matches!(
            resolve_slots(&selection, &[], today()),
            Err(BookingError::EmptySelection)
        ));
    }

    #[test]
    fn holiday_mode_rejects_whole_request() {
        let teacher = Uuid::new_v4();
        let monday = window(teacher, 1, (18, 0), (19, 0));
        let dates = [date(2030, 3, 11)];
        let ids = [monday.id];
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: true,
            dates: &dates,
            availability_ids: &ids,
        };
        assert!(matches!(
            resolve_slots(&selection, &[monday], today()),
            Err(BookingError::TeacherUnavailable)
        ));
    }

    #[test]
    fn foreign_or_inactive_windows_are_unknown() {
        let teacher = Uuid::new_v4();
        let foreign = window(Uuid::new_v4(), 1, (18, 0), (19, 0));
        let mut inactive = window(teacher, 1, (8, 0), (9, 0));
        inactive.is_active = false;
        let dates = [date(2030, 3, 11)];

        for w in [foreign, inactive] {
            let ids = [w.id];
            let selection = SlotSelection {
                teacher_id: teacher,
                holiday_mode: false,
                dates: &dates,
                availability_ids: &ids,
            };
            let err = resolve_slots(&selection, std::slice::from_ref(&w), today()).unwrap_err();
            assert!(matches!(err, BookingError::UnknownAvailability(id) if id == w.id));
        }
    }

    #[test]
    fn date_without_matching_window_is_rejected() {
        let teacher = Uuid::new_v4();
        let monday = window(teacher, 1, (18, 0), (19, 0));
        // Tuesday.
        let dates = [date(2030, 3, 11), date(2030, 3, 12)];
        let ids = [monday.id];
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: false,
            dates: &dates,
            availability_ids: &ids,
        };
        let err = resolve_slots(&selection, &[monday], today()).unwrap_err();
        assert!(matches!(err, BookingError::NoMatchingWindow(d) if d == date(2030, 3, 12)));
    }

    #[test]
    fn past_dates_are_rejected() {
        let teacher = Uuid::new_v4();
        let monday = window(teacher, 1, (18, 0), (19, 0));
        let dates = [date(2030, 2, 25)];
        let ids = [monday.id];
        let selection = SlotSelection {
            teacher_id: teacher,
            holiday_mode: false,
            dates: &dates,
            availability_ids: &ids,
        };
        assert!(matches!(
            resolve_slots(&selection, &[monday], today()),
            Err(BookingError::DateInPast(_))
        ));
    }
}
