//! Property-based tests for funding proration and aggregation.

mod common;

use chrono::{Duration, NaiveDate};
use common::date;
use gradfund::domain::aggregate::FundingTable;
use gradfund::domain::date_range::DateRange;
use gradfund::domain::funding::{FundingRecord, FundingSource};
use gradfund::domain::student::{GraduateStudent, Program};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn epoch() -> NaiveDate {
    date(2015, 1, 1)
}

fn day(offset: i64) -> NaiveDate {
    epoch() + Duration::days(offset)
}

/// Amounts between 0.01 and the 999999.99 cap.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=99_999_999).prop_map(|cents| Decimal::new(cents, 2))
}

/// Ongoing record: start offset, extra days after start, amount.
fn arb_ongoing() -> impl Strategy<Value = FundingRecord> {
    (0i64..3000, 1i64..730, arb_amount()).prop_map(|(start, extra, amount)| {
        FundingRecord::ongoing(1, 1, 1, amount, day(start), day(start + extra))
    })
}

fn arb_range() -> impl Strategy<Value = DateRange> {
    (-100i64..3900, 0i64..800).prop_map(|(start, len)| {
        DateRange::new(day(start), day(start + len)).unwrap()
    })
}

proptest! {
    #[test]
    fn full_span_prorates_to_amount(record in arb_ongoing()) {
        let span = DateRange::new(record.start_date, record.end_date.unwrap()).unwrap();
        prop_assert_eq!(record.for_range(&span).unwrap(), record.amount);
    }

    #[test]
    fn adjacent_ranges_add_up_within_a_cent(record in arb_ongoing(), cut in 0.0f64..1.0) {
        let end = record.end_date.unwrap();
        let days = (end - record.start_date).num_days();
        let split = record.start_date + Duration::days(((days as f64) * cut) as i64).min(Duration::days(days - 1));

        let left = DateRange::new(record.start_date, split).unwrap();
        let right = DateRange::new(split + Duration::days(1), end).unwrap();
        let total = record.for_range(&left).unwrap() + record.for_range(&right).unwrap();

        prop_assert!((total - record.amount).abs() <= Decimal::new(1, 2));
    }

    #[test]
    fn share_is_between_zero_and_amount(record in arb_ongoing(), range in arb_range()) {
        let share = record.for_range(&range).unwrap();
        prop_assert!(share >= Decimal::ZERO);
        prop_assert!(share <= record.amount);
        prop_assert!(share.scale() <= 2);
    }

    #[test]
    fn one_time_is_all_or_nothing(on in 0i64..3000, amount in arb_amount(), range in arb_range()) {
        let record = FundingRecord::one_time(1, 1, 1, amount, day(on));
        let share = record.for_range(&range).unwrap();
        if range.contains(record.start_date) {
            prop_assert_eq!(share, amount);
        } else {
            prop_assert_eq!(share, Decimal::ZERO);
        }
    }

    #[test]
    fn grand_total_is_sum_of_cells(
        records in prop::collection::vec(
            (1i64..=3, 1i64..=2, arb_ongoing()),
            0..12,
        ),
        range in arb_range(),
    ) {
        let students: Vec<GraduateStudent> = (1..=3)
            .map(|id| GraduateStudent::new(id, format!("S{id}"), Program::PhD, epoch()))
            .collect();
        let sources = vec![FundingSource::new(1, "TA"), FundingSource::new(2, "RA")];
        let funding: Vec<FundingRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, (student_id, source_id, mut f))| {
                f.id = i as i64;
                f.student_id = student_id;
                f.source_id = source_id;
                f
            })
            .collect();

        let table = FundingTable::build(range, students.iter().collect(), sources.iter().collect(), &funding);

        let cells: Decimal = table.cells.iter().flatten().copied().sum();
        let rows: Decimal = table.row_totals().into_iter().sum();
        let columns: Decimal = table.column_totals().into_iter().sum();
        prop_assert_eq!(table.grand_total(), cells);
        prop_assert_eq!(rows, cells);
        prop_assert_eq!(columns, cells);

        let direct: Decimal = funding
            .iter()
            .filter(|f| f.overlaps(&range))
            .map(|f| f.for_range(&range).unwrap())
            .sum();
        prop_assert_eq!(table.grand_total(), direct);
    }
}
