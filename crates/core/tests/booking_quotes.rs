//! Integration tests for pricing bookings from user-entered date ranges.

use jiff::{ToSpan, civil::date, tz::TimeZone};
use primitive_types::U256;
use testresult::TestResult;

use sciquip::{
    amounts::{format_ether, parse_ether},
    dates::{DateRange, DateRangeError},
    models::{Address, Equipment},
    pricing::Quote,
};

fn equipment(id: &str, price_per_day: U256) -> Equipment {
    Equipment {
        id: id.to_string(),
        name: "Bench equipment".to_string(),
        owner: Address::default(),
        price_per_day,
        exists: true,
    }
}

#[test]
fn microscope_booking_costs_three_ether() -> TestResult {
    let microscope = equipment("MICROSCOPE-1", parse_ether("1")?);
    let range = DateRange::parse_in("2024-01-01", "2024-01-04", &TimeZone::UTC)?;

    let quote = Quote::for_booking(&microscope, &range)?;

    assert_eq!(range.days(), 3);
    assert_eq!(quote.total(), U256::from(3_000_000_000_000_000_000_u64));
    assert_eq!(format_ether(quote.total()), "3.0");

    Ok(())
}

#[test]
fn day_count_matches_calendar_days_for_every_span() -> TestResult {
    let zones = [
        TimeZone::UTC,
        TimeZone::get("America/New_York")?,
        TimeZone::get("Australia/Sydney")?,
    ];
    let start = date(2024, 1, 1);

    for zone in &zones {
        for offset in 1..=400_i32 {
            let end = start.checked_add(offset.days())?;
            let range = DateRange::from_dates(start, end, zone)?;

            assert_eq!(
                range.days(),
                u64::try_from(offset)?,
                "wrong day count for {start}..{end} in {zone:?}"
            );
            assert!(range.days() >= 1, "day count must be positive");
            assert!(
                range.start_timestamp() < range.end_timestamp(),
                "start must precede end"
            );
        }
    }

    Ok(())
}

#[test]
fn non_increasing_ranges_always_fail() -> TestResult {
    let end = date(2024, 6, 15);

    for offset in 0..=60_i32 {
        let start = end.checked_add(offset.days())?;
        let result = DateRange::from_dates(start, end, &TimeZone::UTC);

        assert_eq!(
            result,
            Err(DateRangeError::InvalidDateRange { start, end }),
            "expected InvalidDateRange for {start}..{end}"
        );
    }

    Ok(())
}

#[test]
fn totals_are_exact_beyond_float_precision() -> TestResult {
    // 2^53 + 1 is the first integer an f64 cannot represent.
    let price = U256::from((1_u64 << 53) + 1);

    for days in [1_u64, 2, 3, 365, 10_000] {
        let quote = Quote::new(price, days)?;
        let expected = u128::from((1_u64 << 53) + 1) * u128::from(days);

        assert_eq!(quote.total(), U256::from(expected), "wrong total for {days} days");
    }

    Ok(())
}
