#![no_main]

use chrono::NaiveDate;
use lanes_core::{Comparison, DateContext, parse_date_filter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(expression) = std::str::from_utf8(data) else {
        return;
    };
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
    let Ok(criterion) = parse_date_filter(expression, &DateContext::fixed(today)) else {
        return;
    };

    // Comparisons are inclusive of the reference date.
    let admits_reference = match criterion.comparison {
        Comparison::Between(until) => criterion.reference <= until,
        Comparison::After | Comparison::Before | Comparison::On => true,
    };
    assert_eq!(criterion.matches(criterion.reference), admits_reference);
});
