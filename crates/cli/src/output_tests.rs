// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    zero         = { 0,       "0s" },
    seconds      = { 59,      "59s" },
    one_minute   = { 60,      "1m" },
    minutes      = { 3599,    "59m" },
    one_hour     = { 3600,    "1h" },
    hour_minutes = { 5400,    "1h30m" },
    almost_day   = { 86399,   "23h59m" },
    days         = { 259200,  "3d" },
)]
fn elapsed(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[test]
fn age_of_unset_timestamp() {
    assert_eq!(format_age_at(0, 10_000), "-");
}

#[test]
fn age_relative_to_now() {
    assert_eq!(format_age_at(1_000, 121_000), "2m");
}

#[test]
fn age_of_future_timestamp_clamps() {
    assert_eq!(format_age_at(5_000, 1_000), "0s");
}
