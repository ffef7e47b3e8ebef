//! 工具函数的组合使用测试

use std::io::Write;
use std::str::FromStr;

use chrono::NaiveDate;
use common::utils::date::{date_range, past_date};
use common::utils::file::merge_files;
use common::utils::{
    chunk, dedupe, dround, flatten, hash_str, parse_decimal, partition, titlecase, HashAlgorithm,
};
use rust_decimal::Decimal;

#[test]
fn test_routines_are_repeatable() {
    let items = vec![3, 1, 3, 2, 1];
    assert_eq!(dedupe(items.clone()), dedupe(items.clone()));
    assert_eq!(partition(items.clone(), 2).unwrap(), partition(items, 2).unwrap());
    assert_eq!(titlecase("hello world"), titlecase("hello world"));
    assert_eq!(
        hash_str("abc", HashAlgorithm::Sha1),
        hash_str("abc", HashAlgorithm::Sha1)
    );
}

#[test]
fn test_chunk_then_flatten_restores_order() {
    let items: Vec<u32> = (1..=10).collect();
    let chunks = chunk(items.clone(), 3).unwrap();
    assert_eq!(chunks.len(), 4);
    assert_eq!(flatten(chunks), items);
}

#[test]
fn test_week_of_dates() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let since = past_date(today, 0, 1).unwrap();
    let days = date_range(since, today);
    assert_eq!(days.len(), 8);
    assert_eq!(days.first(), Some(&today));
    assert_eq!(days.last(), Some(&since));
}

#[test]
fn test_parse_then_round() {
    let value = parse_decimal(" 3.1457 ").unwrap();
    assert_eq!(dround(value, 2).unwrap(), Decimal::from_str("3.15").unwrap());
    assert_eq!(
        HashAlgorithm::from_str("md5").unwrap(),
        HashAlgorithm::Md5
    );
}

#[test]
fn test_merge_daily_exports() {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in [("part_2.csv", "2,b\n"), ("part_1.csv", "1,a\n")] {
        std::fs::File::create(dir.path().join(name))
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }
    let dst = dir.path().join("merged.csv");
    let pattern = dir.path().join("part_*.csv");

    let merged = merge_files(&dst, pattern.to_str().unwrap()).unwrap();

    assert_eq!(merged, 2);
    assert_eq!(std::fs::read_to_string(&dst).unwrap(), "1,a\n2,b\n");
    assert!(!dir.path().join("part_1.csv").exists());
}
