use std::collections::HashSet;

use pagewise::construct::{Attribute, Collection, Record, Schema};
use pagewise::datatype::{RecordId, ValueKind};
use pagewise::{FilterCriteria, PageRequest, PagewiseError, QueryEngine, SortSpec};

fn departments(records: Vec<Record>) -> Collection {
    let schema = Schema::new(
        "Department",
        "DepartmentID",
        vec![
            Attribute::new("Name", ValueKind::Text),
            Attribute::new("GroupName", ValueKind::Text),
        ],
    )
    .unwrap();
    Collection::with_records(schema, records).unwrap()
}

fn ids(records: &[Record]) -> Vec<RecordId> {
    records.iter().map(|r| r.id().clone()).collect()
}

/// Records whose names repeat every three rows, so sorting by name has ties.
fn repeating(n: i64) -> Collection {
    departments(
        (1..=n)
            .rev()
            .map(|i| Record::new(i).with("Name", ["Sales", "Marketing", "Tool Design"][(i % 3) as usize]))
            .collect(),
    )
}

#[test]
fn pages_partition_the_filtered_set() {
    let engine = QueryEngine::new();
    for n in 0..=23 {
        let collection = repeating(n);
        for size in 1..=7u32 {
            for sort in [SortSpec::ascending("Name"), SortSpec::descending("Name")] {
                let first = engine
                    .query(&collection, None, Some(&sort), PageRequest::new(1, size).unwrap())
                    .unwrap();
                let total_pages = first.total_pages();
                assert_eq!(first.total_records(), n as u64);
                assert_eq!(total_pages, (n as u64).div_ceil(u64::from(size)));

                let mut seen = Vec::new();
                for number in 1..=(total_pages as u32 + 1) {
                    let page = engine
                        .query(&collection, None, Some(&sort), PageRequest::new(number, size).unwrap())
                        .unwrap();
                    assert_eq!(page.total_records(), n as u64);
                    if u64::from(number) > total_pages {
                        assert!(page.items().is_empty());
                    } else {
                        assert!(!page.items().is_empty());
                    }
                    seen.extend(ids(page.items()));
                }
                assert_eq!(seen.len() as i64, n);
                let unique: HashSet<_> = seen.iter().cloned().collect();
                assert_eq!(unique.len(), seen.len(), "no record may appear on two pages");

                let everything = engine
                    .query(&collection, None, Some(&sort), PageRequest::new(1, u32::MAX).unwrap())
                    .unwrap();
                assert_eq!(seen, ids(everything.items()));
            }
        }
    }
}

#[test]
fn repeated_queries_return_the_same_page() {
    let engine = QueryEngine::new();
    let collection = repeating(17);
    let filter = FilterCriteria::new().contains("Name", "s");
    let sort = SortSpec::descending("Name");
    let page = PageRequest::new(2, 4).unwrap();
    let first = engine.query(&collection, Some(&filter), Some(&sort), page).unwrap();
    let second = engine.query(&collection, Some(&filter), Some(&sort), page).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_result_has_no_pages() {
    let collection = departments(vec![Record::new(1).with("Name", "Engineering")]);
    let filter = FilterCriteria::new().exact("Name", "Purchasing");
    let page = QueryEngine::new()
        .query(&collection, Some(&filter), None, PageRequest::new(1, 1).unwrap())
        .unwrap();
    assert!(page.items().is_empty());
    assert_eq!(page.total_records(), 0);
    assert_eq!(page.total_pages(), 0);
    assert!(!page.has_next_page());
    assert!(!page.has_previous_page());
}

#[test]
fn ties_on_the_first_page_go_to_the_lowest_identifier() {
    let collection = departments(vec![
        Record::new(1).with("Name", "A"),
        Record::new(3).with("Name", "B"),
        Record::new(2).with("Name", "B"),
    ]);
    let filter = FilterCriteria::new().exact("Name", "B");
    let page = QueryEngine::new()
        .query(&collection, Some(&filter), Some(&SortSpec::ascending("Name")), PageRequest::new(1, 1).unwrap())
        .unwrap();
    assert_eq!(ids(page.items()), vec![RecordId::from(2)]);
    assert_eq!(page.total_records(), 2);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_next_page());
}

#[test]
fn page_past_the_end_is_empty_with_true_totals() {
    let collection = departments(vec![
        Record::new(1).with("Name", "Production"),
        Record::new(2).with("Name", "Production Control"),
        Record::new(3).with("Name", "Quality Assurance"),
    ]);
    let filter = FilterCriteria::new().contains("Name", "production");
    let page = QueryEngine::new()
        .query(&collection, Some(&filter), None, PageRequest::new(5, 10).unwrap())
        .unwrap();
    assert!(page.items().is_empty());
    assert_eq!(page.total_records(), 2);
    assert_eq!(page.total_pages(), 1);
    assert!(page.has_previous_page());
    assert!(!page.has_next_page());
}

#[test]
fn huge_page_numbers_do_not_overflow() {
    let page = QueryEngine::new()
        .query(&repeating(5), None, None, PageRequest::new(u32::MAX, u32::MAX).unwrap())
        .unwrap();
    assert!(page.items().is_empty());
    assert_eq!(page.total_records(), 5);
    assert_eq!(page.total_pages(), 1);
}

#[test]
fn non_positive_paging_is_rejected() {
    let engine = QueryEngine::new();
    let collection = repeating(3);
    for page in [
        PageRequest { page_number: 1, page_size: 0 },
        PageRequest { page_number: 0, page_size: 10 },
    ] {
        assert!(matches!(
            engine.query(&collection, None, None, page),
            Err(PagewiseError::InvalidArgument(_))
        ));
    }
    assert!(matches!(
        PageRequest::from_signed(1, i64::from(i32::MIN)),
        Err(PagewiseError::InvalidArgument(_))
    ));
}

#[test]
fn unsorted_queries_keep_source_order() {
    let collection = departments(vec![
        Record::new(7).with("Name", "Executive"),
        Record::new(2).with("Name", "Tool Design"),
        Record::new(5).with("Name", "Purchasing"),
    ]);
    let page = QueryEngine::new()
        .query(&collection, None, None, PageRequest::new(1, 10).unwrap())
        .unwrap();
    assert_eq!(ids(page.items()), [7, 2, 5].map(RecordId::from).to_vec());
}

#[test]
fn unknown_sort_attribute_is_reported() {
    let err = QueryEngine::new()
        .query(&repeating(3), None, Some(&SortSpec::ascending("Budget")), PageRequest::new(1, 10).unwrap())
        .unwrap_err();
    match err {
        PagewiseError::UnknownAttribute { entity, attribute } => {
            assert_eq!(entity, "Department");
            assert_eq!(attribute, "Budget");
        }
        other => panic!("unexpected error {other}"),
    }
}
