use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use pagewise::construct::{Attribute, Collection, Record, Schema};
use pagewise::datatype::{RecordId, Value, ValueKind};
use pagewise::persist::{PersistenceMode, Persistor};
use pagewise::source::{Catalog, DataSourceProvider, RecordSource};
use pagewise::{FilterCriteria, PageRequest, PagewiseError, QueryEngine, SortSpec};

fn special_offers() -> Collection {
    let schema = Schema::new(
        "SpecialOffer",
        "SpecialOfferID",
        vec![
            Attribute::new("Description", ValueKind::Text),
            Attribute::new("DiscountPct", ValueKind::Decimal),
            Attribute::new("MinQty", ValueKind::Integer),
            Attribute::new("MaxQty", ValueKind::Integer),
            Attribute::new("StartDate", ValueKind::Date),
        ],
    )
    .unwrap();
    let d = |s: &str| BigDecimal::from_str(s).unwrap();
    let day = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
    Collection::with_records(
        schema,
        vec![
            Record::new(1)
                .with("Description", "No Discount")
                .with("DiscountPct", d("0.00"))
                .with("MinQty", 0)
                .with("StartDate", day(2011, 5, 1)),
            Record::new(2)
                .with("Description", "Volume Discount 11 to 14")
                .with("DiscountPct", d("0.02"))
                .with("MinQty", 11)
                .with("MaxQty", 14)
                .with("StartDate", day(2011, 5, 31)),
            Record::new(3)
                .with("Description", "Volume Discount 15 to 24")
                .with("DiscountPct", d("0.05"))
                .with("MinQty", 15)
                .with("MaxQty", 24)
                .with("StartDate", day(2011, 5, 31)),
            Record::new(7)
                .with("Description", "Mountain-100 Clearance Sale")
                .with("DiscountPct", d("0.35"))
                .with("MinQty", 0)
                .with("MaxQty", Value::Null)
                .with("StartDate", day(2013, 5, 14)),
            Record::new(5)
                .with("Description", "Volume Discount over 60")
                .with("DiscountPct", d("0.20"))
                .with("MinQty", 61)
                .with("StartDate", day(2011, 5, 31)),
        ],
    )
    .unwrap()
}

fn ids(records: &[Record]) -> Vec<RecordId> {
    records.iter().map(|r| r.id().clone()).collect()
}

#[test]
fn sqlite_and_memory_sources_agree() {
    let collection = special_offers();
    let persistor = Persistor::new(PersistenceMode::InMemory).unwrap();
    assert_eq!(persistor.persist_collection(&collection).unwrap(), 5);
    let sqlite = persistor.entity_source("SpecialOffer").unwrap();
    assert_eq!(sqlite.schema(), collection.schema());

    let engine = QueryEngine::new();
    let queries = [
        (FilterCriteria::new(), None),
        (FilterCriteria::new().contains("Description", "volume"), Some(SortSpec::descending("DiscountPct"))),
        (FilterCriteria::new().between("DiscountPct", 0, BigDecimal::from_str("0.05").unwrap()), Some(SortSpec::ascending("MaxQty"))),
        (FilterCriteria::new().exact("MinQty", 0), Some(SortSpec::descending("StartDate"))),
    ];
    for (filter, sort) in &queries {
        for number in 1..=3 {
            let page = PageRequest::new(number, 2).unwrap();
            let memory = engine.query(&collection, Some(filter), sort.as_ref(), page).unwrap();
            let stored = engine.query(&sqlite, Some(filter), sort.as_ref(), page).unwrap();
            assert_eq!(ids(memory.items()), ids(stored.items()));
            assert_eq!(memory.total_records(), stored.total_records());
            assert_eq!(memory.total_pages(), stored.total_pages());
        }
    }
}

#[test]
fn stored_values_keep_their_kinds() {
    let persistor = Persistor::new(PersistenceMode::InMemory).unwrap();
    persistor.persist_collection(&special_offers()).unwrap();
    let records = persistor.entity_source("SpecialOffer").unwrap().scan().unwrap();
    assert_eq!(ids(&records), [1, 2, 3, 7, 5].map(RecordId::from).to_vec());
    let clearance = &records[3];
    assert_eq!(clearance.get("DiscountPct"), Some(&Value::Decimal(BigDecimal::from_str("0.35").unwrap())));
    assert_eq!(clearance.get("MinQty"), Some(&Value::Integer(0)));
    assert_eq!(clearance.get("MaxQty"), None);
    assert_eq!(
        clearance.get("StartDate"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2013, 5, 14).unwrap()))
    );
}

#[test]
fn text_identifiers_survive_storage() {
    let schema = Schema::new("CountryRegion", "CountryRegionCode", vec![Attribute::new("Name", ValueKind::Text)]).unwrap();
    let persistor = Persistor::new(PersistenceMode::InMemory).unwrap();
    persistor.create_entity(&schema).unwrap();
    for (code, name) in [("US", "United States"), ("042", "Numeric Code"), ("DE", "Germany")] {
        persistor
            .persist_record("CountryRegion", &Record::new(code).with("Name", name))
            .unwrap();
    }
    let page = QueryEngine::new()
        .query(
            &persistor.entity_source("CountryRegion").unwrap(),
            None,
            Some(&SortSpec::ascending("CountryRegionCode")),
            PageRequest::new(1, 10).unwrap(),
        )
        .unwrap();
    assert_eq!(ids(page.items()), ["042", "DE", "US"].map(RecordId::from).to_vec());
}

#[test]
fn duplicates_and_undeclared_attributes_are_refused() {
    let persistor = Persistor::new(PersistenceMode::InMemory).unwrap();
    persistor.persist_collection(&special_offers()).unwrap();
    assert!(matches!(
        persistor.persist_record("SpecialOffer", &Record::new(2).with("Description", "again")),
        Err(PagewiseError::DuplicateRecord { .. })
    ));
    assert!(matches!(
        persistor.persist_record("SpecialOffer", &Record::new(99).with("Category", "Reseller")),
        Err(PagewiseError::UnknownAttribute { .. })
    ));
    assert!(matches!(
        persistor.persist_record("SpecialOffer", &Record::new(99).with("MinQty", "many")),
        Err(PagewiseError::KindMismatch { .. })
    ));
    assert!(matches!(
        persistor.persist_record("Vendor", &Record::new(1)),
        Err(PagewiseError::UnknownEntity(_))
    ));
}

#[test]
fn file_databases_survive_reopening() {
    let dir = std::env::temp_dir().join(format!("pagewise-sqlite-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("offers.db");
    let _ = std::fs::remove_file(&path);
    let mode = PersistenceMode::File(path.to_string_lossy().into_owned());
    {
        let persistor = Persistor::new(mode.clone()).unwrap();
        persistor.persist_collection(&special_offers()).unwrap();
    }
    let reopened = Persistor::new(mode).unwrap();
    assert_eq!(reopened.entities().unwrap(), vec!["SpecialOffer".to_string()]);
    let total = QueryEngine::new()
        .count(&reopened.entity_source("SpecialOffer").unwrap(), None)
        .unwrap();
    assert_eq!(total, 5);
    drop(reopened);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn providers_are_interchangeable() {
    let persistor = Persistor::new(PersistenceMode::InMemory).unwrap();
    persistor.persist_collection(&special_offers()).unwrap();
    let catalog = Catalog::new().with(special_offers());
    let providers: [&dyn DataSourceProvider; 2] = [&persistor, &catalog];
    for provider in providers {
        assert_eq!(provider.entities().unwrap(), vec!["SpecialOffer".to_string()]);
        let source = provider.source("SpecialOffer").unwrap();
        let page = QueryEngine::new()
            .query(&source, None, Some(&SortSpec::descending("SpecialOfferID")), PageRequest::new(1, 2).unwrap())
            .unwrap();
        assert_eq!(ids(page.items()), [7, 5].map(RecordId::from).to_vec());
        assert!(matches!(provider.source("Vendor"), Err(PagewiseError::UnknownEntity(_))));
    }
}
