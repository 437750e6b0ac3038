use rowdoc_core::{
    document_path,
    id::{Seeded, Sequence, UuidV4},
    IdGenerator, OutputLayout, PathBuilder, RunConfig, StoreDefaults,
};
use std::{collections::HashSet, sync::Arc, thread};

fn defaults() -> StoreDefaults {
    StoreDefaults::new().project_id("proj")
}

#[test]
fn concatenates_id_after_output() {
    let ids = Sequence::with_prefix("id-");
    let path = document_path(&RunConfig::new("runs", "abc123"), &defaults(), &ids).unwrap();

    assert_eq!(
        path.as_str(),
        "projects/proj/databases/(default)/documents/runs/abc123/outputid-0"
    );
}

#[test]
fn nested_layout_adds_separator() {
    let run = RunConfig::new("runs", "abc123").layout(OutputLayout::Nested);
    let path = document_path(&run, &defaults(), &|| "x".to_string()).unwrap();

    assert_eq!(path.relative_path(), "runs/abc123/output/x");
}

#[test]
fn uuid_suffix() {
    let path = document_path(&RunConfig::new("runs", "abc123"), &defaults(), &UuidV4).unwrap();

    let prefix = "projects/proj/databases/(default)/documents/runs/abc123/output";
    let suffix = path.as_str().strip_prefix(prefix).unwrap();
    assert_eq!(uuid::Uuid::parse_str(suffix).unwrap().get_version_num(), 4);
}

#[test]
fn configured_database_wins() {
    let run = RunConfig::new("runs", "1").database_id("analytics");
    let path = document_path(&run, &defaults(), &|| "x".to_string()).unwrap();

    assert_eq!(
        path.as_str(),
        "projects/proj/databases/analytics/documents/runs/1/outputx"
    );
}

#[test]
fn absent_database_uses_default() {
    let defaults = defaults().database_id("fallback");

    for run in [
        RunConfig::new("runs", "1"),
        RunConfig::new("runs", "1").database_id(""),
    ] {
        let path = document_path(&run, &defaults, &|| "x".to_string()).unwrap();
        assert_eq!(
            path.as_str(),
            "projects/proj/databases/fallback/documents/runs/1/outputx"
        );
    }
}

#[test]
fn missing_project_is_configuration_error() {
    for defaults in [StoreDefaults::new(), StoreDefaults::new().project_id("")] {
        let err = document_path(&RunConfig::new("runs", "1"), &defaults, &UuidV4).unwrap_err();
        assert!(err.is_configuration(), "err={err}");
    }
}

#[test]
fn missing_project_draws_no_id() {
    let ids = Sequence::new();
    let _ = document_path(&RunConfig::new("runs", "1"), &StoreDefaults::new(), &ids);

    assert_eq!(ids.generate(), "0");
}

#[test]
fn random_ids_do_not_collide() {
    let builder = PathBuilder::new(&RunConfig::new("runs", "1"), &defaults()).unwrap();

    let paths = (0..10_000)
        .map(|_| builder.next(&UuidV4))
        .collect::<HashSet<_>>();

    assert_eq!(paths.len(), 10_000);
}

#[test]
fn seeded_ids_do_not_collide() {
    let builder = PathBuilder::new(&RunConfig::new("runs", "1"), &defaults()).unwrap();
    let ids = Seeded::new(42);

    let paths = (0..10_000)
        .map(|_| builder.next(&ids))
        .collect::<HashSet<_>>();

    assert_eq!(paths.len(), 10_000);
}

#[test]
fn builder_is_shareable_across_threads() {
    let builder = Arc::new(PathBuilder::new(&RunConfig::new("runs", "1"), &defaults()).unwrap());
    let ids = Arc::new(Sequence::new());

    let handles = (0..4)
        .map(|_| {
            let builder = builder.clone();
            let ids = ids.clone();
            thread::spawn(move || {
                (0..1_000)
                    .map(|_| builder.next(&*ids))
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();

    let mut all = HashSet::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    assert_eq!(all.len(), 4_000);
}
