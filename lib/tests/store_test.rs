use anyhow::Result;
use graphstore::{
    AccessMode, GraphStore, GraphStoreError, GraphStoreOptions, IndexOrder, Iri, Literal, Term,
    Triplet,
};
use tempfile::tempdir;

fn iri(local: &str) -> Iri {
    Iri::new(format!("http://ex.org/{}", local)).unwrap()
}

fn res(local: &str) -> Term {
    Term::Resource(iri(local))
}

fn t(s: &str, p: &str, o: Term) -> Triplet {
    Triplet::new(res(s), iri(p), o)
}

fn no_pos() -> GraphStoreOptions {
    GraphStoreOptions::builder()
        .disable_pos_index(true)
        .build()
        .unwrap()
}

#[test]
fn add_then_query_round_trips() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let triplet = t("s", "p", Literal::new_language_tagged("hello", "en")?.into());
    store.add(&triplet)?;

    let found = store.query_spo(None, None, None)?.collect_triplets()?;
    assert_eq!(found, vec![triplet.clone()]);
    assert!(store.contains(&triplet)?);
    assert!(!store.contains(&t("s", "p", Term::literal("hello")))?);
    store.close();
    Ok(())
}

#[test]
fn adding_twice_keeps_one_record_per_index() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let triplet = t("s", "p", res("o"));
    store.add(&triplet)?;
    store.add(&triplet)?;
    let stats = store.stats()?;
    assert_eq!(stats.spo_records, 1);
    assert_eq!(stats.pos_records, 1);
    Ok(())
}

#[test]
fn longer_prefixes_narrow_results() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let triplets = vec![
        t("a", "p", res("x")),
        t("a", "p", res("y")),
        t("a", "q", res("x")),
        t("b", "p", res("x")),
    ];
    assert_eq!(store.add_all(&triplets)?, 4);

    let a = res("a");
    let p = iri("p");
    let by_subject = store.query_spo(Some(&a), None, None)?.collect_triplets()?;
    let by_subject_predicate = store.query_spo(Some(&a), Some(&p), None)?.collect_triplets()?;
    assert_eq!(by_subject.len(), 3);
    assert_eq!(by_subject_predicate.len(), 2);
    assert!(by_subject_predicate.iter().all(|x| by_subject.contains(x)));

    let exact = store
        .query_spo(Some(&a), Some(&p), Some(&res("y")))?
        .collect_triplets()?;
    assert_eq!(exact, vec![t("a", "p", res("y"))]);
    Ok(())
}

#[test]
fn spo_scan_is_ordered_by_canonical_key() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    store.add(&t("b", "p", res("x")))?;
    store.add(&t("a", "q", res("x")))?;
    store.add(&t("a", "p", res("z")))?;
    store.add(&t("a", "p", res("y")))?;
    let found = store.query_spo(None, None, None)?.collect_triplets()?;
    assert_eq!(
        found,
        vec![
            t("a", "p", res("y")),
            t("a", "p", res("z")),
            t("a", "q", res("x")),
            t("b", "p", res("x")),
        ]
    );
    Ok(())
}

#[test]
fn pos_queries_by_predicate_and_object() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    store.add_all(&[
        t("a", "type", res("Person")),
        t("b", "type", res("Person")),
        t("c", "type", res("Place")),
        t("a", "name", Term::literal("Alice")),
    ])?;

    let person = res("Person");
    let people = store
        .query_pos(Some(&iri("type")), Some(&person), None)?
        .collect_triplets()?;
    let subjects: Vec<_> = people.iter().map(|x| x.subject.clone()).collect();
    assert_eq!(subjects, vec![res("a"), res("b")]);

    let typed = store.query_pos(Some(&iri("type")), None, None)?.count();
    assert_eq!(typed, 3);

    let raw = store
        .query(IndexOrder::Pos, &["<http://ex.org/name>", "\"Alice\""])?
        .collect_triplets()?;
    assert_eq!(raw, vec![t("a", "name", Term::literal("Alice"))]);
    Ok(())
}

#[test]
fn disabled_pos_index_rejects_queries_and_skips_writes() -> Result<()> {
    let dir = tempdir()?;
    {
        let store = GraphStore::open(dir.path(), no_pos(), AccessMode::ReadWrite)?;
        store.add(&t("s", "p", res("o")))?;
        store.add_all(&[t("s", "q", res("o"))])?;
        assert!(matches!(
            store.query_pos(Some(&iri("p")), None, None),
            Err(GraphStoreError::IndexDisabled)
        ));
        assert!(matches!(
            store.query(IndexOrder::Pos, &["<http://ex.org/p>"]),
            Err(GraphStoreError::IndexDisabled)
        ));
        assert!(matches!(
            store.query_prefix(IndexOrder::Pos, "<http://ex.org/"),
            Err(GraphStoreError::IndexDisabled)
        ));
        assert_eq!(store.stats()?.pos_records, 0);
        store.close();
    }

    // reopened with the index enabled, the POS column family is still empty
    let store = GraphStore::open_default(dir.path())?;
    let stats = store.stats()?;
    assert_eq!(stats.spo_records, 2);
    assert_eq!(stats.pos_records, 0);
    assert_eq!(store.query_pos(None, None, None)?.count(), 0);
    Ok(())
}

#[test]
fn second_writer_is_locked_out() -> Result<()> {
    let dir = tempdir()?;
    let first = GraphStore::open_default(dir.path())?;
    let second = GraphStore::open_default(dir.path());
    assert!(matches!(second, Err(GraphStoreError::Lock { .. })));

    first.close();
    let third = GraphStore::open_default(dir.path())?;
    third.close();
    Ok(())
}

#[test]
fn missing_store_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("absent");
    assert!(matches!(
        GraphStore::open_read_only(&path, GraphStoreOptions::default()),
        Err(GraphStoreError::NotExist { .. })
    ));
    let no_create = GraphStoreOptions::builder()
        .create_if_missing(false)
        .build()
        .unwrap();
    assert!(matches!(
        GraphStore::open(&path, no_create, AccessMode::ReadWrite),
        Err(GraphStoreError::NotExist { .. })
    ));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn read_only_handle_reads_but_cannot_write() -> Result<()> {
    let dir = tempdir()?;
    let triplet = t("s", "p", res("o"));
    {
        let store = GraphStore::open_default(dir.path())?;
        store.add(&triplet)?;
        store.close();
    }
    let store = GraphStore::open_read_only(dir.path(), GraphStoreOptions::default())?;
    assert_eq!(store.mode(), AccessMode::ReadOnly);
    assert_eq!(store.query_spo(None, None, None)?.collect_triplets()?, vec![triplet.clone()]);
    assert_eq!(store.query_pos(None, None, None)?.count(), 1);
    assert!(store.add(&t("s", "p", res("other"))).is_err());
    Ok(())
}

#[test]
fn compacting_an_empty_store_succeeds() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    store.compact()?;
    assert_eq!(store.query_spo(None, None, None)?.count(), 0);

    store.add(&t("s", "p", res("o")))?;
    store.compact()?;
    assert_eq!(store.stats()?.spo_records, 1);
    Ok(())
}

#[test]
fn literals_with_pipes_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let triplets = vec![
        t("s", "p", Term::literal("a|b")),
        t("s", "p", Term::literal("|leading")),
        t("s", "p", Term::literal("trailing|")),
        t("s", "p", Term::literal("quote \" and \\ and\nnewline")),
    ];
    store.add_all(&triplets)?;
    let mut found = store.query_spo(Some(&res("s")), None, None)?.collect_triplets()?;
    let mut expected = triplets.clone();
    found.sort_by_key(|x| x.object.clone());
    expected.sort_by_key(|x| x.object.clone());
    assert_eq!(found, expected);
    Ok(())
}

#[test]
fn trailing_keys_do_not_match_longer_terms() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let b1 = Term::blank("b1")?;
    let b10 = Term::blank("b10")?;
    store.add_all(&[
        Triplet::new(b1.clone(), iri("p"), Term::literal("x")),
        Triplet::new(b10.clone(), iri("p"), Term::literal("x")),
        t("s", "p", Term::literal("x")),
        t("s", "p", Literal::new_language_tagged("x", "en")?.into()),
    ])?;

    assert_eq!(store.query_spo(Some(&b1), None, None)?.count(), 1);
    assert_eq!(store.query_spo(Some(&b10), None, None)?.count(), 1);

    let plain = store
        .query_pos(Some(&iri("p")), Some(&Term::literal("x")), None)?
        .collect_triplets()?;
    assert_eq!(plain.len(), 3);
    assert!(plain.iter().all(|x| x.object == Term::literal("x")));

    // a raw prefix scan has no term boundary
    assert_eq!(
        store
            .query_prefix(IndexOrder::Spo, "_:b1")?
            .count(),
        2
    );
    Ok(())
}

#[test]
fn gaps_and_extra_keys_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    assert!(matches!(
        store.query_spo(None, Some(&iri("p")), None),
        Err(GraphStoreError::InvalidQuery(_))
    ));
    assert!(matches!(
        store.query(IndexOrder::Spo, &["<a>", "<b>", "<c>", "<d>"]),
        Err(GraphStoreError::InvalidQuery(_))
    ));
    Ok(())
}

#[test]
fn abandoned_iterators_release_their_cursor() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let triplets: Vec<_> = (0..50)
        .map(|i| t(&format!("s{:02}", i), "p", res("o")))
        .collect();
    store.add_all(&triplets)?;

    let mut iter = store.query_spo(None, None, None)?;
    assert!(iter.has_next());
    let first = iter.next().unwrap()?;
    assert_eq!(first, triplets[0]);
    iter.close();

    let mut partial = store.query_spo(None, None, None)?.take(3);
    assert!(partial.next().is_some());
    drop(partial);

    let mut drained = store.query_spo(Some(&res("s49")), None, None)?;
    assert!(drained.next().is_some());
    assert!(!drained.has_next());
    assert!(drained.next().is_none());
    assert!(drained.next().is_none());

    store.close();
    Ok(())
}

#[test]
fn add_all_with_nothing_is_a_no_op() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let none: Vec<Triplet> = Vec::new();
    assert_eq!(store.add_all(&none)?, 0);
    assert_eq!(store.stats()?.spo_records, 0);
    Ok(())
}

#[test]
fn corrupt_value_aborts_the_scan() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    store.add_all(&[
        t("a", "p", Term::literal("x")),
        t("b", "p", Term::literal("y")),
        t("d", "p", Term::literal("z")),
    ])?;
    store.close();

    {
        let db = rocksdb::DB::open_cf(&rocksdb::Options::default(), dir.path(), ["POS"])?;
        db.put(
            "<http://ex.org/c><http://ex.org/p>\"w\"",
            "<http://ex.org/c>|not a term|\"w\"",
        )?;
    }

    let store = GraphStore::open_default(dir.path())?;
    let mut scan = store.query_spo(None, None, None)?;
    assert_eq!(scan.next().transpose()?, Some(t("a", "p", Term::literal("x"))));
    assert_eq!(scan.next().transpose()?, Some(t("b", "p", Term::literal("y"))));
    assert!(matches!(scan.next(), Some(Err(GraphStoreError::Parse(_)))));
    assert!(scan.next().is_none());
    assert!(scan.next().is_none());
    drop(scan);

    let mut groups = store.subject_groups()?;
    assert_eq!(groups.next().transpose()?.map(|g| g.key), Some(res("a")));
    assert!(matches!(groups.next(), Some(Err(GraphStoreError::Parse(_)))));
    assert!(groups.next().is_none());

    assert!(store.query_spo(None, None, None)?.collect_triplets().is_err());
    Ok(())
}
