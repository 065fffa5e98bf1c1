use anyhow::Result;
use graphstore::{group_by, GraphStore, Iri, Term, Triplet};
use tempfile::tempdir;

fn t(s: &str, p: &str, o: &str) -> Triplet {
    Triplet::new(
        Term::resource(format!("http://ex.org/{}", s)).unwrap(),
        Iri::new(format!("http://ex.org/{}", p)).unwrap(),
        Term::literal(o),
    )
}

#[test]
fn subject_groups_partition_the_spo_index() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let triplets = vec![
        t("a", "p", "x"),
        t("a", "p", "y"),
        t("a", "q", "z"),
        t("b", "p", "z"),
    ];
    store.add_all(&triplets)?;

    let mut shape = Vec::new();
    let mut leaves = Vec::new();
    for subject in store.subject_groups()? {
        let subject = subject?;
        let mut predicates = Vec::new();
        for predicate in subject.items {
            let predicate = predicate?;
            let objects: Vec<_> = predicate.items.collect();
            predicates.push((predicate.key.as_str().to_string(), objects.len()));
            leaves.extend(objects);
        }
        shape.push((subject.key.label().to_string(), predicates));
    }

    assert_eq!(
        shape,
        vec![
            (
                "http://ex.org/a".to_string(),
                vec![
                    ("http://ex.org/p".to_string(), 2),
                    ("http://ex.org/q".to_string(), 1)
                ]
            ),
            (
                "http://ex.org/b".to_string(),
                vec![("http://ex.org/p".to_string(), 1)]
            ),
        ]
    );
    assert_eq!(leaves, store.query_spo(None, None, None)?.collect_triplets()?);
    Ok(())
}

#[test]
fn subject_groups_of_empty_store() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    let mut groups = store.subject_groups()?;
    assert!(!groups.has_next());
    assert!(groups.next().is_none());
    Ok(())
}

#[test]
fn peeking_does_not_consume() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    store.add_all(&[t("a", "p", "x"), t("b", "p", "y")])?;

    let mut groups = store.subject_groups()?;
    assert!(groups.has_next());
    assert!(groups.has_next());
    let peeked = match groups.peek() {
        Some(Ok(group)) => group.key.clone(),
        _ => panic!("expected a group"),
    };
    let first = groups.next().unwrap()?;
    assert_eq!(first.key, peeked);
    assert_eq!(groups.count(), 1);
    Ok(())
}

#[test]
fn custom_grouping_over_a_pos_scan() -> Result<()> {
    let dir = tempdir()?;
    let store = GraphStore::open_default(dir.path())?;
    store.add_all(&[
        t("a", "p", "x"),
        t("b", "p", "x"),
        t("c", "p", "y"),
        t("d", "q", "x"),
    ])?;

    let p = Iri::new("http://ex.org/p")?;
    let by_object: Vec<(String, Vec<String>)> = group_by(
        store.query_pos(Some(&p), None, None)?,
        |triplet: &Triplet| triplet.object.clone(),
        |object, members| {
            (
                object.label().to_string(),
                members.map(|m| m.subject.label().to_string()).collect(),
            )
        },
    )
    .collect::<graphstore::Result<_>>()?;

    assert_eq!(
        by_object,
        vec![
            (
                "x".to_string(),
                vec!["http://ex.org/a".to_string(), "http://ex.org/b".to_string()]
            ),
            ("y".to_string(), vec!["http://ex.org/c".to_string()]),
        ]
    );
    Ok(())
}
