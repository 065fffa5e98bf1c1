use std::io::Write;

use crate::errors::Result;
use crate::io::Serializer;
use crate::prefix::PrefixMapping;
use crate::store::GraphStore;
use crate::term::Term;
use crate::triplet::Triplet;

pub const CSV_HEADER: [&str; 4] = ["subject", "predicate", "object", "lang"];

/// Term labels as CSV rows, plus the object's language tag if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSerializer;

impl Serializer for CsvSerializer {
    fn serialize(&self, out: &mut dyn Write, store: &GraphStore, _prefixes: &PrefixMapping) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(CSV_HEADER)?;
        for triplet in store.query_spo(None, None, None)? {
            writer.write_record(row(&triplet?))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn row(triplet: &Triplet) -> [&str; 4] {
    let lang = match &triplet.object {
        Term::Literal(l) => l.language().unwrap_or_default(),
        _ => "",
    };
    [
        triplet.subject.label(),
        triplet.predicate.as_str(),
        triplet.object.label(),
        lang,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Iri, Literal};

    #[test]
    fn rows_carry_labels_and_language() {
        let subject = Term::resource("http://ex.org/s").unwrap();
        let predicate = Iri::new("http://ex.org/p").unwrap();
        let tagged = Triplet::new(
            subject.clone(),
            predicate.clone(),
            Literal::new_language_tagged("chat", "fr").unwrap().into(),
        );
        assert_eq!(row(&tagged), ["http://ex.org/s", "http://ex.org/p", "chat", "fr"]);

        let linked = Triplet::new(subject, predicate, Term::resource("http://ex.org/o").unwrap());
        assert_eq!(row(&linked)[2..], ["http://ex.org/o", ""]);
    }
}
