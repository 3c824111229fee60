use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use super::{Catalog, CatalogItem};
use crate::config::ColumnNames;
use crate::error::{Error, Result};

/// Header positions of the columns the catalog reads.
struct ColumnIndex {
    title: usize,
    genre: usize,
    overview: usize,
    director: usize,
    star1: usize,
    star2: usize,
    rating: usize,
    poster: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, names: &ColumnNames, path: &Path) -> Result<Self> {
        let wanted = [
            &names.title,
            &names.genre,
            &names.overview,
            &names.director,
            &names.star1,
            &names.star2,
            &names.rating,
            &names.poster,
        ];
        let missing: Vec<&str> = wanted
            .iter()
            .filter(|name| !headers.iter().any(|h| h.trim() == name.as_str()))
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::data_load(
                path,
                Some(1),
                format!("missing required columns: {}", missing.join(", ")),
            ));
        }

        let find = |name: &str| headers.iter().position(|h| h.trim() == name).unwrap_or_default();
        Ok(Self {
            title: find(&names.title),
            genre: find(&names.genre),
            overview: find(&names.overview),
            director: find(&names.director),
            star1: find(&names.star1),
            star2: find(&names.star2),
            rating: find(&names.rating),
            poster: find(&names.poster),
        })
    }
}

/// Load the catalog from a CSV file with a header row.
pub fn load_catalog(path: &Path, columns: &ColumnNames) -> Result<Catalog> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::data_load(path, None, format!("cannot open dataset: {e}")))?;
    read_catalog(file, path, columns)
}

/// Parse catalog rows from any reader. `source` is only used in error messages.
pub fn read_catalog<R: Read>(reader: R, source: &Path, columns: &ColumnNames) -> Result<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::data_load(source, Some(1), format!("cannot read header row: {e}")))?
        .clone();
    let index = ColumnIndex::resolve(&headers, columns, source)?;

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line());
            Error::data_load(source, line, format!("malformed row: {e}"))
        })?;
        let line = record.position().map(|p| p.line());
        items.push(parse_item(&record, &index, source, line, columns)?);
    }

    let catalog = Catalog::new(items);
    let duplicates = catalog.duplicate_titles();
    if !duplicates.is_empty() {
        warn!(
            count = duplicates.len(),
            first = duplicates[0],
            "duplicate titles in catalog; lookups use the first occurrence"
        );
    }
    debug!(items = catalog.len(), source = %source.display(), "catalog parsed");
    Ok(catalog)
}

fn parse_item(
    record: &csv::StringRecord,
    index: &ColumnIndex,
    source: &Path,
    line: Option<u64>,
    columns: &ColumnNames,
) -> Result<CatalogItem> {
    let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

    let title = field(index.title);
    if title.is_empty() {
        return Err(Error::data_load(source, line, format!("empty {}", columns.title)));
    }

    let raw_rating = field(index.rating);
    let rating = if raw_rating.is_empty() {
        0.0
    } else {
        raw_rating
            .parse::<f32>()
            .ok()
            .filter(|r| r.is_finite())
            .ok_or_else(|| {
                Error::data_load(
                    source,
                    line,
                    format!("{} is not a number: {raw_rating:?}", columns.rating),
                )
            })?
    };

    Ok(CatalogItem {
        title,
        genre: field(index.genre),
        overview: field(index.overview),
        director: field(index.director),
        star1: field(index.star1),
        star2: field(index.star2),
        rating,
        poster: field(index.poster),
    })
}

/// BLAKE3 hash of the dataset file, streamed so large files stay out of memory.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let hash = || -> std::io::Result<String> {
        let mut hasher = blake3::Hasher::new();
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::with_capacity(64 * 1024, file);
        std::io::copy(&mut reader, &mut hasher)?;
        Ok(hasher.finalize().to_hex().to_string())
    };
    hash().map_err(|e| Error::data_load(path, None, format!("cannot hash dataset: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Poster_Link,Series_Title,Released_Year,Genre,IMDB_Rating,Overview,Director,Star1,Star2";

    fn parse(body: &str) -> Result<Catalog> {
        read_catalog(body.as_bytes(), Path::new("movies.csv"), &ColumnNames::default())
    }

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let csv = format!(
            "{HEADER}\n\
             https://img/1.jpg,The Godfather,1972,\"Crime, Drama\",9.2,An organized crime dynasty,Francis Ford Coppola,Marlon Brando,Al Pacino\n\
             https://img/2.jpg,The Dark Knight,2008,\"Action, Crime\",9.0,Batman fights the Joker,Christopher Nolan,Christian Bale,Heath Ledger\n"
        );
        let catalog = parse(&csv).unwrap();
        assert_eq!(catalog.len(), 2);
        let first = catalog.get(0).unwrap();
        assert_eq!(first.title, "The Godfather");
        assert_eq!(first.genre, "Crime, Drama");
        assert_eq!(first.star2, "Al Pacino");
        assert!((first.rating - 9.2).abs() < 1e-6);
        assert_eq!(first.poster, "https://img/1.jpg");
    }

    #[test]
    fn missing_genre_and_rating_default() {
        let csv = format!("{HEADER}\n,Quiet Film,1990,,,A quiet story,Jane Doe,A,B\n");
        let catalog = parse(&csv).unwrap();
        let item = catalog.get(0).unwrap();
        assert_eq!(item.genre, "");
        assert_eq!(item.rating, 0.0);
        assert_eq!(item.poster, "");
    }

    #[test]
    fn missing_required_column_fails_fast() {
        let csv = "Series_Title,Genre,Overview\nA,Drama,plot\n";
        let err = parse(csv).unwrap_err();
        match err {
            Error::DataLoad { line, message, .. } => {
                assert_eq!(line, Some(1));
                assert!(message.contains("Director"));
                assert!(message.contains("Poster_Link"));
            }
            other => panic!("expected DataLoad, got {other:?}"),
        }
    }

    #[test]
    fn bad_rating_reports_line() {
        let csv = format!("{HEADER}\n,A,2000,Drama,8.1,x,y,z,w\n,B,2001,Drama,great,x,y,z,w\n");
        let err = parse(&csv).unwrap_err();
        match err {
            Error::DataLoad { line, message, .. } => {
                assert_eq!(line, Some(3));
                assert!(message.contains("great"));
            }
            other => panic!("expected DataLoad, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_rating_is_rejected() {
        for bad in ["nan", "inf", "-inf", "NaN"] {
            let csv = format!("{HEADER}\n,A,2000,Drama,{bad},x,y,z,w\n");
            match parse(&csv) {
                Err(Error::DataLoad { line, message, .. }) => {
                    assert_eq!(line, Some(2));
                    assert!(message.contains(bad), "{message}");
                }
                other => panic!("expected DataLoad for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn duplicate_titles_load_and_resolve_to_first_row() {
        let csv = format!(
            "{HEADER}\n\
             ,Heat,1995,Crime,8.3,first,Michael Mann,Al Pacino,Robert De Niro\n\
             ,Ronin,1998,Action,7.2,heist,John Frankenheimer,Robert De Niro,Jean Reno\n\
             ,Heat,1986,Action,4.4,second,Dick Richards,Burt Reynolds,Karen Young\n"
        );
        let catalog = parse(&csv).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.duplicate_titles(), vec!["Heat"]);
        assert_eq!(catalog.position("Heat"), Some(0));
        assert_eq!(catalog.find("Heat").unwrap().overview, "first");
        assert_eq!(catalog.titles(), vec!["Heat", "Ronin"]);
    }

    #[test]
    fn short_row_is_malformed() {
        let csv = format!("{HEADER}\n,A,2000,Drama\n");
        assert!(matches!(parse(&csv), Err(Error::DataLoad { .. })));
    }

    #[test]
    fn empty_title_is_rejected() {
        let csv = format!("{HEADER}\n,,2000,Drama,7.0,x,y,z,w\n");
        assert!(matches!(parse(&csv), Err(Error::DataLoad { .. })));
    }

    #[test]
    fn custom_column_names() {
        let columns = ColumnNames {
            title: "name".into(),
            genre: "tags".into(),
            overview: "plot".into(),
            director: "dir".into(),
            star1: "lead".into(),
            star2: "second".into(),
            rating: "score".into(),
            poster: "image".into(),
        };
        let csv = "name,tags,plot,dir,lead,second,score,image\nA,drama,x,y,z,w,5,\n";
        let catalog = read_catalog(csv.as_bytes(), Path::new("c.csv"), &columns).unwrap();
        assert_eq!(catalog.get(0).unwrap().genre, "drama");
        assert_eq!(catalog.get(0).unwrap().rating, 5.0);
    }

    #[test]
    fn load_and_fingerprint_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, ",A,2000,Drama,7.0,x,y,z,w").unwrap();
        file.flush().unwrap();

        let catalog = load_catalog(file.path(), &ColumnNames::default()).unwrap();
        assert_eq!(catalog.len(), 1);

        let a = fingerprint_file(file.path()).unwrap();
        let b = fingerprint_file(file.path()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_catalog(Path::new("/nonexistent/movies.csv"), &ColumnNames::default())
            .unwrap_err();
        assert!(matches!(err, Error::DataLoad { line: None, .. }));
    }
}
