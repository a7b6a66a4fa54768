mod ingest_flow_tests {
    use searchserver::ingest::preprocess::preprocess;
    use searchserver::search::highlight::highlight;
    use searchserver::shared::models::PayloadValue;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn startup_records_are_renamed_and_highlightable() {
        let file = temp_file(
            ".json",
            concat!(
                r#"{"name":"Orbit","description":"This is a fast rocket ship","images":"orbit.png","link":"https://orbit.example"}"#,
                "\n",
                r#"{"name":"Crate","description":"Ships crates by drone","images":"crate.png","link":"https://crate.example"}"#,
                "\n",
                r#"{"name":"Plain","description":"Makes plain yogurt","images":"plain.png","link":"https://plain.example"}"#,
                "\n",
            ),
        );

        let prepared = preprocess(file.path()).unwrap().unwrap();
        assert_eq!(prepared.documents.len(), 3);
        assert_eq!(prepared.metadata.len(), 3);

        // Renamed metadata keys, original text preserved verbatim.
        assert_eq!(
            prepared.metadata[0]["logoUrl"],
            PayloadValue::String("orbit.png".to_string())
        );
        assert_eq!(
            prepared.metadata[0]["homepageUrl"],
            PayloadValue::String("https://orbit.example".to_string())
        );
        assert!(!prepared.metadata[0].contains_key("images"));
        assert!(!prepared.metadata[0].contains_key("link"));
        assert_eq!(prepared.documents[0], "This is a fast rocket ship");

        // The extracted text highlights the way the keyword path serves it.
        let marked = highlight(&prepared.documents[0], "fast rocket");
        assert!(marked.contains("<b>fast</b>"));
        assert!(marked.contains("<b>rocket"));
    }

    #[test]
    fn reingesting_the_same_file_prepares_identical_documents() {
        let contents = concat!(
            r#"{"description":"doc one","images":"a.png","link":"https://a"}"#,
            "\n",
            r#"{"description":"doc two","images":"b.png","link":"https://b"}"#,
            "\n",
        );
        let file = temp_file(".json", contents);

        let first = preprocess(file.path()).unwrap().unwrap();
        let second = preprocess(file.path()).unwrap().unwrap();

        assert_eq!(first.documents, second.documents);
        assert_eq!(first.metadata.len(), second.metadata.len());
        for (a, b) in first.metadata.iter().zip(&second.metadata) {
            assert_eq!(a, b);
        }
    }
}
