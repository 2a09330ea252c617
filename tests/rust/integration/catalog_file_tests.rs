//! Integration tests for catalogs loaded from files
//!
//! A catalog other than the bundled world one is written to a temporary
//! file, loaded, and queried through the reference executor.

#[cfg(test)]
mod catalog_file_tests {
    use std::io::Write;

    use querymap::{
        executor::{Dataset, Executor},
        mapping_catalog::{Catalog, MappingError, OpaqueCodecs},
        query_planner::{ElaborationError, Elaborator, Operator},
        Binding, ElaboratorConfig,
    };

    const LIBRARY: &str = r#"
name: library
schema:
  types:
    - name: Query
      fields:
        - { name: books, type: "[Book!]!" }
    - name: Book
      fields:
        - { name: title, type: "String!" }
        - { name: year, type: Int }
        - { name: author, type: "Author!" }
    - name: Author
      fields:
        - { name: name, type: "String!" }
mapping:
  tables:
    - name: book
      columns:
        - { name: isbn, codec: text }
        - { name: title, codec: text }
        - { name: year, codec: int4 }
        - { name: author_id, codec: int4 }
    - name: author
      columns:
        - { name: id, codec: int4 }
        - { name: name, codec: text }
  objects:
    - type: Query
      fields:
        - { kind: root, name: books }
    - type: Book
      fields:
        - { kind: attribute, name: isbn, column: book.isbn, key: true }
        - { kind: field, name: title, column: book.title }
        - { kind: field, name: year, column: book.year }
        - { kind: attribute, name: author_id, column: book.author_id }
        - kind: object
          name: author
          target: Author
          join: { parent: book.author_id, child: author.id }
    - type: Author
      fields:
        - { kind: attribute, name: id, column: author.id, key: true }
        - { kind: field, name: name, column: author.name }
"#;

    fn write_catalog(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_query_library_catalog() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let file = write_catalog(LIBRARY);
        let catalog = Catalog::from_yaml_file(file.path(), &OpaqueCodecs::postgres_basic())?;
        assert_eq!(catalog.name(), Some("library"));

        let request = Operator::select(
            "books",
            vec![],
            Operator::group(vec![
                Operator::leaf("title"),
                Operator::select("author", vec![], Operator::leaf("name")),
            ]),
        );
        // No rewrite rule for `books`: the request comes back unchanged
        let plan = Elaborator::for_catalog(&catalog, ElaboratorConfig::default())
            .elaborate_query(request.clone())?;
        assert_eq!(plan, request);

        let dataset = Dataset::new()
            .with_row("author", [("id", 1.into()), ("name", "Ursula K. Le Guin".into())])
            .with_row(
                "book",
                [
                    ("isbn", "0-441-47812-3".into()),
                    ("title", "The Left Hand of Darkness".into()),
                    ("year", 1969.into()),
                    ("author_id", 1.into()),
                ],
            );
        let value = Executor::for_catalog(&catalog, &dataset).execute(&plan)?;
        assert_eq!(
            value.to_json(),
            serde_json::json!({
                "books": [{
                    "title": "The Left Hand of Darkness",
                    "author": { "name": "Ursula K. Le Guin" }
                }]
            })
        );
        Ok(())
    }

    #[test]
    fn test_world_operations_are_unknown_fields_elsewhere() {
        let catalog = Catalog::from_yaml_str(LIBRARY, &OpaqueCodecs::postgres_basic()).unwrap();
        let errors = Elaborator::for_catalog(&catalog, ElaboratorConfig::default())
            .elaborate("country", &[Binding::new("code", "FRA")], Operator::Empty)
            .unwrap_err();
        assert_eq!(
            errors.0[0].to_string(),
            "Cannot elaborate `country`: No field mapping found for `Query.country`"
        );
    }

    /// `countries` with the world signature over a country without population.
    const ATLAS: &str = r#"
name: atlas
schema:
  types:
    - name: Query
      fields:
        - name: countries
          type: "[Country!]"
          args:
            - { name: limit, type: Int, default: -1 }
            - { name: minPopulation, type: Int, default: 0 }
            - { name: byPopulation, type: Boolean, default: false }
    - name: Country
      fields:
        - { name: name, type: "String!" }
mapping:
  tables:
    - name: country
      columns:
        - { name: code, codec: bpchar }
        - { name: name, codec: varchar }
  objects:
    - type: Query
      fields:
        - { kind: root, name: countries }
    - type: Country
      fields:
        - { kind: attribute, name: code, column: country.code, key: true }
        - { kind: field, name: name, column: country.name }
"#;

    #[test]
    fn test_rewrite_over_unmapped_column_is_unknown_field() {
        let catalog = Catalog::from_yaml_str(ATLAS, &OpaqueCodecs::postgres_basic()).unwrap();
        let elaborator = Elaborator::for_catalog(&catalog, ElaboratorConfig::default());

        let plan = elaborator
            .elaborate("countries", &[Binding::new("limit", 2)], Operator::leaf("name"))
            .unwrap();
        assert_eq!(plan, Operator::leaf("name").limit(2));

        let errors = elaborator
            .elaborate(
                "countries",
                &[Binding::new("minPopulation", 5), Binding::new("byPopulation", true)],
                Operator::leaf("name"),
            )
            .unwrap_err();
        // Filter and sort key both read `population`
        assert_eq!(errors.0.len(), 2);
        assert!(errors.0.iter().all(|e| matches!(
            e,
            ElaborationError::UnknownField { operation, .. } if operation == "countries"
        )));
    }

    #[test]
    fn test_unmapped_declared_field_is_rejected() {
        let broken = LIBRARY.replace(
            "        - { kind: field, name: year, column: book.year }\n",
            "",
        );
        let err = Catalog::from_yaml_str(&broken, &OpaqueCodecs::postgres_basic()).unwrap_err();
        assert_eq!(
            err,
            MappingError::UnmappedField {
                type_name: "Book".to_string(),
                field: "year".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_codec_is_rejected() {
        let broken = LIBRARY.replace("{ name: year, codec: int4 }", "{ name: year, codec: money }");
        let err = Catalog::from_yaml_str(&broken, &OpaqueCodecs::postgres_basic()).unwrap_err();
        assert!(matches!(err, MappingError::UnknownCodec { ref codec, .. } if codec == "money"));
    }

    #[test]
    fn test_missing_file_is_config_read_error() {
        let err = Catalog::from_yaml_file(
            "/nonexistent/library.yaml",
            &OpaqueCodecs::postgres_basic(),
        )
        .unwrap_err();
        assert!(matches!(err, MappingError::ConfigRead { .. }));
    }
}
