//! Integration tests for world queries
//!
//! Requests are elaborated against the bundled world catalog and executed
//! over `fixtures/world_sample.json`.

#[cfg(test)]
mod world_query_tests {
    use querymap::{
        config::{ElaboratorConfig, RangePredicate},
        executor::{Dataset, ExecutionError, Executor, Value},
        query_planner::{combinators::eql, Elaborator, Operator},
        world_catalog, Binding, Literal,
    };

    const SAMPLE: &str = include_str!("../fixtures/world_sample.json");

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sample() -> Dataset {
        Dataset::from_json_str(SAMPLE).expect("sample dataset should parse")
    }

    /// Elaborate `root` with `config` and execute it over `dataset`.
    fn run_with(config: ElaboratorConfig, dataset: &Dataset, root: Operator) -> Value {
        init();
        let catalog = world_catalog().unwrap();
        let plan = Elaborator::for_catalog(catalog, config)
            .elaborate_query(root)
            .unwrap();
        Executor::for_catalog(catalog, dataset)
            .execute(&plan)
            .unwrap()
    }

    fn run(root: Operator) -> Value {
        run_with(ElaboratorConfig::default(), &sample(), root)
    }

    fn names(value: &Value, field: &str) -> Vec<String> {
        value
            .get(field)
            .and_then(Value::as_list)
            .expect("list result")
            .iter()
            .map(|item| {
                item.get("name")
                    .and_then(Value::as_literal)
                    .and_then(Literal::as_str)
                    .expect("name")
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_country_lookup_with_nested_cities() {
        let root = Operator::select(
            "country",
            vec![Binding::new("code", "NLD")],
            Operator::group(vec![
                Operator::leaf("name"),
                Operator::leaf("code2"),
                Operator::select("cities", vec![], Operator::leaf("name")),
            ]),
        );
        let value = run(root);
        assert_eq!(
            value.to_json(),
            serde_json::json!({
                "country": {
                    "name": "Netherlands",
                    "code2": "NL",
                    "cities": [{ "name": "Amsterdam" }, { "name": "Rotterdam" }]
                }
            })
        );
    }

    #[test]
    fn test_country_lookup_without_match_is_null() {
        let root = Operator::select(
            "country",
            vec![Binding::new("code", "XXX")],
            Operator::leaf("name"),
        );
        assert_eq!(run(root).get("country"), Some(&Value::Null));
    }

    #[test]
    fn test_city_lookup_with_country() {
        let root = Operator::select(
            "city",
            vec![Binding::new("id", 8)],
            Operator::group(vec![
                Operator::leaf("name"),
                Operator::select("country", vec![], Operator::leaf("name")),
            ]),
        );
        assert_eq!(
            run(root).to_json(),
            serde_json::json!({
                "city": { "name": "Windhoek", "country": { "name": "Namibia" } }
            })
        );
    }

    fn countries(limit: i64, min_population: i64) -> Vec<String> {
        let root = Operator::select(
            "countries",
            vec![
                Binding::new("limit", limit),
                Binding::new("minPopulation", min_population),
                Binding::new("byPopulation", true),
            ],
            Operator::leaf("name"),
        );
        names(&run(root), "countries")
    }

    #[test]
    fn test_countries_is_prefix_of_filtered_order() {
        let unlimited = countries(0, 10_000_000);
        assert_eq!(
            unlimited,
            vec!["Belgium", "Netherlands", "France", "United States", "India"]
        );
        assert_eq!(countries(3, 10_000_000), unlimited[..3].to_vec());
        assert_eq!(countries(-1, 10_000_000), unlimited);
        assert_eq!(countries(50, 10_000_000), unlimited);
    }

    #[test]
    fn test_limit_cuts_inside_filtered_rows() {
        // France, the first physical row, passes the filter but sorts later
        assert_eq!(countries(1, 1_000_000), vec!["Namibia"]);
        assert_eq!(
            countries(0, 1_000_000),
            vec!["Namibia", "Belgium", "Netherlands", "France", "United States", "India"]
        );
        assert_eq!(countries(2, 100_000_000), vec!["United States", "India"]);
    }

    #[test]
    fn test_countries_binding_order_does_not_change_result() {
        let bindings = vec![
            Binding::new("byPopulation", true),
            Binding::new("limit", 2),
            Binding::new("minPopulation", 1_000_000),
        ];
        let mut reversed = bindings.clone();
        reversed.reverse();

        let forward = run(Operator::select(
            "countries",
            bindings,
            Operator::leaf("name"),
        ));
        let backward = run(Operator::select(
            "countries",
            reversed,
            Operator::leaf("name"),
        ));
        assert_eq!(names(&forward, "countries"), vec!["Namibia", "Belgium"]);
        assert_eq!(
            names(&forward, "countries"),
            names(&backward, "countries")
        );
    }

    #[test]
    fn test_countries_without_arguments_returns_everything() {
        let value = run(Operator::select("countries", vec![], Operator::leaf("name")));
        assert_eq!(names(&value, "countries").len(), 8);
    }

    #[test]
    fn test_search_applies_both_bounds() {
        let root = Operator::select(
            "search",
            vec![
                Binding::new("minPopulation", 500_000),
                Binding::new("indepSince", 1900),
            ],
            Operator::leaf("name"),
        );
        let negated = run(root.clone());
        assert_eq!(names(&negated, "search"), vec!["India", "Namibia"]);

        let direct = run_with(
            ElaboratorConfig {
                range_predicate: RangePredicate::GreaterOrEqual,
                ..Default::default()
            },
            &sample(),
            root,
        );
        assert_eq!(negated, direct);
    }

    #[test]
    fn test_search_accepts_row_above_both_bounds() {
        let dataset = Dataset::new().with_row(
            "country",
            [
                ("code", "ZZZ".into()),
                ("name", "Zedland".into()),
                ("population", 600_000.into()),
                ("indepyear", 1920.into()),
            ],
        );
        let root = Operator::select(
            "search",
            vec![
                Binding::new("minPopulation", 500_000),
                Binding::new("indepSince", 1900),
            ],
            Operator::leaf("name"),
        );
        let value = run_with(ElaboratorConfig::default(), &dataset, root);
        assert_eq!(names(&value, "search"), vec!["Zedland"]);
    }

    #[test]
    fn test_cities_prefix_pattern() {
        let by_pattern = |config: ElaboratorConfig, pattern: &str| {
            let root = Operator::select(
                "cities",
                vec![Binding::new("namePattern", pattern)],
                Operator::leaf("name"),
            );
            names(&run_with(config, &sample(), root), "cities")
        };
        assert_eq!(
            by_pattern(ElaboratorConfig::default(), "San%"),
            vec!["San Jose", "San Francisco", "Santa Ana"]
        );
        assert!(by_pattern(ElaboratorConfig::default(), "SAN%").is_empty());
        let insensitive = ElaboratorConfig {
            case_sensitive_patterns: false,
            ..Default::default()
        };
        assert_eq!(by_pattern(insensitive, "SAN %").len(), 2);
        assert_eq!(
            by_pattern(ElaboratorConfig::default(), "Mumbai (%)"),
            vec!["Mumbai (Bombay)"]
        );
    }

    #[test]
    fn test_languages_filter_and_nested_countries() {
        let root = Operator::select(
            "languages",
            vec![Binding::new(
                "languages",
                Literal::List(vec!["Dutch".into(), "German".into()]),
            )],
            Operator::group(vec![
                Operator::leaf("language"),
                Operator::select("countries", vec![], Operator::leaf("name")),
            ]),
        );
        assert_eq!(
            run(root).to_json(),
            serde_json::json!({
                "languages": [
                    {
                        "language": "Dutch",
                        "countries": [{ "name": "Netherlands" }, { "name": "Belgium" }]
                    },
                    { "language": "German", "countries": [{ "name": "Namibia" }] }
                ]
            })
        );
    }

    #[test]
    fn test_language_lookup_spans_rows() {
        let root = Operator::select(
            "language",
            vec![Binding::new("language", "English")],
            Operator::select("countries", vec![], Operator::leaf("name")),
        );
        let value = run(root);
        let countries = value.get("language").expect("language object");
        assert_eq!(names(countries, "countries"), vec!["United States", "Tuvalu"]);
    }

    #[test]
    fn test_several_operations_in_one_request() {
        let root = Operator::group(vec![
            Operator::select(
                "country",
                vec![Binding::new("code", "FRA")],
                Operator::leaf("name"),
            ),
            Operator::select(
                "cities",
                vec![Binding::new("namePattern", "Rot%")],
                Operator::leaf("name"),
            ),
        ]);
        assert_eq!(
            run(root).to_json(),
            serde_json::json!({
                "country": { "name": "France" },
                "cities": [{ "name": "Rotterdam" }]
            })
        );
    }

    #[test]
    fn test_unique_over_several_entities_is_ambiguous() {
        init();
        let catalog = world_catalog().unwrap();
        let dataset = sample();
        let plan = Operator::select(
            "country",
            vec![],
            Operator::leaf("name").unique(eql("continent", "Europe")),
        );
        let err = Executor::for_catalog(catalog, &dataset)
            .execute(&plan)
            .unwrap_err();
        assert!(
            matches!(err, ExecutionError::AmbiguousKey { ref field, matches: 3 } if field == "country"),
            "{}",
            err
        );
    }

    #[test]
    fn test_plan_survives_json_handoff() {
        init();
        let catalog = world_catalog().unwrap();
        let plan = Elaborator::for_catalog(catalog, ElaboratorConfig::default())
            .elaborate_query(Operator::select(
                "countries",
                vec![
                    Binding::new("minPopulation", 1_000_000),
                    Binding::new("byPopulation", true),
                ],
                Operator::select("cities", vec![], Operator::leaf("name")),
            ))
            .unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let handed_off: Operator = serde_json::from_str(&json).unwrap();
        assert_eq!(handed_off, plan);

        let dataset = sample();
        let executor = Executor::for_catalog(catalog, &dataset);
        assert_eq!(
            executor.execute(&handed_off).unwrap(),
            executor.execute(&plan).unwrap()
        );
    }
}
