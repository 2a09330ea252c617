//! Unit tests for argument-driven rewrite rules
//!
//! Each test elaborates a top-level operation against the bundled world
//! catalog and checks the resulting operator tree.

#[cfg(test)]
mod elaboration_rule_tests {
    use querymap::{
        config::{ElaboratorConfig, RangePredicate},
        query_planner::{
            combinators::{and, eql, gt_eql, in_list, like, lt, not},
            ArgumentProblem, ElaborationError, Elaborator, Operator, OrderItem,
        },
        world_catalog, Binding, Literal,
    };
    use test_case::test_case;

    fn child() -> Operator {
        Operator::group(vec![Operator::leaf("name"), Operator::leaf("population")])
    }

    fn elaborate(operation: &str, bindings: &[Binding]) -> Operator {
        querymap::elaborate(operation, bindings, child()).unwrap()
    }

    #[test]
    fn test_key_lookups_wrap_in_unique() {
        assert_eq!(
            elaborate("country", &[Binding::new("code", "FRA")]),
            child().unique(eql("code", "FRA"))
        );
        assert_eq!(
            elaborate("city", &[Binding::new("id", 3)]),
            child().unique(eql("id", 3))
        );
        let language = Operator::leaf("isOfficial");
        assert_eq!(
            querymap::elaborate(
                "language",
                &[Binding::new("language", "Dutch")],
                language.clone()
            )
            .unwrap(),
            language.unique(eql("language", "Dutch"))
        );
    }

    #[test_case(0 ; "zero")]
    #[test_case(-1 ; "minus one")]
    #[test_case(-250 ; "large negative")]
    fn test_non_positive_limit_is_no_limit(limit: i64) {
        assert_eq!(
            elaborate("countries", &[Binding::new("limit", limit)]),
            elaborate("countries", &[])
        );
    }

    #[test]
    fn test_zero_min_population_is_no_filter() {
        assert_eq!(
            elaborate("countries", &[Binding::new("minPopulation", 0)]),
            elaborate("countries", &[])
        );
        assert_eq!(elaborate("countries", &[]), child());
    }

    #[test]
    fn test_countries_applies_filter_order_limit() {
        let bindings = [
            Binding::new("limit", 10),
            Binding::new("byPopulation", true),
            Binding::new("minPopulation", 5_000_000),
        ];
        let expected = child()
            .filter(gt_eql("population", 5_000_000))
            .order_by(vec![OrderItem::asc("population")])
            .limit(10);
        assert_eq!(elaborate("countries", &bindings), expected);

        let mut reversed = bindings.to_vec();
        reversed.reverse();
        assert_eq!(elaborate("countries", &reversed), expected);
    }

    #[test]
    fn test_countries_order_without_filter() {
        assert_eq!(
            elaborate("countries", &[Binding::new("byPopulation", true)]),
            child().order_by(vec![OrderItem::asc("population")])
        );
        assert_eq!(
            elaborate("countries", &[Binding::new("byPopulation", false)]),
            child()
        );
    }

    #[test]
    fn test_search_uses_negated_less_than() {
        let plan = elaborate(
            "search",
            &[
                Binding::new("minPopulation", 500_000),
                Binding::new("indepSince", 1900),
            ],
        );
        let predicate = and(vec![
            not(lt("population", 500_000)),
            not(lt("indepyear", 1900)),
        ])
        .unwrap();
        assert_eq!(plan, child().filter(predicate));
    }

    #[test]
    fn test_search_greater_or_equal_form() {
        let catalog = world_catalog().unwrap();
        let elaborator = Elaborator::for_catalog(
            catalog,
            ElaboratorConfig {
                range_predicate: RangePredicate::GreaterOrEqual,
                ..Default::default()
            },
        );
        let plan = elaborator
            .elaborate(
                "search",
                &[
                    Binding::new("indepSince", 1900),
                    Binding::new("minPopulation", 500_000),
                ],
                child(),
            )
            .unwrap();
        let predicate =
            and(vec![gt_eql("population", 500_000), gt_eql("indepyear", 1900)]).unwrap();
        assert_eq!(plan, child().filter(predicate));
    }

    #[test]
    fn test_cities_pattern_is_case_sensitive_like() {
        let plan = elaborate("cities", &[Binding::new("namePattern", "San%")]);
        assert_eq!(plan, child().filter(like("name", "San%", true)));
        assert_eq!(
            plan.to_string().lines().next(),
            Some("Filter(name LIKE 'San%')")
        );
    }

    #[test]
    fn test_cities_default_pattern_matches_everything() {
        assert_eq!(
            elaborate("cities", &[]),
            child().filter(like("name", "%", true))
        );
    }

    #[test]
    fn test_languages_list_becomes_in() {
        let plan = querymap::elaborate(
            "languages",
            &[Binding::new(
                "languages",
                Literal::List(vec!["Dutch".into(), "German".into()]),
            )],
            Operator::leaf("language"),
        )
        .unwrap();
        assert_eq!(
            plan,
            Operator::leaf("language")
                .filter(in_list("language", vec!["Dutch".into(), "German".into()]))
        );
    }

    #[test]
    fn test_unknown_operation_passes_child_through() {
        assert_eq!(
            elaborate("capitals", &[Binding::new("continent", "Europe")]),
            child()
        );
    }

    #[test]
    fn test_elaboration_is_deterministic() {
        let bindings = [
            Binding::new("minPopulation", 1_000_000),
            Binding::new("byPopulation", true),
            Binding::new("limit", 2),
        ];
        let first = elaborate("countries", &bindings);
        let second = elaborate("countries", &bindings);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_all_argument_problems_are_reported() {
        let catalog = world_catalog().unwrap();
        let elaborator = Elaborator::for_catalog(catalog, ElaboratorConfig::default());
        let errors = elaborator
            .elaborate(
                "search",
                &[
                    Binding::new("minPopulation", 1.5),
                    Binding::new("indepSince", "1900"),
                    Binding::new("continent", "Asia"),
                ],
                child(),
            )
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        let arguments: Vec<String> = errors
            .iter()
            .map(|e| match e {
                ElaborationError::ArgumentShapeMismatch { argument, .. } => argument.clone(),
                other => panic!("unexpected error {}", other),
            })
            .collect();
        assert_eq!(arguments, vec!["minPopulation", "indepSince", "continent"]);

        let message = errors.to_string();
        assert!(message.starts_with("3 elaboration errors:"), "{}", message);
        assert!(message.contains("Invalid argument `continent` for `search`"));
    }

    #[test]
    fn test_lookup_without_key_is_missing_argument() {
        let catalog = world_catalog().unwrap();
        let errors = Elaborator::for_catalog(catalog, ElaboratorConfig::default())
            .elaborate("country", &[], child())
            .unwrap_err();
        assert_eq!(
            errors.0,
            vec![ElaborationError::mismatch(
                "country",
                "code",
                ArgumentProblem::Missing
            )]
        );
    }

    #[test]
    fn test_float_for_int_is_wrong_kind() {
        let catalog = world_catalog().unwrap();
        let errors = Elaborator::for_catalog(catalog, ElaboratorConfig::default())
            .elaborate("city", &[Binding::new("id", 4.0)], child())
            .unwrap_err();
        assert!(matches!(
            &errors.0[0],
            ElaborationError::ArgumentShapeMismatch {
                problem: ArgumentProblem::WrongKind { expected, found },
                ..
            } if expected == "Int" && found == "Float"
        ));
    }
}
