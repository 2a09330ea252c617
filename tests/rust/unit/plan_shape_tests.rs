//! Unit tests for nested selection handling
//!
//! Object-field selections get an explicit join and every selected field is
//! checked against the mapping.

#[cfg(test)]
mod plan_shape_tests {
    use querymap::{
        mapping_catalog::MappingError,
        query_planner::{combinators::eql, operator::Select, ElaborationError, Elaborator, Operator},
        world_catalog, Binding, ElaboratorConfig,
    };

    fn elaborator() -> Elaborator<'static> {
        Elaborator::for_catalog(world_catalog().unwrap(), ElaboratorConfig::default())
    }

    #[test]
    fn test_query_keeps_top_level_selects() {
        let root = Operator::group(vec![
            Operator::select(
                "country",
                vec![Binding::new("code", "NLD")],
                Operator::leaf("name"),
            ),
            Operator::select("countries", vec![], Operator::leaf("code2")),
        ]);
        let plan = elaborator().elaborate_query(root).unwrap();

        let expected = Operator::group(vec![
            Operator::select(
                "country",
                vec![Binding::new("code", "NLD")],
                Operator::leaf("name").unique(eql("code", "NLD")),
            ),
            Operator::select("countries", vec![], Operator::leaf("code2")),
        ]);
        assert_eq!(plan, expected);
    }

    #[test]
    fn test_nested_object_fields_are_joined() {
        let child = Operator::group(vec![
            Operator::leaf("name"),
            Operator::select(
                "country",
                vec![],
                Operator::group(vec![
                    Operator::leaf("name"),
                    Operator::select("languages", vec![], Operator::leaf("language")),
                ]),
            ),
        ]);
        let plan = elaborator()
            .elaborate("city", &[Binding::new("id", 1)], child)
            .unwrap();
        let rendered = plan.to_string();
        let expected = "\
Unique(id = 1)
└── Group
    ├── Select(name)
    │   └── Empty
    └── Select(country)
        └── Join(city.countrycode = country.code)
            └── Group
                ├── Select(name)
                │   └── Empty
                └── Select(languages)
                    └── Join(country.code = countrylanguage.countrycode)
                        └── Select(language)
                            └── Empty
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_arguments_on_nested_fields_are_rejected() {
        let child = Operator::select(
            "cities",
            vec![Binding::new("limit", 2)],
            Operator::leaf("name"),
        );
        let errors = elaborator()
            .elaborate("country", &[Binding::new("code", "USA")], child)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.0[0].operation(), "country");
    }

    #[test]
    fn test_unknown_fields_report_type_and_field() {
        let root = Operator::select(
            "languages",
            vec![],
            Operator::group(vec![Operator::leaf("speakers"), Operator::leaf("language")]),
        );
        let errors = elaborator().elaborate_query(root).unwrap_err();
        let ElaborationError::UnknownField { source, .. } = &errors.0[0] else {
            panic!("expected UnknownField, got {}", errors);
        };
        assert_eq!(source, &MappingError::unknown_field("Language", "speakers"));
    }

    #[test]
    fn test_unknown_operation_keeps_select() {
        let root = Operator::select("capitals", vec![], Operator::leaf("name"));
        let plan = elaborator().elaborate_query(root.clone()).unwrap();
        assert_eq!(plan, root);
        let Operator::Select(Select { field, .. }) = plan else {
            panic!("expected Select");
        };
        assert_eq!(field, "capitals");
    }
}
