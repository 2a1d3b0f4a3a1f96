//! End-to-end scenarios: wishes resolved and applied against a graph.

use wish_tests::prelude::*;

fn create_joe(_: &Context) -> Result<Vec<WishItem>, ScenarioError> {
    Ok(vec![
        EntityLiteral::new("Person").named("joe").into(),
        WishItem::triple(WishItem::var("joe"), RelationLiteral::new("FirstName"), "Joe"),
    ])
}

fn only_person(graph: &Graph) -> AtomRef {
    let people = graph.state().entities_of_type(&EntityType::new("Person"));
    assert_eq!(people.len(), 1, "expected exactly one person");
    people[0].reference.clone()
}

mod scenario_a {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("scenario_a").step("create_joe", create_joe, |a| {
            a.instantiates(3).relations(1).assigns(1).linked(1)
        })
    }

    #[test]
    fn test_new_person_with_first_name() {
        init_tracing();
        let graph = scenario().run().unwrap();

        let joe = only_person(&graph);
        assert_eq!(graph.state().relation_count(), 1);
        assert_eq!(attribute_targets(&graph, &joe, "FirstName"), vec![Value::from("Joe")]);
    }
}

mod scenario_b {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("scenario_b")
            .step("create_joe", create_joe, |a| a.linked(1))
            .step(
                "add_last_name",
                |ctx| {
                    Ok(vec![WishItem::triple(
                        ctx.var("joe")?,
                        RelationLiteral::new("LastName"),
                        "Bloggs",
                    )])
                },
                |a| a.relations(1).linked(1).removed(0),
            )
    }

    #[test]
    fn test_second_call_adds_one_relation() {
        init_tracing();
        let graph = scenario().run().unwrap();

        let joe = only_person(&graph);
        assert_eq!(graph.state().relation_count(), 2);
        assert_eq!(attribute_targets(&graph, &joe, "FirstName"), vec![Value::from("Joe")]);
        assert_eq!(attribute_targets(&graph, &joe, "LastName"), vec![Value::from("Bloggs")]);
    }
}

mod scenario_c {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("scenario_c")
            .step(
                "create_joe_bloggs",
                |_| {
                    Ok(vec![
                        EntityLiteral::new("Person").named("joe").into(),
                        WishItem::triple(
                            WishItem::var("joe"),
                            RelationLiteral::new("FirstName"),
                            "Joe",
                        ),
                        WishItem::triple(
                            WishItem::var("joe"),
                            RelationLiteral::new("LastName"),
                            "Bloggs",
                        ),
                    ])
                },
                |a| a.linked(2),
            )
            .step(
                "drop_last_name",
                |ctx| {
                    let object = ObjectNotation::of(ctx.var("joe")?.id())
                        .set("FirstName", vec!["Joe".into()])
                        .set("LastName", vec![]);
                    Ok(vec![object.into()])
                },
                |a| a.commands(1).terminates(1).instantiates(0).removed(1),
            )
    }

    #[test]
    fn test_removing_a_field_value_terminates_one_relation() {
        init_tracing();
        let graph = scenario().run().unwrap();

        let joe = only_person(&graph);
        assert_eq!(graph.state().relation_count(), 1);
        assert!(attribute_targets(&graph, &joe, "LastName").is_empty());
    }
}

mod scenario_d {
    use super::*;

    #[test]
    fn test_relation_across_graphs_is_engine_error() {
        init_tracing();

        // GIVEN joe on graph 1 and ann on graph 2
        let mut home = Graph::new(GraphUid::new(1));
        let mut away = Graph::new(GraphUid::new(2));
        let joe = person_with_names(&mut home, &[]).unwrap();
        let ann = person_with_names(&mut away, &[]).unwrap();
        let head = home.current_write_head();

        // WHEN a relation from joe to ann is applied to graph 1
        let wish = vec![WishItem::triple(joe, RelationLiteral::new("Knows"), ann)];
        let effect = resolve_and_transact(wish, &home, &ResolveOptions::new()).unwrap();
        let err = apply(effect, &mut home).unwrap_err();

        // THEN the engine refuses and nothing is committed
        assert!(err.is_engine(), "unexpected error: {}", err);
        assert_eq!(home.current_write_head(), head);
        assert_eq!(home.state().relation_count(), 0);
        assert_eq!(home.state().entity_count(), 1);
    }
}

mod pipelines {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("pipelines")
            .step(
                "create_joe",
                |_| {
                    Ok(vec![
                        EntityLiteral::new("Person").named("joe").into(),
                        WishItem::triple(WishItem::var("joe"), RelationLiteral::new("Nick"), "J"),
                    ])
                },
                |a| a.linked(1),
            )
            .step(
                "rename_nick",
                |ctx| Ok(vec![Pipeline::new(ctx.var("joe")?).set_field("Nick", "JB").into()]),
                |a| a.commands(1).assigns(1).updated(1),
            )
            .step(
                "restate_nick",
                |ctx| Ok(vec![Pipeline::new(ctx.var("joe")?).set_field("Nick", "JB").into()]),
                |a| a.noop(),
            )
            .step(
                "terminate_joe",
                |ctx| Ok(vec![Pipeline::new(ctx.var("joe")?).terminate().into()]),
                |a| a.terminates(1).removed(2),
            )
    }

    #[test]
    fn test_pipeline_edits_in_place() {
        init_tracing();
        let graph = scenario().run().unwrap();
        assert_eq!(graph.state().entity_count(), 0);
        assert_eq!(graph.state().relation_count(), 0);
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_conflicting_assignments_fail_the_step() {
        let scenario = Scenario::new("conflict").step(
            "assign_twice",
            |_| {
                Ok(vec![
                    AttributeLiteral::new(ValueKind::Int).named("age").with_value(3).into(),
                    Command::assign(AnyId::var("age"), 4).into(),
                ])
            },
            |a| a.error("Conflict"),
        );
        let graph = scenario.run().unwrap();
        assert_eq!(graph.current_write_head(), WriteHead(0));
    }

    #[test]
    fn test_unknown_variable_is_reported() {
        let scenario = Scenario::new("unknown").step(
            "use_missing",
            |ctx| Ok(vec![ctx.var("nobody")?.into()]),
            |a| a,
        );
        let err = scenario.run().unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownVariable { .. }));
    }

    #[test]
    fn test_failing_step_without_error_expectation() {
        let scenario = Scenario::new("shape").step(
            "fanout_as_endpoint",
            |_| {
                let fanout = WishItem::fanout(
                    vec![WishItem::var("a")],
                    RelationLiteral::new("Knows"),
                    vec![WishItem::var("b")],
                );
                Ok(vec![WishItem::triple(fanout, RelationLiteral::new("Knows"), "x")])
            },
            |a| a,
        );
        assert!(matches!(
            scenario.run().unwrap_err(),
            ScenarioError::StepFailed { .. }
        ));
    }
}
