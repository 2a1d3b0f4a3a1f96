//! Properties every resolution call upholds.

use proptest::prelude::*;
use wish_tests::prelude::*;

fn options() -> ResolveOptions {
    ResolveOptions::new().with_salt("p")
}

fn person(name: &str) -> Level2Command {
    Command::instantiate(Atom::Entity(EntityType::new("Person")), vec![AnyId::var(name)]).into()
}

mod idempotent_instantiate {
    use super::*;

    fn fixed_joe(graph: &Graph) -> WishItem {
        let uid = EternalUid::new(10, graph.uid());
        EntityLiteral::new("Person")
            .with_name(AnyId::Eternal(uid))
            .into()
    }

    #[test]
    fn test_same_literal_twice_in_one_wish() {
        // GIVEN an empty graph
        let mut graph = Graph::new(GraphUid::new(1));

        // WHEN one wish holds the same fixed-uid literal twice
        let wish = vec![fixed_joe(&graph), fixed_joe(&graph)];
        let effect = resolve_and_transact(wish, &graph, &options()).unwrap();
        let receipt = apply(effect, &mut graph).unwrap();

        // THEN one entity is created under that uid
        let uid = AnyId::Eternal(EternalUid::new(10, GraphUid::new(1)));
        assert_eq!(graph.state().entity_count(), 1);
        assert_eq!(receipt.get(&uid).map(|r| r.id()), Some(uid));
    }

    #[test]
    fn test_same_literal_in_two_calls() {
        let mut graph = Graph::new(GraphUid::new(1));
        let uid = AnyId::Eternal(EternalUid::new(10, GraphUid::new(1)));

        let first = apply(
            resolve_and_transact(vec![fixed_joe(&graph)], &graph, &options()).unwrap(),
            &mut graph,
        )
        .unwrap();
        let effect = resolve_and_transact(vec![fixed_joe(&graph)], &graph, &options()).unwrap();
        assert!(effect.is_noop());
        let second = apply(effect, &mut graph).unwrap();

        assert_eq!(graph.state().entity_count(), 1);
        assert_eq!(first.get(&uid), second.get(&uid));
        assert!(first.get(&uid).is_some());
    }
}

mod alias_transitivity {
    use super::*;

    #[test]
    fn test_chained_aliases_resolve_to_one_record() {
        // GIVEN a person named a, with b aliased to a and c aliased to b
        let mut graph = Graph::new(GraphUid::new(1));
        let commands = vec![
            person("a"),
            Command::alias([AnyId::var("a"), AnyId::var("b")]).into(),
            Command::alias([AnyId::var("b"), AnyId::var("c")]).into(),
        ];

        // WHEN applied
        let effect = resolve_commands(commands, &graph, &options()).unwrap();
        let receipt = apply(effect, &mut graph).unwrap();

        // THEN all three names map to the same single record
        let a = receipt.var("a").cloned().unwrap();
        assert_eq!(receipt.var("b"), Some(&a));
        assert_eq!(receipt.var("c"), Some(&a));
        assert_eq!(graph.state().entity_count(), 1);
    }

    #[test]
    fn test_aliased_instantiates_merge() {
        let mut graph = Graph::new(GraphUid::new(1));
        let commands = vec![
            person("a"),
            person("c"),
            Command::alias([AnyId::var("a"), AnyId::var("b")]).into(),
            Command::alias([AnyId::var("b"), AnyId::var("c")]).into(),
        ];
        let receipt = apply(resolve_commands(commands, &graph, &options()).unwrap(), &mut graph)
            .unwrap();
        assert_eq!(graph.state().entity_count(), 1);
        assert_eq!(receipt.var("a"), receipt.var("c"));
    }
}

mod value_dedup {
    use super::*;

    #[test]
    fn test_same_value_twice_is_one_node() {
        let mut graph = Graph::new(GraphUid::new(1));
        let wish = vec![WishItem::value(5), WishItem::value(5)];
        apply(resolve_and_transact(wish, &graph, &options()).unwrap(), &mut graph).unwrap();
        assert_eq!(graph.state().value_node_count(), 1);
    }

    #[test]
    fn test_value_and_assignment_share_a_node() {
        let mut graph = Graph::new(GraphUid::new(1));
        let wish = vec![
            WishItem::value(5),
            AttributeLiteral::new(ValueKind::Int).with_value(5).into(),
        ];
        apply(resolve_and_transact(wish, &graph, &options()).unwrap(), &mut graph).unwrap();
        assert_eq!(graph.state().value_node_count(), 1);
        assert!(graph.slice().contains(&AnyId::val(5)));
    }

    #[test]
    fn test_distinct_values_are_distinct_nodes() {
        let mut graph = Graph::new(GraphUid::new(1));
        let wish = vec![WishItem::value(5), WishItem::value(6)];
        apply(resolve_and_transact(wish, &graph, &options()).unwrap(), &mut graph).unwrap();
        assert_eq!(graph.state().value_node_count(), 2);
        let slice = graph.slice();
        assert_ne!(slice.lookup(&AnyId::val(5)), slice.lookup(&AnyId::val(6)));
    }

    #[test]
    fn test_value_already_on_graph_is_reused() {
        let mut graph = Graph::new(GraphUid::new(1));
        apply(
            resolve_and_transact(vec![WishItem::value(5)], &graph, &options()).unwrap(),
            &mut graph,
        )
        .unwrap();
        let effect = resolve_and_transact(vec![WishItem::value(5)], &graph, &options()).unwrap();
        assert!(effect.is_noop());
    }
}

mod conflict_rejection {
    use super::*;

    fn age_with(values: &[i64]) -> Vec<Level2Command> {
        let mut commands: Vec<Level2Command> = vec![Command::instantiate(
            Atom::Attribute(AttributeType::new(ValueKind::Int)),
            vec![AnyId::var("age")],
        )
        .into()];
        for value in values {
            commands.push(Command::assign(AnyId::var("age"), *value).into());
        }
        commands
    }

    #[test]
    fn test_different_values_conflict() {
        let graph = Graph::new(GraphUid::new(1));
        let err = resolve_commands(age_with(&[1, 2]), &graph, &options()).unwrap_err();
        assert!(err.is_conflict(), "unexpected error: {}", err);
    }

    #[test]
    fn test_equal_values_collapse() {
        let graph = Graph::new(GraphUid::new(1));
        let effect = resolve_commands(age_with(&[7, 7]), &graph, &options()).unwrap();
        let assigns = effect
            .batch
            .commands
            .iter()
            .filter(|c| c.kind() == CommandKind::Assign)
            .count();
        assert_eq!(assigns, 1);
    }

    #[test]
    fn test_aliasing_two_existing_records_conflicts() {
        let mut graph = Graph::new(GraphUid::new(1));
        let joe = person_with_names(&mut graph, &[]).unwrap();
        let ann = person_with_names(&mut graph, &[]).unwrap();
        let err = resolve_commands(
            vec![Command::alias([joe.id(), ann.id()]).into()],
            &graph,
            &options(),
        )
        .unwrap_err();
        assert!(err.is_conflict());
    }
}

mod ordering {
    use super::*;

    fn knows(i: usize) -> Level2Command {
        Command::instantiate(
            Atom::relation(
                RelationType::new("Knows"),
                AnyId::var(format!("e{}", i)),
                AnyId::var(format!("e{}", i + 1)),
            ),
            vec![AnyId::var(format!("r{}", i))],
        )
        .into()
    }

    fn chain(len: usize) -> Vec<Level2Command> {
        let mut commands: Vec<Level2Command> =
            (0..=len).map(|i| person(&format!("e{}", i))).collect();
        commands.extend((0..len).map(knows));
        commands
    }

    fn position(commands: &[Command], name: &str) -> usize {
        let id = AnyId::var(name);
        commands
            .iter()
            .position(|c| c.kind() == CommandKind::Instantiate && c.names().contains(&id))
            .unwrap()
    }

    proptest! {
        #[test]
        fn prop_relations_follow_their_endpoints(
            (len, commands) in (1usize..8)
                .prop_flat_map(|len| (Just(len), Just(chain(len)).prop_shuffle()))
        ) {
            let mut graph = Graph::new(GraphUid::new(1));
            let effect = resolve_commands(commands, &graph, &options()).unwrap();
            let ordered = &effect.batch.commands;
            for i in 0..len {
                let rel = position(ordered, &format!("r{}", i));
                let from = format!("e{}", i);
                let to = format!("e{}", i + 1);
                prop_assert!(position(ordered, &from) < rel);
                prop_assert!(position(ordered, &to) < rel);
            }

            apply(effect, &mut graph).unwrap();
            prop_assert_eq!(graph.state().relation_count(), len);
            prop_assert_eq!(graph.state().entity_count(), len + 1);
        }
    }
}
