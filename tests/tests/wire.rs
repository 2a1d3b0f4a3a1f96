//! Wire forms: JSON round trips, remote merges and stale slices.

use proptest::prelude::*;
use wish_tests::prelude::*;

fn any_id() -> impl Strategy<Value = AnyId> {
    prop_oneof![
        (0u64..1000, 1u64..4)
            .prop_map(|(blob, g)| AnyId::Eternal(EternalUid::new(blob, GraphUid::new(g)))),
        "[a-z]{1,8}".prop_map(AnyId::var),
        any::<i64>().prop_map(AnyId::val),
        ".{0,12}".prop_map(AnyId::val),
    ]
}

fn any_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        ".{0,16}".prop_map(Value::String),
    ]
}

fn any_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        ("[A-Z][a-z]{0,8}", proptest::collection::vec(any_id(), 0..3))
            .prop_map(|(ty, ids)| Command::instantiate(Atom::Entity(EntityType::new(ty)), ids)),
        ("[A-Z][a-z]{0,8}", any_id(), any_id())
            .prop_map(|(rt, s, t)| {
                Command::instantiate(Atom::relation(RelationType::new(rt), s, t), vec![])
            }),
        (any_id(), any_value()).prop_map(|(target, value)| Command::assign(target, value)),
        any_id().prop_map(Command::terminate),
        proptest::collection::vec(any_id(), 1..4).prop_map(Command::alias),
        any_id().prop_map(|target| Command::MustLive { target }),
    ]
}

fn sample_receipt() -> Receipt {
    let mut graph = Graph::new(GraphUid::new(1));
    let wish = vec![
        EntityLiteral::new("Person").named("joe").into(),
        WishItem::triple(WishItem::var("joe"), RelationLiteral::new("FirstName"), "Joe"),
    ];
    let options = ResolveOptions::new().with_salt("w").retain_internal_ids(true);
    apply(resolve_and_transact(wish, &graph, &options).unwrap(), &mut graph).unwrap()
}

proptest! {
    #[test]
    fn prop_commands_round_trip(cmd in any_command()) {
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, cmd);
    }
}

#[test]
fn test_receipt_round_trip() {
    let receipt = sample_receipt();
    assert!(receipt.len() >= 3);
    let json = serde_json::to_vec(&receipt).unwrap();
    let back: Receipt = serde_json::from_slice(&json).unwrap();
    assert_eq!(back, receipt);
}

#[test]
fn test_level2_object_round_trip() {
    let object: Level2Command = ObjectNotation::new(EntityType::new("Person"))
        .with_id(AnyId::var("joe"))
        .field(
            RelationType::new("Nick"),
            Field::single("JB").named(AnyId::var("nick")),
        )
        .set("Friend", vec![AnyId::var("ann").into()])
        .into();
    let json = serde_json::to_string(&object).unwrap();
    let back: Level2Command = serde_json::from_str(&json).unwrap();
    assert_eq!(back, object);
}

#[test]
fn test_remote_merge_answers_with_receipt() {
    init_tracing();

    // GIVEN a remote wish that creates joe and gives him a nickname
    let mut graph = Graph::new(GraphUid::new(1));
    let wish = RemoteWish::new(vec![
        Command::instantiate(
            Atom::Entity(EntityType::new("Person")),
            vec![AnyId::var("joe")],
        )
        .into(),
        ObjectNotation::of(AnyId::var("joe"))
            .set("Nick", vec!["JB".into()])
            .into(),
    ])
    .retain_internal_ids(true);

    // WHEN the server handles the encoded request
    let reply = handle_remote_merge(&wish.to_bytes().unwrap(), &mut graph).unwrap();
    let reply = RemoteMergeReply::from_bytes(&reply).unwrap();

    // THEN the reply names the new slice and joe, and internal ids are kept
    assert_eq!(reply.slice, graph.marker());
    let joe = reply.receipt.var("joe").cloned().unwrap();
    assert_eq!(attribute_targets(&graph, &joe, "Nick"), vec![Value::from("JB")]);
    assert!(reply
        .receipt
        .iter()
        .any(|(id, _)| matches!(id, AnyId::Internal(_))));
}

#[test]
fn test_stale_effect_is_rejected_then_rebased() {
    // GIVEN two effects resolved against the same slice
    let mut graph = Graph::new(GraphUid::new(1));
    let options = ResolveOptions::new().with_salt("s");
    let wish = || vec![WishItem::from(EntityLiteral::new("Person").named("p"))];
    let first = resolve_and_transact(wish(), &graph, &options).unwrap();
    let second = resolve_and_transact(wish(), &graph, &options).unwrap();

    // WHEN both are applied in turn
    apply(first, &mut graph).unwrap();
    let err = second.clone().run(&mut graph).unwrap_err();

    // THEN the second is stale and writes nothing until rebased
    assert!(err.is_stale());
    assert_eq!(graph.state().entity_count(), 1);
    let receipt = apply(second.rebase(&graph, &options).unwrap(), &mut graph).unwrap();
    assert_eq!(graph.state().entity_count(), 2);
    assert!(receipt.var("p").is_some());
}
