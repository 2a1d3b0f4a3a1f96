//! Endpoint tagging: make sure an item has an identity another command can point at.

use crate::{AttributeLiteral, CompileError, CompileResult, GenerationState, Pipeline, WishItem};
use wish_core::{AnyId, AttributeType};

/// Give `item` an identity, naming it with a fresh internal id if it has none.
///
/// Returns the item to interpret in its place (if anything is left to create) and the
/// identity it is now known by.
pub fn ensure_tag(
    item: WishItem,
    gen: &mut GenerationState,
) -> CompileResult<(Option<WishItem>, AnyId)> {
    match item {
        WishItem::Entity(mut lit) => {
            let id = first_name(&mut lit.names, gen);
            Ok((Some(WishItem::Entity(lit)), id))
        }
        WishItem::Attribute(mut lit) => {
            let id = first_name(&mut lit.names, gen);
            Ok((Some(WishItem::Attribute(lit)), id))
        }
        WishItem::Scalar(value) => {
            let id = gen.next_id();
            let lit = AttributeLiteral {
                ty: AttributeType::of(&value),
                names: vec![id.clone()],
                value: Some(value),
            };
            Ok((Some(WishItem::Attribute(lit)), id))
        }
        WishItem::Value(value) => {
            let id = AnyId::Value(value.clone());
            Ok((Some(WishItem::Value(value)), id))
        }
        WishItem::Delegate(delegate) => {
            let id = AnyId::Delegate(delegate.clone());
            Ok((Some(WishItem::Delegate(delegate)), id))
        }
        WishItem::Reference(reference) => {
            let id = reference.id();
            Ok((Some(WishItem::Reference(reference)), id))
        }
        WishItem::Id(id) => match id {
            // content ids still need their node to exist
            AnyId::Value(_) | AnyId::Delegate(_) => Ok((Some(WishItem::Id(id.clone())), id)),
            _ => Ok((None, id)),
        },
        WishItem::Object(mut object) => {
            let id = match &object.id {
                Some(id) => id.clone(),
                None => {
                    let id = gen.next_id();
                    object.id = Some(id.clone());
                    id
                }
            };
            Ok((Some(WishItem::Object(object)), id))
        }
        WishItem::Triple(mut triple) => {
            let id = first_name(&mut triple.relation.names, gen);
            Ok((Some(WishItem::Triple(triple)), id))
        }
        WishItem::Pipeline(pipeline) => {
            let Pipeline { subject, ops } = *pipeline;
            let (subject, id) = ensure_tag(subject, gen)?;
            let subject = subject.unwrap_or_else(|| WishItem::Id(id.clone()));
            Ok((Some(WishItem::Pipeline(Box::new(Pipeline { subject, ops }))), id))
        }
        WishItem::Fanout(_) => Err(CompileError::shape(
            "a fan-out has several identities and cannot be a relation endpoint",
        )),
        WishItem::Sequence(_) => Err(CompileError::shape(
            "a sequence cannot be a relation endpoint",
        )),
        WishItem::Command(_) => Err(CompileError::shape(
            "a raw command cannot be a relation endpoint",
        )),
    }
}

/// The first of `names`, minting one first if the list is empty.
fn first_name(names: &mut Vec<AnyId>, gen: &mut GenerationState) -> AnyId {
    match names.first() {
        Some(id) => id.clone(),
        None => {
            let id = gen.next_id();
            names.push(id.clone());
            id
        }
    }
}
