//! Object pipelines: a subject followed by field edits or a termination.

use crate::tagging::ensure_tag;
use crate::{
    Command, CompileError, CompileResult, Field, FieldValue, GenerationState, Interpreted,
    Level2Command, ObjectNotation, Pipeline, PipelineOp, WishItem,
};
use wish_core::RelationType;

/// Evaluate a pipeline into level-2 commands and follow-up items.
pub fn evaluate(pipeline: Pipeline, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    if pipeline.ends_in_terminate() {
        return evaluate_terminate(pipeline, gen);
    }
    if pipeline.ops.iter().any(|op| matches!(op, PipelineOp::Terminate)) {
        return Err(CompileError::shape("terminate must be the last step of a pipeline"));
    }

    let mut out = Interpreted::default();
    let (mut object, id) = match pipeline.subject {
        WishItem::Object(object) => {
            let (_, id) = ensure_tag(WishItem::Object(object.clone()), gen)?;
            (ObjectNotation { id: Some(id.clone()), ..object }, id)
        }
        subject => {
            let ty = match &subject {
                WishItem::Reference(reference) => reference.kind.object_type(),
                _ => None,
            };
            let (follow_up, id) = ensure_tag(subject, gen)?;
            out.follow_ups.extend(follow_up);
            let object = ObjectNotation {
                ty,
                ..ObjectNotation::of(id.clone())
            };
            (object, id)
        }
    };

    let mut focus: Option<RelationType> = None;
    for op in pipeline.ops {
        match op {
            PipelineOp::Field(rt) => focus = Some(rt),
            PipelineOp::Assign(value) => match focus.take() {
                Some(rt) => {
                    object.fields.insert(rt, Field::single(value));
                }
                None => match value {
                    FieldValue::Value(value) => {
                        out.commands.push(Command::assign(id.clone(), value).into())
                    }
                    _ => {
                        return Err(CompileError::shape(format!(
                            "only a scalar can be assigned to {} itself",
                            id
                        )))
                    }
                },
            },
            PipelineOp::SetField(rt, values) => {
                focus = None;
                object.fields.insert(rt, Field::new(values));
            }
            PipelineOp::Terminate => {}
        }
    }
    if let Some(rt) = focus {
        return Err(CompileError::shape(format!("field {} is focused but never assigned", rt)));
    }

    if !object.fields.is_empty() || object.ty.is_some() {
        out.commands.push(Level2Command::Object(object));
    }
    Ok(out)
}

fn evaluate_terminate(pipeline: Pipeline, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    if pipeline.ops.len() != 1 {
        return Err(CompileError::shape("a terminated subject cannot also be edited"));
    }
    // the subject is only named, never created
    let (_, id) = ensure_tag(pipeline.subject, gen)?;
    Ok(Interpreted {
        commands: vec![Command::terminate(id).into()],
        follow_ups: Vec::new(),
    })
}
