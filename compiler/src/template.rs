//! Shorthand encoding: name every top-level item so its result can be found again.

use crate::tagging::ensure_tag;
use crate::{Command, CompileResult, Fanout, GenerationState, Level2Command, WishItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wish_core::AnyId;

/// The shape of a caller's input, with identities in place of the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Template {
    Id(AnyId),
    /// An identity that may legitimately be absent afterwards, e.g. a terminated record.
    Optional(AnyId),
    Seq(Vec<Template>),
    Map(BTreeMap<String, Template>),
}

impl Template {
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Template)>) -> Self {
        Template::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Every identity in the template, required or optional, in order.
    pub fn ids(&self) -> Vec<&AnyId> {
        let mut ids = Vec::new();
        self.collect(&mut ids, true);
        ids
    }

    /// Identities that must resolve for the template to unpack.
    pub fn required_ids(&self) -> Vec<&AnyId> {
        let mut ids = Vec::new();
        self.collect(&mut ids, false);
        ids
    }

    fn collect<'a>(&'a self, ids: &mut Vec<&'a AnyId>, optional: bool) {
        match self {
            Template::Id(id) => ids.push(id),
            Template::Optional(id) if optional => ids.push(id),
            Template::Optional(_) => {}
            Template::Seq(items) => items.iter().for_each(|t| t.collect(ids, optional)),
            Template::Map(entries) => entries.values().for_each(|t| t.collect(ids, optional)),
        }
    }
}

/// Name every unnamed item in `items` and return a template of the same shape.
pub fn encode(
    items: Vec<WishItem>,
    gen: &mut GenerationState,
) -> CompileResult<(Vec<WishItem>, Template)> {
    let mut encoded = Vec::with_capacity(items.len());
    let mut templates = Vec::with_capacity(items.len());
    for item in items {
        let (item, template) = encode_item(item, gen)?;
        encoded.push(item);
        templates.push(template);
    }
    Ok((encoded, Template::Seq(templates)))
}

fn encode_item(item: WishItem, gen: &mut GenerationState) -> CompileResult<(WishItem, Template)> {
    match item {
        WishItem::Sequence(items) => {
            let (items, template) = encode(items, gen)?;
            Ok((WishItem::Sequence(items), template))
        }
        WishItem::Fanout(fanout) => {
            let Fanout {
                sources,
                relation,
                targets,
            } = *fanout;
            let (sources, source_template) = encode_endpoints(sources, gen)?;
            let (targets, target_template) = encode_endpoints(targets, gen)?;
            let item = WishItem::fanout(sources, relation, targets);
            Ok((item, Template::Seq(vec![source_template, target_template])))
        }
        WishItem::Pipeline(pipeline) if pipeline.ends_in_terminate() => {
            let (_, id) = ensure_tag(pipeline.subject.clone(), gen)?;
            Ok((WishItem::Pipeline(pipeline), Template::Optional(id)))
        }
        WishItem::Command(Level2Command::Command(cmd)) => encode_command(cmd, gen),
        WishItem::Command(Level2Command::Object(object)) => tagged(WishItem::Object(object), gen),
        other => tagged(other, gen),
    }
}

fn tagged(item: WishItem, gen: &mut GenerationState) -> CompileResult<(WishItem, Template)> {
    let (tagged, id) = ensure_tag(item, gen)?;
    let item = tagged.unwrap_or_else(|| WishItem::Id(id.clone()));
    Ok((item, Template::Id(id)))
}

fn encode_endpoints(
    items: Vec<WishItem>,
    gen: &mut GenerationState,
) -> CompileResult<(Vec<WishItem>, Template)> {
    let mut out = Vec::with_capacity(items.len());
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let (item, template) = tagged(item, gen)?;
        out.push(item);
        ids.push(template);
    }
    Ok((out, Template::Seq(ids)))
}

fn encode_command(cmd: Command, gen: &mut GenerationState) -> CompileResult<(WishItem, Template)> {
    match cmd {
        Command::Instantiate {
            atom,
            origin_uid,
            mut internal_ids,
        } => {
            if origin_uid.is_none() && internal_ids.is_empty() && atom.content_id().is_none() {
                internal_ids.push(gen.next_id());
            }
            let cmd = Command::Instantiate {
                atom,
                origin_uid,
                internal_ids,
            };
            let template = match cmd.names().into_iter().next() {
                Some(id) => Template::Id(id),
                None => Template::Seq(Vec::new()),
            };
            Ok((cmd.into(), template))
        }
        // other commands produce nothing to look up
        other => Ok((other.into(), Template::Seq(Vec::new()))),
    }
}
