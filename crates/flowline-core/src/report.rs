//! Change report wire format: parser and writer.
//!
//! The XML shape and its field names are a compatibility boundary with
//! existing build history; both directions must keep exactly this shape.
//! Parsing never fails for an empty report (that is an empty set); a report
//! that cannot be understood is [`CoreError::MalformedReport`].

use chrono::{DateTime, TimeZone, Utc};
use roxmltree::Node;

use crate::error::{CoreError, Result};
use crate::model::{
    ChangeAction, ChangeDesc, ChangeLogEntry, ChangeLogSet, ChangeSetEntry, ComponentEntry,
    EditKind, WorkItemDesc,
};

/// Parse a serialized change report.
///
/// Blank input is a valid, empty report. Top-level attributes map 1:1 onto
/// the [`ChangeLogSet`] header; a missing `baselineSetItemId` just leaves it
/// unset. Entries keep document order. Unknown elements and attributes are
/// skipped for forward compatibility.
pub fn parse_report(raw: &str) -> Result<ChangeLogSet> {
    if raw.trim().is_empty() {
        return Ok(ChangeLogSet::default());
    }

    let doc = roxmltree::Document::parse(raw).map_err(|e| CoreError::malformed(e.to_string()))?;
    let root = doc.root_element();
    if !root.has_tag_name("changelog") {
        return Err(CoreError::malformed(format!(
            "unexpected root element <{}>, expected <changelog>",
            root.tag_name().name()
        )));
    }

    let mut set = ChangeLogSet {
        version: attr_string(&root, "version"),
        baseline_set_item_id: attr_string(&root, "baselineSetItemId"),
        baseline_set_name: attr_string(&root, "baselineSetName"),
        workspace_item_id: attr_string(&root, "workspaceItemId"),
        workspace_name: attr_string(&root, "workspaceName"),
        stream_item_id: attr_string(&root, "streamItemId"),
        stream_name: attr_string(&root, "streamName"),
        previous_baseline_set_item_id: attr_string(&root, "previousBaselineSetItemId")
            .unwrap_or_default(),
        previous_baseline_set_name: attr_string(&root, "previousBaselineSetName")
            .unwrap_or_default(),
        previous_build_url: attr_string(&root, "previousBuildUrl").unwrap_or_default(),
        ..ChangeLogSet::default()
    };

    for node in root.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "component" => set.push(ChangeLogEntry::Component(parse_component(&node)?)),
            "changeset" => set.push(ChangeLogEntry::ChangeSet(parse_change_set(&node)?)),
            _ => {}
        }
    }

    Ok(set)
}

fn attr_string(node: &Node, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

fn required_attr(node: &Node, tag: &str, name: &str) -> Result<String> {
    attr_string(node, name)
        .ok_or_else(|| CoreError::malformed(format!("missing {name} attribute on <{tag}>")))
}

fn parse_action(node: &Node, tag: &str) -> Result<ChangeAction> {
    let raw = required_attr(node, tag, "action")?;
    ChangeAction::from_wire(&raw)
        .ok_or_else(|| CoreError::malformed(format!("unknown action \"{raw}\" on <{tag}>")))
}

fn parse_component(node: &Node) -> Result<ComponentEntry> {
    Ok(ComponentEntry {
        item_id: required_attr(node, "component", "itemId")?,
        name: attr_string(node, "name"),
        action: parse_action(node, "component")?,
    })
}

fn parse_change_set(node: &Node) -> Result<ChangeSetEntry> {
    let action = parse_action(node, "changeset")?;
    let date = match node.attribute("date") {
        // Reports produced before the date attribute shipped.
        None => DateTime::<Utc>::UNIX_EPOCH,
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(|| CoreError::malformed(format!("invalid date \"{raw}\" on <changeset>")))?,
    };

    let additional_changes =
        attr_string(node, "additionalChanges").filter(|s| !s.trim().is_empty());

    let mut changes = Vec::new();
    let mut work_items = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            // A truncated change set carries only the overflow count; a
            // per-file list still present in the report is not parsed.
            "changes" if additional_changes.is_none() => changes.push(parse_change(&child)?),
            "workItems" => work_items.push(parse_work_item(&child)?),
            _ => {}
        }
    }
    let mut work_items = work_items.into_iter();
    let work_item = work_items.next();
    let additional_work_items = work_items.collect();

    Ok(ChangeSetEntry {
        change_set_item_id: required_attr(node, "changeset", "changeSetItemId")?,
        component_item_id: required_attr(node, "changeset", "componentItemId")?,
        component_name: attr_string(node, "componentName"),
        owner: attr_string(node, "owner").unwrap_or_default(),
        comment: unescape_comment(&attr_string(node, "comment").unwrap_or_default()),
        date,
        action,
        changes,
        work_item,
        additional_work_items,
        additional_changes,
    })
}

fn parse_change(node: &Node) -> Result<ChangeDesc> {
    let kind = match node.attribute("kind") {
        None => EditKind::Edit,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(EditKind::from_mask)
            .map_err(|_| CoreError::malformed(format!("invalid change kind \"{raw}\"")))?,
    };
    Ok(ChangeDesc {
        kind,
        name: attr_string(node, "name").unwrap_or_default(),
        item_id: attr_string(node, "itemId"),
        state_id: attr_string(node, "stateId"),
    })
}

fn parse_work_item(node: &Node) -> Result<WorkItemDesc> {
    let raw = required_attr(node, "workItems", "number")?;
    let number = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| CoreError::malformed(format!("invalid work item number \"{raw}\"")))?;
    Ok(WorkItemDesc::new(
        number,
        node.attribute("summary").unwrap_or_default(),
    ))
}

/// Comments carry their newlines in an escaped form on the wire.
fn unescape_comment(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Serialize a change log back to the wire format [`parse_report`] accepts.
pub fn write_report(set: &ChangeLogSet) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<changelog");
    push_attr_opt(&mut out, "version", set.version.as_deref());
    push_attr_opt(&mut out, "baselineSetItemId", set.baseline_set_item_id.as_deref());
    push_attr_opt(&mut out, "baselineSetName", set.baseline_set_name.as_deref());
    push_attr_opt(&mut out, "workspaceItemId", set.workspace_item_id.as_deref());
    push_attr_opt(&mut out, "workspaceName", set.workspace_name.as_deref());
    push_attr_opt(&mut out, "streamItemId", set.stream_item_id.as_deref());
    push_attr_opt(&mut out, "streamName", set.stream_name.as_deref());
    push_attr_nonempty(
        &mut out,
        "previousBaselineSetItemId",
        &set.previous_baseline_set_item_id,
    );
    push_attr_nonempty(
        &mut out,
        "previousBaselineSetName",
        &set.previous_baseline_set_name,
    );
    push_attr_nonempty(&mut out, "previousBuildUrl", &set.previous_build_url);

    if set.entries().is_empty() {
        out.push_str("/>\n");
        return out;
    }
    out.push_str(">\n");

    for entry in set.entries() {
        match entry {
            ChangeLogEntry::Component(component) => write_component(&mut out, component),
            ChangeLogEntry::ChangeSet(change_set) => write_change_set(&mut out, change_set),
        }
    }

    out.push_str("</changelog>\n");
    out
}

fn write_component(out: &mut String, component: &ComponentEntry) {
    out.push_str("    <component");
    push_attr(out, "action", component.action.as_str());
    push_attr(out, "itemId", &component.item_id);
    push_attr_opt(out, "name", component.name.as_deref());
    out.push_str("/>\n");
}

fn write_change_set(out: &mut String, cs: &ChangeSetEntry) {
    out.push_str("    <changeset");
    push_attr(out, "action", cs.action.as_str());
    push_attr(out, "owner", &cs.owner);
    push_attr(out, "date", &cs.date.timestamp_millis().to_string());
    push_attr(out, "comment", &escape_comment(&cs.comment));
    push_attr(out, "changeSetItemId", &cs.change_set_item_id);
    push_attr(out, "componentItemId", &cs.component_item_id);
    push_attr_opt(out, "componentName", cs.component_name.as_deref());
    push_attr_opt(out, "additionalChanges", cs.additional_changes.as_deref());

    // Truncated entries carry the overflow count alone, never a file list.
    let changes: &[ChangeDesc] = if cs.is_too_many_changes() {
        &[]
    } else {
        &cs.changes
    };

    if changes.is_empty() && cs.work_items().is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");

    for change in changes {
        out.push_str("        <changes");
        push_attr(out, "kind", &wire_kind(change.kind).to_string());
        push_attr(out, "name", &change.name);
        push_attr_opt(out, "itemId", change.item_id.as_deref());
        push_attr_opt(out, "stateId", change.state_id.as_deref());
        out.push_str("/>\n");
    }
    for work_item in cs.work_items() {
        out.push_str("        <workItems");
        push_attr(out, "number", &work_item.number.to_string());
        push_attr(out, "summary", &work_item.summary);
        out.push_str("/>\n");
    }

    out.push_str("    </changeset>\n");
}

/// The mask written for a decoded kind. Decoding is lossy across bit
/// combinations, so write the canonical bit for the decoded value.
fn wire_kind(kind: EditKind) -> u32 {
    match kind {
        EditKind::Add => 1,
        EditKind::Edit => 2,
        EditKind::Delete => 4,
        EditKind::Rename => 8,
        EditKind::Move => 16,
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&xml_escape(value));
    out.push('"');
}

fn push_attr_opt(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        push_attr(out, name, value);
    }
}

fn push_attr_nonempty(out: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        push_attr(out, name, value);
    }
}

fn xml_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn escape_comment(comment: &str) -> String {
    comment.replace('\n', "\\n")
}
