use flowline_core::{parse_report, write_report, EditKind};

/// A full build's report: two components, five accepts (two truncated),
/// two discards, one component added and one dropped.
const SCENARIO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<changelog version="1" baselineSetItemId="_bs77" baselineSetName="flowline-77"
    workspaceItemId="_ws1" workspaceName="flowline-build"
    previousBaselineSetItemId="_bs76" previousBaselineSetName="flowline-76"
    previousBuildUrl="job/flowline/76/">
    <component action="Added" itemId="_capp" name="app"/>
    <changeset action="Added" owner="deb" date="1717430400000"
        comment="import vendor drop" additionalChanges="2034"
        changeSetItemId="_cs1" componentItemId="_capp" componentName="app"/>
    <changeset action="Added" owner="deb" date="1717434000000"
        comment="merge feature branch" additionalChanges="129"
        changeSetItemId="_cs2" componentItemId="_capp" componentName="app">
        <workItems number="200" summary="merge the feature branch"/>
        <workItems number="201" summary="follow-on cleanup"/>
        <workItems number="202" summary="update release notes"/>
    </changeset>
    <changeset action="Added" owner="pat" date="1717437600000"
        comment="fix session leak in connector"
        changeSetItemId="_cs3" componentItemId="_capp" componentName="app">
        <changes kind="2" name="src/connector.cfg" itemId="_f1" stateId="_s1"/>
        <changes kind="3" name="src/pool.cfg" itemId="_f2" stateId="_s2"/>
        <workItems number="203" summary="connector leaks sessions"/>
    </changeset>
    <changeset action="Added" owner="pat" date="1717441200000"
        comment="update build scripts\nand docs"
        changeSetItemId="_cs4" componentItemId="_clib" componentName="lib">
        <changes kind="10" name="build/new-name.cfg" itemId="_f3" stateId="_s3"/>
        <changes kind="18" name="moved/here.cfg" itemId="_f4" stateId="_s4"/>
        <workItems number="204" summary="build scripts out of date"/>
    </changeset>
    <changeset action="Added" owner="sam" date="1717444800000" comment=""
        changeSetItemId="_cs5" componentItemId="_clib" componentName="lib">
        <changes kind="24" name="relocated.cfg"/>
        <workItems number="205" summary="restructure the lib layout"/>
    </changeset>
    <changeset action="Dropped" owner="sam" date="1717448400000"
        comment="back out the experiment"
        changeSetItemId="_cs6" componentItemId="_clib" componentName="lib">
        <changes kind="4" name="experiment.cfg"/>
    </changeset>
    <changeset action="Dropped" owner="deb" date="1717452000000" comment=""
        changeSetItemId="_cs7" componentItemId="_capp" componentName="app"/>
    <component action="Dropped" itemId="_clib" name="lib"/>
</changelog>"#;

fn scenario() -> flowline_core::ChangeLogSet {
    parse_report(SCENARIO).expect("scenario report must parse")
}

// ── Partition ───────────────────────────────────────────────────────────

#[test]
fn nine_entries_partition_into_the_three_buckets() {
    let set = scenario();
    assert_eq!(set.len(), 9);
    assert_eq!(set.accepted_count(), 5);
    assert_eq!(set.discarded_count(), 2);
    assert_eq!(set.component_change_count(), 2);
    assert_eq!(
        set.accepted_count() + set.discarded_count() + set.component_change_count(),
        set.len()
    );
}

#[test]
fn header_carries_snapshot_and_previous_build_linkage() {
    let set = scenario();
    assert!(set.has_recorded_snapshot());
    assert_eq!(set.baseline_set_name.as_deref(), Some("flowline-77"));
    assert_eq!(set.previous_baseline_set_item_id, "_bs76");
    assert_eq!(set.previous_build_url, "job/flowline/76/");
}

#[test]
fn per_component_queries_split_the_same_change_sets() {
    let set = scenario();
    assert_eq!(set.change_sets_accepted("_capp").len(), 3);
    assert_eq!(set.change_sets_accepted("_clib").len(), 2);
    assert_eq!(set.change_sets_discarded("_capp").len(), 1);
    assert_eq!(set.change_sets_discarded("_clib").len(), 1);

    let affected = set.affected_components();
    assert_eq!(affected.len(), 2);
    assert_eq!(affected[0].name.as_deref(), Some("app"));
    assert_eq!(affected[1].name.as_deref(), Some("lib"));
}

// ── Truncated change sets ───────────────────────────────────────────────

#[test]
fn truncated_change_sets_report_the_count_instead_of_paths() {
    let set = scenario();
    let truncated: Vec<_> = set
        .accepted_entries()
        .filter(|cs| cs.is_too_many_changes())
        .collect();
    assert_eq!(truncated.len(), 2);

    assert_eq!(
        truncated[0].message(),
        "Change set has 2034 changes, too many to show individually"
    );
    assert!(truncated[0].affected_paths().is_empty());
    assert!(truncated[0].work_items().is_empty());

    assert!(truncated[1].message().contains("129"));
    // Truncation drops the file list, not the work item links.
    let numbers: Vec<i64> = truncated[1].work_items().iter().map(|wi| wi.number).collect();
    assert_eq!(numbers, vec![200, 201, 202]);
}

// ── Entry content ───────────────────────────────────────────────────────

#[test]
fn edit_kinds_decode_from_the_wire_masks() {
    let set = scenario();
    let kinds: Vec<(&str, EditKind)> = set
        .accepted_entries()
        .chain(set.discarded_entries())
        .flat_map(|cs| cs.changes.iter())
        .map(|c| (c.name.as_str(), c.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("src/connector.cfg", EditKind::Edit),
            ("src/pool.cfg", EditKind::Add),
            ("build/new-name.cfg", EditKind::Rename),
            ("moved/here.cfg", EditKind::Move),
            ("relocated.cfg", EditKind::Edit),
            ("experiment.cfg", EditKind::Delete),
        ]
    );
}

#[test]
fn comments_unescape_and_blank_comments_render_as_no_comment() {
    let set = scenario();
    let cs4 = set.change_sets_accepted("_clib")[0];
    assert_eq!(cs4.comment, "update build scripts\nand docs");
    assert_eq!(cs4.message(), "update build scripts\nand docs");

    let cs5 = set.change_sets_accepted("_clib")[1];
    assert_eq!(cs5.message(), "No comment");

    let cs7 = set.change_sets_discarded("_capp")[0];
    assert_eq!(cs7.message(), "No comment");
}

#[test]
fn component_events_render_their_action() {
    let set = scenario();
    let messages: Vec<String> = set.component_entries().map(|c| c.message()).collect();
    assert_eq!(
        messages,
        vec![
            "Added component \"app\"".to_string(),
            "Dropped component \"lib\"".to_string(),
        ]
    );
}

// ── Stability ───────────────────────────────────────────────────────────

#[test]
fn parsing_the_scenario_twice_yields_equal_sets() {
    assert_eq!(scenario(), scenario());
}

#[test]
fn scenario_survives_a_write_and_reparse() {
    let set = scenario();
    let rewritten = write_report(&set);
    let reparsed = parse_report(&rewritten).expect("rewritten report must parse");
    assert_eq!(set, reparsed);
}

// ── Shared component names ──────────────────────────────────────────────

#[test]
fn components_sharing_a_name_are_tracked_independently() {
    let raw = r#"<changelog>
        <changeset action="Added" owner="deb" date="1717430400000" comment="first core"
            changeSetItemId="_csA" componentItemId="_c100" componentName="core">
            <changes kind="2" name="a.cfg"/>
        </changeset>
        <changeset action="Added" owner="deb" date="1717430400000" comment="second core"
            changeSetItemId="_csB" componentItemId="_c200" componentName="core">
            <changes kind="2" name="b.cfg"/>
        </changeset>
    </changelog>"#;
    let set = parse_report(raw).expect("report must parse");

    let affected = set.affected_components();
    assert_eq!(affected.len(), 2);
    assert!(affected.iter().all(|c| c.name.as_deref() == Some("core")));
    assert_eq!(set.change_sets_accepted("_c100").len(), 1);
    assert_eq!(set.change_sets_accepted("_c200").len(), 1);
}

#[test]
fn work_item_summaries_are_scrubbed_of_control_characters() {
    let raw = r#"<changelog>
        <changeset action="Added" owner="deb" date="1717430400000" comment="fix"
            changeSetItemId="_csA" componentItemId="_c100" componentName="core">
            <workItems number="300" summary="crash&#13;on startup"/>
        </changeset>
    </changelog>"#;
    let set = parse_report(raw).expect("report must parse");
    let cs = set.accepted_entries().next().expect("one change set");
    assert_eq!(cs.work_item.as_ref().expect("work item").summary, "crash on startup");
}
