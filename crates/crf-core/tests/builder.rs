mod common;

use std::collections::BTreeSet;

use crf_core::{CoreError, build, defs};
use crf_model::{HiddenRowPolicy, OdmVersion};

use common::{item, metadata, row, section, two_concepts, weight_with_unit};

#[test]
fn two_groups_in_one_section_build_two_concepts() {
    let built = build(
        OdmVersion::V2_0,
        HiddenRowPolicy::Exclude,
        &two_concepts(),
    )
    .expect("build");

    assert_eq!(built.sections.len(), 1);
    let section = &built.sections[0];
    assert_eq!(section.oid, "IG.VS.S1");
    let concept_oids: Vec<&str> = section
        .item_group_refs
        .iter()
        .map(|r| r.item_group_oid.as_str())
        .collect();
    assert_eq!(concept_oids, vec!["IG.S1.G1", "IG.S1.G2"]);

    let g1 = built.concept("IG.S1.G1").expect("G1 concept");
    let g2 = built.concept("IG.S1.G2").expect("G2 concept");
    assert_eq!(g1.item_refs.len(), 2);
    assert_eq!(g2.item_refs.len(), 1);
    assert_eq!(g1.item_refs[0].item_oid, "IT.S1.G1.VSTESTCD");
    assert_eq!(built.items.len(), 3);
}

#[test]
fn every_distinct_group_key_yields_one_concept() {
    let s1 = section("S1", 1);
    let s2 = section("S2", 2);
    let rows = vec![
        row(&s1, 1, item("G1", 1, "A")),
        row(&s1, 2, item("G2", 1, "B")),
        row(&s1, 2, item("G2", 2, "C")),
        row(&s2, 1, item("G1", 1, "A")),
        row(&s2, 3, item("G3", 1, "D")),
    ];
    let expected: BTreeSet<_> = rows.iter().map(|r| r.group_key()).collect();
    let meta = metadata(vec![s1, s2], rows);

    for version in [OdmVersion::V1_3_2, OdmVersion::V2_0] {
        let built = build(version, HiddenRowPolicy::default_for(version), &meta).expect("build");
        assert_eq!(built.concepts.len(), expected.len());
        assert_eq!(built.sections.len(), 2);
        // The last concept is flushed after the loop.
        assert_eq!(
            built.concepts.last().map(|c| c.name.as_str()),
            Some("G3 concept")
        );
    }
}

#[test]
fn hidden_rows_never_produce_items() {
    let s1 = section("S1", 1);
    let mut hidden = item("G1", 2, "VSTESTCD");
    hidden.hidden = true;
    hidden.codelist = "C66741".to_string();
    hidden.prepopulated_term = "WEIGHT".to_string();
    let meta = metadata(
        vec![s1.clone()],
        vec![row(&s1, 1, item("G1", 1, "VSORRES")), row(&s1, 1, hidden)],
    );

    for version in [OdmVersion::V1_3_2, OdmVersion::V2_0] {
        let built = build(version, HiddenRowPolicy::default_for(version), &meta).expect("build");
        assert_eq!(built.items.len(), 1);
        assert_eq!(built.concepts[0].item_refs.len(), 1);
        assert!(built.items.iter().all(|def| def.name != "VSTESTCD"));
    }
}

#[test]
fn hidden_row_codelists_follow_the_version_default() {
    let s1 = section("S1", 1);
    let mut hidden = item("G1", 2, "VSTESTCD");
    hidden.hidden = true;
    hidden.codelist = "C66741".to_string();
    hidden.prepopulated_term = "WEIGHT".to_string();
    let meta = metadata(
        vec![s1.clone()],
        vec![row(&s1, 1, item("G1", 1, "VSORRES")), row(&s1, 1, hidden)],
    );

    let v132 = build(
        OdmVersion::V1_3_2,
        HiddenRowPolicy::default_for(OdmVersion::V1_3_2),
        &meta,
    )
    .expect("build 1.3.2");
    assert_eq!(v132.codelists.len(), 1);

    let v20 = build(
        OdmVersion::V2_0,
        HiddenRowPolicy::default_for(OdmVersion::V2_0),
        &meta,
    )
    .expect("build 2.0");
    assert!(v20.codelists.is_empty());

    let overridden = build(OdmVersion::V2_0, HiddenRowPolicy::IncludeCodelists, &meta)
        .expect("build 2.0 with hidden codelists");
    assert_eq!(overridden.codelists.len(), 1);
}

#[test]
fn repeated_unit_literal_yields_one_measurement_unit() {
    let s1 = section("S1", 1);
    let mut rows = weight_with_unit("G1", 1, &s1);
    rows.extend(weight_with_unit("G2", 2, &s1));
    let meta = metadata(vec![s1], rows);

    let built = build(OdmVersion::V2_0, HiddenRowPolicy::Exclude, &meta).expect("build");
    assert_eq!(built.units.len(), 1);
    assert_eq!(built.units[0].oid, "MU.kg");
    let refs: Vec<_> = built
        .items
        .iter()
        .filter_map(|def| def.measurement_unit_ref.as_ref())
        .map(|r| r.measurement_unit_oid.as_str())
        .collect();
    assert_eq!(refs, vec!["MU.kg", "MU.kg"]);
}

#[test]
fn codelists_are_not_deduplicated() {
    let s1 = section("S1", 1);
    let mut first = item("G1", 1, "VSPOS");
    first.codelist = "C71148".to_string();
    first.value_list = "SITTING;STANDING".to_string();
    first.value_display_list = "Sitting;Standing".to_string();
    let second = first.clone();
    let meta = metadata(
        vec![s1.clone()],
        vec![row(&s1, 1, first), row(&s1, 1, second)],
    );

    let built = build(OdmVersion::V1_3_2, HiddenRowPolicy::IncludeCodelists, &meta).expect("build");
    assert_eq!(built.codelists.len(), 2);
    assert_eq!(built.codelists[0].oid, built.codelists[1].oid);
}

#[test]
fn short_display_list_fails_the_build() {
    let s1 = section("S1", 1);
    let mut bad = item("G1", 1, "VSPOS");
    bad.value_list = "A;B;C".to_string();
    bad.value_display_list = "Alpha;Beta".to_string();
    let meta = metadata(vec![s1.clone()], vec![row(&s1, 1, bad)]);
    assert!(build(OdmVersion::V2_0, HiddenRowPolicy::Exclude, &meta).is_err());
}

#[test]
fn section_aliases_and_form_refs_are_attached() {
    let built = build(
        OdmVersion::V1_3_2,
        HiddenRowPolicy::IncludeCodelists,
        &two_concepts(),
    )
    .expect("build");
    let section = built.section("IG.S1_1").expect("section");
    assert_eq!(section.aliases[0].context, defs::SECTION_ANNOTATION);
    assert_eq!(section.aliases[0].name, "S1 annotation");

    assert_eq!(built.form.oid, "FORM.VS");
    assert_eq!(built.form.aliases[0].context, defs::FORM_ANNOTATION);
    assert_eq!(built.form.section_refs.len(), 1);
    assert_eq!(built.form.section_refs[0].item_group_oid, "IG.S1_1");
    assert_eq!(built.form.section_refs[0].order_number, 1);
}

#[test]
fn groups_sharing_a_concept_order_build_one_concept_each() {
    let s1 = section("S1", 1);
    let mut rows = vec![
        row(&s1, 1, item("G2", 1, "RESP1")),
        row(&s1, 1, item("G1", 1, "PULSE1")),
        row(&s1, 1, item("G2", 2, "RESP2")),
        row(&s1, 1, item("G1", 2, "PULSE2")),
    ];
    rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let meta = metadata(vec![s1], rows);

    for version in [OdmVersion::V1_3_2, OdmVersion::V2_0] {
        let built = build(version, HiddenRowPolicy::default_for(version), &meta).expect("build");
        assert_eq!(built.concepts.len(), 2);
        assert!(built.concepts.iter().all(|c| c.item_refs.len() == 2));
    }
}

#[test]
fn group_placed_twice_in_one_section() {
    let s1 = section("S1", 1);
    let meta = metadata(
        vec![s1.clone()],
        vec![
            row(&s1, 1, item("G1", 1, "A")),
            row(&s1, 2, item("G2", 1, "B")),
            row(&s1, 3, item("G1", 1, "A")),
        ],
    );

    let v132 = build(OdmVersion::V1_3_2, HiddenRowPolicy::IncludeCodelists, &meta)
        .expect("build 1.3.2");
    let oids: Vec<&str> = v132.concepts.iter().map(|c| c.oid.as_str()).collect();
    assert_eq!(oids, vec!["IG.S1_1_G1_1", "IG.S1_1_G2_2", "IG.S1_1_G1_3"]);

    let err = build(OdmVersion::V2_0, HiddenRowPolicy::Exclude, &meta).unwrap_err();
    assert!(matches!(
        err,
        CoreError::DuplicateConcept { ref oid, ref group_id, .. }
            if oid == "IG.S1.G1" && group_id == "G1"
    ));
}
