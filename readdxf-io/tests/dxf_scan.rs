
use std::path::PathBuf;

use golden::assert_golden;
use readdxf_core::entity::{Entity, EntityKind};
use readdxf_io::{DxfFile, LoadError, ScanError, SectionError, scan_file};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn scan_basic_entities_matches_expected_output() {
    let file = DxfFile::open(fixture("basic_entities.dxf")).expect("读取 DXF 失败");
    let mut scanner = file.entities();
    let entities: Vec<Entity> = scanner.by_ref().collect();
    assert_golden("basic_entities", &entities, scanner.stats());
}

#[test]
fn scan_skips_entities_with_missing_fields() {
    let file = DxfFile::open(fixture("missing_fields.dxf")).expect("读取 DXF 失败");
    let mut scanner = file.entities();
    let entities: Vec<Entity> = scanner.by_ref().collect();
    assert_golden("missing_fields", &entities, scanner.stats());
}

#[test]
fn scan_respects_requested_kinds() {
    let arcs = scan_file(fixture("basic_entities.dxf"), &[EntityKind::Arc]).expect("扫描失败");
    assert_eq!(arcs.len(), 1);
    match &arcs[0] {
        Entity::Arc(arc) => {
            assert!((arc.center.x() - 50.0).abs() < 1e-9);
            assert!((arc.center.y() - 25.5).abs() < 1e-9);
            assert!((arc.radius - 12.5).abs() < 1e-9);
            assert!((arc.end_angle - 180.0).abs() < 1e-9);
        }
        other => panic!("期望圆弧实体，实际为 {other:?}"),
    }

    let lines = scan_file(fixture("basic_entities.dxf"), &[EntityKind::Line]).expect("扫描失败");
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|entity| entity.kind() == EntityKind::Line));
}

#[test]
fn scan_reports_entities_in_buffer_order() {
    let file = DxfFile::open(fixture("basic_entities.dxf")).expect("读取 DXF 失败");
    let source = file.buffer().as_bytes();
    let reports: Vec<String> = file.entities().map(|entity| entity.to_string()).collect();
    assert_eq!(
        reports,
        vec![
            "Found line segment from (0,0) to (100,0)",
            "Found arc center (50,25.5) radius 12.5 from 0° to 180°.",
            "Found line segment from (-2.5,100) to (3.75,-4)",
        ]
    );
    // 区间内只有两条 LINE、一条 ARC，CIRCLE 不参与
    let body = &source[file.span().start..file.span().end];
    let body = std::str::from_utf8(body).expect("ASCII 内容");
    assert_eq!(body.matches("\nLINE\n").count(), 2);
    assert_eq!(body.matches("\nARC\n").count(), 1);
    assert_eq!(body.matches("\nCIRCLE\n").count(), 1);
}

#[test]
fn file_without_entities_section_is_rejected() {
    let err = DxfFile::open(fixture("no_entities.dxf")).expect_err("不应找到 ENTITIES");
    assert!(matches!(err, ScanError::Section(SectionError::NotFound)));
}

#[test]
fn file_without_endsec_is_rejected() {
    let err = DxfFile::open(fixture("unterminated.dxf")).expect_err("不应找到 ENDSEC");
    assert!(matches!(err, ScanError::Section(SectionError::Unterminated)));
}

#[test]
fn missing_file_is_a_load_failure() {
    let err = DxfFile::open(fixture("does_not_exist.dxf")).expect_err("文件不存在");
    match err {
        ScanError::Load(load) => {
            assert!(matches!(load, LoadError::Open { .. }));
            assert_eq!(load.code(), -1);
        }
        other => panic!("期望读取失败，实际为 {other:?}"),
    }
}
