mod common;

use std::sync::Arc;

use cascade_ocr::document::{
    extract_lines, Bounds, Detection, DocumentError, LineGeometry, PageAssembler,
    FALLBACK_COMPLEXITY,
};
use common::{
    assembler_for, failure, geometry, page_with, row, FailingDetector, FakeDetector,
    FakeRecognizer, FixedLayout, Tiers,
};
use geo::Coord;

#[test]
fn test_lines_follow_layout_order_and_complexity() {
    let tiers = Tiers::labelled();
    let boxes = [(row(0), 0), (row(1), 1), (row(2), 2), (row(3), 3)];
    let page = page_with(&boxes);

    let lines = vec![
        geometry(row(0)).with_complexity(3.0),
        geometry(row(1)).with_complexity(2.0),
        geometry(row(2)),
        geometry(row(3)).with_complexity(f32::NAN),
    ];
    let assembler = assembler_for(&tiers, Vec::new(), lines);

    let result = assembler.recognize(&page, "page.jpg", true).unwrap();

    let texts: Vec<&str> = result.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["small-0", "medium-1", "large-2", "large-3"]);
    assert_eq!(result.text, "small-0\nmedium-1\nlarge-2\nlarge-3");
    assert_eq!(result.name, "page.jpg");
    assert_eq!((result.width, result.height), (200, 200));

    let ids: Vec<usize> = result.lines.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn test_layout_order_is_not_resorted() {
    let tiers = Tiers::labelled();
    let page = page_with(&[(row(0), 0), (row(1), 1), (row(2), 2)]);

    // Bottom line first: the assembler keeps whatever order layout gives.
    let lines = vec![geometry(row(2)), geometry(row(0)), geometry(row(1))];
    let assembler = assembler_for(&tiers, Vec::new(), lines);

    let result = assembler.recognize(&page, "page.jpg", true).unwrap();

    assert_eq!(result.text, "large-2\nlarge-0\nlarge-1");
}

#[test]
fn test_fallback_to_detector_boxes() {
    let tiers = Tiers::labelled();
    let page = page_with(&[(row(0), 0), (row(1), 1)]);
    let detections = vec![
        Detection::new(row(0), 0.9, 7).with_char_count(3.0),
        Detection::new(row(1), 0.8, 7).with_char_count(2.0),
    ];

    let assembler = PageAssembler::new(
        FakeDetector::new(detections),
        FixedLayout::empty(),
        tiers.dispatcher(),
    );

    let result = assembler.recognize(&page, "page.jpg", true).unwrap();

    assert_eq!(result.lines.len(), 2);
    assert_eq!(result.text, "large-0\nlarge-1");
    assert_eq!(tiers.small.call_count(), 0);
    assert_eq!(tiers.medium.call_count(), 0);
    assert_eq!(tiers.large.calls(), vec![0, 1]);
    assert!((result.lines[0].confidence - 0.9).abs() < 1e-6);
}

#[test]
fn test_empty_page() {
    let tiers = Tiers::labelled();
    let page = page_with(&[]);
    let assembler = assembler_for(&tiers, Vec::new(), Vec::new());

    let result = assembler.recognize(&page, "blank.jpg", true).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.text, "");
    assert_eq!(tiers.large.call_count(), 0);
}

#[test]
fn test_zero_area_geometries_are_skipped() {
    let tiers = Tiers::labelled();
    let page = page_with(&[(row(0), 0), (row(2), 2)]);

    let lines = vec![
        geometry(row(0)),
        LineGeometry::new(10, 40, 0, 10),
        LineGeometry::new(10, 40, 50, -3),
        geometry(row(2)),
    ];
    let assembler = assembler_for(&tiers, Vec::new(), lines);

    let result = assembler.recognize(&page, "page.jpg", true).unwrap();

    let ids: Vec<usize> = result.lines.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(result.text, "large-0\nlarge-2");
}

#[test]
fn test_line_result_geometry() {
    let tiers = Tiers::labelled();
    let bounds = Bounds::new(20, 30, 120, 45);
    let page = page_with(&[(bounds, 5)]);

    let lines = vec![geometry(bounds), geometry(row(8)).with_confidence(0.75)];
    let assembler = assembler_for(&tiers, Vec::new(), lines);

    let result = assembler.recognize(&page, "page.jpg", true).unwrap();
    let first = &result.lines[0];

    assert_eq!(first.confidence, 0.0);
    assert_eq!(
        first.bounding_box,
        [
            Coord { x: 20, y: 30 },
            Coord { x: 20, y: 45 },
            Coord { x: 120, y: 45 },
            Coord { x: 120, y: 30 },
        ]
    );
    assert_eq!(result.lines[1].confidence, 0.75);
}

#[test]
fn test_all_lines_failing_is_a_page_failure() {
    let tiers = Tiers {
        small: FakeRecognizer::failing(),
        medium: FakeRecognizer::failing(),
        large: FakeRecognizer::failing(),
    };
    let page = page_with(&[(row(0), 0), (row(1), 1)]);
    let assembler = assembler_for(&tiers, Vec::new(), vec![geometry(row(0)), geometry(row(1))]);

    let err = assembler.recognize(&page, "page.jpg", true).unwrap_err();

    assert!(matches!(
        err,
        DocumentError::RecognitionFailed {
            failed: 2,
            total: 2
        }
    ));
}

#[test]
fn test_partial_failure_keeps_page() {
    let tiers = Tiers {
        small: FakeRecognizer::labelled("small"),
        medium: FakeRecognizer::labelled("medium"),
        large: FakeRecognizer::new(|id| {
            if id == 0 {
                Err(failure("bad crop"))
            } else {
                Ok(format!("large-{id}"))
            }
        }),
    };
    let page = page_with(&[(row(0), 0), (row(1), 1)]);
    let assembler = assembler_for(&tiers, Vec::new(), vec![geometry(row(0)), geometry(row(1))]);

    let result = assembler.recognize(&page, "page.jpg", true).unwrap();

    assert_eq!(result.text, "\nlarge-1");
}

#[test]
fn test_detector_error_propagates() {
    let tiers = Tiers::labelled();
    let assembler = PageAssembler::new(
        Arc::new(FailingDetector),
        FixedLayout::empty(),
        tiers.dispatcher(),
    );

    let err = assembler
        .recognize(&page_with(&[]), "page.jpg", true)
        .unwrap_err();

    assert!(matches!(err, DocumentError::ModelProcessingError { .. }));
}

#[test]
fn test_recognition_is_idempotent() {
    let tiers = Tiers::labelled();
    let boxes = [(row(0), 0), (row(1), 1), (row(2), 2)];
    let page = page_with(&boxes);
    let lines = vec![
        geometry(row(0)).with_complexity(3.0),
        geometry(row(1)).with_complexity(2.0),
        geometry(row(2)),
    ];
    let assembler = assembler_for(&tiers, Vec::new(), lines);

    let first = assembler.recognize(&page, "page.jpg", true).unwrap();
    let second = assembler.recognize(&page, "page.jpg", true).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_cascade_flag_reaches_dispatcher() {
    let tiers = Tiers::labelled();
    let page = page_with(&[(row(0), 0)]);
    let assembler = assembler_for(&tiers, Vec::new(), vec![geometry(row(0)).with_complexity(3.0)]);

    let result = assembler.recognize(&page, "page.jpg", false).unwrap();

    assert_eq!(result.text, "large-0");
    assert_eq!(tiers.small.call_count(), 0);
}

#[test]
fn test_extract_lines_assigns_dense_indices() {
    let page = page_with(&[(row(0), 0), (row(1), 1)]);
    let geometries = vec![
        geometry(row(0)).with_complexity(2.0),
        LineGeometry::new(500, 500, 10, 10),
        geometry(row(1)),
    ];

    let (regions, kept) = extract_lines(&page, &geometries);

    assert_eq!(regions.len(), 2);
    assert_eq!(kept.len(), 2);
    assert_eq!(regions[0].order_index, 0);
    assert_eq!(regions[1].order_index, 1);
    assert_eq!(regions[0].complexity, 2.0);
    assert_eq!(regions[1].complexity, FALLBACK_COMPLEXITY);
    assert_eq!(regions[1].image.get_pixel(0, 0)[0], 1);
    assert!(!regions[0].is_recognized());
}
