use cascade_ocr::document::reading_order::graph_based_reading_order;
use cascade_ocr::document::{Bounds, Detection, Directionality, ReadingOrderAnalyzer};
use cascade_ocr::inference::LayoutAnalyzer;

#[test]
fn test_reading_order_empty() {
    assert!(graph_based_reading_order(&[], Directionality::Horizontal).is_empty());
}

#[test]
fn test_reading_order_single() {
    let boxes = vec![Bounds::new(0, 0, 10, 10)];
    assert_eq!(
        graph_based_reading_order(&boxes, Directionality::Horizontal),
        vec![0]
    );
}

#[test]
fn test_reading_order_left_to_right() {
    let boxes = vec![
        Bounds::new(200, 0, 300, 50),
        Bounds::new(0, 0, 100, 50),
        Bounds::new(100, 0, 200, 50),
    ];
    assert_eq!(
        graph_based_reading_order(&boxes, Directionality::Horizontal),
        vec![1, 2, 0]
    );
}

#[test]
fn test_reading_order_top_to_bottom() {
    let boxes = vec![
        Bounds::new(0, 100, 100, 150),
        Bounds::new(0, 200, 100, 250),
        Bounds::new(0, 0, 100, 50),
    ];
    assert_eq!(
        graph_based_reading_order(&boxes, Directionality::Horizontal),
        vec![2, 0, 1]
    );
}

#[test]
fn test_vertical_columns_read_right_to_left() {
    // Two columns, each split in two.
    let boxes = vec![
        Bounds::new(0, 0, 30, 100),
        Bounds::new(0, 110, 30, 200),
        Bounds::new(100, 0, 130, 100),
        Bounds::new(100, 110, 130, 200),
    ];
    assert_eq!(
        graph_based_reading_order(&boxes, Directionality::VerticalRtl),
        vec![2, 3, 0, 1]
    );
}

#[test]
fn test_directionality_detection() {
    let horizontal = vec![Bounds::new(0, 0, 100, 20), Bounds::new(0, 30, 100, 50)];
    let vertical = vec![
        Bounds::new(0, 0, 20, 100),
        Bounds::new(30, 0, 50, 100),
        Bounds::new(0, 150, 100, 170),
    ];

    assert_eq!(Directionality::detect(&horizontal), Directionality::Horizontal);
    assert_eq!(Directionality::detect(&vertical), Directionality::VerticalRtl);
    assert_eq!(Directionality::detect(&[]), Directionality::Horizontal);
}

#[test]
fn test_analyzer_filters_line_classes() {
    let analyzer = ReadingOrderAnalyzer::new(vec![1]);
    let detections = vec![
        Detection::new(Bounds::new(0, 50, 100, 70), 0.9, 1),
        Detection::new(Bounds::new(0, 0, 300, 300), 0.9, 0),
        Detection::new(Bounds::new(0, 10, 100, 30), 0.8, 1),
    ];

    let lines = analyzer.analyze(&detections, 400, 400).unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].y, 10);
    assert_eq!(lines[1].y, 50);
    assert_eq!(lines[0].confidence, Some(0.8));
}

#[test]
fn test_analyzer_passes_char_count_through() {
    let analyzer = ReadingOrderAnalyzer::new(vec![1]);
    let detections = vec![
        Detection::new(Bounds::new(0, 0, 100, 20), 0.9, 1).with_char_count(3.0),
        Detection::new(Bounds::new(0, 40, 100, 60), 0.9, 1),
    ];

    let lines = analyzer.analyze(&detections, 200, 200).unwrap();

    assert_eq!(lines[0].complexity, Some(3.0));
    assert_eq!(lines[1].complexity, None);
}

#[test]
fn test_analyzer_clips_to_page() {
    let analyzer = ReadingOrderAnalyzer::new(vec![1]);
    let detections = vec![
        Detection::new(Bounds::new(-10, 0, 150, 20), 0.9, 1),
        Detection::new(Bounds::new(300, 300, 400, 320), 0.9, 1),
    ];

    let lines = analyzer.analyze(&detections, 100, 100).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!((lines[0].x, lines[0].width), (0, 100));
}

#[test]
fn test_analyzer_without_line_detections_returns_nothing() {
    let analyzer = ReadingOrderAnalyzer::new(vec![1, 2]);
    let detections = vec![Detection::new(Bounds::new(0, 0, 100, 20), 0.9, 9)];

    assert!(analyzer.analyze(&detections, 200, 200).unwrap().is_empty());
}
