use tosa_lower::shape_helpers::{
    checked_element_count_or_error, parse_requested_shape, resolve_reshape_dims, static_dims,
    InferenceFailure, ReshapeDim,
};

#[test]
fn checked_element_count_or_error_reports_overflow() {
    let err = checked_element_count_or_error(&[usize::MAX, 2], || "overflow".to_string())
        .expect_err("overflow should be reported");
    assert_eq!(err, "overflow");
}

#[test]
fn checked_element_count_of_empty_shape_is_one() {
    let count = checked_element_count_or_error::<String, _>(&[], || "overflow".to_string())
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(count, 1);
}

#[test]
fn parse_requested_shape_marks_sentinel() {
    let dims = parse_requested_shape(&[2, -1, 0]).unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(
        dims,
        vec![
            ReshapeDim::Explicit(2),
            ReshapeDim::Infer,
            ReshapeDim::Explicit(0)
        ]
    );
}

#[test]
fn static_dims_rejects_sentinel() {
    let err = static_dims(&[3, -1]).expect_err("sentinel is not a size");
    assert_eq!(
        err,
        InferenceFailure::NegativeDimension { axis: 1, value: -1 }
    );
}

#[test]
fn resolve_without_sentinel_returns_shape_unchanged() {
    let dims = resolve_reshape_dims(&[5, 7], 24).unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(dims, vec![5, 7]);
}

#[test]
fn resolve_infers_leading_trailing_and_middle_axes() {
    let cases: [(&[i64], Vec<usize>); 3] = [
        (&[-1, 4], vec![6, 4]),
        (&[2, -1], vec![2, 12]),
        (&[2, -1, 3], vec![2, 4, 3]),
    ];
    for (requested, expected) in cases {
        let dims = resolve_reshape_dims(requested, 24).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(dims, expected, "requested {requested:?}");
    }
}

#[test]
fn resolve_lone_sentinel_takes_every_element() {
    let dims = resolve_reshape_dims(&[-1], 0).unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(dims, vec![0]);
}

#[test]
fn resolve_reports_overflowing_known_extent() {
    let err = resolve_reshape_dims(&[i64::MAX, i64::MAX, -1], 8).expect_err("overflow");
    assert_eq!(err, InferenceFailure::Overflow);
}
