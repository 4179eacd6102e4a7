use proptest::prelude::*;
use tosa_lower::conversion::{lower_reshape, lower_reshape_to, LoweringError};
use tosa_lower::layout::DimOrder;
use tosa_lower::shape_helpers::InferenceFailure;
use tosa_lower::ValueDescriptor;

fn lower(
    input_shape: &[i64],
    requested: &[i64],
    order: &[usize],
) -> Result<Vec<usize>, LoweringError> {
    let input = ValueDescriptor::new("x", input_shape.to_vec());
    let output = ValueDescriptor::new("y", requested.to_vec()).with_dim_order(order.to_vec());
    lower_reshape(&input, &output)
}

#[test]
fn infers_sentinel_from_input_element_count() {
    let shape = lower(&[2, 3, 4], &[-1, 4], &[0, 1])
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(shape, vec![6, 4]);
}

#[test]
fn reorders_requested_shape_into_physical_order() {
    let shape =
        lower(&[3, 2], &[2, 3], &[1, 0]).unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(shape, vec![3, 2]);
}

#[test]
fn resolves_sentinel_before_layout_mapping() {
    let shape = lower(&[2, 24], &[2, -1, 2, 3], &[0, 2, 3, 1])
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(shape, vec![2, 2, 3, 4]);
}

#[test]
fn scalar_reshape_produces_empty_shape() {
    let shape = lower(&[1], &[], &[]).unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert!(shape.is_empty());
}

#[test]
fn zero_sized_dims_pass_without_sentinel() {
    let shape =
        lower(&[0, 3], &[3, 0], &[0, 1]).unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(shape, vec![3, 0]);
}

#[test]
fn sentinel_next_to_zero_sized_dim_fails() {
    let err = lower(&[0, 3], &[0, -1], &[0, 1]).expect_err("division by zero");
    assert_eq!(
        err,
        LoweringError::ShapeInference {
            input: "x".to_string(),
            requested: vec![0, -1],
            input_elements: Some(0),
            reason: InferenceFailure::ZeroSizedKnownDims,
        }
    );
}

#[test]
fn multiple_sentinels_fail() {
    let err = lower(&[2, 3, 4], &[-1, -1], &[0, 1]).expect_err("ambiguous inference");
    assert!(matches!(
        err,
        LoweringError::ShapeInference {
            reason: InferenceFailure::MultipleInferDims,
            ..
        }
    ));
}

#[test]
fn inexact_division_fails() {
    let err = lower(&[2, 3, 4], &[-1, 5], &[0, 1]).expect_err("24 is not divisible by 5");
    assert!(matches!(
        err,
        LoweringError::ShapeInference {
            input_elements: Some(24),
            reason: InferenceFailure::InexactDivision {
                elements: 24,
                known: 5
            },
            ..
        }
    ));
}

#[test]
fn negative_requested_dim_other_than_sentinel_fails() {
    let err = lower(&[4], &[-2, -2], &[0, 1]).expect_err("negative extent");
    assert!(matches!(
        err,
        LoweringError::ShapeInference {
            reason: InferenceFailure::NegativeDimension { axis: 0, value: -2 },
            ..
        }
    ));
}

#[test]
fn element_count_mismatch_is_fatal() {
    let err = lower(&[2, 3], &[4, 2], &[0, 1]).expect_err("6 != 8");
    assert_eq!(
        err,
        LoweringError::ElementCountMismatch {
            expected: 6,
            actual: 8,
            shape: vec![4, 2],
        }
    );
}

#[test]
fn output_order_rank_must_match_requested_rank() {
    let err = lower(&[2, 3], &[6], &[0, 1]).expect_err("order has rank 2, shape has rank 1");
    assert!(matches!(err, LoweringError::InvalidLayout(_)));
}

#[test]
fn unresolved_input_shape_is_reported_by_name() {
    let err = lower(&[-1, 3], &[3, -1], &[0, 1]).expect_err("input must be static");
    assert_eq!(
        err,
        LoweringError::ShapeInference {
            input: "x".to_string(),
            requested: vec![3, -1],
            input_elements: None,
            reason: InferenceFailure::UnresolvedInputDim { axis: 0, value: -1 },
        }
    );
    assert!(err.to_string().contains("'x'"), "{err}");
}

#[test]
fn explicit_requested_shape_overrides_output_shape() {
    let input = ValueDescriptor::new("x", vec![4, 6]);
    let shape = lower_reshape_to(&input, &[-1, 2, 3], &DimOrder::identity(3))
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(shape, vec![4, 2, 3]);
}

fn shape_with_sentinel() -> impl Strategy<Value = (Vec<i64>, Vec<i64>, Vec<usize>)> {
    prop::collection::vec(1i64..6, 1..5).prop_flat_map(|input| {
        let rank = input.len();
        let requested = Just(input.clone())
            .prop_shuffle()
            .prop_flat_map(move |dims| {
                (Just(dims), 0..rank).prop_map(|(mut dims, axis)| {
                    dims[axis] = -1;
                    dims
                })
            });
        let order = Just((0..rank).collect::<Vec<usize>>()).prop_shuffle();
        (Just(input), requested, order)
    })
}

proptest! {
    #[test]
    fn lowering_preserves_element_count((input, requested, order) in shape_with_sentinel()) {
        let shape = lower(&input, &requested, &order).expect("shuffled dims always resolve");
        let expected: i64 = input.iter().product();
        prop_assert_eq!(shape.iter().product::<usize>() as i64, expected);
        prop_assert_eq!(shape.len(), requested.len());
    }
}
