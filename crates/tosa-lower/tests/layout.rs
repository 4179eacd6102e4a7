use proptest::prelude::*;
use tosa_lower::layout::{map_shape, DimOrder, LayoutError, NHWC_ORDER};

#[test]
fn map_shape_reorders_sizes_by_physical_axis() {
    let physical = map_shape(&[2, 3], &DimOrder::new(vec![1, 0]))
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(physical, vec![3, 2]);
}

#[test]
fn map_shape_applies_channels_last_order() {
    let physical = map_shape(&[1, 16, 8, 4], &DimOrder::new(NHWC_ORDER.to_vec()))
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert_eq!(physical, vec![1, 8, 4, 16]);
}

#[test]
fn map_shape_of_scalar_is_empty() {
    let physical = map_shape(&[], &DimOrder::identity(0))
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
    assert!(physical.is_empty());
}

#[test]
fn map_shape_rejects_rank_mismatch() {
    let err = map_shape(&[2, 3, 4], &DimOrder::new(vec![1, 0]))
        .expect_err("rank mismatch should be rejected");
    assert_eq!(
        err,
        LayoutError {
            dim_order: vec![1, 0],
            rank: 3,
        }
    );
}

#[test]
fn map_shape_rejects_non_permutation() {
    let err = map_shape(&[2, 3], &DimOrder::new(vec![1, 1]))
        .expect_err("repeated axis should be rejected");
    assert_eq!(err.rank, 2);
    assert!(err.to_string().contains("not a permutation"));
}

#[test]
fn inverse_of_invalid_order_fails() {
    DimOrder::new(vec![0, 3])
        .inverse()
        .expect_err("out of range axis has no inverse");
}

#[test]
fn dim_order_serializes_as_plain_list() {
    let json = serde_json::to_string(&DimOrder::new(vec![0, 2, 3, 1])).expect("serialize");
    assert_eq!(json, "[0,2,3,1]");
}

fn shape_and_order() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    prop::collection::vec(0usize..9, 0..6).prop_flat_map(|shape| {
        let rank = shape.len();
        let order = Just((0..rank).collect::<Vec<usize>>()).prop_shuffle();
        (Just(shape), order)
    })
}

proptest! {
    #[test]
    fn layout_round_trips_through_inverse((shape, order) in shape_and_order()) {
        let order = DimOrder::new(order);
        let inverse = order.inverse().expect("shuffled range is a permutation");
        let physical = map_shape(&shape, &order).expect("valid permutation");
        let restored = map_shape(&physical, &inverse).expect("valid inverse");
        prop_assert_eq!(restored, shape);
    }

    #[test]
    fn layout_preserves_element_count((shape, order) in shape_and_order()) {
        let physical = map_shape(&shape, &DimOrder::new(order)).expect("valid permutation");
        prop_assert_eq!(physical.iter().product::<usize>(), shape.iter().product::<usize>());
    }
}
