//! The literal end-to-end scenarios from spec.md §8's scenario table (S1-S8), exercised
//! through the public facade rather than any one crate's internals.

use nagare::{finalizers::to_array, from, DistinctUntilChangedExt, NagareError, StartWithExt};
use nagare_windowed::{AggOp, WindowedStreamExt};
use std::time::Duration;

#[tokio::test]
async fn s1_map_filter() {
    let out = to_array(from(vec![1, 2, 3, 4, 5]).map(|x| x * 2).filter(|x| *x > 5))
        .await
        .unwrap();
    assert_eq!(out, vec![6, 8, 10]);
}

#[tokio::test]
async fn s2_scan_prefix_sums() {
    let out = to_array(from(vec![1, 2, 3, 4, 5]).scan(0, |acc, x| acc + x)).await.unwrap();
    assert_eq!(out, vec![1, 3, 6, 10, 15]);
}

#[tokio::test]
async fn s3_take_then_skip() {
    let out = to_array(from(vec![1, 2, 3, 4, 5]).take(3).skip(1)).await.unwrap();
    assert_eq!(out, vec![2, 3]);
}

#[tokio::test]
async fn s4_distinct_until_changed_then_start_with() {
    let out = to_array(
        from(vec![1, 1, 2, 2, 3, 3])
            .distinct_until_changed()
            .start_with(vec![0]),
    )
    .await
    .unwrap();
    assert_eq!(out, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn s5_windowed_mean() {
    let out = to_array(from(vec![1.0, 2.0, 3.0, 4.0, 5.0]).windowed_aggregate(3, AggOp::Mean))
        .await
        .unwrap();
    assert_eq!(out, vec![2.0, 3.0, 4.0]);
}

#[tokio::test]
async fn s6_rescue_recovers_the_faulted_item() {
    let out = to_array(
        from(vec![1, 2, 3])
            .try_map(|x| {
                if x == 2 {
                    Err(NagareError::operator_fault(0, "boom"))
                } else {
                    Ok(x)
                }
            })
            .rescue(|_| Some(99)),
    )
    .await
    .unwrap();
    assert_eq!(out, vec![1, 99, 3]);
}

#[tokio::test(start_paused = true)]
async fn s7_debounce_over_spaced_arrivals() {
    use nagare::DebounceExt;
    let source = futures::stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((1, 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Some((2, 2))
            }
            2 => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some((3, 3))
            }
            _ => None,
        }
    });
    let out = to_array(nagare::Stream::from_async_stream(source).debounce(Duration::from_millis(10)))
        .await
        .unwrap();
    assert_eq!(out, vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn s8_combine_latest() {
    let a = futures::stream::unfold(0u8, |step| async move {
        match step {
            0 => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some(("a1", 1))
            }
            1 => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some(("a2", 2))
            }
            _ => None,
        }
    });
    let b = futures::stream::unfold(0u8, |step| async move {
        match step {
            0 => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some((1, 1))
            }
            1 => {
                tokio::time::sleep(Duration::from_millis(40)).await;
                Some((2, 2))
            }
            _ => None,
        }
    });
    let out = to_array(nagare::combine_latest(
        nagare::Stream::from_async_stream(a),
        nagare::Stream::from_async_stream(b),
    ))
    .await
    .unwrap();
    assert_eq!(out, vec![("a1", 1), ("a2", 1), ("a2", 2)]);
}
