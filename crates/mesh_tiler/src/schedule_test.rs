use super::*;

const EPS: f64 = 1e-9;

#[test]
fn test_strictly_increasing() {
  let schedule = QualitySchedule::new(5, 0.1, 0.8).unwrap();
  let values: Vec<f64> = schedule.iter().map(|(_, r)| r).collect();
  for pair in values.windows(2) {
    assert!(pair[1] > pair[0], "schedule not increasing: {values:?}");
  }
}

/// The first layer is already one step above the minimum.
#[test]
fn test_first_value_above_min() {
  let schedule = QualitySchedule::new(5, 0.1, 0.8).unwrap();
  let k = (0.8f64 / 0.1).ln() / 5.0;
  assert!((schedule.retention(0) - 0.1 * k.exp()).abs() < EPS);
  assert!(schedule.retention(0) > 0.1);
}

#[test]
fn test_last_value_bounded_by_max() {
  for layers in 1..10 {
    let schedule = QualitySchedule::new(layers, 0.05, 0.9).unwrap();
    let last = schedule.retention(layers - 1);
    assert!(last <= 0.9, "layers={layers} last={last}");
    assert!((last - 0.9).abs() < EPS);
  }
}

/// Two layers between 0.1 and 0.8: 0.1 * sqrt(8) and 0.8.
#[test]
fn test_two_layer_values() {
  let schedule = QualitySchedule::new(2, 0.1, 0.8).unwrap();
  assert!((schedule.retention(0) - 0.282_842_712).abs() < 1e-6);
  assert!((schedule.retention(1) - 0.8).abs() < 1e-9);
}

#[test]
fn test_equal_bounds_flat() {
  let schedule = QualitySchedule::new(3, 0.5, 0.5).unwrap();
  for (_, r) in schedule.iter() {
    assert!((r - 0.5).abs() < EPS);
  }
}

#[test]
fn test_inverted_bounds_rejected() {
  assert!(QualitySchedule::new(3, 0.8, 0.1).is_err());
  assert!(QualitySchedule::new(3, 0.0, 0.5).is_err());
  assert!(QualitySchedule::new(3, 0.1, 1.5).is_err());
  assert!(QualitySchedule::new(0, 0.1, 0.8).is_err());
}

/// The unchecked formula decreases for an inverted range.
#[test]
fn test_raw_formula_inverted_is_decreasing() {
  let a = retention(0, 3, 0.8, 0.1);
  let b = retention(1, 3, 0.8, 0.1);
  assert!(b < a);
}

#[test]
fn test_iter_indices() {
  let schedule = QualitySchedule::new(4, 0.1, 0.8).unwrap();
  let indices: Vec<usize> = schedule.iter().map(|(i, _)| i).collect();
  assert_eq!(indices, vec![0, 1, 2, 3]);
  assert_eq!(schedule.num_layers(), 4);
}
